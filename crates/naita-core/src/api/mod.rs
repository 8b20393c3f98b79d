//! REST API client for the NAITA MIS backend.
//!
//! Requests carry the JWT access token obtained from `/api/token/` as a
//! bearer header. List endpoints may be paginated; both shapes decode to a
//! plain `Vec`.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
