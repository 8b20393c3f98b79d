//! Session persistence.
//!
//! The backend issues a JWT access/refresh pair on login. The pair, the
//! user's role and their assigned district are stored in `session.json` in
//! the cache directory so later commands can reuse them.

pub mod session;

pub use session::{Session, SessionData};
