//! Core library for the NAITA MIS client.
//!
//! - `api`: REST client for the backend
//! - `provider`: record sources (live API or JSON fixtures)
//! - `filter`: search, dropdown filters and sorting for table views
//! - `aggregate`: stat cards, groupings and the district report
//! - `dashboard`: snapshots, background loading and derived views
//! - `export`: CSV/JSON export, server-rendered PDF/Excel, ID card payloads

pub mod aggregate;
pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod filter;
pub mod models;
pub mod provider;
pub mod utils;
pub mod validation;

pub use config::Config;
