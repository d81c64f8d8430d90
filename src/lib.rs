//! Client library for the Drivium cloud drive.
//!
//! All HTTP traffic goes through [`api::ApiClient`], which injects the stored
//! bearer token and maps failures onto [`api::ApiError`]. The `auth`, `users`
//! and `drive` modules wrap the individual backend endpoints.

pub mod api;
pub mod config;

pub use api::{ApiClient, ApiError, RequestOptions, ResponseBody, TokenStore};
pub use config::Config;
