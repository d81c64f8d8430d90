//! API client module for the Drivium drive backend.
//!
//! Provides the request gateway with bearer token injection, pluggable token
//! storage, the auth/user/drive endpoint wrappers, and the request/response
//! types matching the backend API.

pub mod auth;
pub mod client;
pub mod drive;
pub mod error;
pub mod tokens;
pub mod types;
pub mod users;

pub use client::{ApiClient, CredentialsMode, RequestOptions, ResponseBody};
pub use error::ApiError;
pub use tokens::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
