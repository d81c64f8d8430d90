//! User account endpoints.

use super::client::{ApiClient, RequestOptions};
use super::error::ApiError;
use super::types::{RegisterRequest, UserResponse};

/// POST /users/register (unauthenticated).
pub async fn register_user(
    client: &ApiClient,
    request: &RegisterRequest,
) -> Result<UserResponse, ApiError> {
    client
        .request_json(
            "/users/register",
            RequestOptions::new().method("POST").json(request).auth(false),
        )
        .await
}

/// GET /users/me
pub async fn get_current_user(client: &ApiClient) -> Result<UserResponse, ApiError> {
    client.request_json("/users/me", RequestOptions::new()).await
}
