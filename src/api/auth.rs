//! Authentication endpoints.

use super::client::{ApiClient, RequestOptions, ResponseBody};
use super::error::ApiError;
use super::tokens::TokenStoreError;
use super::types::{LoginRequest, LoginResponse};

/// Log in with username and password.
///
/// POST /auth/login (unauthenticated). If the response carries a non-empty
/// `access_token`, it replaces whatever token was stored. A 2xx body that is
/// not a login object yields an empty `LoginResponse` and stores nothing.
pub async fn login(client: &ApiClient, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
    log::info!("Logging in as {}", credentials.username);

    let body = client
        .request(
            "/auth/login",
            RequestOptions::new()
                .method("POST")
                .json(credentials)
                .auth(false),
        )
        .await?;
    let resp = login_response(body);

    if let Some(token) = resp.token() {
        client.set_access_token(token)?;
        log::info!("Login successful, access token stored");
    } else {
        log::warn!("Login response carried no access token");
    }

    Ok(resp)
}

fn login_response(body: Option<ResponseBody>) -> LoginResponse {
    match body {
        Some(ResponseBody::Json(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
            log::debug!("Unexpected login response shape: {}", e);
            LoginResponse::default()
        }),
        _ => LoginResponse::default(),
    }
}

/// Forget the stored access token. Local only; the backend has no logout endpoint.
pub fn logout(client: &ApiClient) -> Result<(), TokenStoreError> {
    log::info!("Logging out");
    client.clear_access_token()
}
