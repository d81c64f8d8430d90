//! Request gateway: every call to the Drivium backend goes through here.
//!
//! Handles bearer token injection, JSON body serialization, response body
//! parsing and translation of failures into `ApiError`. A 401 from the
//! backend evicts the stored token.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE,
};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::tokens::{TokenStore, TokenStoreError};
use crate::config::Config;

/// Parsed response payload. An absent body is represented as `None` by callers.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(t) => Some(t),
            ResponseBody::Json(_) => None,
        }
    }
}

/// Whether stored cookies are sent with a request (and `Set-Cookie` honoured).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    Omit,
    /// Only when the request URL shares the base URL's origin.
    #[default]
    SameOrigin,
    Include,
}

/// Per-call request configuration.
///
/// Defaults to an authenticated GET with no body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Option<String>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    // Serialization errors surface when the request is sent.
    json: Option<Result<Value, String>>,
    auth: bool,
    credentials: CredentialsMode,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: None,
            headers: HeaderMap::new(),
            body: None,
            json: None,
            auth: true,
            credentials: CredentialsMode::default(),
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP method, case-insensitive.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Raw request body. Ignored when a JSON payload is also set.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Structured payload, serialized as the JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> Self {
        self.json = Some(serde_json::to_value(payload).map_err(|e| e.to_string()));
        self
    }

    /// Whether to attach the stored bearer token. Defaults to `true`.
    pub fn auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    pub fn credentials(mut self, mode: CredentialsMode) -> Self {
        self.credentials = mode;
        self
    }
}

/// HTTP client wrapper for Drivium API communication.
///
/// Holds the base URL, the injected token store and a cookie jar. Cheap to
/// share behind an `Arc`; calls are independent and may run concurrently.
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    cookies: Arc<Jar>,
}

impl ApiClient {
    /// Create a new API client with default timeouts.
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_timeouts(
            base_url,
            tokens,
            Duration::from_secs(120),
            Duration::from_secs(10),
        )
    }

    /// Create a client from resolved configuration.
    pub fn from_config(config: &Config, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_timeouts(
            &config.api_base_url,
            tokens,
            config.timeout,
            config.connect_timeout,
        )
    }

    fn with_timeouts(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            cookies: Arc::new(Jar::default()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the stored access token.
    pub fn access_token(&self) -> Result<Option<String>, TokenStoreError> {
        self.tokens.get()
    }

    /// Store the access token for authenticated requests.
    pub fn set_access_token(&self, token: &str) -> Result<(), TokenStoreError> {
        self.tokens.set(token)
    }

    /// Clear the access token (used on logout and on 401).
    pub fn clear_access_token(&self) -> Result<(), TokenStoreError> {
        self.tokens.clear()
    }

    /// Send a request to a path relative to the base URL.
    ///
    /// Returns the parsed body on a 2xx status: `None` for 204 or an empty
    /// body, JSON for a JSON content type, text otherwise.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<ResponseBody>, ApiError> {
        self.send(path, options).await.map(|(_, body)| body)
    }

    /// Like `request`, then deserialize the body into `T`.
    ///
    /// An absent body deserializes from JSON `null`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.url_for(path);
        let (status, body) = self.send(path, options).await?;
        decode_body(&url, status, body)
    }

    async fn send(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<(StatusCode, Option<ResponseBody>), ApiError> {
        let url = self.url_for(path);

        let method_name = options
            .method
            .as_deref()
            .unwrap_or("GET")
            .to_ascii_uppercase();
        let method = Method::from_bytes(method_name.as_bytes()).map_err(|e| {
            ApiError::InvalidRequest {
                url: url.clone(),
                detail: format!("invalid method {:?}: {}", method_name, e),
            }
        })?;

        let mut headers = options.headers;

        if options.auth {
            match self.tokens.get() {
                Ok(Some(token)) => match HeaderValue::from_str(&format!("Bearer {}", token)) {
                    Ok(value) => {
                        headers.insert(AUTHORIZATION, value);
                    }
                    Err(_) => log::warn!("Stored access token is not a valid header value, skipping"),
                },
                Ok(None) => {}
                Err(e) => log::warn!("Failed to read access token: {}", e),
            }
        }

        let mut body = options.body;
        if let Some(json) = options.json {
            let value = json.map_err(|detail| ApiError::InvalidRequest {
                url: url.clone(),
                detail,
            })?;
            body = Some(serde_json::to_vec(&value).map_err(|e| ApiError::InvalidRequest {
                url: url.clone(),
                detail: e.to_string(),
            })?);
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
        }

        let cookie_url = self.cookie_url(&url, options.credentials);
        if let Some(ref parsed) = cookie_url {
            if !headers.contains_key(COOKIE) {
                if let Some(cookies) = self.cookies.cookies(parsed) {
                    headers.insert(COOKIE, cookies);
                }
            }
        }

        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            log::warn!("{} {} failed: {}", method, url, e);
            ApiError::network(&url, &e)
        })?;

        let status = response.status();
        log::debug!("{} {} -> {}", method, url, status.as_u16());

        if let Some(ref parsed) = cookie_url {
            let mut set_cookies = response.headers().get_all(SET_COOKIE).iter();
            self.cookies.set_cookies(&mut set_cookies, parsed);
        }

        let data = read_body(response)
            .await
            .map_err(|e| ApiError::network(&url, &e))?;

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                log::warn!("Received 401 from {}, clearing stored access token", url);
                if let Err(e) = self.tokens.clear() {
                    log::warn!("Failed to clear access token: {}", e);
                }
            }
            return Err(ApiError::Http {
                status: status.as_u16(),
                url,
                message: format!("Request failed: {}", status.as_u16()),
                body: data,
            });
        }

        Ok((status, data))
    }

    /// URL to read/write cookies for, or `None` when the mode excludes them.
    fn cookie_url(&self, url: &str, mode: CredentialsMode) -> Option<Url> {
        let parsed = Url::parse(url).ok()?;
        match mode {
            CredentialsMode::Omit => None,
            CredentialsMode::Include => Some(parsed),
            CredentialsMode::SameOrigin => {
                let base = Url::parse(&self.base_url).ok()?;
                (base.origin() == parsed.origin()).then_some(parsed)
            }
        }
    }

    /// PUT raw bytes to an absolute URL (presigned storage upload).
    ///
    /// Never sends the bearer token.
    pub async fn put_bytes(
        &self,
        url: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut builder = self.client.put(url).body(data);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }

        let resp = builder.send().await.map_err(|e| ApiError::network(url, &e))?;
        log::debug!("PUT {} -> {}", url, resp.status().as_u16());
        ensure_transfer_success(url, "Upload failed", resp).await?;
        Ok(())
    }

    /// Fetch raw bytes from an absolute URL (presigned storage download).
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::network(url, &e))?;
        log::debug!("GET {} -> {}", url, resp.status().as_u16());

        let resp = ensure_transfer_success(url, "Download failed", resp).await?;
        let bytes = resp.bytes().await.map_err(|e| ApiError::network(url, &e))?;
        Ok(bytes.to_vec())
    }
}

/// Parse a response body according to its status and content type.
async fn read_body(response: Response) -> Result<Option<ResponseBody>, reqwest::Error> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    let bytes = response.bytes().await?;

    if is_json {
        return Ok(match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Null) | Err(_) => None,
            Ok(value) => Some(ResponseBody::Json(value)),
        });
    }

    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok((!text.is_empty()).then_some(ResponseBody::Text(text)))
}

fn decode_body<T: DeserializeOwned>(
    url: &str,
    status: StatusCode,
    body: Option<ResponseBody>,
) -> Result<T, ApiError> {
    let value = match body {
        None => Value::Null,
        Some(ResponseBody::Json(v)) => v,
        Some(ResponseBody::Text(t)) => Value::String(t),
    };
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        status: status.as_u16(),
        url: url.to_string(),
        detail: e.to_string(),
    })
}

/// Turn a non-2xx storage response into `ApiError::Http` with the response text.
async fn ensure_transfer_success(
    url: &str,
    action: &str,
    resp: Response,
) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    Err(ApiError::Http {
        status: status.as_u16(),
        url: url.to_string(),
        message: format!("{}: {} {}", action, status.as_u16(), text)
            .trim()
            .to_string(),
        body: (!text.is_empty()).then_some(ResponseBody::Text(text)),
    })
}
