//! The seam between the request gateway and the network.
//!
//! `ApiRequest` is a plain value so the gateway can clone it and resend it
//! after a token refresh. `HttpTransport` is the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{ApiError, FieldErrors};

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/tasks/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::POST, path).json(body)
    }

    pub fn put<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PUT, path).json(body)
    }

    pub fn patch<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PATCH, path).json(body)
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn without_bearer(mut self) -> Self {
        self.bearer = None;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Turn a non-2xx response into the matching `ApiError`.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }

    /// The `detail` message of an error body.
    pub fn detail(&self) -> Option<String> {
        FieldErrors::from_body(&self.body).and_then(|errors| errors.detail().map(str::to_string))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Transport over HTTP.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if let Some(ref token) = request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(method = %request.method, url = %url, status = status.as_u16(), "Response received");

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_base_url() {
        let transport = HttpTransport::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000/api");
        assert_eq!(transport.url("/tasks/"), "http://localhost:8000/api/tasks/");
        assert_eq!(transport.url("tasks/"), "http://localhost:8000/api/tasks/");
    }

    #[test]
    fn bearer_is_replaced_on_clone() {
        let original = ApiRequest::get("/tasks/").with_bearer("old");
        let retry = original.clone().with_bearer("new");
        assert_eq!(original.bearer.as_deref(), Some("old"));
        assert_eq!(retry.bearer.as_deref(), Some("new"));
        assert_eq!(retry.path, "/tasks/");
    }

    #[test]
    fn error_for_status_passes_success_through() {
        assert!(ApiResponse::new(StatusCode::OK, "{}").error_for_status().is_ok());
        assert!(matches!(
            ApiResponse::new(StatusCode::UNAUTHORIZED, "").error_for_status(),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn extracts_detail_message() {
        let response = ApiResponse::new(StatusCode::UNAUTHORIZED, r#"{"detail":"invalid credentials"}"#);
        assert_eq!(response.detail().as_deref(), Some("invalid credentials"));
        assert_eq!(ApiResponse::new(StatusCode::BAD_GATEWAY, "oops").detail(), None);
    }
}
