//! In-memory transport for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};

type Responder = dyn Fn(&ApiRequest, usize) -> Result<ApiResponse, ApiError> + Send + Sync;

/// Answers every request with a closure and records what was sent.
/// The closure also receives how many earlier requests hit the same path.
pub struct ScriptedTransport {
    responder: Box<Responder>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&ApiRequest, usize) -> ApiResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::failing(move |request, previous| Ok(responder(request, previous)))
    }

    /// Like `new`, but the closure may fail the way the network does.
    pub fn failing(
        responder: impl Fn(&ApiRequest, usize) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<ApiRequest> {
        self.sent().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls_to(path).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let previous = {
            let mut sent = self.sent.lock().unwrap();
            let previous = sent.iter().filter(|r| r.path == request.path).count();
            sent.push(request.clone());
            previous
        };
        // Give concurrent callers a chance to interleave, like a real network call
        tokio::task::yield_now().await;
        (self.responder)(request, previous)
    }
}

pub fn ok(body: Value) -> ApiResponse {
    ApiResponse::new(StatusCode::OK, body.to_string())
}

pub fn status(code: u16, body: Value) -> ApiResponse {
    ApiResponse::new(StatusCode::from_u16(code).unwrap(), body.to_string())
}

/// A connection failure, as reqwest reports it.
pub fn network_error() -> ApiError {
    let err = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .expect_err("invalid URL must not build");
    ApiError::NetworkError(err)
}

pub fn unauthorized() -> ApiResponse {
    status(401, serde_json::json!({"detail": "Given token not valid for any token type"}))
}

pub fn is_refresh(request: &ApiRequest) -> bool {
    request.method == Method::POST && request.path == "/auth/refresh/"
}
