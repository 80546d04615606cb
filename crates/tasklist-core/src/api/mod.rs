//! REST API client module for the tasklist service.
//!
//! - `Transport` / `HttpTransport`: the raw request/response seam
//! - `AuthApi`: login, registration and token refresh endpoints
//! - `RequestGateway`: attaches credentials, refreshes and retries
//! - `ApiClient`: typed task endpoints, all routed through the gateway
//!
//! The API uses JWT bearer authentication with short-lived access tokens and
//! longer-lived refresh tokens.

pub mod auth;
pub mod client;
pub mod error;
pub mod gateway;
pub mod transport;

pub use auth::{AuthApi, RefreshedTokens};
pub use client::ApiClient;
pub use error::{ApiError, FieldErrors};
pub use gateway::RequestGateway;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
