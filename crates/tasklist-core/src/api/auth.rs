//! Unauthenticated endpoints: login, registration, token refresh.
//!
//! These calls go straight to the transport. They never carry a bearer token
//! and never pass through the request gateway's guards.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{AuthError, TokenPair};
use crate::models::{Credentials, NewUser, RegisteredUser};

use super::{ApiError, ApiRequest, FieldErrors, Transport};

const LOGIN_PATH: &str = "/auth/login/";
const REFRESH_PATH: &str = "/auth/refresh/";
const REGISTER_PATH: &str = "/users/";

/// Fallback messages when the server gives no detail
const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Body of a successful refresh. The refresh token is only present when the
/// server rotates it.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Clone)]
pub struct AuthApi {
    transport: Arc<dyn Transport>,
}

impl AuthApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Exchange credentials for a token pair.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let request = ApiRequest::post(LOGIN_PATH, credentials)?;
        let response = self.transport.send(&request).await?;

        if !response.is_success() {
            debug!(status = response.status.as_u16(), "Login rejected");
            let message = response.detail().unwrap_or_else(|| LOGIN_FAILED.to_string());
            return Err(AuthError::Rejected(message));
        }

        Ok(response.json()?)
    }

    /// Create a user account.
    pub async fn register(&self, user: &NewUser) -> Result<RegisteredUser, AuthError> {
        let request = ApiRequest::post(REGISTER_PATH, user)?;
        let response = self.transport.send(&request).await?;

        if !response.is_success() {
            debug!(status = response.status.as_u16(), "Registration rejected");
            return Err(match FieldErrors::from_body(&response.body) {
                Some(errors) => AuthError::Validation(errors),
                None => AuthError::Rejected(REGISTRATION_FAILED.to_string()),
            });
        }

        Ok(response.json()?)
    }

    /// Trade a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH, &RefreshRequest { refresh: refresh_token })?;
        let response = self.transport.send(&request).await?.error_for_status()?;
        response.json()
    }
}
