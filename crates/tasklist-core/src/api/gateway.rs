//! Credential handling for every authenticated API call.
//!
//! Two guards wrap the transport:
//!
//! - Before sending, the stored access token is decoded. An expired token is
//!   refreshed first; an unreadable one is dropped and the request goes out
//!   without credentials so the server can reject it.
//! - After receiving a 401, one refresh is attempted and the request is sent
//!   again exactly once with the new token.
//!
//! Whenever credentials are dropped a `SignedOut` event is emitted. The
//! gateway never touches session state; the next status check reconciles it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{AccessClaims, AuthEvents, RefreshError, SignOutReason, TokenRefresher, TokenStore};

use super::{ApiError, ApiRequest, ApiResponse, Transport};

pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    store: TokenStore,
    refresher: Arc<TokenRefresher>,
    events: AuthEvents,
}

impl RequestGateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: TokenStore,
        refresher: Arc<TokenRefresher>,
        events: AuthEvents,
    ) -> Self {
        Self {
            transport,
            store,
            refresher,
            events,
        }
    }

    /// Send a request with credentials attached, refreshing and retrying as
    /// needed. Any HTTP status is returned as a response; only transport
    /// failures and a failed pre-flight refresh are errors.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = self.authorize(request).await?;
        let response = self.transport.send(&request).await?;

        if !response.is_unauthorized() {
            return Ok(response);
        }
        self.retry_unauthorized(request, response).await
    }

    /// Pre-flight guard.
    async fn authorize(&self, request: ApiRequest) -> Result<ApiRequest, ApiError> {
        let Some(access) = self.store.access_token() else {
            debug!(path = %request.path, "No access token, sending unauthenticated");
            return Ok(request.without_bearer());
        };

        let claims = match AccessClaims::decode(&access) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, path = %request.path, "Stored access token is unreadable, dropping credentials");
                self.sign_out(SignOutReason::MalformedToken);
                return Ok(request.without_bearer());
            }
        };

        if !claims.is_expired() {
            return Ok(request.with_bearer(access));
        }

        debug!(
            path = %request.path,
            expired_secs = -claims.seconds_until_expiry(),
            "Access token expired, refreshing before send"
        );
        match self.refresher.refresh(Some(&access)).await {
            Ok(fresh) => Ok(request.with_bearer(fresh)),
            Err(e) => {
                warn!(error = %e, path = %request.path, "Refresh failed, request not sent");
                self.refresh_failed(&e);
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Post-flight guard: one refresh, one resend.
    async fn retry_unauthorized(
        &self,
        request: ApiRequest,
        response: ApiResponse,
    ) -> Result<ApiResponse, ApiError> {
        if !self.store.get().has_refresh() {
            info!(path = %request.path, "Request unauthorized and no refresh token stored");
            self.sign_out(SignOutReason::MissingRefreshToken);
            return Ok(response);
        }

        match self.refresher.refresh(request.bearer.as_deref()).await {
            Ok(fresh) => {
                debug!(path = %request.path, "Retrying request with refreshed token");
                let retry = request.with_bearer(fresh);
                self.transport.send(&retry).await
            }
            Err(e) => {
                warn!(error = %e, path = %request.path, "Refresh after 401 failed");
                self.refresh_failed(&e);
                Ok(response)
            }
        }
    }

    fn refresh_failed(&self, error: &RefreshError) {
        let reason = match error {
            RefreshError::MissingRefreshToken => SignOutReason::MissingRefreshToken,
            RefreshError::Api(_) => SignOutReason::RefreshFailed,
            // Explicit logout, already reflected in the session
            RefreshError::SignedOut => return,
        };
        self.sign_out(reason);
    }

    fn sign_out(&self, reason: SignOutReason) {
        self.store.clear();
        self.events.signed_out(reason);
    }
}
