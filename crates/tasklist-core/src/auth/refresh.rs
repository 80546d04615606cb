//! The one place that trades a refresh token for a new access token.
//!
//! Refreshes are serialised behind an async lock. A caller names the access
//! token it found stale; if another caller already replaced that token while
//! this one waited for the lock, the fresh token is handed back without a
//! second trip to the server. That keeps concurrent requests from spending
//! the same refresh token twice.

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ApiError, AuthApi};

use super::{TokenPair, TokenStore};

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Signed out while the refresh was in flight")]
    SignedOut,

    #[error("Token refresh failed: {0}")]
    Api(#[from] ApiError),
}

pub struct TokenRefresher {
    auth: AuthApi,
    store: TokenStore,
    in_flight: Mutex<()>,
}

impl TokenRefresher {
    pub fn new(auth: AuthApi, store: TokenStore) -> Self {
        Self {
            auth,
            store,
            in_flight: Mutex::new(()),
        }
    }

    /// Obtain a usable access token, refreshing unless someone else already did.
    ///
    /// `stale_access` is the access token the caller found unusable. On any
    /// failure from the refresh endpoint the store is wiped before returning.
    /// New tokens are dropped if the store was cleared while the call ran.
    pub async fn refresh(&self, stale_access: Option<&str>) -> Result<String, RefreshError> {
        let _guard = self.in_flight.lock().await;

        let current = self.store.get();
        if let (Some(stale), Some(access)) = (stale_access, current.access.as_deref()) {
            if stale != access {
                debug!("Access token already replaced, reusing it");
                return Ok(access.to_string());
            }
        }

        let refresh_token = current.refresh.ok_or(RefreshError::MissingRefreshToken)?;

        match self.auth.refresh(&refresh_token).await {
            Ok(refreshed) => {
                let rotated = refreshed.refresh.is_some();
                let pair = TokenPair {
                    access: refreshed.access,
                    refresh: refreshed.refresh.unwrap_or_else(|| refresh_token.clone()),
                };
                let access = pair.access.clone();
                if !self.store.rotate(&refresh_token, pair) {
                    info!("Signed out during refresh, discarding new tokens");
                    return Err(RefreshError::SignedOut);
                }
                info!(rotated, "Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing credentials");
                self.store.clear();
                Err(e.into())
            }
        }
    }
}
