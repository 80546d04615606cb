//! Wiring of the token store, session manager, gateway and task client.
//!
//! One `AppContext` is created at startup and lives for the whole process.
//! Every component receives the shared pieces it needs from here rather than
//! reaching for globals.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::api::{ApiClient, AuthApi, HttpTransport, RequestGateway, Transport};
use crate::auth::{AuthEvents, SessionManager, TokenRefresher, TokenStore};
use crate::config::Config;

pub struct AppContext {
    pub store: TokenStore,
    pub events: AuthEvents,
    pub session: SessionManager,
    pub api: ApiClient,
}

impl AppContext {
    /// Build the context against the configured server and token backend.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.api_base_url, config.request_timeout())
            .context("Failed to build HTTP client")?;
        let store = config.open_token_store()?;
        info!(api = %transport.base_url(), storage = ?config.token_storage, "Client configured");
        Ok(Self::with_transport(Arc::new(transport), store))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, store: TokenStore) -> Self {
        let events = AuthEvents::new();
        let auth = AuthApi::new(Arc::clone(&transport));
        let refresher = Arc::new(TokenRefresher::new(auth.clone(), store.clone()));
        let gateway = RequestGateway::new(transport, store.clone(), refresher, events.clone());

        Self {
            session: SessionManager::new(auth, store.clone()),
            api: ApiClient::new(Arc::new(gateway)),
            store,
            events,
        }
    }
}
