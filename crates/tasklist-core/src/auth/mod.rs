//! Authentication: token storage, session state and token refresh.
//!
//! This module provides:
//! - `TokenStore`: durable access/refresh pair with pluggable backends
//! - `SessionManager`: login/register/logout and status derived from the token
//! - `TokenRefresher`: the shared refresh primitive, de-duplicated
//! - `AuthEvents`: sign-out notifications for the presentation layer

pub mod claims;
pub mod error;
pub mod events;
pub mod refresh;
pub mod session;
pub mod store;

pub use claims::{AccessClaims, TokenError};
pub use error::AuthError;
pub use events::{AuthEvent, AuthEvents, SignOutReason};
pub use refresh::{RefreshError, TokenRefresher};
pub use session::{SessionManager, SessionState};
pub use store::{
    FileTokenBackend, KeyringTokenBackend, MemoryTokenBackend, StoredTokens, TokenBackend,
    TokenPair, TokenStore,
};
