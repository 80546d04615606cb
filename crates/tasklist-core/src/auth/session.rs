//! Session state derived from the stored token pair.
//!
//! `SessionManager` is the only writer of `SessionState`. It publishes every
//! change on a `watch` channel so a front end can re-render on login, logout
//! or an expired token without polling.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::AuthApi;
use crate::models::{Credentials, NewUser, RegisteredUser, User};

use super::{AccessClaims, AuthError, TokenStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    /// True only until the first status check has run.
    pub loading: bool,
}

impl SessionState {
    fn loading() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            loading: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            loading: false,
        }
    }

    fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            loading: false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::signed_out()
    }
}

pub struct SessionManager {
    auth: AuthApi,
    store: TokenStore,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    pub fn new(auth: AuthApi, store: TokenStore) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        Self { auth, store, state }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Subscribe to session changes.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Re-derive the session from the stored tokens.
    ///
    /// Unreadable or expired tokens are wiped. This never fails; every path
    /// ends with `loading` cleared.
    pub fn check_status(&self) -> SessionState {
        let tokens = self.store.get();
        debug!(?tokens, "Checking auth status");

        let next = match tokens.access {
            None => {
                debug!("No access token stored");
                SessionState::signed_out()
            }
            Some(ref access) => match AccessClaims::decode(access) {
                Err(e) => {
                    warn!(error = %e, "Stored access token is unreadable, clearing credentials");
                    self.store.clear();
                    SessionState::signed_out()
                }
                Ok(claims) if claims.is_expired() => {
                    info!(exp = claims.exp, "Access token expired, clearing credentials");
                    self.store.clear();
                    SessionState::signed_out()
                }
                Ok(claims) => {
                    debug!(
                        user_id = claims.user_id,
                        seconds_left = claims.seconds_until_expiry(),
                        "Access token valid"
                    );
                    SessionState::signed_in(claims.user())
                }
            },
        };

        self.state.send_replace(next.clone());
        next
    }

    /// Sign in and store the issued token pair.
    ///
    /// Failures come back as values; the token store and session state are
    /// left untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::Rejected("Username and password required".to_string()));
        }

        debug!(username = %credentials.username, "Attempting login");
        let pair = match self.auth.login(credentials).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e);
            }
        };

        let claims = match AccessClaims::decode(&pair.access) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Login returned an unreadable access token");
                return Err(e.into());
            }
        };

        self.store.set(pair);
        let user = claims.user();
        self.state.send_replace(SessionState::signed_in(user.clone()));
        info!(user_id = user.id, "Login successful");
        Ok(user)
    }

    /// Create an account. Does not sign the new user in.
    pub async fn register(&self, user: &NewUser) -> Result<RegisteredUser, AuthError> {
        match self.auth.register(user).await {
            Ok(created) => {
                info!(username = %created.username, "Registration successful");
                Ok(created)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                Err(e)
            }
        }
    }

    /// Drop the stored credentials and return to the signed-out state.
    pub fn logout(&self) {
        self.store.clear();
        self.state.send_replace(SessionState::signed_out());
        info!("Logged out");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::claims::test_tokens::{expired_token, valid_token};
    use crate::auth::{MemoryTokenBackend, StoredTokens, TokenPair};
    use crate::api::ApiError;
    use crate::testing::{network_error, ok, status, ScriptedTransport};

    fn manager_with(tokens: StoredTokens, transport: std::sync::Arc<ScriptedTransport>) -> (SessionManager, TokenStore) {
        let store = TokenStore::open(MemoryTokenBackend::with_tokens(tokens));
        (SessionManager::new(AuthApi::new(transport), store.clone()), store)
    }

    fn offline() -> std::sync::Arc<ScriptedTransport> {
        ScriptedTransport::new(|request, _| panic!("unexpected request to {}", request.path))
    }

    fn stored(access: &str, refresh: &str) -> StoredTokens {
        StoredTokens {
            access: Some(access.to_string()),
            refresh: Some(refresh.to_string()),
        }
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn starts_loading() {
        let (manager, _) = manager_with(StoredTokens::default(), offline());
        let state = manager.state();
        assert!(state.loading);
        assert!(!state.is_authenticated);
    }

    #[test]
    fn no_token_is_signed_out() {
        let (manager, _) = manager_with(StoredTokens::default(), offline());
        let state = manager.check_status();
        assert_eq!(state, SessionState::signed_out());
        assert!(!manager.state().loading);
    }

    #[test]
    fn valid_token_signs_in() {
        let (manager, store) = manager_with(stored(&valid_token(7, "ana"), "R1"), offline());
        let state = manager.check_status();
        assert!(state.is_authenticated);
        assert!(!state.loading);
        assert_eq!(state.user, Some(User { id: 7, username: "ana".to_string() }));
        assert!(!store.get().is_empty());
    }

    #[test]
    fn expired_token_is_cleared() {
        let (manager, store) = manager_with(stored(&expired_token(7, "ana"), "R1"), offline());
        let state = manager.check_status();
        assert!(!state.is_authenticated);
        assert!(!state.loading);
        assert!(store.get().is_empty());
    }

    #[test]
    fn malformed_token_is_cleared() {
        let (manager, store) = manager_with(stored("garbage", "R1"), offline());
        let state = manager.check_status();
        assert_eq!(state, SessionState::signed_out());
        assert!(store.get().is_empty());
    }

    #[test]
    fn check_status_is_idempotent() {
        let (manager, _) = manager_with(stored(&valid_token(3, "cy"), "R1"), offline());
        let first = manager.check_status();
        let second = manager.check_status();
        assert_eq!(first, second);
    }

    #[test]
    fn watchers_see_status_changes() {
        let (manager, _) = manager_with(stored(&valid_token(3, "cy"), "R1"), offline());
        let rx = manager.watch();
        manager.check_status();
        assert!(rx.borrow().is_authenticated);
        manager.logout();
        assert!(!rx.borrow().is_authenticated);
    }

    #[tokio::test]
    async fn login_stores_pair_and_signs_in() {
        let access = valid_token(9, "bob");
        let issued = access.clone();
        let transport = ScriptedTransport::new(move |_, _| ok(json!({"access": issued, "refresh": "R1"})));
        let (manager, store) = manager_with(StoredTokens::default(), transport.clone());

        let user = manager.login(&credentials("bob", "hunter2")).await.unwrap();

        assert_eq!(user, User { id: 9, username: "bob".to_string() });
        assert!(manager.is_authenticated());
        assert_eq!(store.get(), StoredTokens::from(TokenPair { access, refresh: "R1".into() }));

        let sent = transport.calls_to("/auth/login/");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, Some(json!({"username": "bob", "password": "hunter2"})));
    }

    #[tokio::test]
    async fn login_failure_carries_server_detail() {
        let transport = ScriptedTransport::new(|_, _| status(401, json!({"detail": "invalid credentials"})));
        let (manager, store) = manager_with(StoredTokens::default(), transport);
        manager.check_status();

        let err = manager.login(&credentials("bob", "x")).await.unwrap_err();

        assert_eq!(err.to_string(), "invalid credentials");
        assert!(store.get().is_empty());
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn login_failure_without_detail_uses_fallback() {
        let transport = ScriptedTransport::new(|_, _| status(500, json!("boom")));
        let (manager, _) = manager_with(StoredTokens::default(), transport);

        let err = manager.login(&credentials("bob", "x")).await.unwrap_err();

        assert_eq!(err.to_string(), "Login failed");
    }

    #[tokio::test]
    async fn login_with_unreadable_token_leaves_store_untouched() {
        let transport = ScriptedTransport::new(|_, _| ok(json!({"access": "nope", "refresh": "R1"})));
        let (manager, store) = manager_with(StoredTokens::default(), transport);

        let err = manager.login(&credentials("bob", "x")).await.unwrap_err();

        assert!(matches!(err, AuthError::Token(_)));
        assert!(store.get().is_empty());
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn login_network_failure_leaves_store_untouched() {
        let previous = stored(&valid_token(1, "old"), "R0");
        let transport = ScriptedTransport::failing(|_, _| Err(network_error()));
        let (manager, store) = manager_with(previous.clone(), transport);
        manager.check_status();

        let err = manager.login(&credentials("bob", "hunter2")).await.unwrap_err();

        assert!(matches!(err, AuthError::Api(ApiError::NetworkError(_))));
        assert_eq!(store.get(), previous);
        assert_eq!(manager.user(), Some(User { id: 1, username: "old".to_string() }));
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let (manager, _) = manager_with(StoredTokens::default(), offline());
        assert!(manager.login(&credentials("", "x")).await.is_err());
        assert!(manager.login(&credentials("bob", "")).await.is_err());
    }

    #[tokio::test]
    async fn register_returns_field_errors() {
        let transport = ScriptedTransport::new(|_, _| {
            status(400, json!({"username": ["A user with that username already exists."]}))
        });
        let (manager, store) = manager_with(stored(&valid_token(1, "old"), "R1"), transport);

        let user = NewUser {
            first_name: "Bob".into(),
            last_name: "Builder".into(),
            username: "bob".into(),
            email: "bob@example.com".into(),
            password: "pw".into(),
        };
        let err = manager.register(&user).await.unwrap_err();

        let errors = err.field_errors().expect("validation errors");
        assert_eq!(errors.get("username"), ["A user with that username already exists."]);
        assert!(!store.get().is_empty());
    }

    #[tokio::test]
    async fn register_does_not_sign_in() {
        let transport = ScriptedTransport::new(|_, _| {
            status(201, json!({"id": 4, "username": "bob", "email": "bob@example.com", "first_name": "Bob", "last_name": "Builder"}))
        });
        let (manager, store) = manager_with(StoredTokens::default(), transport.clone());
        manager.check_status();

        let user = NewUser {
            first_name: "Bob".into(),
            last_name: "Builder".into(),
            username: "bob".into(),
            email: "bob@example.com".into(),
            password: "pw".into(),
        };
        let created = manager.register(&user).await.unwrap();

        assert_eq!(created.id, 4);
        assert!(!manager.is_authenticated());
        assert!(store.get().is_empty());
        assert_eq!(transport.calls_to("/users/")[0].body.as_ref().unwrap()["first_name"], "Bob");
    }

    #[test]
    fn logout_always_clears() {
        let (manager, store) = manager_with(stored(&valid_token(3, "cy"), "R1"), offline());
        manager.check_status();
        manager.logout();
        assert!(store.get().is_empty());
        assert_eq!(manager.state(), SessionState::signed_out());

        // Already signed out
        manager.logout();
        assert_eq!(manager.state(), SessionState::signed_out());
    }
}
