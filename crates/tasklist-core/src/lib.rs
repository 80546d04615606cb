//! Client core for the tasklist to-do service.
//!
//! The pieces, bottom up:
//!
//! - [`auth::TokenStore`] holds the access/refresh pair and persists it.
//! - [`auth::SessionManager`] derives "who is signed in" from that pair and
//!   handles login, registration and logout.
//! - [`api::RequestGateway`] wraps every task API call: it refreshes an
//!   expired token before sending and retries once after a 401.
//! - [`api::ApiClient`] exposes the task endpoints on top of the gateway.
//!
//! [`AppContext`] wires them together for one process.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthEvent, SessionManager, SessionState, SignOutReason, TokenStore};
pub use config::Config;
pub use context::AppContext;
