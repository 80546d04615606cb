use thiserror::Error;

use crate::api::{ApiError, FieldErrors};

use super::TokenError;

/// Failure result of `login` and `register`.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The server refused the request; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Field-level validation errors from the server.
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("Server issued an unreadable token: {0}")]
    Token(#[from] TokenError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Field errors when the failure was a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AuthError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
