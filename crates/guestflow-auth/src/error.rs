//! Authentication error types.

use guestflow_core::error::GuestflowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for GuestflowError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Crypto(msg) => GuestflowError::Internal(msg),
            other => GuestflowError::Unauthenticated {
                reason: other.to_string(),
            },
        }
    }
}
