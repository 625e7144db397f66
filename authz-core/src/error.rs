//! Error taxonomy for the authorization core.
//!
//! `Unauthorized` is deliberately message-free: every token verification
//! failure looks identical to callers, while audit records keep the reason.
//! Store failures surface as `StoreUnavailable` so a flaky database is never
//! misreported as an access decision.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("type mismatch: declared context type '{declared}' does not match requested type '{requested}'")]
    TypeMismatch { declared: String, requested: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl AuthzError {
    pub fn not_found(entity: &str) -> Self {
        AuthzError::NotFound(entity.to_string())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AuthzError::InvalidInput(msg.into())
    }
}

impl From<sqlx::Error> for AuthzError {
    fn from(err: sqlx::Error) -> Self {
        AuthzError::StoreUnavailable(anyhow::Error::new(err))
    }
}

impl From<sqlx::migrate::MigrateError> for AuthzError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AuthzError::StoreUnavailable(anyhow::Error::new(err))
    }
}
