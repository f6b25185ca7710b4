//! Startup and infrastructure errors.

use thiserror::Error;

use crate::store::StoreError;

/// The error type returned by userbase's fallible startup operations.
///
/// Request-level failures never become an `Error`: they are answered in-band
/// as HTTP responses (see [`ApiError`](crate::api::ApiError)). This type
/// covers what stops the process from serving at all: reading settings,
/// reaching storage, binding the port.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config: {0}")]
    Config(#[from] config::ConfigError),
    #[error("storage: {0}")]
    Store(#[from] StoreError),
    #[error("invalid listen address `{0}`")]
    InvalidAddr(String),
}
