//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

/// Why a request body could not be turned into a typed value.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("request body is required")]
    Missing,
    #[error("invalid request payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// An incoming HTTP request with its body already collected.
///
/// Each request owns its own body and parameters; nothing is shared with
/// other in-flight requests.
#[derive(Debug)]
pub struct Request {
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(body: Bytes, params: HashMap<String, String>) -> Self {
        Self { body, params }
    }

    pub fn body(&self) -> &[u8] { &self.body }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/find/{id}`, `req.param("id")` on
    /// `/users/find/abc123` returns `Some("abc123")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decodes the body as JSON into a fresh `T`.
    ///
    /// An empty body is [`BodyError::Missing`]; anything serde rejects is
    /// [`BodyError::Malformed`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        if self.body.is_empty() {
            return Err(BodyError::Missing);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}
