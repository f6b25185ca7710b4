use thiserror::Error;
use tracing::{error, warn};

use crate::model::UserId;
use crate::request::BodyError;
use crate::response::{IntoResponse, Response};
use crate::status::Status;
use crate::store::StoreError;

/// Everything a user endpoint can fail with, and the status each maps to.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400
    #[error("request body is required")]
    MissingBody,
    /// 400
    #[error("invalid request payload: {0}")]
    InvalidPayload(String),
    /// 400
    #[error("invalid user id")]
    InvalidId,
    /// 404
    #[error("user {0} not found")]
    NotFound(UserId),
    /// 500
    #[error("{0}")]
    Storage(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            Self::MissingBody | Self::InvalidPayload(_) | Self::InvalidId => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Storage(_) => Status::InternalServerError,
        }
    }
}

impl From<BodyError> for ApiError {
    fn from(e: BodyError) -> Self {
        match e {
            BodyError::Missing => Self::MissingBody,
            BodyError::Malformed(e) => Self::InvalidPayload(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            Status::InternalServerError => error!("request failed: {self}"),
            _ => warn!("request rejected: {self}"),
        }
        Response::error(status, self.to_string())
    }
}
