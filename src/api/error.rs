//! Errors returned by the backend client.

use thiserror::Error;

use super::ValidationErrors;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the submitted fields
    #[error("{}", .0.summary())]
    Validation(ValidationErrors),

    /// 401 from the backend; the token is missing, expired or revoked
    #[error("not authorised: {0}")]
    Unauthorized(String),

    /// Any other non-2xx response
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A protected call was attempted without a session token
    #[error("not logged in")]
    MissingToken,
}

impl ApiError {
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
