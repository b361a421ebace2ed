//! Uniform response wrapper returned by every backend endpoint and the
//! typed error callers match on instead of inspecting status codes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Code the backend uses for a successful call.
pub const SUCCESS_CODE: i64 = 0;

/// Business code for a missing or expired login. The backend sends it in a
/// 200 envelope rather than as an HTTP 401.
pub const NOT_LOGIN_CODE: i64 = 40100;

const DEFAULT_FAILURE: &str = "Request failed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Envelope {
    /// Unwraps the payload, or turns a non-zero code into a business error.
    ///
    /// A missing or null `data` is decoded from JSON `null`, so `()` and
    /// `Option<_>` payloads come out without special casing.
    pub fn into_result<T: DeserializeOwned>(self) -> ApiResult<T> {
        if self.code != SUCCESS_CODE {
            let message = self
                .server_message()
                .unwrap_or_else(|| DEFAULT_FAILURE.to_string());
            return Err(ApiError::new(ApiErrorKind::Business(self.code), message));
        }
        serde_json::from_value(self.data)
            .map_err(|e| ApiError::new(ApiErrorKind::Decode, format!("Invalid response payload: {}", e)))
    }

    /// First non-blank of `message` / `description`.
    pub fn server_message(&self) -> Option<String> {
        [&self.message, &self.description]
            .into_iter()
            .flatten()
            .map(|m| m.trim())
            .find(|m| !m.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Server,
    /// Any other non-2xx status.
    Http(u16),
    /// Envelope returned with `code != 0`.
    Business(i64),
    Network,
    Timeout,
    Decode,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            500..=599 => ApiErrorKind::Server,
            other => ApiErrorKind::Http(other),
        }
    }

    /// Message shown when the server did not supply one.
    pub fn default_message(&self) -> &'static str {
        match self {
            ApiErrorKind::Unauthorized => "Unauthorized, please log in again",
            ApiErrorKind::Forbidden => "Access denied",
            ApiErrorKind::NotFound => "Requested resource does not exist",
            ApiErrorKind::Server => "Server error",
            ApiErrorKind::Network | ApiErrorKind::Timeout => "Network connection failed",
            ApiErrorKind::Http(_) | ApiErrorKind::Business(_) | ApiErrorKind::Decode => DEFAULT_FAILURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Error for an HTTP status, preferring the server-supplied message.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let kind = ApiErrorKind::from_status(status);
        let message = server_message.unwrap_or_else(|| kind.default_message().to_string());
        Self { kind, message }
    }

    /// HTTP 401 or the backend's not-login business code.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Unauthorized | ApiErrorKind::Business(NOT_LOGIN_CODE))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
