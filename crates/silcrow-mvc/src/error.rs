// File: src/error.rs
// Purpose: Error taxonomy for result construction and execution

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::result::ResultKind;

/// Errors raised while building or executing action results.
///
/// Negotiation failures are not errors: they become a `406` response.
/// Validation problems are data (`ModelStateDictionary`), never errors.
#[derive(Debug, Error)]
pub enum MvcError {
    /// A required argument was empty or otherwise unusable.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("{0} is not a valid HTTP status code")]
    InvalidStatusCode(u16),

    #[error("'{0}' is not a valid media type")]
    InvalidMediaType(String),

    /// Declared consumes/produces sets must name concrete media types.
    #[error("the content type '{0}' is not allowed here: wildcard-only media types cannot be declared")]
    WildcardContentType(String),

    #[error("no executor is registered for result kind {0:?}")]
    NoExecutor(ResultKind),

    #[error("executor for {expected:?} results was given a {actual:?} result")]
    UnexpectedResult {
        expected: ResultKind,
        actual: ResultKind,
    },

    /// URL generation produced nothing; the route or action does not exist.
    #[error("no route matches the supplied values")]
    NoRoutesMatched,

    #[error("the supplied URL '{0}' is not local")]
    NotLocalUrl(String),

    #[error("the required service `{0}` is not registered")]
    MissingService(&'static str),

    #[error("a cache duration must be set when no_store is false")]
    MissingCacheDuration,

    #[error("the '{0}' cache profile is not defined")]
    UnknownCacheProfile(String),

    #[error("request matched multiple handlers resulting in ambiguity: {}", .0.join(", "))]
    AmbiguousAction(Vec<String>),

    /// Status and headers are frozen once the body has started.
    #[error("the response has already started")]
    ResponseStarted,

    #[error("invalid value for header `{0}`")]
    InvalidHeaderValue(String),

    #[error("authentication handler failed: {0}")]
    Authentication(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("the request was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MvcError>;

impl MvcError {
    pub(crate) fn authentication(err: anyhow::Error) -> Self {
        MvcError::Authentication(err.into())
    }

    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        MvcError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Misuse and misconfiguration are fatal; only cancellation is expected traffic.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MvcError::Cancelled)
    }
}

// Fatal errors surface to the client as a generic 500 and nothing more.
impl IntoResponse for MvcError {
    fn into_response(self) -> Response {
        match self {
            MvcError::Cancelled => {
                tracing::debug!("Request cancelled before the response completed");
                // 499 is non-standard but is the conventional "client closed request" code
                StatusCode::from_u16(499)
                    .unwrap_or(StatusCode::BAD_REQUEST)
                    .into_response()
            }
            err => {
                tracing::error!("Unhandled error while executing action result: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}
