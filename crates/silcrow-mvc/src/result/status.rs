// File: src/result/status.rs
// Purpose: Results that only set a status code

use axum::http::StatusCode;

use crate::error::Result;

/// Sets the response status and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCodeResult {
    pub status: StatusCode,
}

impl StatusCodeResult {
    /// Fails with `InvalidStatusCode` outside 100..=599.
    pub fn new(status: u16) -> Result<Self> {
        Ok(Self {
            status: super::status_code(status)?,
        })
    }

    pub fn from_status(status: StatusCode) -> Self {
        Self { status }
    }

    pub fn ok() -> Self {
        Self::from_status(StatusCode::OK)
    }

    pub fn no_content() -> Self {
        Self::from_status(StatusCode::NO_CONTENT)
    }

    pub fn bad_request() -> Self {
        Self::from_status(StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized() -> Self {
        Self::from_status(StatusCode::UNAUTHORIZED)
    }

    pub fn not_found() -> Self {
        Self::from_status(StatusCode::NOT_FOUND)
    }

    pub fn conflict() -> Self {
        Self::from_status(StatusCode::CONFLICT)
    }

    pub fn not_acceptable() -> Self {
        Self::from_status(StatusCode::NOT_ACCEPTABLE)
    }

    pub fn unsupported_media_type() -> Self {
        Self::from_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    }

    pub fn unprocessable_entity() -> Self {
        Self::from_status(StatusCode::UNPROCESSABLE_ENTITY)
    }

    pub fn internal_server_error() -> Self {
        Self::from_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// True for 4xx and 5xx.
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatusCodeResult::ok(), 200)]
    #[case(StatusCodeResult::no_content(), 204)]
    #[case(StatusCodeResult::bad_request(), 400)]
    #[case(StatusCodeResult::unauthorized(), 401)]
    #[case(StatusCodeResult::not_found(), 404)]
    #[case(StatusCodeResult::conflict(), 409)]
    #[case(StatusCodeResult::not_acceptable(), 406)]
    #[case(StatusCodeResult::unsupported_media_type(), 415)]
    #[case(StatusCodeResult::unprocessable_entity(), 422)]
    #[case(StatusCodeResult::internal_server_error(), 500)]
    fn test_named_constructors(#[case] result: StatusCodeResult, #[case] expected: u16) {
        assert_eq!(result.status.as_u16(), expected);
    }

    #[test]
    fn test_invalid_status_rejected() {
        assert!(StatusCodeResult::new(42).is_err());
        assert!(StatusCodeResult::new(418).is_ok());
    }

    #[test]
    fn test_is_error() {
        assert!(StatusCodeResult::not_found().is_error());
        assert!(!StatusCodeResult::no_content().is_error());
    }
}
