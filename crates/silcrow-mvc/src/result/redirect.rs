// File: src/result/redirect.rs
// Purpose: Redirect results and the permanent/preserve-method status matrix

use axum::http::StatusCode;

use crate::context::RouteValues;
use crate::error::{MvcError, Result};

/// How a redirect is issued.
///
/// | permanent | preserve_method | status |
/// |-----------|-----------------|--------|
/// | false     | false           | 302    |
/// | true      | false           | 301    |
/// | false     | true            | 307    |
/// | true      | true            | 308    |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedirectMode {
    pub permanent: bool,
    pub preserve_method: bool,
}

impl RedirectMode {
    pub const FOUND: Self = Self::new(false, false);
    pub const MOVED_PERMANENTLY: Self = Self::new(true, false);
    pub const TEMPORARY: Self = Self::new(false, true);
    pub const PERMANENT: Self = Self::new(true, true);

    pub const fn new(permanent: bool, preserve_method: bool) -> Self {
        Self {
            permanent,
            preserve_method,
        }
    }

    pub fn status(&self) -> StatusCode {
        match (self.permanent, self.preserve_method) {
            (false, false) => StatusCode::FOUND,
            (true, false) => StatusCode::MOVED_PERMANENTLY,
            (false, true) => StatusCode::TEMPORARY_REDIRECT,
            (true, true) => StatusCode::PERMANENT_REDIRECT,
        }
    }
}

fn require_url(url: String) -> Result<String> {
    if url.is_empty() {
        return Err(MvcError::invalid_argument("url", "must not be empty"));
    }
    Ok(url)
}

/// Redirect to any url. A leading `~/` resolves against the path base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectResult {
    pub url: String,
    pub mode: RedirectMode,
}

impl RedirectResult {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            url: require_url(url.into())?,
            mode: RedirectMode::FOUND,
        })
    }

    pub fn permanent(mut self, permanent: bool) -> Self {
        self.mode.permanent = permanent;
        self
    }

    pub fn preserve_method(mut self, preserve_method: bool) -> Self {
        self.mode.preserve_method = preserve_method;
        self
    }

    pub fn with_mode(mut self, mode: RedirectMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Redirect that refuses to leave the application.
///
/// Locality is checked when the result executes, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRedirectResult {
    pub url: String,
    pub mode: RedirectMode,
}

impl LocalRedirectResult {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            url: require_url(url.into())?,
            mode: RedirectMode::FOUND,
        })
    }

    pub fn permanent(mut self, permanent: bool) -> Self {
        self.mode.permanent = permanent;
        self
    }

    pub fn preserve_method(mut self, preserve_method: bool) -> Self {
        self.mode.preserve_method = preserve_method;
        self
    }

    pub fn with_mode(mut self, mode: RedirectMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Redirect to a url generated from a named route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectToRouteResult {
    pub route_name: Option<String>,
    pub route_values: RouteValues,
    pub fragment: Option<String>,
    pub mode: RedirectMode,
}

impl RedirectToRouteResult {
    pub fn new(route_name: Option<String>, route_values: RouteValues) -> Self {
        Self {
            route_name,
            route_values,
            ..Self::default()
        }
    }

    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn with_mode(mut self, mode: RedirectMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Redirect to a url generated from an action and controller.
///
/// Missing action or controller names fall back to the current request's
/// route values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectToActionResult {
    pub action: Option<String>,
    pub controller: Option<String>,
    pub route_values: RouteValues,
    pub fragment: Option<String>,
    pub mode: RedirectMode,
}

impl RedirectToActionResult {
    pub fn new(action: Option<String>, controller: Option<String>, route_values: RouteValues) -> Self {
        Self {
            action,
            controller,
            route_values,
            ..Self::default()
        }
    }

    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn with_mode(mut self, mode: RedirectMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, 302)]
    #[case(true, false, 301)]
    #[case(false, true, 307)]
    #[case(true, true, 308)]
    fn test_status_matrix(#[case] permanent: bool, #[case] preserve: bool, #[case] expected: u16) {
        assert_eq!(RedirectMode::new(permanent, preserve).status().as_u16(), expected);

        let result = RedirectResult::new("/next")
            .unwrap()
            .permanent(permanent)
            .preserve_method(preserve);
        assert_eq!(result.mode.status().as_u16(), expected);
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(matches!(
            RedirectResult::new(""),
            Err(MvcError::InvalidArgument { name: "url", .. })
        ));
        assert!(LocalRedirectResult::new("").is_err());
    }

    #[test]
    fn test_local_redirect_accepts_any_url_at_construction() {
        assert!(LocalRedirectResult::new("https://example.com").is_ok());
    }
}
