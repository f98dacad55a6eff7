// File: src/result/content.rs
// Purpose: Raw string content with an explicit content type

use axum::http::StatusCode;

use crate::error::Result;
use crate::media_type::MediaType;

/// Writes `content` verbatim; no negotiation takes place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentResult {
    pub content: String,
    /// Defaults to `text/plain; charset=utf-8` at execution
    pub content_type: Option<MediaType>,
    pub status: Option<StatusCode>,
}

impl ContentResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: None,
            status: None,
        }
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self {
            content_type: MediaType::parse("text/html; charset=utf-8").ok(),
            ..Self::new(content)
        }
    }

    pub fn content_type(mut self, content_type: &str) -> Result<Self> {
        self.content_type = Some(MediaType::parse(content_type)?);
        Ok(self)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_content_type() {
        let result = ContentResult::html("<p>hi</p>");
        assert_eq!(
            result.content_type.unwrap().to_string(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_invalid_content_type() {
        assert!(ContentResult::new("x").content_type("nope").is_err());
    }
}
