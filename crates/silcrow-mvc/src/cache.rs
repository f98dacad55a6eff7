// File: src/cache.rs
// Purpose: Declarative response cache directives emitted as Cache-Control headers

use axum::http::header::{CACHE_CONTROL, PRAGMA, VARY};
use serde::{Deserialize, Serialize};

use crate::error::{MvcError, Result};
use crate::response::HttpResponse;

/// Where a response may be cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheLocation {
    #[default]
    Any,
    Client,
    None,
}

/// Caching instructions for a handler. Enforcement belongs to caching middleware;
/// this layer only emits the headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirective {
    /// max-age in seconds
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub location: CacheLocation,
    #[serde(default)]
    pub no_store: bool,
    #[serde(default)]
    pub vary_by_header: Option<String>,
    /// Consumed by response caching middleware, never emitted as a header.
    #[serde(default)]
    pub vary_by_query_keys: Option<Vec<String>>,
}

impl CacheDirective {
    pub fn duration(seconds: u32) -> Self {
        Self {
            duration: Some(seconds),
            ..Self::default()
        }
    }

    pub fn no_store() -> Self {
        Self {
            no_store: true,
            ..Self::default()
        }
    }

    pub fn location(mut self, location: CacheLocation) -> Self {
        self.location = location;
        self
    }

    pub fn vary_by_header(mut self, header: impl Into<String>) -> Self {
        self.vary_by_header = Some(header.into());
        self
    }

    pub fn vary_by_query_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vary_by_query_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.no_store && self.duration.is_none() {
            return Err(MvcError::MissingCacheDuration);
        }
        Ok(())
    }

    /// `Cache-Control` value. With `no_store`, duration and location are ignored
    /// except that `CacheLocation::None` adds `no-cache`.
    pub fn cache_control(&self) -> Result<String> {
        if self.no_store {
            return Ok(match self.location {
                CacheLocation::None => "no-store,no-cache".to_string(),
                _ => "no-store".to_string(),
            });
        }

        let duration = self.duration.ok_or(MvcError::MissingCacheDuration)?;
        let prefix = match self.location {
            CacheLocation::Any => "public",
            CacheLocation::Client => "private",
            CacheLocation::None => "no-cache",
        };
        Ok(format!("{},max-age={}", prefix, duration))
    }

    /// Write the caching headers onto the response.
    pub fn apply(&self, response: &mut HttpResponse) -> Result<()> {
        let cache_control = self.cache_control()?;

        if let Some(vary) = &self.vary_by_header {
            response.set_header(VARY, vary)?;
        }
        response.set_header(CACHE_CONTROL, &cache_control)?;
        if self.location == CacheLocation::None {
            response.set_header(PRAGMA, "no-cache")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CacheDirective::duration(60), "public,max-age=60")]
    #[case(CacheDirective::duration(30).location(CacheLocation::Client), "private,max-age=30")]
    #[case(CacheDirective::duration(10).location(CacheLocation::None), "no-cache,max-age=10")]
    #[case(CacheDirective::no_store(), "no-store")]
    #[case(CacheDirective::no_store().location(CacheLocation::None), "no-store,no-cache")]
    fn test_cache_control_values(#[case] directive: CacheDirective, #[case] expected: &str) {
        assert_eq!(directive.cache_control().unwrap(), expected);
    }

    #[test]
    fn test_no_store_keeps_void_fields_for_inspection() {
        let mut directive = CacheDirective::no_store();
        directive.duration = Some(120);
        assert_eq!(directive.cache_control().unwrap(), "no-store");
        assert_eq!(directive.duration, Some(120));
    }

    #[test]
    fn test_missing_duration_is_an_error() {
        let directive = CacheDirective::default();
        assert!(matches!(
            directive.cache_control(),
            Err(MvcError::MissingCacheDuration)
        ));
    }

    #[test]
    fn test_apply_sets_headers() {
        let mut response = HttpResponse::new();
        CacheDirective::duration(5)
            .location(CacheLocation::None)
            .vary_by_header("Accept-Encoding")
            .vary_by_query_keys(["page"])
            .apply(&mut response)
            .unwrap();

        assert_eq!(response.header_str(CACHE_CONTROL), Some("no-cache,max-age=5"));
        assert_eq!(response.header_str(PRAGMA), Some("no-cache"));
        assert_eq!(response.header_str(VARY), Some("Accept-Encoding"));
    }
}
