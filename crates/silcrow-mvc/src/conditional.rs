// File: src/conditional.rs
// Purpose: Entity tags, HTTP dates and conditional request evaluation

use axum::http::header::{IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, IF_UNMODIFIED_SINCE};
use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;

use crate::context::RequestContext;
use crate::error::{MvcError, Result};

/// An entity tag such as `"v1"` or `W/"v1"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    tag: String,
    weak: bool,
}

impl EntityTag {
    pub fn strong(tag: impl Into<String>) -> Result<Self> {
        Self::with_weakness(tag.into(), false)
    }

    pub fn weak(tag: impl Into<String>) -> Result<Self> {
        Self::with_weakness(tag.into(), true)
    }

    fn with_weakness(tag: String, weak: bool) -> Result<Self> {
        if tag.contains('"') || tag.chars().any(|c| c.is_control()) {
            return Err(MvcError::invalid_argument("etag", "must not contain quotes or control characters"));
        }
        Ok(Self { tag, weak })
    }

    /// Parse the quoted header form.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (weak, quoted) = match input.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        let tag = quoted.strip_prefix('"')?.strip_suffix('"')?;
        Self::with_weakness(tag.to_string(), weak).ok()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    /// Both strong and character-identical.
    pub fn strong_eq(&self, other: &EntityTag) -> bool {
        !self.weak && !other.weak && self.tag == other.tag
    }

    /// Character-identical, ignoring weakness.
    pub fn weak_eq(&self, other: &EntityTag) -> bool {
        self.tag == other.tag
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.tag)
        } else {
            write!(f, "\"{}\"", self.tag)
        }
    }
}

/// Value of `If-Match` / `If-None-Match`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntityTagCondition {
    Any,
    Tags(Vec<EntityTag>),
}

impl EntityTagCondition {
    fn parse(header: &str) -> Option<Self> {
        if header.trim() == "*" {
            return Some(Self::Any);
        }
        let tags: Vec<EntityTag> = header.split(',').filter_map(EntityTag::parse).collect();
        if tags.is_empty() {
            None
        } else {
            Some(Self::Tags(tags))
        }
    }

    fn matches(&self, etag: Option<&EntityTag>, strong: bool) -> bool {
        match (self, etag) {
            (Self::Any, _) => true,
            (Self::Tags(_), None) => false,
            (Self::Tags(tags), Some(etag)) => tags.iter().any(|candidate| {
                if strong {
                    candidate.strong_eq(etag)
                } else {
                    candidate.weak_eq(etag)
                }
            }),
        }
    }
}

pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Outcome of evaluating the conditional headers, ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreconditionState {
    Unspecified,
    ShouldProcess,
    NotModified,
    PreconditionFailed,
}

/// Validators of the representation being served.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validators<'a> {
    pub etag: Option<&'a EntityTag>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl<'a> Validators<'a> {
    /// HTTP dates carry whole seconds only.
    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified.map(|date| date.trunc_subsecs(0))
    }

    /// Evaluate `If-Match`, `If-None-Match`, `If-Modified-Since` and
    /// `If-Unmodified-Since`. The most severe individual outcome wins.
    pub fn precondition_state(&self, request: &RequestContext) -> PreconditionState {
        let now = Utc::now();
        let last_modified = self.last_modified();

        let mut if_match = PreconditionState::Unspecified;
        if let Some(condition) = request.header(IF_MATCH).and_then(EntityTagCondition::parse) {
            if_match = if condition.matches(self.etag, true) {
                PreconditionState::ShouldProcess
            } else {
                PreconditionState::PreconditionFailed
            };
        }

        let mut if_none_match = PreconditionState::Unspecified;
        let none_match = request
            .header(IF_NONE_MATCH)
            .and_then(EntityTagCondition::parse);
        if let Some(condition) = &none_match {
            if_none_match = if !condition.matches(self.etag, false) {
                PreconditionState::ShouldProcess
            } else if request.is_get_or_head() {
                PreconditionState::NotModified
            } else {
                PreconditionState::PreconditionFailed
            };
        }

        // If-Modified-Since is ignored when If-None-Match is present
        let mut if_modified_since = PreconditionState::Unspecified;
        if none_match.is_none() && request.is_get_or_head() {
            let since = request.header(IF_MODIFIED_SINCE).and_then(parse_http_date);
            if let (Some(since), Some(last_modified)) = (since, last_modified) {
                if since <= now {
                    if_modified_since = if since < last_modified {
                        PreconditionState::ShouldProcess
                    } else {
                        PreconditionState::NotModified
                    };
                }
            }
        }

        let mut if_unmodified_since = PreconditionState::Unspecified;
        let since = request.header(IF_UNMODIFIED_SINCE).and_then(parse_http_date);
        if let (Some(since), Some(last_modified)) = (since, last_modified) {
            if since <= now {
                if_unmodified_since = if since >= last_modified {
                    PreconditionState::ShouldProcess
                } else {
                    PreconditionState::PreconditionFailed
                };
            }
        }

        if_match
            .max(if_none_match)
            .max(if_modified_since)
            .max(if_unmodified_since)
    }

    /// `If-Range` holds a date or a strong entity tag; a mismatch means the
    /// full representation is sent instead of the range.
    pub fn if_range_allows(&self, request: &RequestContext) -> bool {
        let Some(if_range) = request.header(IF_RANGE) else {
            return true;
        };

        if let Some(date) = parse_http_date(if_range) {
            return match self.last_modified() {
                Some(last_modified) => last_modified <= date,
                None => true,
            };
        }

        match (EntityTag::parse(if_range), self.etag) {
            (Some(requested), Some(etag)) => requested.strong_eq(etag),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::HeaderName;
    use axum::http::Method;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn request(method: Method, headers: &[(HeaderName, &str)]) -> RequestContext {
        headers
            .iter()
            .fold(RequestContext::new(method, "/file"), |req, (name, value)| {
                req.with_header(name.clone(), value)
            })
    }

    fn modified() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_entity_tag_parsing() {
        let strong = EntityTag::parse("\"abc\"").unwrap();
        let weak = EntityTag::parse("W/\"abc\"").unwrap();
        assert!(!strong.is_weak());
        assert!(weak.is_weak());
        assert!(strong.weak_eq(&weak));
        assert!(!strong.strong_eq(&weak));
        assert_eq!(weak.to_string(), "W/\"abc\"");
        assert!(EntityTag::parse("abc").is_none());
        assert!(EntityTag::strong("a\"b").is_err());
    }

    #[test]
    fn test_http_date_round_trip_format() {
        let date = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(format_http_date(&date), "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(date));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[rstest]
    #[case(IF_MATCH, "\"v1\"", PreconditionState::ShouldProcess)]
    #[case(IF_MATCH, "\"v2\"", PreconditionState::PreconditionFailed)]
    #[case(IF_MATCH, "*", PreconditionState::ShouldProcess)]
    #[case(IF_NONE_MATCH, "\"v1\"", PreconditionState::NotModified)]
    #[case(IF_NONE_MATCH, "W/\"v1\"", PreconditionState::NotModified)]
    #[case(IF_NONE_MATCH, "\"v2\"", PreconditionState::ShouldProcess)]
    fn test_etag_preconditions(
        #[case] name: HeaderName,
        #[case] value: &str,
        #[case] expected: PreconditionState,
    ) {
        let etag = EntityTag::strong("v1").unwrap();
        let validators = Validators {
            etag: Some(&etag),
            last_modified: None,
        };
        let req = request(Method::GET, &[(name, value)]);
        assert_eq!(validators.precondition_state(&req), expected);
    }

    #[test]
    fn test_if_none_match_on_unsafe_method_fails() {
        let etag = EntityTag::strong("v1").unwrap();
        let validators = Validators {
            etag: Some(&etag),
            last_modified: None,
        };
        let req = request(Method::PUT, &[(IF_NONE_MATCH, "*")]);
        assert_eq!(
            validators.precondition_state(&req),
            PreconditionState::PreconditionFailed
        );
    }

    #[test]
    fn test_date_preconditions() {
        let validators = Validators {
            etag: None,
            last_modified: Some(modified() + Duration::milliseconds(250)),
        };
        let same = format_http_date(&modified());
        let earlier = format_http_date(&(modified() - Duration::hours(1)));

        let req = request(Method::GET, &[(IF_MODIFIED_SINCE, same.as_str())]);
        assert_eq!(validators.precondition_state(&req), PreconditionState::NotModified);

        let req = request(Method::GET, &[(IF_MODIFIED_SINCE, earlier.as_str())]);
        assert_eq!(validators.precondition_state(&req), PreconditionState::ShouldProcess);

        let req = request(Method::GET, &[(IF_UNMODIFIED_SINCE, earlier.as_str())]);
        assert_eq!(
            validators.precondition_state(&req),
            PreconditionState::PreconditionFailed
        );
    }

    #[test]
    fn test_if_modified_since_ignored_with_if_none_match() {
        let etag = EntityTag::strong("v1").unwrap();
        let validators = Validators {
            etag: Some(&etag),
            last_modified: Some(modified()),
        };
        let same = format_http_date(&modified());
        let req = request(
            Method::GET,
            &[(IF_NONE_MATCH, "\"other\""), (IF_MODIFIED_SINCE, same.as_str())],
        );
        assert_eq!(validators.precondition_state(&req), PreconditionState::ShouldProcess);
    }

    #[test]
    fn test_if_range() {
        let etag = EntityTag::strong("v1").unwrap();
        let validators = Validators {
            etag: Some(&etag),
            last_modified: Some(modified()),
        };

        assert!(validators.if_range_allows(&request(Method::GET, &[])));
        assert!(validators.if_range_allows(&request(Method::GET, &[(IF_RANGE, "\"v1\"")])));
        assert!(!validators.if_range_allows(&request(Method::GET, &[(IF_RANGE, "\"v0\"")])));
        assert!(!validators.if_range_allows(&request(Method::GET, &[(IF_RANGE, "W/\"v1\"")])));

        let earlier = format_http_date(&(modified() - Duration::days(1)));
        assert!(!validators.if_range_allows(&request(Method::GET, &[(IF_RANGE, earlier.as_str())])));
        let same = format_http_date(&modified());
        assert!(validators.if_range_allows(&request(Method::GET, &[(IF_RANGE, same.as_str())])));
    }
}
