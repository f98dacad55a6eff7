// File: src/media_type.rs
// Purpose: Media type parsing, matching and ordered content type sets

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::{MvcError, Result};

/// RFC 7230 token characters, plus `*` for wildcards.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9!#$%&'*+.^_`|~-]+$").expect("static regex is valid"));

/// A parsed media type such as `application/problem+json; charset=utf-8`.
///
/// Type, subtype and parameter names are stored lowercased so comparisons
/// are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    kind: String,
    subtype: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Parse a single media type. Parameters are optional.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parts = input.split(';');
        let essence = parts.next().unwrap_or("").trim();

        let (kind, subtype) = essence
            .split_once('/')
            .ok_or_else(|| MvcError::InvalidMediaType(input.to_string()))?;
        let (kind, subtype) = (kind.trim(), subtype.trim());

        if !TOKEN.is_match(kind) || !TOKEN.is_match(subtype) {
            return Err(MvcError::InvalidMediaType(input.to_string()));
        }
        // "*/json" is never meaningful
        if kind == "*" && subtype != "*" {
            return Err(MvcError::InvalidMediaType(input.to_string()));
        }

        let mut params = Vec::new();
        for raw in parts {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let (name, value) = raw
                .split_once('=')
                .ok_or_else(|| MvcError::InvalidMediaType(input.to_string()))?;
            let name = name.trim();
            let value = value.trim().trim_matches('"');
            if !TOKEN.is_match(name) {
                return Err(MvcError::InvalidMediaType(input.to_string()));
            }
            params.push((name.to_ascii_lowercase(), value.to_string()));
        }

        Ok(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Structured syntax suffix: `json` for `application/problem+json`.
    pub fn suffix(&self) -> Option<&str> {
        self.subtype.rsplit_once('+').map(|(_, suffix)| suffix)
    }

    fn subtype_without_suffix(&self) -> &str {
        self.subtype
            .rsplit_once('+')
            .map(|(base, _)| base)
            .unwrap_or(&self.subtype)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// Returns a copy with `charset` set, replacing any existing one.
    pub fn with_charset(&self, charset: &str) -> Self {
        let mut params: Vec<_> = self
            .params
            .iter()
            .filter(|(key, _)| key != "charset")
            .cloned()
            .collect();
        params.push(("charset".to_string(), charset.to_string()));
        Self {
            kind: self.kind.clone(),
            subtype: self.subtype.clone(),
            params,
        }
    }

    /// `*/*`
    pub fn matches_all_types(&self) -> bool {
        self.kind == "*" && self.subtype == "*"
    }

    /// `type/*`
    pub fn matches_all_subtypes(&self) -> bool {
        self.subtype == "*"
    }

    /// `type/*+suffix`
    fn matches_all_subtypes_with_suffix(&self) -> bool {
        self.subtype_without_suffix() == "*" && self.suffix().is_some()
    }

    pub fn has_wildcard(&self) -> bool {
        self.matches_all_subtypes() || self.matches_all_subtypes_with_suffix()
    }

    /// Exact types rank above `type/*+suffix`, which rank above `type/*`,
    /// which rank above `*/*`.
    pub fn specificity(&self) -> u8 {
        if self.matches_all_types() {
            0
        } else if self.matches_all_subtypes() {
            1
        } else if self.matches_all_subtypes_with_suffix() {
            2
        } else {
            3
        }
    }

    /// True when every value described by `self` is also described by `set`.
    ///
    /// `application/json` is a subset of `application/*` and of `*/*`;
    /// `application/problem+json` is a subset of `application/*+json`.
    /// Parameters of `set` (other than `q`) must appear in `self` with equal values.
    pub fn is_subset_of(&self, set: &MediaType) -> bool {
        self.type_is_subset(set) && self.subtype_is_subset(set) && self.params_are_subset(set)
    }

    fn type_is_subset(&self, set: &MediaType) -> bool {
        set.kind == "*" || set.kind == self.kind
    }

    fn subtype_is_subset(&self, set: &MediaType) -> bool {
        if set.subtype == "*" || set.subtype == self.subtype {
            return true;
        }
        if set.matches_all_subtypes_with_suffix() {
            return self.suffix() == set.suffix();
        }
        false
    }

    fn params_are_subset(&self, set: &MediaType) -> bool {
        set.params
            .iter()
            .filter(|(key, _)| key != "q")
            .all(|(key, value)| {
                self.param(key)
                    .map(|own| own.eq_ignore_ascii_case(value))
                    .unwrap_or(false)
            })
    }

    /// Essence without parameters, e.g. `text/plain`.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.kind, self.subtype)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)?;
        for (key, value) in &self.params {
            write!(f, "; {}={}", key, value)?;
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = MvcError;

    fn from_str(s: &str) -> Result<Self> {
        MediaType::parse(s)
    }
}

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTypeWithQuality {
    pub media_type: MediaType,
    pub quality: f32,
}

/// Parse an `Accept` header value, dropping invalid entries and entries with `q=0`.
///
/// The result is sorted by quality, then specificity, preserving header order
/// among equals.
pub fn parse_accept(header: &str) -> Vec<MediaTypeWithQuality> {
    let mut entries: Vec<MediaTypeWithQuality> = header
        .split(',')
        .filter(|raw| !raw.trim().is_empty())
        .filter_map(|raw| {
            let media_type = MediaType::parse(raw).ok()?;
            let quality = match media_type.param("q") {
                Some(q) => q.parse::<f32>().ok()?.clamp(0.0, 1.0),
                None => 1.0,
            };
            Some(MediaTypeWithQuality {
                media_type,
                quality,
            })
        })
        .filter(|entry| entry.quality > 0.0)
        .collect();

    // sort_by is stable, so header order breaks remaining ties
    entries.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.media_type.specificity().cmp(&a.media_type.specificity()))
    });
    entries
}

/// Ordered set of media types; order is preference order during negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypeSet(Vec<MediaType>);

impl ContentTypeSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a declared set (produces/consumes). Wildcard-only entries such as
    /// `*/*` or `text/*` are rejected.
    pub fn declared<I, S>(content_types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        content_types
            .into_iter()
            .map(|raw| {
                let media_type = MediaType::parse(raw.as_ref())?;
                if media_type.matches_all_types() || media_type.matches_all_subtypes() {
                    return Err(MvcError::WildcardContentType(raw.as_ref().to_string()));
                }
                Ok(media_type)
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Parse a set without the wildcard restriction.
    pub fn parse<I, S>(content_types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        content_types
            .into_iter()
            .map(|raw| MediaType::parse(raw.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn push(&mut self, media_type: MediaType) {
        self.0.push(media_type);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaType> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&MediaType> {
        self.0.first()
    }

    /// True when `media_type` is a subset of at least one entry.
    pub fn accepts(&self, media_type: &MediaType) -> bool {
        self.0.iter().any(|declared| media_type.is_subset_of(declared))
    }
}

impl<'a> IntoIterator for &'a ContentTypeSet {
    type Item = &'a MediaType;
    type IntoIter = std::slice::Iter<'a, MediaType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ContentTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", joined.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mt(s: &str) -> MediaType {
        MediaType::parse(s).unwrap()
    }

    #[test]
    fn test_parse_with_params() {
        let media_type = mt("Application/JSON; Charset=\"UTF-8\"");
        assert_eq!(media_type.kind(), "application");
        assert_eq!(media_type.subtype(), "json");
        assert_eq!(media_type.charset(), Some("UTF-8"));
        assert_eq!(media_type.to_string(), "application/json; charset=UTF-8");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MediaType::parse("json").is_err());
        assert!(MediaType::parse("text/").is_err());
        assert!(MediaType::parse("*/json").is_err());
        assert!(MediaType::parse("text/plain; charset").is_err());
    }

    #[test]
    fn test_subset_rules() {
        assert!(mt("application/json").is_subset_of(&mt("*/*")));
        assert!(mt("application/json").is_subset_of(&mt("application/*")));
        assert!(mt("application/problem+json").is_subset_of(&mt("application/*+json")));
        assert!(!mt("application/xml").is_subset_of(&mt("application/*+json")));
        assert!(!mt("text/plain").is_subset_of(&mt("application/*")));
        assert!(!mt("application/*").is_subset_of(&mt("application/json")));
    }

    #[test]
    fn test_subset_requires_set_params() {
        let utf8 = mt("text/plain; charset=utf-8");
        assert!(utf8.is_subset_of(&mt("text/plain")));
        assert!(!mt("text/plain").is_subset_of(&utf8));
        assert!(mt("text/plain; charset=UTF-8").is_subset_of(&utf8));
    }

    #[test]
    fn test_specificity_order() {
        assert!(mt("text/plain").specificity() > mt("text/*+json").specificity());
        assert!(mt("text/*+json").specificity() > mt("text/*").specificity());
        assert!(mt("text/*").specificity() > mt("*/*").specificity());
    }

    #[test]
    fn test_parse_accept_sorts_by_quality_then_specificity() {
        let accept = parse_accept("*/*;q=0.8, text/*, text/html, application/json;q=0.9, bogus");
        let order: Vec<String> = accept.iter().map(|e| e.media_type.essence()).collect();
        assert_eq!(
            order,
            vec!["text/html", "text/*", "application/json", "*/*"]
        );
    }

    #[test]
    fn test_parse_accept_drops_zero_quality() {
        let accept = parse_accept("application/xml;q=0, application/json");
        assert_eq!(accept.len(), 1);
        assert_eq!(accept[0].media_type.essence(), "application/json");
    }

    #[test]
    fn test_declared_set_rejects_wildcards() {
        assert!(matches!(
            ContentTypeSet::declared(["application/json", "*/*"]),
            Err(MvcError::WildcardContentType(_))
        ));
        assert!(ContentTypeSet::declared(["text/*"]).is_err());
        assert!(ContentTypeSet::declared(["application/*+json"]).is_ok());
    }

    #[test]
    fn test_declared_set_keeps_order_and_duplicates() {
        let set = ContentTypeSet::declared(["application/xml", "application/json", "application/xml"])
            .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.first().unwrap().essence(), "application/xml");
        assert!(set.accepts(&mt("application/json; charset=utf-8")));
    }
}
