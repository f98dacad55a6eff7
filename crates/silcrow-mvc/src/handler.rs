// File: src/handler.rs
// Purpose: Per-handler metadata (consumes, produces, response cache) and consumes-based selection

use crate::cache::CacheDirective;
use crate::config::MvcOptions;
use crate::error::{MvcError, Result};
use crate::media_type::{ContentTypeSet, MediaType};

/// Request content types a handler accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumesConstraint {
    content_types: ContentTypeSet,
}

impl ConsumesConstraint {
    /// At least one concrete media type is required; `*/*` and `type/*` are rejected.
    pub fn new<I, S>(content_types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let content_types = ContentTypeSet::declared(content_types)?;
        if content_types.is_empty() {
            return Err(MvcError::invalid_argument(
                "content_types",
                "at least one content type is required",
            ));
        }
        Ok(Self { content_types })
    }

    pub fn content_types(&self) -> &ContentTypeSet {
        &self.content_types
    }

    /// An absent content type passes; an unparseable one never does.
    pub fn accepts(&self, request_content_type: Option<&str>) -> bool {
        let Some(raw) = request_content_type.filter(|raw| !raw.trim().is_empty()) else {
            return true;
        };
        match MediaType::parse(raw) {
            Ok(media_type) => self.content_types.accepts(&media_type),
            Err(_) => false,
        }
    }
}

/// Cache settings for a handler: inline, or a named profile from config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCache {
    Directive(CacheDirective),
    Profile(String),
}

/// Configuration attached to a handler when it is registered.
#[derive(Debug, Clone, Default)]
pub struct HandlerMetadata {
    pub name: String,
    pub consumes: Option<ConsumesConstraint>,
    pub produces: ContentTypeSet,
    pub response_cache: Option<ResponseCache>,
}

impl HandlerMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn consumes<I, S>(mut self, content_types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.consumes = Some(ConsumesConstraint::new(content_types)?);
        Ok(self)
    }

    pub fn produces<I, S>(mut self, content_types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.produces = ContentTypeSet::declared(content_types)?;
        Ok(self)
    }

    /// Fails when the directive has neither a duration nor `no_store`.
    pub fn response_cache(mut self, directive: CacheDirective) -> Result<Self> {
        directive.validate()?;
        self.response_cache = Some(ResponseCache::Directive(directive));
        Ok(self)
    }

    pub fn cache_profile(mut self, name: impl Into<String>) -> Self {
        self.response_cache = Some(ResponseCache::Profile(name.into()));
        self
    }

    /// Effective cache directive, resolving profiles against the options.
    pub fn cache_directive<'a>(&'a self, options: &'a MvcOptions) -> Result<Option<&'a CacheDirective>> {
        match &self.response_cache {
            None => Ok(None),
            Some(ResponseCache::Directive(directive)) => Ok(Some(directive)),
            Some(ResponseCache::Profile(name)) => options
                .cache_profile(name)
                .map(Some)
                .ok_or_else(|| MvcError::UnknownCacheProfile(name.clone())),
        }
    }
}

/// Choose among handlers registered for the same route by request content type.
///
/// Unconstrained handlers always pass. Without a request content type a
/// constrained handler only passes when no unconstrained one exists. More
/// than one survivor is ambiguous; none means the host should answer 415.
pub fn select_candidate<'a>(
    candidates: &'a [HandlerMetadata],
    request_content_type: Option<&str>,
) -> Result<Option<&'a HandlerMetadata>> {
    let request_content_type = request_content_type.filter(|raw| !raw.trim().is_empty());
    let has_unconstrained = candidates.iter().any(|c| c.consumes.is_none());

    let survivors: Vec<&HandlerMetadata> = candidates
        .iter()
        .filter(|candidate| match (&candidate.consumes, request_content_type) {
            (None, _) => true,
            (Some(_), None) => !has_unconstrained,
            (Some(consumes), Some(content_type)) => consumes.accepts(Some(content_type)),
        })
        .collect();

    match survivors.as_slice() {
        [] => Ok(None),
        [single] => Ok(Some(*single)),
        many => Err(MvcError::AmbiguousAction(
            many.iter().map(|candidate| candidate.name.clone()).collect(),
        )),
    }
}
