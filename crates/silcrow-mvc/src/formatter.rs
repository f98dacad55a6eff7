// File: src/formatter.rs
// Purpose: Output formatters that turn object payloads into response bodies

use bytes::Bytes;
use std::any::type_name;
use std::sync::Arc;

use crate::error::Result;
use crate::media_type::{ContentTypeSet, MediaType};
use crate::result::Payload;

/// What is being written, as seen by a formatter.
#[derive(Debug, Clone, Copy)]
pub struct FormatterContext<'a> {
    pub payload: &'a Payload,
    pub object_type: &'static str,
}

/// A serialized body and the exact content type to send with it.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedBody {
    pub content_type: MediaType,
    pub bytes: Bytes,
}

pub trait OutputFormatter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Media types this formatter produces, in preference order.
    fn supported_media_types(&self) -> &ContentTypeSet;

    fn can_write_type(&self, _ctx: &FormatterContext<'_>) -> bool {
        true
    }

    /// Concrete content type this formatter would write for `requested`.
    ///
    /// With no requested type the first supported type is used. A wildcard
    /// supported type such as `application/*+json` only matches when the
    /// requested type was declared by the server rather than the client.
    fn can_write_result(
        &self,
        ctx: &FormatterContext<'_>,
        requested: Option<&MediaType>,
        server_defined: bool,
    ) -> Option<MediaType> {
        if !self.can_write_type(ctx) {
            return None;
        }

        let Some(requested) = requested else {
            return self.supported_media_types().first().cloned();
        };

        for supported in self.supported_media_types() {
            if supported.has_wildcard() {
                if server_defined && requested.is_subset_of(supported) {
                    return Some(requested.clone());
                }
            } else if supported.is_subset_of(requested) {
                return Some(supported.clone());
            } else if server_defined && requested.is_subset_of(supported) {
                // e.g. a declared `application/json; charset=utf-8`
                return Some(requested.clone());
            }
        }
        None
    }

    fn write(&self, ctx: &FormatterContext<'_>, content_type: &MediaType) -> Result<FormattedBody>;
}

fn utf8(content_type: &MediaType) -> MediaType {
    if content_type.charset().is_some() {
        content_type.clone()
    } else {
        content_type.with_charset("utf-8")
    }
}

/// `application/json`, `text/json` and `application/*+json` via serde_json.
pub struct JsonOutputFormatter {
    media_types: ContentTypeSet,
}

impl JsonOutputFormatter {
    pub fn new() -> Self {
        let media_types = ["application/json", "text/json", "application/*+json"]
            .iter()
            .filter_map(|raw| MediaType::parse(raw).ok())
            .fold(ContentTypeSet::new(), |mut set, media_type| {
                set.push(media_type);
                set
            });
        Self { media_types }
    }
}

impl Default for JsonOutputFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutputFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supported_media_types(&self) -> &ContentTypeSet {
        &self.media_types
    }

    fn write(&self, ctx: &FormatterContext<'_>, content_type: &MediaType) -> Result<FormattedBody> {
        let bytes = match ctx.payload {
            Payload::Problem(problem) => serde_json::to_vec(problem)?,
            Payload::ValidationProblem(validation) => serde_json::to_vec(validation)?,
            payload => serde_json::to_vec(&payload.to_json()?)?,
        };
        Ok(FormattedBody {
            content_type: utf8(content_type),
            bytes: Bytes::from(bytes),
        })
    }
}

/// `text/plain` for string payloads only.
pub struct PlainTextOutputFormatter {
    media_types: ContentTypeSet,
}

impl PlainTextOutputFormatter {
    pub fn new() -> Self {
        let mut media_types = ContentTypeSet::new();
        if let Ok(text) = MediaType::parse("text/plain") {
            media_types.push(text);
        }
        Self { media_types }
    }
}

impl Default for PlainTextOutputFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for PlainTextOutputFormatter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supported_media_types(&self) -> &ContentTypeSet {
        &self.media_types
    }

    fn can_write_type(&self, ctx: &FormatterContext<'_>) -> bool {
        matches!(ctx.payload, Payload::Text(_)) || ctx.object_type == type_name::<String>()
    }

    fn write(&self, ctx: &FormatterContext<'_>, content_type: &MediaType) -> Result<FormattedBody> {
        let text = match ctx.payload {
            Payload::Text(text) => text.clone(),
            Payload::None => String::new(),
            other => other.to_json()?.to_string(),
        };
        Ok(FormattedBody {
            content_type: utf8(content_type),
            bytes: Bytes::from(text),
        })
    }
}

/// Ordered formatter list; earlier formatters win ties.
#[derive(Clone)]
pub struct FormatterCollection(Vec<Arc<dyn OutputFormatter>>);

impl FormatterCollection {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, formatter: Arc<dyn OutputFormatter>) {
        self.0.push(formatter);
    }

    pub fn insert(&mut self, index: usize, formatter: Arc<dyn OutputFormatter>) {
        self.0.insert(index.min(self.0.len()), formatter);
    }

    pub fn with(mut self, formatter: Arc<dyn OutputFormatter>) -> Self {
        self.push(formatter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn OutputFormatter>> {
        self.0.iter()
    }
}

impl Default for FormatterCollection {
    /// Plain text first so strings stay strings, then JSON for everything else.
    fn default() -> Self {
        Self::empty()
            .with(Arc::new(PlainTextOutputFormatter::new()))
            .with(Arc::new(JsonOutputFormatter::new()))
    }
}
