// File: src/negotiation.rs
// Purpose: Choose an output formatter and content type from Accept and declared types

use std::sync::Arc;

use crate::config::MvcOptions;
use crate::context::RequestContext;
use crate::formatter::{FormatterCollection, FormatterContext, OutputFormatter};
use crate::media_type::{parse_accept, ContentTypeSet, MediaType, MediaTypeWithQuality};

/// The formatter chosen for a response and the content type it will write.
#[derive(Clone)]
pub struct SelectedFormatter {
    pub formatter: Arc<dyn OutputFormatter>,
    pub content_type: MediaType,
}

impl std::fmt::Debug for SelectedFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFormatter")
            .field("formatter", &self.formatter.name())
            .field("content_type", &self.content_type.to_string())
            .finish()
    }
}

/// Content negotiation over the `Accept` header.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatterSelector {
    respect_browser_accept_header: bool,
    return_http_not_acceptable: bool,
}

impl OutputFormatterSelector {
    pub fn new(options: &MvcOptions) -> Self {
        Self {
            respect_browser_accept_header: options.respect_browser_accept_header,
            return_http_not_acceptable: options.return_http_not_acceptable,
        }
    }

    /// Pick a formatter. `None` means the response should be 406.
    pub fn select(
        &self,
        request: &RequestContext,
        formatters: &FormatterCollection,
        ctx: &FormatterContext<'_>,
        content_types: &ContentTypeSet,
    ) -> Option<SelectedFormatter> {
        if formatters.is_empty() {
            tracing::warn!("No output formatters are registered; content negotiation cannot succeed");
            return None;
        }

        let accepted = self.acceptable_media_types(request);
        let mut ignore_accept = false;
        let mut selected = None;

        if accepted.is_empty() {
            tracing::debug!(
                "No information found on request to perform content negotiation"
            );
            ignore_accept = true;
        } else {
            selected = if content_types.is_empty() {
                Self::select_using_accept(formatters, ctx, &accepted)
            } else {
                Self::select_using_accept_and_content_types(formatters, ctx, &accepted, content_types)
            };

            if selected.is_none() {
                tracing::debug!(
                    "Could not find an output formatter based on content negotiation. Accepted types were ({})",
                    accepted
                        .iter()
                        .map(|entry| entry.media_type.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                ignore_accept = !self.return_http_not_acceptable;
            }
        }

        if ignore_accept {
            tracing::debug!("Attempting to select an output formatter without using a content type");
            selected = if content_types.is_empty() {
                Self::select_without_content_type(formatters, ctx)
            } else {
                Self::select_using_any_content_type(formatters, ctx, content_types)
            };
        }

        match &selected {
            Some(choice) => tracing::debug!(
                "Selected output formatter '{}' and content type '{}' to write the response",
                choice.formatter.name(),
                choice.content_type
            ),
            None => tracing::warn!(
                "No output formatter was found for content types '{}' to write the response",
                content_types
            ),
        }
        selected
    }

    /// Sorted Accept entries; empty when absent or when a browser-style
    /// `*/*` is present and such headers are not respected.
    fn acceptable_media_types(&self, request: &RequestContext) -> Vec<MediaTypeWithQuality> {
        let Some(header) = request.accept() else {
            return Vec::new();
        };
        let accepted = parse_accept(header);
        if !self.respect_browser_accept_header
            && accepted.iter().any(|entry| entry.media_type.matches_all_types())
        {
            return Vec::new();
        }
        accepted
    }

    fn first_writer(
        formatters: &FormatterCollection,
        ctx: &FormatterContext<'_>,
        requested: Option<&MediaType>,
        server_defined: bool,
    ) -> Option<SelectedFormatter> {
        formatters.iter().find_map(|formatter| {
            formatter
                .can_write_result(ctx, requested, server_defined)
                .map(|content_type| SelectedFormatter {
                    formatter: formatter.clone(),
                    content_type,
                })
        })
    }

    fn select_without_content_type(
        formatters: &FormatterCollection,
        ctx: &FormatterContext<'_>,
    ) -> Option<SelectedFormatter> {
        Self::first_writer(formatters, ctx, None, false)
    }

    fn select_using_any_content_type(
        formatters: &FormatterCollection,
        ctx: &FormatterContext<'_>,
        content_types: &ContentTypeSet,
    ) -> Option<SelectedFormatter> {
        content_types
            .iter()
            .find_map(|content_type| Self::first_writer(formatters, ctx, Some(content_type), true))
    }

    fn select_using_accept(
        formatters: &FormatterCollection,
        ctx: &FormatterContext<'_>,
        accepted: &[MediaTypeWithQuality],
    ) -> Option<SelectedFormatter> {
        accepted
            .iter()
            .find_map(|entry| Self::first_writer(formatters, ctx, Some(&entry.media_type), false))
    }

    fn select_using_accept_and_content_types(
        formatters: &FormatterCollection,
        ctx: &FormatterContext<'_>,
        accepted: &[MediaTypeWithQuality],
        content_types: &ContentTypeSet,
    ) -> Option<SelectedFormatter> {
        for entry in accepted {
            for content_type in content_types {
                if content_type.is_subset_of(&entry.media_type) {
                    if let Some(selected) = Self::first_writer(formatters, ctx, Some(content_type), true) {
                        return Some(selected);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{FormattedBody, JsonOutputFormatter};
    use crate::result::Payload;
    use axum::http::header::ACCEPT;
    use axum::http::Method;
    use serde_json::json;

    fn request(accept: Option<&str>) -> RequestContext {
        let request = RequestContext::new(Method::GET, "/items");
        match accept {
            Some(accept) => request.with_header(ACCEPT, accept),
            None => request,
        }
    }

    fn options(respect_browser: bool, not_acceptable: bool) -> MvcOptions {
        MvcOptions {
            respect_browser_accept_header: respect_browser,
            return_http_not_acceptable: not_acceptable,
            ..MvcOptions::default()
        }
    }

    fn select(
        options: &MvcOptions,
        accept: Option<&str>,
        declared: &[&str],
    ) -> Option<SelectedFormatter> {
        let payload = Payload::Json(json!({"id": 1}));
        let ctx = FormatterContext {
            payload: &payload,
            object_type: "Item",
        };
        let declared = ContentTypeSet::parse(declared).unwrap();
        OutputFormatterSelector::new(options).select(
            &request(accept),
            &FormatterCollection::default(),
            &ctx,
            &declared,
        )
    }

    #[test]
    fn test_no_accept_uses_first_capable_formatter() {
        let selected = select(&MvcOptions::default(), None, &[]).unwrap();
        assert_eq!(selected.formatter.name(), "json");
        assert_eq!(selected.content_type.to_string(), "application/json");
    }

    #[test]
    fn test_accept_picks_matching_supported_type() {
        let selected = select(&MvcOptions::default(), Some("text/json"), &[]).unwrap();
        assert_eq!(selected.content_type.to_string(), "text/json");
    }

    #[test]
    fn test_browser_wildcard_ignored_by_default() {
        let selected = select(
            &MvcOptions::default(),
            Some("text/html, */*;q=0.8"),
            &["application/json"],
        )
        .unwrap();
        assert_eq!(selected.content_type.to_string(), "application/json");
    }

    #[test]
    fn test_unmatched_accept_falls_back_or_fails() {
        let fallback = select(&options(false, false), Some("application/xml"), &[]).unwrap();
        assert_eq!(fallback.content_type.to_string(), "application/json");

        assert!(select(&options(false, true), Some("application/xml"), &[]).is_none());
    }

    #[test]
    fn test_declared_problem_type_is_written_by_json() {
        let selected = select(
            &MvcOptions::default(),
            Some("application/problem+json"),
            &["application/problem+json"],
        )
        .unwrap();
        assert_eq!(selected.formatter.name(), "json");
        assert_eq!(selected.content_type.to_string(), "application/problem+json");
    }

    #[test]
    fn test_no_formatters_is_not_acceptable() {
        let payload = Payload::None;
        let ctx = FormatterContext {
            payload: &payload,
            object_type: "()",
        };
        let selected = OutputFormatterSelector::new(&MvcOptions::default()).select(
            &request(None),
            &FormatterCollection::empty(),
            &ctx,
            &ContentTypeSet::new(),
        );
        assert!(selected.is_none());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let first = select(&MvcOptions::default(), Some("application/*;q=0.5, text/json"), &[]);
        let second = select(&MvcOptions::default(), Some("application/*;q=0.5, text/json"), &[]);
        assert_eq!(
            first.map(|s| s.content_type),
            second.map(|s| s.content_type)
        );
    }

    #[test]
    fn test_custom_formatter_order_matters() {
        struct Csv(ContentTypeSet);
        impl OutputFormatter for Csv {
            fn name(&self) -> &'static str {
                "csv"
            }
            fn supported_media_types(&self) -> &ContentTypeSet {
                &self.0
            }
            fn write(
                &self,
                _ctx: &FormatterContext<'_>,
                content_type: &MediaType,
            ) -> crate::error::Result<FormattedBody> {
                Ok(FormattedBody {
                    content_type: content_type.clone(),
                    bytes: bytes::Bytes::from_static(b"id\n1\n"),
                })
            }
        }

        let mut formatters = FormatterCollection::empty();
        formatters.push(Arc::new(JsonOutputFormatter::new()));
        formatters.insert(0, Arc::new(Csv(ContentTypeSet::parse(["text/csv"]).unwrap())));

        let payload = Payload::Json(json!([1]));
        let ctx = FormatterContext {
            payload: &payload,
            object_type: "Vec<i32>",
        };
        let selected = OutputFormatterSelector::new(&MvcOptions::default())
            .select(&request(None), &formatters, &ctx, &ContentTypeSet::new())
            .unwrap();
        assert_eq!(selected.formatter.name(), "csv");
    }
}
