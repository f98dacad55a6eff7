// File: src/executor/object.rs
// Purpose: Executor for negotiated object results

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;

use super::{unexpected, ResultExecutor};
use crate::context::ActionContext;
use crate::error::Result;
use crate::formatter::FormatterContext;
use crate::media_type::MediaType;
use crate::negotiation::OutputFormatterSelector;
use crate::result::{ActionResult, ObjectResult, ResultKind};

const PROBLEM_JSON: &str = "application/problem+json";

pub struct ObjectResultExecutor;

impl ObjectResultExecutor {
    /// With no declared content types, an explicit response Content-Type is
    /// honoured, and problem payloads default to `application/problem+json`.
    fn infer_content_types(ctx: &ActionContext, result: &mut ObjectResult) -> Result<()> {
        if !result.content_types.is_empty() {
            return Ok(());
        }

        if let Some(existing) = ctx.response.content_type() {
            if let Ok(media_type) = MediaType::parse(existing) {
                tracing::debug!(
                    "Skipped content negotiation as content type '{}' is explicitly set for the response",
                    existing
                );
                result.content_types.push(media_type);
                return Ok(());
            }
        }

        if result.value.is_problem() {
            result.content_types.push(MediaType::parse(PROBLEM_JSON)?);
        }
        Ok(())
    }

    /// Empty values become 204 unless a non-200 status was asked for.
    fn write_no_content(ctx: &mut ActionContext, mut result: ObjectResult) -> Result<()> {
        result.on_formatting(ctx)?;
        if ctx.response.status() == StatusCode::OK {
            ctx.response.set_status(StatusCode::NO_CONTENT)?;
        }
        ctx.response.set_content_length(0)
    }
}

#[async_trait]
impl ResultExecutor for ObjectResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let mut result = match result {
            ActionResult::Object(result) => result,
            other => return Err(unexpected(ResultKind::Object, &other)),
        };

        tracing::info!(
            "Executing ObjectResult, writing value of type '{}'",
            result.object_type()
        );

        Self::infer_content_types(ctx, &mut result)?;

        let services = ctx.services.clone();
        if result.value.is_none() && services.options.treat_null_value_as_no_content {
            return Self::write_no_content(ctx, result);
        }

        let selected = {
            let formatter_ctx = FormatterContext {
                payload: &result.value,
                object_type: result.object_type(),
            };
            OutputFormatterSelector::new(&services.options).select(
                &ctx.request,
                &services.formatters,
                &formatter_ctx,
                &result.content_types,
            )
        };

        let Some(selected) = selected else {
            return ctx.response.set_status(StatusCode::NOT_ACCEPTABLE);
        };

        result.on_formatting(ctx)?;

        let formatter_ctx = FormatterContext {
            payload: &result.value,
            object_type: result.object_type(),
        };
        let body = selected.formatter.write(&formatter_ctx, &selected.content_type)?;

        ctx.response
            .set_header(CONTENT_TYPE, &body.content_type.to_string())?;
        ctx.response.set_content_length(body.bytes.len() as u64)?;

        ctx.ensure_not_cancelled()?;
        if !ctx.request.is_head() {
            ctx.response.write_body(&body.bytes);
        }
        Ok(())
    }
}
