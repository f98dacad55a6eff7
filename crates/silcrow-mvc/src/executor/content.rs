// File: src/executor/content.rs
// Purpose: Executor for raw string content

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;

use super::{unexpected, ResultExecutor};
use crate::context::ActionContext;
use crate::error::Result;
use crate::result::{ActionResult, ResultKind};

const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

pub struct ContentResultExecutor;

#[async_trait]
impl ResultExecutor for ContentResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::Content(result) => result,
            other => return Err(unexpected(ResultKind::Content, &other)),
        };

        let content_type = match &result.content_type {
            Some(content_type) => content_type.to_string(),
            None => match ctx.response.content_type() {
                Some(existing) => existing.to_string(),
                None => DEFAULT_CONTENT_TYPE.to_string(),
            },
        };

        tracing::info!("Executing ContentResult with HTTP Response ContentType of {}", content_type);

        if let Some(status) = result.status {
            ctx.response.set_status(status)?;
        }
        ctx.response.set_header(CONTENT_TYPE, &content_type)?;
        ctx.response.set_content_length(result.content.len() as u64)?;

        ctx.ensure_not_cancelled()?;
        if !ctx.request.is_head() {
            ctx.response.write_body(result.content.as_bytes());
        }
        Ok(())
    }
}
