// File: src/executor/status.rs
// Purpose: Executor for status-only results

use async_trait::async_trait;

use super::{unexpected, ResultExecutor};
use crate::context::ActionContext;
use crate::error::Result;
use crate::result::{ActionResult, ResultKind};

pub struct StatusCodeResultExecutor;

#[async_trait]
impl ResultExecutor for StatusCodeResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::Status(result) => result,
            other => return Err(unexpected(ResultKind::Status, &other)),
        };

        tracing::debug!("Executing StatusCodeResult, setting HTTP status code {}", result.status.as_u16());
        ctx.response.set_status(result.status)
    }
}
