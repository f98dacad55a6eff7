// File: src/invoker.rs
// Purpose: Runs a handler and its metadata filters, then dispatches the result

use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::context::{ActionContext, RequestContext, Services};
use crate::error::Result;
use crate::handler::HandlerMetadata;
use crate::media_type::MediaType;
use crate::problem::ProblemOptions;
use crate::result::{ActionResult, ObjectResult, StatusCodeResult};

/// Applies handler metadata around result execution.
///
/// Order: consumes check, response cache headers, produces, client error
/// mapping, then the executor for the result's kind.
#[derive(Clone)]
pub struct ActionInvoker {
    services: Arc<Services>,
}

impl ActionInvoker {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn context(&self, request: RequestContext) -> ActionContext {
        ActionContext::new(request, self.services.clone())
    }

    /// 415 when the request body's content type is not consumed by the handler.
    pub fn check_consumes(&self, ctx: &ActionContext, metadata: &HandlerMetadata) -> Option<ActionResult> {
        let consumes = metadata.consumes.as_ref()?;
        if consumes.accepts(ctx.request.content_type()) {
            return None;
        }
        tracing::debug!(
            "Request content type '{}' is not accepted by handler '{}' (consumes {})",
            ctx.request.content_type().unwrap_or(""),
            metadata.name,
            consumes.content_types()
        );
        Some(StatusCodeResult::unsupported_media_type().into())
    }

    /// Run `handler` unless the consumes check short-circuits, then execute its result.
    pub async fn invoke<F, Fut>(
        &self,
        ctx: &mut ActionContext,
        metadata: &HandlerMetadata,
        handler: F,
    ) -> Result<()>
    where
        F: FnOnce(RequestContext) -> Fut + Send,
        Fut: Future<Output = Result<ActionResult>> + Send,
    {
        let result = match self.check_consumes(ctx, metadata) {
            Some(short_circuit) => short_circuit,
            None => handler(ctx.request.clone()).await?,
        };
        self.execute(ctx, metadata, result).await
    }

    /// Apply metadata filters to an already produced result and execute it.
    pub async fn execute(
        &self,
        ctx: &mut ActionContext,
        metadata: &HandlerMetadata,
        mut result: ActionResult,
    ) -> Result<()> {
        if let Some(directive) = metadata.cache_directive(&self.services.options)? {
            directive.apply(&mut ctx.response)?;
        }

        if let ActionResult::Object(object) = &mut result {
            if object.content_types.is_empty() && !metadata.produces.is_empty() {
                object.content_types = metadata.produces.clone();
            }
        }

        if self.services.options.map_client_errors {
            result = self.map_client_error(ctx, result)?;
        }

        tracing::info!("Executing action {}", metadata.name);
        let started = Instant::now();
        let outcome = ctx.execute_result(result).await;
        tracing::info!(
            "Executed action {} in {}ms",
            metadata.name,
            started.elapsed().as_millis()
        );
        outcome
    }

    /// Bare error statuses become problem payloads.
    fn map_client_error(&self, ctx: &ActionContext, result: ActionResult) -> Result<ActionResult> {
        let status = match &result {
            ActionResult::Status(status) if status.is_error() => status.status,
            _ => return Ok(result),
        };

        let problem = self.services.problem_details.create_problem_details(
            ctx.request.trace_id.as_deref(),
            ProblemOptions {
                status: Some(status.as_u16()),
                ..ProblemOptions::default()
            },
        );
        let mut object = ObjectResult::problem(problem).with_status(status);
        object.content_types.push(MediaType::parse("application/problem+json")?);
        Ok(object.into())
    }

    /// Host entry point: build the context, run the pipeline and convert to
    /// an Axum response.
    ///
    /// Errors become a logged 500 (499 when cancelled) and any partially
    /// written response is discarded. Once a body stream has been handed
    /// over, a read failure ends the stream with an error and the host
    /// aborts the connection instead of completing a truncated body.
    pub async fn respond<F, Fut>(
        &self,
        request: RequestContext,
        cancellation: CancellationToken,
        metadata: &HandlerMetadata,
        handler: F,
    ) -> Response
    where
        F: FnOnce(RequestContext) -> Fut + Send,
        Fut: Future<Output = Result<ActionResult>> + Send,
    {
        let mut ctx = self.context(request).with_cancellation(cancellation);
        match self.invoke(&mut ctx, metadata, handler).await {
            Ok(()) => ctx.into_response(),
            Err(err) => {
                if ctx.response.has_started() {
                    tracing::error!("Discarding partially written response: {}", err);
                }
                err.into_response()
            }
        }
    }
}

impl Default for ActionInvoker {
    fn default() -> Self {
        Self::new(Arc::new(Services::default()))
    }
}
