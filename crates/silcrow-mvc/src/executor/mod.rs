// File: src/executor/mod.rs
// Purpose: Result executors and the registry that dispatches on result kind

mod auth;
mod content;
mod file;
mod object;
mod redirect;
mod status;

pub use auth::{ChallengeResultExecutor, ForbidResultExecutor, SignInResultExecutor, SignOutResultExecutor};
pub use content::ContentResultExecutor;
pub use file::FileResultExecutor;
pub use object::ObjectResultExecutor;
pub use redirect::{
    LocalRedirectResultExecutor, RedirectResultExecutor, RedirectToActionResultExecutor,
    RedirectToRouteResultExecutor,
};
pub use status::StatusCodeResultExecutor;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::ActionContext;
use crate::error::{MvcError, Result};
use crate::result::{ActionResult, ResultKind};

/// Realizes one kind of result against the live response.
///
/// Executors hold no per-request state.
#[async_trait]
pub trait ResultExecutor: Send + Sync {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()>;
}

/// Executors keyed by the exact result kind. There is no fallback.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<ResultKind, Arc<dyn ResultExecutor>>,
}

impl ExecutorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// One executor for every built-in result kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ResultKind::Status, Arc::new(StatusCodeResultExecutor));
        registry.register(ResultKind::Object, Arc::new(ObjectResultExecutor));
        registry.register(ResultKind::Content, Arc::new(ContentResultExecutor));
        registry.register(ResultKind::Redirect, Arc::new(RedirectResultExecutor));
        registry.register(ResultKind::LocalRedirect, Arc::new(LocalRedirectResultExecutor));
        registry.register(ResultKind::RedirectToRoute, Arc::new(RedirectToRouteResultExecutor));
        registry.register(ResultKind::RedirectToAction, Arc::new(RedirectToActionResultExecutor));
        registry.register(ResultKind::File, Arc::new(FileResultExecutor));
        registry.register(ResultKind::Challenge, Arc::new(ChallengeResultExecutor));
        registry.register(ResultKind::Forbid, Arc::new(ForbidResultExecutor));
        registry.register(ResultKind::SignIn, Arc::new(SignInResultExecutor));
        registry.register(ResultKind::SignOut, Arc::new(SignOutResultExecutor));
        registry
    }

    /// Register or replace the executor for `kind`
    pub fn register(&mut self, kind: ResultKind, executor: Arc<dyn ResultExecutor>) {
        self.executors.insert(kind, executor);
    }

    pub fn get(&self, kind: ResultKind) -> Result<Arc<dyn ResultExecutor>> {
        self.executors
            .get(&kind)
            .cloned()
            .ok_or(MvcError::NoExecutor(kind))
    }

    pub async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let kind = result.kind();
        let executor = self.get(kind)?;
        tracing::info!("Executing {:?} result", kind);
        executor.execute(ctx, result).await
    }
}

/// Error for an executor handed a result of another kind.
pub(crate) fn unexpected(expected: ResultKind, result: &ActionResult) -> MvcError {
    MvcError::UnexpectedResult {
        expected,
        actual: result.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RequestContext, Services};
    use crate::result::StatusCodeResult;
    use axum::http::{Method, StatusCode};

    struct Teapot;

    #[async_trait]
    impl ResultExecutor for Teapot {
        async fn execute(&self, ctx: &mut ActionContext, _result: ActionResult) -> Result<()> {
            ctx.response.set_status(StatusCode::IM_A_TEAPOT)
        }
    }

    fn context(executors: ExecutorRegistry) -> ActionContext {
        let services = Services::default().with_executors(executors);
        ActionContext::new(RequestContext::new(Method::GET, "/"), Arc::new(services))
    }

    #[tokio::test]
    async fn test_missing_executor_is_fatal() {
        let mut ctx = context(ExecutorRegistry::empty());
        let err = ctx
            .execute_result(StatusCodeResult::ok().into())
            .await
            .unwrap_err();
        assert!(matches!(err, MvcError::NoExecutor(ResultKind::Status)));
    }

    #[tokio::test]
    async fn test_registered_executor_replaces_default() {
        let mut registry = ExecutorRegistry::with_defaults();
        registry.register(ResultKind::Status, Arc::new(Teapot));
        let mut ctx = context(registry);

        ctx.execute_result(StatusCodeResult::ok().into()).await.unwrap();
        assert_eq!(ctx.response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_mismatched_result_is_reported() {
        let mut registry = ExecutorRegistry::empty();
        registry.register(ResultKind::Object, Arc::new(StatusCodeResultExecutor));
        let mut ctx = context(registry);

        let err = ctx
            .execute_result(crate::result::ObjectResult::empty().into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MvcError::UnexpectedResult {
                expected: ResultKind::Status,
                actual: ResultKind::Object
            }
        ));
    }
}
