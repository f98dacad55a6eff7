// File: src/executor/auth.rs
// Purpose: Executors that hand challenge/forbid/sign-in/sign-out to the authentication service

use async_trait::async_trait;

use super::{unexpected, ResultExecutor};
use crate::context::ActionContext;
use crate::error::{MvcError, Result};
use crate::result::{ActionResult, ResultKind};

/// `None` once when no schemes are listed, otherwise each scheme in order.
fn schemes_or_default(schemes: &[String]) -> Vec<Option<&str>> {
    if schemes.is_empty() {
        vec![None]
    } else {
        schemes.iter().map(|scheme| Some(scheme.as_str())).collect()
    }
}

pub struct ChallengeResultExecutor;

#[async_trait]
impl ResultExecutor for ChallengeResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::Challenge(result) => result,
            other => return Err(unexpected(ResultKind::Challenge, &other)),
        };

        let auth = ctx.authentication()?;
        tracing::info!(
            "Executing ChallengeResult with authentication schemes ({})",
            result.schemes.join(", ")
        );

        for scheme in schemes_or_default(&result.schemes) {
            auth.challenge(&ctx.request, &mut ctx.response, scheme, result.properties.as_ref())
                .await
                .map_err(MvcError::authentication)?;
        }
        Ok(())
    }
}

pub struct ForbidResultExecutor;

#[async_trait]
impl ResultExecutor for ForbidResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::Forbid(result) => result,
            other => return Err(unexpected(ResultKind::Forbid, &other)),
        };

        let auth = ctx.authentication()?;
        tracing::info!(
            "Executing ForbidResult with authentication schemes ({})",
            result.schemes.join(", ")
        );

        for scheme in schemes_or_default(&result.schemes) {
            auth.forbid(&ctx.request, &mut ctx.response, scheme, result.properties.as_ref())
                .await
                .map_err(MvcError::authentication)?;
        }
        Ok(())
    }
}

pub struct SignInResultExecutor;

#[async_trait]
impl ResultExecutor for SignInResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::SignIn(result) => result,
            other => return Err(unexpected(ResultKind::SignIn, &other)),
        };

        let auth = ctx.authentication()?;
        tracing::info!(
            "Executing SignInResult with authentication scheme ({}) and the following principal: {:?}",
            result.scheme.as_deref().unwrap_or("default"),
            result.principal.authentication_type
        );

        auth.sign_in(
            &ctx.request,
            &mut ctx.response,
            result.scheme.as_deref(),
            &result.principal,
            result.properties.as_ref(),
        )
        .await
        .map_err(MvcError::authentication)
    }
}

pub struct SignOutResultExecutor;

#[async_trait]
impl ResultExecutor for SignOutResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::SignOut(result) => result,
            other => return Err(unexpected(ResultKind::SignOut, &other)),
        };

        let auth = ctx.authentication()?;
        tracing::info!(
            "Executing SignOutResult with authentication schemes ({})",
            result.schemes.join(", ")
        );

        for scheme in schemes_or_default(&result.schemes) {
            auth.sign_out(&ctx.request, &mut ctx.response, scheme, result.properties.as_ref())
                .await
                .map_err(MvcError::authentication)?;
        }
        Ok(())
    }
}
