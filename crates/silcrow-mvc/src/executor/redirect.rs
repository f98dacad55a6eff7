// File: src/executor/redirect.rs
// Purpose: Executors for the four redirect result kinds

use async_trait::async_trait;
use axum::http::header::LOCATION;

use super::{unexpected, ResultExecutor};
use crate::context::ActionContext;
use crate::error::{MvcError, Result};
use crate::result::{ActionResult, RedirectMode, ResultKind};
use crate::url;

fn redirect(ctx: &mut ActionContext, destination: &str, mode: RedirectMode) -> Result<()> {
    ctx.response.set_status(mode.status())?;
    ctx.response.set_header(LOCATION, destination)
}

fn with_fragment(url: String, fragment: Option<&str>) -> String {
    match fragment.filter(|fragment| !fragment.is_empty()) {
        Some(fragment) => format!("{}#{}", url, fragment),
        None => url,
    }
}

fn is_local(ctx: &ActionContext, target: &str) -> bool {
    match &ctx.services.url_helper {
        Some(helper) => helper.is_local_url(target),
        None => url::is_local_url(target),
    }
}

fn content(ctx: &ActionContext, target: &str) -> String {
    match &ctx.services.url_helper {
        Some(helper) => helper.content(&ctx.request, target),
        None => url::content_url(&ctx.request, target),
    }
}

pub struct RedirectResultExecutor;

#[async_trait]
impl ResultExecutor for RedirectResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::Redirect(result) => result,
            other => return Err(unexpected(ResultKind::Redirect, &other)),
        };

        let destination = if is_local(ctx, &result.url) {
            content(ctx, &result.url)
        } else {
            result.url.clone()
        };

        tracing::info!("Executing RedirectResult, redirecting to {}", destination);
        redirect(ctx, &destination, result.mode)
    }
}

pub struct LocalRedirectResultExecutor;

#[async_trait]
impl ResultExecutor for LocalRedirectResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::LocalRedirect(result) => result,
            other => return Err(unexpected(ResultKind::LocalRedirect, &other)),
        };

        if !is_local(ctx, &result.url) {
            return Err(MvcError::NotLocalUrl(result.url));
        }

        let destination = content(ctx, &result.url);
        tracing::info!("Executing LocalRedirectResult, redirecting to {}", destination);
        redirect(ctx, &destination, result.mode)
    }
}

pub struct RedirectToRouteResultExecutor;

#[async_trait]
impl ResultExecutor for RedirectToRouteResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::RedirectToRoute(result) => result,
            other => return Err(unexpected(ResultKind::RedirectToRoute, &other)),
        };

        let destination = ctx
            .url_helper()?
            .route_url(&ctx.request, result.route_name.as_deref(), &result.route_values)
            .filter(|url| !url.is_empty())
            .ok_or(MvcError::NoRoutesMatched)?;
        let destination = with_fragment(destination, result.fragment.as_deref());

        tracing::info!(
            "Executing RedirectToRouteResult, redirecting to {} from route {}",
            destination,
            result.route_name.as_deref().unwrap_or("(default)")
        );
        redirect(ctx, &destination, result.mode)
    }
}

pub struct RedirectToActionResultExecutor;

#[async_trait]
impl ResultExecutor for RedirectToActionResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let result = match result {
            ActionResult::RedirectToAction(result) => result,
            other => return Err(unexpected(ResultKind::RedirectToAction, &other)),
        };

        let destination = ctx
            .url_helper()?
            .action_url(
                &ctx.request,
                result.action.as_deref(),
                result.controller.as_deref(),
                &result.route_values,
            )
            .filter(|url| !url.is_empty())
            .ok_or(MvcError::NoRoutesMatched)?;
        let destination = with_fragment(destination, result.fragment.as_deref());

        tracing::info!("Executing RedirectToActionResult, redirecting to {}", destination);
        redirect(ctx, &destination, result.mode)
    }
}
