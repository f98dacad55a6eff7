// File: src/controller.rs
// Purpose: Convenience factories for building action results inside handlers

use axum::http::StatusCode;
use bytes::Bytes;
use serde::Serialize;
use std::path::PathBuf;

use crate::auth::{AuthenticationProperties, ClaimsPrincipal};
use crate::context::{RequestContext, RouteValues, Services};
use crate::error::{MvcError, Result};
use crate::problem::{ModelStateDictionary, ProblemDetailsFactory, ProblemOptions};
use crate::result::{
    ChallengeResult, ContentResult, FileResult, ForbidResult, LocalRedirectResult, Location,
    ObjectResult, RedirectMode, RedirectResult, RedirectToActionResult, RedirectToRouteResult,
    SignInResult, SignOutResult, StatusCodeResult,
};

// ============================================================================
// Status results
// ============================================================================

pub fn ok() -> StatusCodeResult {
    StatusCodeResult::ok()
}

pub fn no_content() -> StatusCodeResult {
    StatusCodeResult::no_content()
}

pub fn bad_request() -> StatusCodeResult {
    StatusCodeResult::bad_request()
}

pub fn unauthorized() -> StatusCodeResult {
    StatusCodeResult::unauthorized()
}

pub fn not_found() -> StatusCodeResult {
    StatusCodeResult::not_found()
}

pub fn conflict() -> StatusCodeResult {
    StatusCodeResult::conflict()
}

pub fn unprocessable_entity() -> StatusCodeResult {
    StatusCodeResult::unprocessable_entity()
}

pub fn status_code(status: u16) -> Result<StatusCodeResult> {
    StatusCodeResult::new(status)
}

// ============================================================================
// Object results
// ============================================================================

fn object_with<T: Serialize + 'static>(status: StatusCode, value: T) -> Result<ObjectResult> {
    Ok(ObjectResult::new(value)?.with_status(status))
}

pub fn ok_with<T: Serialize + 'static>(value: T) -> Result<ObjectResult> {
    object_with(StatusCode::OK, value)
}

pub fn status_code_with<T: Serialize + 'static>(status: u16, value: T) -> Result<ObjectResult> {
    ObjectResult::new(value)?.with_status_code(status)
}

pub fn bad_request_with<T: Serialize + 'static>(value: T) -> Result<ObjectResult> {
    object_with(StatusCode::BAD_REQUEST, value)
}

pub fn unauthorized_with<T: Serialize + 'static>(value: T) -> Result<ObjectResult> {
    object_with(StatusCode::UNAUTHORIZED, value)
}

pub fn not_found_with<T: Serialize + 'static>(value: T) -> Result<ObjectResult> {
    object_with(StatusCode::NOT_FOUND, value)
}

pub fn conflict_with<T: Serialize + 'static>(value: T) -> Result<ObjectResult> {
    object_with(StatusCode::CONFLICT, value)
}

pub fn unprocessable_entity_with<T: Serialize + 'static>(value: T) -> Result<ObjectResult> {
    object_with(StatusCode::UNPROCESSABLE_ENTITY, value)
}

/// 400 with the model state's field errors as the body.
pub fn bad_request_model_state(model_state: Option<&ModelStateDictionary>) -> Result<ObjectResult> {
    let model_state = model_state.ok_or_else(|| MvcError::invalid_argument("model_state", "is required"))?;
    object_with(StatusCode::BAD_REQUEST, model_state.errors().clone())
}

/// 422 with the model state's field errors as the body.
pub fn unprocessable_entity_model_state(
    model_state: Option<&ModelStateDictionary>,
) -> Result<ObjectResult> {
    let model_state = model_state.ok_or_else(|| MvcError::invalid_argument("model_state", "is required"))?;
    object_with(StatusCode::UNPROCESSABLE_ENTITY, model_state.errors().clone())
}

/// Raw string body; `content_type` defaults to `text/plain; charset=utf-8`.
pub fn content(body: impl Into<String>, content_type: Option<&str>) -> Result<ContentResult> {
    let result = ContentResult::new(body);
    match content_type {
        Some(content_type) => result.content_type(content_type),
        None => Ok(result),
    }
}

// ============================================================================
// Created / Accepted
// ============================================================================

pub fn created<T: Serialize + 'static>(uri: impl Into<String>, value: T) -> Result<ObjectResult> {
    Ok(object_with(StatusCode::CREATED, value)?.with_location(Location::url(uri)?))
}

pub fn created_at_route<T: Serialize + 'static>(
    route_name: Option<&str>,
    route_values: RouteValues,
    value: T,
) -> Result<ObjectResult> {
    Ok(object_with(StatusCode::CREATED, value)?.with_location(Location::Route {
        route_name: route_name.map(str::to_string),
        values: route_values,
    }))
}

pub fn created_at_action<T: Serialize + 'static>(
    action: Option<&str>,
    controller: Option<&str>,
    route_values: RouteValues,
    value: T,
) -> Result<ObjectResult> {
    Ok(object_with(StatusCode::CREATED, value)?.with_location(Location::Action {
        action: action.map(str::to_string),
        controller: controller.map(str::to_string),
        values: route_values,
    }))
}

/// 202; the location is optional.
pub fn accepted<T: Serialize + 'static>(uri: Option<&str>, value: T) -> Result<ObjectResult> {
    let result = object_with(StatusCode::ACCEPTED, value)?;
    Ok(match uri {
        Some(uri) => result.with_location(Location::url(uri)?),
        None => result,
    })
}

pub fn accepted_at_route<T: Serialize + 'static>(
    route_name: Option<&str>,
    route_values: RouteValues,
    value: T,
) -> Result<ObjectResult> {
    Ok(object_with(StatusCode::ACCEPTED, value)?.with_location(Location::Route {
        route_name: route_name.map(str::to_string),
        values: route_values,
    }))
}

pub fn accepted_at_action<T: Serialize + 'static>(
    action: Option<&str>,
    controller: Option<&str>,
    route_values: RouteValues,
    value: T,
) -> Result<ObjectResult> {
    Ok(object_with(StatusCode::ACCEPTED, value)?.with_location(Location::Action {
        action: action.map(str::to_string),
        controller: controller.map(str::to_string),
        values: route_values,
    }))
}

// ============================================================================
// Redirects
// ============================================================================

pub fn redirect(url: impl Into<String>, mode: RedirectMode) -> Result<RedirectResult> {
    Ok(RedirectResult::new(url)?.with_mode(mode))
}

pub fn local_redirect(url: impl Into<String>, mode: RedirectMode) -> Result<LocalRedirectResult> {
    Ok(LocalRedirectResult::new(url)?.with_mode(mode))
}

pub fn redirect_to_route(
    route_name: Option<&str>,
    route_values: RouteValues,
    mode: RedirectMode,
) -> RedirectToRouteResult {
    RedirectToRouteResult::new(route_name.map(str::to_string), route_values).with_mode(mode)
}

pub fn redirect_to_action(
    action: Option<&str>,
    controller: Option<&str>,
    route_values: RouteValues,
    mode: RedirectMode,
) -> RedirectToActionResult {
    RedirectToActionResult::new(
        action.map(str::to_string),
        controller.map(str::to_string),
        route_values,
    )
    .with_mode(mode)
}

// ============================================================================
// Files
// ============================================================================

pub fn file(
    contents: impl Into<Bytes>,
    content_type: &str,
    download_name: Option<&str>,
) -> Result<FileResult> {
    let result = FileResult::bytes(contents, content_type)?;
    Ok(match download_name {
        Some(name) => result.download_name(name),
        None => result,
    })
}

pub fn physical_file(
    path: impl Into<PathBuf>,
    content_type: Option<&str>,
    download_name: Option<&str>,
) -> Result<FileResult> {
    let result = FileResult::physical(path, content_type)?;
    Ok(match download_name {
        Some(name) => result.download_name(name),
        None => result,
    })
}

// ============================================================================
// Authentication
// ============================================================================

pub fn challenge<I, S>(schemes: I, properties: Option<AuthenticationProperties>) -> ChallengeResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ChallengeResult {
        properties,
        ..ChallengeResult::new(schemes)
    }
}

pub fn forbid<I, S>(schemes: I, properties: Option<AuthenticationProperties>) -> ForbidResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ForbidResult {
        properties,
        ..ForbidResult::new(schemes)
    }
}

pub fn sign_in(
    principal: ClaimsPrincipal,
    scheme: Option<&str>,
    properties: Option<AuthenticationProperties>,
) -> SignInResult {
    SignInResult {
        scheme: scheme.map(str::to_string),
        principal,
        properties,
    }
}

pub fn sign_out<I, S>(schemes: I, properties: Option<AuthenticationProperties>) -> SignOutResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SignOutResult {
        properties,
        ..SignOutResult::new(schemes)
    }
}

// ============================================================================
// Problems
// ============================================================================

/// Per-request helper for results that need the request or the options.
pub struct Controller {
    trace_id: Option<String>,
    factory: ProblemDetailsFactory,
    pub model_state: ModelStateDictionary,
}

impl Controller {
    pub fn new(request: &RequestContext, services: &Services) -> Self {
        Self {
            trace_id: request.trace_id.clone(),
            factory: services.problem_details.clone(),
            model_state: ModelStateDictionary::new(),
        }
    }

    /// Problem payload; status defaults to 500.
    pub fn problem(&self, options: ProblemOptions) -> ObjectResult {
        let problem = self
            .factory
            .create_problem_details(self.trace_id.as_deref(), options);
        ObjectResult::problem(problem)
    }

    /// Validation problem over this controller's model state; status defaults to 400.
    pub fn validation_problem(&self, options: ProblemOptions) -> ObjectResult {
        self.validation_problem_for(&self.model_state, options)
    }

    /// Validation problem over an explicit model state, which must be present.
    pub fn validation_problem_with(
        &self,
        model_state: Option<&ModelStateDictionary>,
        options: ProblemOptions,
    ) -> Result<ObjectResult> {
        let model_state = model_state.ok_or_else(|| MvcError::invalid_argument("model_state", "is required"))?;
        Ok(self.validation_problem_for(model_state, options))
    }

    fn validation_problem_for(
        &self,
        model_state: &ModelStateDictionary,
        options: ProblemOptions,
    ) -> ObjectResult {
        let validation = self.factory.create_validation_problem_details(
            self.trace_id.as_deref(),
            model_state,
            options,
        );
        ObjectResult::validation_problem(validation)
    }
}
