// File: src/result/object.rs
// Purpose: Negotiated object results and their formatting hook

use axum::http::header::LOCATION;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::any::{type_name, Any};

use crate::context::{ActionContext, RouteValues};
use crate::error::{MvcError, Result};
use crate::media_type::{ContentTypeSet, MediaType};
use crate::problem::{ProblemDetails, ValidationProblemDetails};

/// Value carried by an [`ObjectResult`].
///
/// Problem payloads report their own status, which `on_formatting`
/// reconciles with the result's status.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Json(JsonValue),
    Text(String),
    Problem(ProblemDetails),
    ValidationProblem(ValidationProblemDetails),
}

impl Payload {
    /// `null` (e.g. a serialized `None`) is an absent value.
    fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Payload::None,
            value => Payload::Json(value),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Payload::None)
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, Payload::Problem(_) | Payload::ValidationProblem(_))
    }

    /// Status reported by the payload itself.
    pub fn status(&self) -> Option<u16> {
        match self {
            Payload::Problem(problem) => problem.status,
            Payload::ValidationProblem(validation) => validation.problem.status,
            _ => None,
        }
    }

    fn set_status(&mut self, status: u16) {
        match self {
            Payload::Problem(problem) => problem.status = Some(status),
            Payload::ValidationProblem(validation) => validation.problem.status = Some(status),
            _ => {}
        }
    }

    pub fn to_json(&self) -> Result<JsonValue> {
        Ok(match self {
            Payload::None => JsonValue::Null,
            Payload::Json(value) => value.clone(),
            Payload::Text(text) => JsonValue::String(text.clone()),
            Payload::Problem(problem) => serde_json::to_value(problem)?,
            Payload::ValidationProblem(validation) => serde_json::to_value(validation)?,
        })
    }
}

/// Where a created/accepted resource lives. Route and action targets are
/// resolved through the URL helper when the result is formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Url(String),
    Route {
        route_name: Option<String>,
        values: RouteValues,
    },
    Action {
        action: Option<String>,
        controller: Option<String>,
        values: RouteValues,
    },
}

impl Location {
    /// Literal location; empty urls are rejected.
    pub fn url(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(MvcError::invalid_argument("location", "must not be empty"));
        }
        Ok(Location::Url(url))
    }

    fn resolve(&self, ctx: &ActionContext) -> Result<String> {
        let resolved = match self {
            Location::Url(url) => return Ok(url.clone()),
            Location::Route { route_name, values } => {
                ctx.url_helper()?
                    .route_url(&ctx.request, route_name.as_deref(), values)
            }
            Location::Action {
                action,
                controller,
                values,
            } => ctx.url_helper()?.action_url(
                &ctx.request,
                action.as_deref(),
                controller.as_deref(),
                values,
            ),
        };

        resolved
            .filter(|url| !url.is_empty())
            .ok_or(MvcError::NoRoutesMatched)
    }
}

/// A value to be serialized by a negotiated formatter.
#[derive(Debug, Clone)]
pub struct ObjectResult {
    pub value: Payload,
    value_type: &'static str,
    /// Overrides the runtime type name during formatter selection
    pub declared_type: Option<&'static str>,
    pub status: Option<StatusCode>,
    pub content_types: ContentTypeSet,
    pub location: Option<Location>,
}

impl ObjectResult {
    /// Wrap any serializable value. Strings become text payloads and problem
    /// types keep their self-reported status.
    pub fn new<T: Serialize + 'static>(value: T) -> Result<Self> {
        let any = &value as &dyn Any;
        let payload = if let Some(text) = any.downcast_ref::<String>() {
            Payload::Text(text.clone())
        } else if let Some(text) = any.downcast_ref::<&'static str>() {
            Payload::Text((*text).to_string())
        } else if let Some(problem) = any.downcast_ref::<ProblemDetails>() {
            Payload::Problem(problem.clone())
        } else if let Some(validation) = any.downcast_ref::<ValidationProblemDetails>() {
            Payload::ValidationProblem(validation.clone())
        } else if let Some(json) = any.downcast_ref::<JsonValue>() {
            Payload::from_json(json.clone())
        } else {
            Payload::from_json(serde_json::to_value(&value)?)
        };

        Ok(Self::with_payload(payload, type_name::<T>()))
    }

    pub fn empty() -> Self {
        Self::with_payload(Payload::None, "()")
    }

    pub fn json(value: JsonValue) -> Self {
        Self::with_payload(Payload::Json(value), type_name::<JsonValue>())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::with_payload(Payload::Text(value.into()), type_name::<String>())
    }

    pub fn problem(problem: ProblemDetails) -> Self {
        Self::with_payload(Payload::Problem(problem), type_name::<ProblemDetails>())
    }

    pub fn validation_problem(validation: ValidationProblemDetails) -> Self {
        Self::with_payload(
            Payload::ValidationProblem(validation),
            type_name::<ValidationProblemDetails>(),
        )
    }

    fn with_payload(value: Payload, value_type: &'static str) -> Self {
        Self {
            value,
            value_type,
            declared_type: None,
            status: None,
            content_types: ContentTypeSet::new(),
            location: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Numeric status; fails outside 100..=599.
    pub fn with_status_code(self, status: u16) -> Result<Self> {
        Ok(self.with_status(super::status_code(status)?))
    }

    pub fn declared_as<T: 'static>(mut self) -> Self {
        self.declared_type = Some(type_name::<T>());
        self
    }

    /// Append a content type to the preference list.
    pub fn content_type(mut self, content_type: &str) -> Result<Self> {
        self.content_types.push(MediaType::parse(content_type)?);
        Ok(self)
    }

    pub fn with_content_types(mut self, content_types: ContentTypeSet) -> Self {
        self.content_types = content_types;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Type name used for formatter selection: the declared type if any,
    /// otherwise the runtime type of the value.
    pub fn object_type(&self) -> &'static str {
        self.declared_type.unwrap_or(self.value_type)
    }

    /// Make the payload and result agree on one status.
    ///
    /// If only one side carries a status it is copied to the other; if both
    /// do and they differ, the payload's status wins.
    pub fn reconcile_status(&mut self) -> Result<()> {
        match (self.value.status(), self.status) {
            (Some(payload), None) => self.status = Some(super::status_code(payload)?),
            (None, Some(status)) => self.value.set_status(status.as_u16()),
            (Some(payload), Some(status)) if payload != status.as_u16() => {
                tracing::debug!(
                    "Payload status {} overrides result status {}",
                    payload,
                    status.as_u16()
                );
                self.status = Some(super::status_code(payload)?);
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs once before the body is serialized: reconciles status, applies it
    /// and resolves the `Location` header.
    pub fn on_formatting(&mut self, ctx: &mut ActionContext) -> Result<()> {
        self.reconcile_status()?;

        let location = match &self.location {
            Some(location) => Some(location.resolve(ctx)?),
            None => None,
        };

        if let Some(status) = self.status {
            ctx.response.set_status(status)?;
        }
        if let Some(location) = location {
            ctx.response.set_header(LOCATION, &location)?;
        }
        Ok(())
    }
}
