// ./crates/silcrow-mvc/src/lib.rs

pub mod auth;
pub mod cache;
pub mod conditional;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod handler;
pub mod invoker;
pub mod media_type;
pub mod negotiation;
pub mod problem;
pub mod range;
pub mod response;
pub mod result;
pub mod url;

// Re-export the core API so handlers can just `use silcrow_mvc::*`
pub use auth::{AuthenticationProperties, AuthenticationService, Claim, ClaimsPrincipal};
pub use cache::{CacheDirective, CacheLocation};
pub use conditional::EntityTag;
pub use config::{Config, MvcOptions};
pub use context::{ActionContext, RequestContext, RouteValues, Services};
pub use controller::Controller;
pub use error::{MvcError, Result};
pub use executor::{ExecutorRegistry, ResultExecutor};
pub use formatter::{FormatterCollection, JsonOutputFormatter, OutputFormatter, PlainTextOutputFormatter};
pub use handler::HandlerMetadata;
pub use invoker::ActionInvoker;
pub use media_type::{ContentTypeSet, MediaType};
pub use problem::{ModelStateDictionary, ProblemDetails, ProblemOptions, ValidationProblemDetails};
pub use result::{
    ActionResult, ChallengeResult, ContentResult, FileResult, ForbidResult, LocalRedirectResult,
    Location, ObjectResult, Payload, RedirectMode, RedirectResult, RedirectToActionResult,
    RedirectToRouteResult, ResultKind, SignInResult, SignOutResult, StatusCodeResult,
};
pub use url::{RouteTableUrlHelper, UrlHelper};

// Re-export Axum primitives they might need for convenience
pub use axum;
pub use axum::http::StatusCode;
