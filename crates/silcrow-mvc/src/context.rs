// File: src/context.rs
// Purpose: Per-request context handed to executors: request view, response, services

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::auth::AuthenticationService;
use crate::config::MvcOptions;
use crate::error::{MvcError, Result};
use crate::executor::ExecutorRegistry;
use crate::formatter::FormatterCollection;
use crate::problem::ProblemDetailsFactory;
use crate::response::HttpResponse;
use crate::result::ActionResult;
use crate::url::UrlHelper;

/// Route values such as `{"controller": "items", "action": "show", "id": "7"}`.
pub type RouteValues = BTreeMap<String, String>;

/// Read-only view of the incoming request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: Method,

    /// Request path, without the path base
    pub path: String,

    /// Mount point of the application ("" when mounted at the root)
    pub path_base: String,

    /// Request headers
    pub headers: HeaderMap,

    /// Identifier added to problem payloads
    pub trace_id: Option<String>,

    /// Values matched by the router for this request
    pub route_values: RouteValues,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_base: String::new(),
            headers: HeaderMap::new(),
            trace_id: None,
            route_values: RouteValues::new(),
        }
    }

    /// Build from the parts of an Axum request
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            path_base: String::new(),
            headers: parts.headers.clone(),
            trace_id: None,
            route_values: RouteValues::new(),
        }
    }

    /// Add a header; invalid values are ignored
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_path_base(mut self, path_base: impl Into<String>) -> Self {
        self.path_base = path_base.into();
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(key.into(), value.into());
        self
    }

    /// Get a header value
    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn accept(&self) -> Option<&str> {
        self.header(ACCEPT)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE).filter(|value| !value.trim().is_empty())
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    pub fn is_get_or_head(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}

/// Collaborators shared by every request.
pub struct Services {
    pub options: Arc<MvcOptions>,
    pub executors: ExecutorRegistry,
    pub formatters: FormatterCollection,
    pub problem_details: ProblemDetailsFactory,
    pub url_helper: Option<Arc<dyn UrlHelper>>,
    pub authentication: Option<Arc<dyn AuthenticationService>>,
}

impl Services {
    /// Default executors and formatters for the given options
    pub fn new(options: MvcOptions) -> Self {
        let problem_details = ProblemDetailsFactory::new(options.client_error_mapping.clone());
        Self {
            options: Arc::new(options),
            executors: ExecutorRegistry::with_defaults(),
            formatters: FormatterCollection::default(),
            problem_details,
            url_helper: None,
            authentication: None,
        }
    }

    pub fn with_url_helper(mut self, url_helper: Arc<dyn UrlHelper>) -> Self {
        self.url_helper = Some(url_helper);
        self
    }

    pub fn with_authentication(mut self, authentication: Arc<dyn AuthenticationService>) -> Self {
        self.authentication = Some(authentication);
        self
    }

    pub fn with_formatters(mut self, formatters: FormatterCollection) -> Self {
        self.formatters = formatters;
        self
    }

    pub fn with_executors(mut self, executors: ExecutorRegistry) -> Self {
        self.executors = executors;
        self
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(MvcOptions::default())
    }
}

/// Everything one result execution needs.
pub struct ActionContext {
    pub request: RequestContext,
    pub response: HttpResponse,
    pub services: Arc<Services>,
    /// Cancelled when the client goes away
    pub cancellation: CancellationToken,
}

impl ActionContext {
    pub fn new(request: RequestContext, services: Arc<Services>) -> Self {
        Self {
            request,
            response: HttpResponse::new(),
            services,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn options(&self) -> &MvcOptions {
        &self.services.options
    }

    pub fn url_helper(&self) -> Result<Arc<dyn UrlHelper>> {
        self.services
            .url_helper
            .clone()
            .ok_or(MvcError::MissingService("url_helper"))
    }

    pub fn authentication(&self) -> Result<Arc<dyn AuthenticationService>> {
        self.services
            .authentication
            .clone()
            .ok_or(MvcError::MissingService("authentication"))
    }

    /// Fail fast when the request has been cancelled
    pub fn ensure_not_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(MvcError::Cancelled);
        }
        Ok(())
    }

    /// Run the executor registered for this result's kind
    pub async fn execute_result(&mut self, result: ActionResult) -> Result<()> {
        let services = self.services.clone();
        services.executors.execute(self, result).await
    }

    pub fn into_response(self) -> Response {
        self.response.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_headers() {
        let request = RequestContext::new(Method::POST, "/items")
            .with_header(ACCEPT, "application/json")
            .with_header(CONTENT_TYPE, "  ");

        assert_eq!(request.accept(), Some("application/json"));
        assert_eq!(request.content_type(), None);
        assert!(!request.is_get_or_head());
    }

    #[test]
    fn test_from_parts() {
        let (parts, _) = axum::http::Request::builder()
            .method(Method::HEAD)
            .uri("/files/report.pdf?download=1")
            .header(ACCEPT, "*/*")
            .body(())
            .unwrap()
            .into_parts();

        let request = RequestContext::from_parts(&parts);
        assert_eq!(request.path, "/files/report.pdf");
        assert!(request.is_head());
        assert_eq!(request.accept(), Some("*/*"));
    }

    #[test]
    fn test_missing_collaborators_are_reported() {
        let ctx = ActionContext::new(
            RequestContext::new(Method::GET, "/"),
            Arc::new(Services::default()),
        );
        assert!(matches!(
            ctx.url_helper(),
            Err(MvcError::MissingService("url_helper"))
        ));
        assert!(matches!(
            ctx.authentication(),
            Err(MvcError::MissingService("authentication"))
        ));
    }

    #[test]
    fn test_cancellation_token() {
        let ctx = ActionContext::new(
            RequestContext::new(Method::GET, "/"),
            Arc::new(Services::default()),
        );
        assert!(ctx.ensure_not_cancelled().is_ok());
        ctx.cancellation.cancel();
        assert!(matches!(ctx.ensure_not_cancelled(), Err(MvcError::Cancelled)));
    }
}
