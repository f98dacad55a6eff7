// File: src/handlers.rs
// Purpose: Demo route handlers returning action results through the invoker

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use maud::{html, DOCTYPE};
use serde::{Deserialize, Serialize};
use silcrow_mvc::{
    controller, ActionInvoker, ActionResult, AuthenticationProperties, CacheDirective,
    CacheLocation, ClaimsPrincipal, ContentResult, Controller, EntityTag, FileResult,
    HandlerMetadata, ProblemOptions, RedirectMode, RequestContext, Result, RouteValues, Services,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub price_cents: u64,
}

/// Body accepted by `POST /items`. Fields are optional so missing ones
/// surface as validation problems rather than parse failures.
#[derive(Debug, Deserialize)]
struct NewItem {
    name: Option<String>,
    price_cents: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    name: Option<String>,
    #[serde(default)]
    remember: bool,
}

struct Handlers {
    index: HandlerMetadata,
    list_items: HandlerMetadata,
    show_item: HandlerMetadata,
    create_item: HandlerMetadata,
    old_items: HandlerMetadata,
    report: HandlerMetadata,
    account: HandlerMetadata,
    login: HandlerMetadata,
    logout: HandlerMetadata,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    invoker: ActionInvoker,
    items: Arc<RwLock<BTreeMap<u32, Item>>>,
    handlers: Arc<Handlers>,
}

impl AppState {
    pub fn new(invoker: ActionInvoker) -> Result<Self> {
        let handlers = Handlers {
            index: HandlerMetadata::new("home.index"),
            list_items: HandlerMetadata::new("items.index")
                .response_cache(CacheDirective::duration(30).location(CacheLocation::Any))?,
            show_item: HandlerMetadata::new("items.show"),
            create_item: HandlerMetadata::new("items.create")
                .consumes(["application/json"])?
                .produces(["application/json"])?,
            old_items: HandlerMetadata::new("items.legacy"),
            report: HandlerMetadata::new("files.report"),
            account: HandlerMetadata::new("account.index").cache_profile("no-store"),
            login: HandlerMetadata::new("account.login").consumes(["application/json"])?,
            logout: HandlerMetadata::new("account.logout"),
        };

        let items = [(1, "Notebook", 450), (2, "Fountain pen", 2_900)]
            .into_iter()
            .map(|(id, name, price_cents)| {
                (
                    id,
                    Item {
                        id,
                        name: name.to_string(),
                        price_cents,
                    },
                )
            })
            .collect();

        Ok(Self {
            invoker,
            items: Arc::new(RwLock::new(items)),
            handlers: Arc::new(handlers),
        })
    }

    async fn respond<F, Fut>(
        &self,
        request: RequestContext,
        metadata: &HandlerMetadata,
        handler: F,
    ) -> Response
    where
        F: FnOnce(RequestContext) -> Fut + Send,
        Fut: Future<Output = Result<ActionResult>> + Send,
    {
        let cancellation = CancellationToken::new();
        cancel_on_drop(
            cancellation.clone(),
            self.invoker.respond(request, cancellation, metadata, handler),
        )
        .await
    }
}

/// Axum drops the handler future when the client disconnects; the token is
/// cancelled then, and left alone once `fut` completes.
async fn cancel_on_drop<Fut: Future>(cancellation: CancellationToken, fut: Fut) -> Fut::Output {
    let guard = cancellation.drop_guard();
    let output = fut.await;
    guard.disarm();
    output
}

/// Request view with a fresh trace id and the route values of the handler.
fn request_context(parts: &Parts, controller: &str, action: &str) -> RequestContext {
    RequestContext::from_parts(parts)
        .with_trace_id(Uuid::new_v4().to_string())
        .with_route_value("controller", controller)
        .with_route_value("action", action)
}

// ============================================================================
// Routes
// ============================================================================

pub async fn index(State(state): State<AppState>, parts: Parts) -> Response {
    let request = request_context(&parts, "home", "index");
    state
        .respond(request, &state.handlers.index, |_| home_page())
        .await
}

pub async fn list_items(State(state): State<AppState>, parts: Parts) -> Response {
    let request = request_context(&parts, "items", "index");
    let items = state.items.clone();
    state
        .respond(request, &state.handlers.list_items, |_| all_items(items))
        .await
}

pub async fn show_item(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    parts: Parts,
) -> Response {
    let request = request_context(&parts, "items", "show");
    let items = state.items.clone();
    state
        .respond(request, &state.handlers.show_item, move |_| find_item(items, id))
        .await
}

pub async fn create_item(State(state): State<AppState>, parts: Parts, body: Bytes) -> Response {
    let request = request_context(&parts, "items", "create");
    let services = state.invoker.services().clone();
    let items = state.items.clone();
    state
        .respond(request, &state.handlers.create_item, move |request| {
            insert_item(request, services, items, body)
        })
        .await
}

pub async fn old_items(State(state): State<AppState>, parts: Parts) -> Response {
    let request = request_context(&parts, "items", "legacy");
    state
        .respond(request, &state.handlers.old_items, |_| legacy_redirect())
        .await
}

pub async fn download_report(State(state): State<AppState>, parts: Parts) -> Response {
    let request = request_context(&parts, "files", "report");
    state
        .respond(request, &state.handlers.report, |_| quarterly_report())
        .await
}

pub async fn account(State(state): State<AppState>, parts: Parts) -> Response {
    let request = request_context(&parts, "account", "index");
    state
        .respond(request, &state.handlers.account, account_page)
        .await
}

pub async fn login(State(state): State<AppState>, parts: Parts, body: Bytes) -> Response {
    let request = request_context(&parts, "account", "login");
    let services = state.invoker.services().clone();
    state
        .respond(request, &state.handlers.login, move |request| {
            sign_in(request, services, body)
        })
        .await
}

pub async fn logout(State(state): State<AppState>, parts: Parts) -> Response {
    let request = request_context(&parts, "account", "logout");
    state
        .respond(request, &state.handlers.logout, |_| sign_out())
        .await
}

// ============================================================================
// Actions
// ============================================================================

async fn home_page() -> Result<ActionResult> {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { "Silcrow MVC" }
            }
            body {
                h1 { "Silcrow MVC" }
                ul {
                    li { a href="/items" { "Items (JSON)" } }
                    li { a href="/files/report.txt" { "Download report" } }
                    li { a href="/account" { "Account (requires sign in)" } }
                }
            }
        }
    };
    Ok(ContentResult::html(markup.into_string()).into())
}

async fn all_items(items: Arc<RwLock<BTreeMap<u32, Item>>>) -> Result<ActionResult> {
    let items: Vec<Item> = items.read().await.values().cloned().collect();
    Ok(controller::ok_with(items)?.into())
}

async fn find_item(items: Arc<RwLock<BTreeMap<u32, Item>>>, id: u32) -> Result<ActionResult> {
    let item = items.read().await.get(&id).cloned();
    Ok(match item {
        Some(item) => controller::ok_with(item)?.into(),
        None => controller::not_found().into(),
    })
}

async fn insert_item(
    request: RequestContext,
    services: Arc<Services>,
    items: Arc<RwLock<BTreeMap<u32, Item>>>,
    body: Bytes,
) -> Result<ActionResult> {
    let mut controller = Controller::new(&request, &services);
    let new_item = match serde_json::from_slice::<NewItem>(&body) {
        Ok(new_item) => new_item,
        Err(err) => {
            controller.model_state.add_model_error("$", err.to_string());
            return Ok(controller.validation_problem(ProblemOptions::default()).into());
        }
    };

    let name = new_item.name.unwrap_or_default();
    if name.trim().is_empty() {
        controller
            .model_state
            .add_model_error("name", "The name field is required.");
    }
    if new_item.price_cents.is_none() {
        controller
            .model_state
            .add_model_error("price_cents", "The price_cents field is required.");
    }
    if !controller.model_state.is_valid() {
        return Ok(controller.validation_problem(ProblemOptions::default()).into());
    }

    let mut items = items.write().await;
    let id = items.keys().next_back().map_or(1, |last| last + 1);
    let item = Item {
        id,
        name,
        price_cents: new_item.price_cents.unwrap_or_default(),
    };
    items.insert(id, item.clone());
    tracing::info!("Created item {}", id);

    let values: RouteValues = [("id".to_string(), id.to_string())].into_iter().collect();
    Ok(controller::created_at_route(Some("item"), values, item)?.into())
}

async fn legacy_redirect() -> Result<ActionResult> {
    let result = controller::redirect_to_action(
        Some("index"),
        Some("items"),
        RouteValues::new(),
        RedirectMode::MOVED_PERMANENTLY,
    );
    Ok(result.into())
}

async fn quarterly_report() -> Result<ActionResult> {
    let report: String = (1..=200)
        .map(|line| format!("{:04} quarterly figures\n", line))
        .collect();
    let published = Utc
        .with_ymd_and_hms(2024, 1, 15, 8, 30, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let result = FileResult::bytes(report, "text/plain; charset=utf-8")?
        .download_name("report.txt")
        .last_modified(published)
        .etag(EntityTag::strong("report-2024-q1")?)
        .enable_range_processing(true);
    Ok(result.into())
}

fn session_user(request: &RequestContext) -> Option<String> {
    request
        .header(COOKIE)?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == "silcrow_session" && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

async fn account_page(request: RequestContext) -> Result<ActionResult> {
    let Some(user) = session_user(&request) else {
        let properties = AuthenticationProperties::redirect_to(request.path.clone());
        return Ok(controller::challenge(["cookies"], Some(properties)).into());
    };
    let markup = html! {
        h1 { "Signed in as " (user) }
        form method="post" action="/logout" { button { "Sign out" } }
    };
    Ok(ContentResult::html(markup.into_string()).into())
}

async fn sign_in(request: RequestContext, services: Arc<Services>, body: Bytes) -> Result<ActionResult> {
    let form = match serde_json::from_slice::<LoginForm>(&body) {
        Ok(form) => form,
        Err(err) => {
            let mut controller = Controller::new(&request, &services);
            controller.model_state.add_model_error("$", err.to_string());
            return Ok(controller.validation_problem(ProblemOptions::default()).into());
        }
    };
    let Some(name) = form.name.filter(|name| !name.trim().is_empty()) else {
        return Ok(controller::unauthorized().into());
    };
    let principal = ClaimsPrincipal::new("cookies").claim("name", name);
    let properties = AuthenticationProperties::redirect_to("/account").persistent(form.remember);
    Ok(controller::sign_in(principal, Some("cookies"), Some(properties)).into())
}

async fn sign_out() -> Result<ActionResult> {
    let properties = AuthenticationProperties::redirect_to("/");
    Ok(controller::sign_out(["cookies"], Some(properties)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use silcrow_mvc::{Location, ResultKind};
    use pretty_assertions::assert_eq;

    fn items() -> Arc<RwLock<BTreeMap<u32, Item>>> {
        let state = AppState::new(ActionInvoker::default()).unwrap();
        state.items
    }

    #[test]
    fn test_session_user_from_cookie() {
        let request = RequestContext::new(Method::GET, "/account")
            .with_header(COOKIE, "theme=dark; silcrow_session=ada");
        assert_eq!(session_user(&request).as_deref(), Some("ada"));

        let anonymous = RequestContext::new(Method::GET, "/account")
            .with_header(COOKIE, "silcrow_session=");
        assert_eq!(session_user(&anonymous), None);
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let result = find_item(items(), 99).await.unwrap();
        assert_eq!(result.kind(), ResultKind::Status);
    }

    #[tokio::test]
    async fn test_invalid_item_is_validation_problem() {
        let request = RequestContext::new(Method::POST, "/items");
        let services = Arc::new(Services::default());
        let body = Bytes::from_static(br#"{"name": ""}"#);

        let result = insert_item(request, services, items(), body).await.unwrap();
        let ActionResult::Object(object) = result else {
            panic!("expected an object result");
        };
        assert_eq!(object.value.status(), Some(400));
    }

    #[tokio::test]
    async fn test_created_item_gets_next_id() {
        let request = RequestContext::new(Method::POST, "/items");
        let services = Arc::new(Services::default());
        let store = items();
        let body = Bytes::from_static(br#"{"name": "Ink", "price_cents": 800}"#);

        let result = insert_item(request, services, store.clone(), body)
            .await
            .unwrap();
        let ActionResult::Object(object) = result else {
            panic!("expected an object result");
        };
        assert_eq!(object.status.map(|s| s.as_u16()), Some(201));
        assert_eq!(
            object.location,
            Some(Location::Route {
                route_name: Some("item".into()),
                values: [("id".to_string(), "3".to_string())].into_iter().collect(),
            })
        );
        assert!(store.read().await.contains_key(&3));
    }

    #[tokio::test]
    async fn test_malformed_login_is_validation_problem() {
        let request = RequestContext::new(Method::POST, "/login");
        let services = Arc::new(Services::default());

        let result = sign_in(request, services, Bytes::from_static(b"{"))
            .await
            .unwrap();
        let ActionResult::Object(object) = result else {
            panic!("expected an object result");
        };
        assert_eq!(object.value.status(), Some(400));
    }

    #[tokio::test]
    async fn test_login_signs_in_named_user() {
        let request = RequestContext::new(Method::POST, "/login");
        let services = Arc::new(Services::default());
        let body = Bytes::from_static(br#"{"name": "ada", "remember": true}"#);

        let result = sign_in(request, services, body).await.unwrap();
        assert_eq!(result.kind(), ResultKind::SignIn);
    }

    #[tokio::test]
    async fn test_dropped_request_is_cancelled() {
        let cancellation = CancellationToken::new();
        let pending = cancel_on_drop(cancellation.clone(), std::future::pending::<()>());

        let outcome = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(outcome.is_err());
        assert!(cancellation.is_cancelled());
    }

    #[tokio::test]
    async fn test_completed_request_is_not_cancelled() {
        let cancellation = CancellationToken::new();
        let value = cancel_on_drop(cancellation.clone(), async { 7 }).await;

        assert_eq!(value, 7);
        assert!(!cancellation.is_cancelled());
    }
}
