mod cookie_auth;
mod handlers;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use silcrow_mvc::{ActionInvoker, CacheDirective, Config, RouteTableUrlHelper, Services};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cookie_auth::CookieAuthentication;
use crate::handlers::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load_default().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        Config::default()
    });

    let mut options = config.mvc_options().context("Invalid [mvc] configuration")?;
    options
        .cache_profiles
        .entry("no-store".to_string())
        .or_insert_with(CacheDirective::no_store);

    info!(
        "Negotiation: respect_browser_accept_header={}, return_http_not_acceptable={}",
        options.respect_browser_accept_header, options.return_http_not_acceptable
    );

    let url_helper = RouteTableUrlHelper::new()
        .route("item", "/items/:id")
        .action("items", "index", "/items")
        .action("items", "show", "/items/:id");

    let services = Services::new(options)
        .with_url_helper(Arc::new(url_helper))
        .with_authentication(Arc::new(CookieAuthentication::new("/login")));

    let state = AppState::new(ActionInvoker::new(Arc::new(services)))
        .context("Invalid handler metadata")?;

    let app = Router::new()
        .route("/", get(handlers::index))
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route("/items/:id", get(handlers::show_item))
        .route("/old-items", get(handlers::old_items))
        .route("/files/report.txt", get(handlers::download_report))
        .route("/account", get(handlers::account))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
