pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::jwt::TokenService;
use crate::catalog::ProductCatalog;
use crate::config::Config;
use crate::db::{ProductStore, UserStore};
use crate::directory::UserDirectory;
use crate::middleware::authorize::require_access;
use crate::state::{AppState, SharedState};

pub fn build_app(
    users: Arc<dyn UserStore>,
    products: Arc<dyn ProductStore>,
    config: Config,
) -> Router {
    let state: SharedState = Arc::new(AppState {
        tokens: TokenService::new(&config.jwt_secret, config.token_ttl),
        users: UserDirectory::new(users),
        products: ProductCatalog::new(products),
        config,
    });

    let api = routes::api_routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        require_access,
    ));

    Router::new()
        .merge(api)
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(state.config.max_body_size)),
        )
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
