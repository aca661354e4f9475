//! API layer - HTTP handlers and routing
//!
//! This module contains every HTTP endpoint of the newsroom backend:
//! - Index/stats endpoint
//! - Topic, Newspaper and Redactor endpoints
//! - Login/logout endpoints
//! - Administrative console endpoints

pub mod admin;
pub mod auth;
pub mod common;
pub mod index;
pub mod middleware;
pub mod newspapers;
pub mod redactors;
pub mod topics;


use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedRedactor};

/// Build the application routes, gated per section
pub fn build_app_router(state: AppState) -> Router<AppState> {
    // Staff-only console; staff check runs after authentication
    let admin_routes = admin::router()
        .route_layer(axum_middleware::from_fn(middleware::require_staff))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Everything else needs a session
    let protected_routes = Router::new()
        .merge(index::router())
        .merge(topics::router())
        .merge(newspapers::router())
        .merge(redactors::router())
        .merge(auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .merge(auth::public_router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // Cookie authentication needs an explicit origin with credentials
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => tracing::warn!("Ignoring invalid CORS origin {:?}: {}", cors_origin, e),
    }

    build_app_router(state.clone())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
