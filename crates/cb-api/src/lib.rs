//! # cb-api
//!
//! The web routing and orchestration layer for Complaint Box.

pub mod cookie;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;

pub use cookie::CookieSettings;
pub use state::AppState;

/// Configures the routes for the complaint service.
///
/// Mounted at the root; every JSON route lives under `/api/`.
pub fn configure_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/signin", post(handlers::signin))
        .route("/api/auth/me", get(handlers::current_user))
        .route("/api/auth/signout", post(handlers::signout))
        .route("/api/auth/admin-exists", get(handlers::admin_exists))
        .route("/api/complaint/create", post(handlers::create_complaint))
        .route("/api/complaint/all", get(handlers::all_complaints))
        .route("/api/complaint/my-complaints", get(handlers::my_complaints))
        .route(
            "/api/complaint/{complaint_id}/update",
            put(handlers::update_complaint),
        )
        .route(
            "/api/complaint/{complaint_id}/delete",
            delete(handlers::delete_complaint),
        )
        .route("/metrics", get(handlers::render_metrics))
}

/// The full application: routes, CORS for `allowed_origin`, tracing and state.
pub fn app(state: Arc<AppState>, allowed_origin: HeaderValue) -> Router {
    let router = configure_routes().layer(middleware::cors_policy(allowed_origin));
    middleware::standard_middleware(router).with_state(state)
}
