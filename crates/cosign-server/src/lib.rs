//! # cosign-server
//!
//! HTTP surface of the cooperative signing service. The binary in
//! `main.rs` wires configuration, logging, and shutdown around the router
//! built here.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub mod api;
pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use state::AppState;

/// Build the full route table over the shared state.
pub fn create_router(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.read_timeout);

    Router::new()
        // Public user flow
        .route("/api/register", post(api::users::register))
        .route("/api/login", post(api::users::login))
        .route("/api/logout", post(api::users::logout))
        // Authenticated user flow
        .route("/api/user/info", get(api::users::user_info))
        .route("/api/key/init", post(api::cosign::key_init))
        .route("/api/sign", post(api::cosign::sign))
        .route("/api/decrypt", post(api::cosign::decrypt))
        // Operator surface (bearer + admin flag)
        .route("/mapi/health", get(api::admin::health))
        .route("/mapi/stats", get(api::admin::stats))
        .route("/mapi/users", get(api::admin::list_users))
        .route(
            "/mapi/users/:id",
            get(api::admin::get_user).delete(api::admin::delete_user),
        )
        .route("/mapi/users/:id/status", put(api::admin::update_user_status))
        .route("/mapi/keys", get(api::admin::list_keys))
        .route("/mapi/keys/:id", delete(api::admin::delete_key))
        .route("/mapi/logs", get(api::admin::list_logs))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
