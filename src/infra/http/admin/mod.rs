mod auth;
mod dashboard;
mod errors;
mod forms;
mod health;
mod posts;
mod state;

pub use auth::AdminCredentials;
pub use state::AdminState;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::infra::assets;

use super::middleware::{log_responses, security_headers, set_request_context};

/// Admin listener routes. Every route, static assets included, sits behind Basic auth.
pub fn build_admin_router(state: AdminState) -> Router {
    let credentials = state.credentials.clone();
    let security = state.security.clone();

    Router::new()
        .route("/", get(dashboard::admin_dashboard))
        .route("/posts", get(posts::admin_posts))
        .route("/posts/create", post(posts::admin_post_create))
        .route("/posts/new", get(posts::admin_post_new))
        .route(
            "/posts/{id}/edit",
            get(posts::admin_post_edit).post(posts::admin_post_update),
        )
        .route("/posts/{id}/publish", post(posts::admin_post_publish))
        .route("/posts/{id}/draft", post(posts::admin_post_move_to_draft))
        .route("/posts/{id}/schedule", post(posts::admin_post_schedule))
        .route("/posts/{id}/delete", post(posts::admin_post_delete))
        .route("/messages", get(dashboard::admin_messages))
        .route("/_health/db", get(health::admin_health))
        .route("/static/admin/{*path}", get(assets::serve_admin))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            credentials,
            auth::require_basic_auth,
        ))
        .layer(middleware::from_fn_with_state(security, security_headers))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}
