pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod views;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use services::{UsersApi, UsersService};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use views::ViewRegistry;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn UsersApi>,
    pub users_service: Arc<UsersService>,
    /// Users views untouched for this long are dropped on the next login
    pub view_idle_lifetime: Duration,
}

impl AppState {
    pub fn new(api: Arc<dyn UsersApi>, view_idle_lifetime: Duration) -> Self {
        let users_service = Arc::new(UsersService::new(api.clone(), ViewRegistry::new()));
        Self {
            api,
            users_service,
            view_idle_lifetime,
        }
    }
}

/// All application routes. The caller adds the session layer on top, since
/// the store differs between the server (SQLite) and tests (memory).
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/users", get(handlers::users_page))
        .route("/users/page", post(handlers::change_page_handler))
        .route("/users/reload", post(handlers::reload_handler))
        .route("/users/edit/cancel", post(handlers::cancel_edit_handler))
        .route("/users/delete/cancel", post(handlers::cancel_delete_handler))
        .route("/users/{id}", post(handlers::save_user_handler))
        .route("/users/{id}/edit", post(handlers::start_edit_handler))
        .route("/users/{id}/delete", post(handlers::request_delete_handler))
        .route(
            "/users/{id}/delete/confirm",
            post(handlers::confirm_delete_handler),
        )
        .route_layer(from_fn(auth::middleware::require_session));

    Router::new()
        .route(
            "/",
            get(auth::handlers::login_page).post(auth::handlers::login_handler),
        )
        .merge(protected_routes)
        .nest_service("/static", ServeDir::new("static"))
        .layer(from_fn(middleware::add_security_headers))
        .with_state(state)
}
