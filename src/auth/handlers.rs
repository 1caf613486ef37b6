use crate::auth::session::store_login;
use crate::models::{LoginCredentials, LoginResponse};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

pub const LOGIN_FAILED: &str = "Login failed. Please try again.";

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
    email: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

fn render_login(error: Option<String>, email: String) -> Response {
    let template = LoginTemplate { error, email };
    Html(template.render().unwrap_or_else(|_| {
        "<html><body><h1>Error rendering login page</h1></body></html>".to_string()
    }))
    .into_response()
}

/// GET / - Show the login form
pub async fn login_page() -> Response {
    render_login(None, String::new())
}

/// POST / - Log in against the users API
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_string();
    if email.is_empty() {
        return render_login(Some("Please enter your email address".to_string()), email);
    }

    let credentials = LoginCredentials {
        email: email.clone(),
        password: form.password,
    };

    let response = match state.api.login(&credentials).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Login request failed: {}", e);
            return render_login(Some(LOGIN_FAILED.to_string()), email);
        }
    };

    match response {
        LoginResponse {
            token: Some(token), ..
        } if !token.is_empty() => {
            let previous_view = match store_login(&session, &token).await {
                Ok(previous_view) => previous_view,
                Err(e) => {
                    warn!("Failed to store session token: {}", e);
                    return render_login(Some("Failed to create session".to_string()), email);
                }
            };

            // A new login starts with a fresh table
            if let Some(view_id) = previous_view {
                state.users_service.discard(view_id).await;
            }
            state
                .users_service
                .prune_idle(state.view_idle_lifetime)
                .await;

            info!("Logged in as {}", email);
            Redirect::to("/users").into_response()
        }
        LoginResponse { error, .. } => {
            let message = error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| LOGIN_FAILED.to_string());
            render_login(Some(message), email)
        }
    }
}
