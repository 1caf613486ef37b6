use crate::auth::session::load_context;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::warn;

/// Session guard for protected routes.
///
/// Admits the request only when a token is stored in the session and hands
/// the resulting `SessionContext` to the handler through the request
/// extensions. Everything else is sent back to the login page.
pub async fn require_session(session: Session, mut request: Request, next: Next) -> Response {
    match load_context(&session).await {
        Ok(Some(context)) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Ok(None) => Redirect::to("/").into_response(),
        Err(e) => {
            warn!("Failed to read session: {}", e);
            Redirect::to("/").into_response()
        }
    }
}
