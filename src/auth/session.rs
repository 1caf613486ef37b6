//! The visitor's session as the rest of the application sees it
//!
//! The API token lives in the session store under [`TOKEN_KEY`]. Its presence
//! is the only thing that counts: it is never validated or expired here. The
//! guard turns it into a [`SessionContext`] that handlers receive explicitly.

use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::{session, Session};
use uuid::Uuid;

pub const TOKEN_KEY: &str = "token";
pub const VIEW_KEY: &str = "users_view";

/// Opaque token handed out by the API's login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What the guard admitted a request with
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: SessionToken,
    /// Key of this login's users view in the registry
    pub view_id: Uuid,
}

// Only present on requests that went through the session guard
impl<S: Send + Sync> FromRequestParts<S> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or(AppError::NotAuthenticated)
    }
}

/// Presence check on a stored token; an empty string counts as absent
pub fn admits(token: Option<&str>) -> bool {
    token.is_some_and(|token| !token.is_empty())
}

/// Reads the context from the session, `None` when no token is stored
pub async fn load_context(session: &Session) -> Result<Option<SessionContext>, session::Error> {
    let token = session.get::<String>(TOKEN_KEY).await?;
    let token = match token {
        Some(token) if admits(Some(&token)) => SessionToken(token),
        _ => return Ok(None),
    };

    let view_id = match session.get::<Uuid>(VIEW_KEY).await? {
        Some(view_id) => view_id,
        None => {
            let view_id = Uuid::new_v4();
            session.insert(VIEW_KEY, view_id).await?;
            view_id
        }
    };

    Ok(Some(SessionContext { token, view_id }))
}

/// Stores a fresh token and starts a new users view for it.
///
/// Returns the view the session used before, if any, so the caller can
/// discard it.
pub async fn store_login(session: &Session, token: &str) -> Result<Option<Uuid>, session::Error> {
    let previous_view = session.get::<Uuid>(VIEW_KEY).await?;
    session.insert(TOKEN_KEY, token).await?;
    session.insert(VIEW_KEY, Uuid::new_v4()).await?;
    Ok(previous_view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn new_session() -> Session {
        let store = Arc::new(MemoryStore::default());
        Session::new(None, store, None)
    }

    #[test]
    fn test_admits_only_present_tokens() {
        assert!(admits(Some("QpwL5tke4Pnpja7X4")));
        assert!(!admits(Some("")));
        assert!(!admits(None));
    }

    #[tokio::test]
    async fn test_no_token_no_context() {
        let session = new_session();
        assert!(load_context(&session).await.unwrap().is_none());

        session.insert(TOKEN_KEY, "").await.unwrap();
        assert!(load_context(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_starts_new_view() {
        let session = new_session();

        assert_eq!(store_login(&session, "first").await.unwrap(), None);
        let first = load_context(&session).await.unwrap().unwrap();
        assert_eq!(first.token.as_str(), "first");

        let previous = store_login(&session, "second").await.unwrap();
        assert_eq!(previous, Some(first.view_id));
        let second = load_context(&session).await.unwrap().unwrap();
        assert_eq!(second.token.as_str(), "second");
        assert_ne!(second.view_id, first.view_id);
    }

    #[tokio::test]
    async fn test_context_creates_missing_view_id_once() {
        let session = new_session();
        session.insert(TOKEN_KEY, "token").await.unwrap();

        let first = load_context(&session).await.unwrap().unwrap();
        let again = load_context(&session).await.unwrap().unwrap();
        assert_eq!(first.view_id, again.view_id);
    }
}
