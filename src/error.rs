use crate::views::ViewError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotAuthenticated => Redirect::to("/").into_response(),
            AppError::View(ViewError::UnknownUser(id)) => (
                StatusCode::NOT_FOUND,
                format!("User {} is not on the current page", id),
            )
                .into_response(),
            AppError::View(e) => (StatusCode::CONFLICT, e.to_string()).into_response(),
            AppError::Template(e) => {
                error!("Template error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
