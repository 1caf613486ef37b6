use crate::auth::SessionContext;
use crate::error::Result;
use crate::models::DraftFields;
use crate::views::{Direction, RowState, UsersView};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
    Form,
};
use chrono::Utc;
use serde::Deserialize;

// Template structures
#[derive(Template, WebTemplate)]
#[template(path = "users.html")]
struct UsersTemplate {
    loading: bool,
    rows: Vec<UserRow>,
    page: u32,
    total_pages: u32,
    has_previous: bool,
    has_next: bool,
    banner: Option<Banner>,
}

// One table row; while editing, the fields hold the draft's values
pub struct UserRow {
    pub id: i64,
    pub avatar: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub editing: bool,
    pub confirming_delete: bool,
}

pub struct Banner {
    pub message: String,
    pub is_error: bool,
    pub remaining_ms: i64,
}

impl UsersTemplate {
    fn from_view(view: &UsersView) -> Self {
        let now = Utc::now();
        let rows = view
            .users()
            .iter()
            .map(|user| {
                let (shown, editing) = match view.row_state(user.id) {
                    RowState::Editing(draft) => (draft, true),
                    RowState::Viewing => (user, false),
                };
                UserRow {
                    id: user.id,
                    avatar: user.avatar.clone(),
                    first_name: shown.first_name.clone(),
                    last_name: shown.last_name.clone(),
                    email: shown.email.clone(),
                    editing,
                    confirming_delete: view.pending_delete() == Some(user.id),
                }
            })
            .collect();

        let banner = view.visible_notification(now).map(|notification| Banner {
            message: notification.message.clone(),
            is_error: notification.is_error(),
            remaining_ms: notification.remaining_ms(now),
        });

        UsersTemplate {
            loading: view.is_loading(),
            rows,
            page: view.page(),
            total_pages: view.total_pages(),
            has_previous: view.has_previous(),
            has_next: view.has_next(),
            banner,
        }
    }
}

#[derive(Deserialize)]
pub struct PageForm {
    direction: Direction,
}

fn back_to_users() -> Redirect {
    Redirect::to("/users")
}

// Handlers

/// GET /users - Show the users table, loading the first page on first visit
pub async fn users_page(
    State(state): State<AppState>,
    context: SessionContext,
) -> Result<impl IntoResponse> {
    let view = state.users_service.open(context.view_id).await;
    let template = UsersTemplate::from_view(&view);
    Ok(Html(template.render()?))
}

/// POST /users/page - Go to the previous or next page
pub async fn change_page_handler(
    State(state): State<AppState>,
    context: SessionContext,
    Form(form): Form<PageForm>,
) -> Redirect {
    state
        .users_service
        .change_page(context.view_id, form.direction)
        .await;
    back_to_users()
}

/// POST /users/reload - Fetch the current page again
pub async fn reload_handler(State(state): State<AppState>, context: SessionContext) -> Redirect {
    state.users_service.reload(context.view_id).await;
    back_to_users()
}

/// POST /users/:id/edit - Switch a row to inline editing
pub async fn start_edit_handler(
    State(state): State<AppState>,
    context: SessionContext,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    state.users_service.start_edit(context.view_id, id).await?;
    Ok(back_to_users())
}

/// POST /users/:id - Save the row being edited
pub async fn save_user_handler(
    State(state): State<AppState>,
    context: SessionContext,
    Path(id): Path<i64>,
    Form(form): Form<DraftFields>,
) -> Result<Redirect> {
    state.users_service.save(context.view_id, id, &form).await?;
    Ok(back_to_users())
}

/// POST /users/edit/cancel - Drop the draft
pub async fn cancel_edit_handler(
    State(state): State<AppState>,
    context: SessionContext,
) -> Redirect {
    state.users_service.cancel_edit(context.view_id).await;
    back_to_users()
}

/// POST /users/:id/delete - Ask for confirmation before deleting
pub async fn request_delete_handler(
    State(state): State<AppState>,
    context: SessionContext,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    state.users_service.request_delete(context.view_id, id).await?;
    Ok(back_to_users())
}

/// POST /users/:id/delete/confirm - Delete after confirmation
pub async fn confirm_delete_handler(
    State(state): State<AppState>,
    context: SessionContext,
    Path(id): Path<i64>,
) -> Redirect {
    state.users_service.confirm_delete(context.view_id, id).await;
    back_to_users()
}

/// POST /users/delete/cancel - Keep the user
pub async fn cancel_delete_handler(
    State(state): State<AppState>,
    context: SessionContext,
) -> Redirect {
    state.users_service.cancel_delete(context.view_id).await;
    back_to_users()
}
