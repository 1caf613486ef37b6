use crate::models::{DraftFields, User, UserUpdate};
use crate::services::api_client::UsersApi;
use crate::views::{Direction, FetchTicket, UsersView, ViewError, ViewRegistry};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How long `open` waits on another request's first-page fetch before
/// fetching by itself
const FIRST_LOAD_WAIT: Duration = Duration::from_secs(10);

/// Drives the users views against the remote API.
///
/// View locks are only held for state transitions, never across an API call,
/// so a slow request never blocks other requests of the same visitor.
pub struct UsersService {
    api: Arc<dyn UsersApi>,
    views: ViewRegistry,
    // Bumped every time a fetch result is applied to any view
    settled: watch::Sender<u64>,
}

impl UsersService {
    pub fn new(api: Arc<dyn UsersApi>, views: ViewRegistry) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            api,
            views,
            settled,
        }
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    async fn view(&self, view_id: Uuid) -> Arc<Mutex<UsersView>> {
        self.views.get_or_create(view_id).await
    }

    /// Returns the view, fetching the first page if it never loaded.
    ///
    /// Never returns a view that is still loading: when a newer fetch from a
    /// concurrent request superseded this one, waits for that fetch to land.
    pub async fn open(&self, view_id: Uuid) -> UsersView {
        let view = self.view(view_id).await;
        // Subscribe before fetching so a settle in between is not missed
        let mut settled = self.settled.subscribe();
        let ticket = {
            let mut view = view.lock().await;
            view.is_loading().then(|| view.reload())
        };

        if let Some(ticket) = ticket {
            self.fetch(&view, ticket).await;
        }
        self.await_first_load(&view, &mut settled).await;
        self.snapshot(view_id).await
    }

    async fn await_first_load(&self, view: &Mutex<UsersView>, settled: &mut watch::Receiver<u64>) {
        loop {
            let loading = view.lock().await.is_loading();
            if !loading {
                return;
            }

            match timeout(FIRST_LOAD_WAIT, settled.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => return,
                Err(_) => {
                    // The request owning the latest ticket went away
                    warn!("First page never arrived, fetching again");
                    let ticket = view.lock().await.reload();
                    self.fetch(view, ticket).await;
                }
            }
        }
    }

    /// Fetches the current page again
    pub async fn reload(&self, view_id: Uuid) {
        let view = self.view(view_id).await;
        let ticket = view.lock().await.reload();
        self.fetch(&view, ticket).await;
    }

    /// Moves one page back or forward; does nothing at either bound
    pub async fn change_page(&self, view_id: Uuid, direction: Direction) {
        let view = self.view(view_id).await;
        let ticket = view.lock().await.step(direction);

        match ticket {
            Some(ticket) => self.fetch(&view, ticket).await,
            None => debug!("Ignoring {:?} at page bound", direction),
        }
    }

    async fn fetch(&self, view: &Mutex<UsersView>, ticket: FetchTicket) {
        let result = self.api.list_users(ticket.page).await;

        let applied = {
            let mut view = view.lock().await;
            match result {
                Ok(page) => view.apply_page(ticket, page),
                Err(e) => {
                    warn!("Failed to fetch users page {}: {}", ticket.page, e);
                    view.fetch_failed(ticket, Utc::now())
                }
            }
        };

        if applied {
            self.settled.send_modify(|count| *count += 1);
        } else {
            debug!(
                "Dropped stale response for page {} (request #{})",
                ticket.page, ticket.seq
            );
        }
    }

    pub async fn start_edit(&self, view_id: Uuid, user_id: i64) -> Result<(), ViewError> {
        let view = self.view(view_id).await;
        let mut view = view.lock().await;
        view.start_edit(user_id)
    }

    pub async fn cancel_edit(&self, view_id: Uuid) {
        let view = self.view(view_id).await;
        view.lock().await.cancel_edit();
    }

    /// Stores the submitted fields in the draft and sends the changes.
    ///
    /// On success the row takes the draft's values; on failure the draft is
    /// kept so the visitor can retry or cancel. Either way the outcome is
    /// reported through the view's notification, as is a save posted for a
    /// draft that no longer exists.
    pub async fn save(
        &self,
        view_id: Uuid,
        user_id: i64,
        fields: &DraftFields,
    ) -> Result<(), ViewError> {
        let view = self.view(view_id).await;
        let (draft, update) = {
            let mut view = view.lock().await;
            match prepare_update(&mut view, user_id, fields) {
                Ok(prepared) => prepared,
                Err(e @ (ViewError::NotEditing | ViewError::EditMismatch(_))) => {
                    warn!("Ignoring save of user {}: {}", user_id, e);
                    view.reject_stale_form(&e, Utc::now());
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        };

        let result = self.api.update_user(user_id, &update).await;

        let mut view = view.lock().await;
        match result {
            Ok(_) => {
                info!("Updated user {}", user_id);
                view.commit_succeeded(draft, Utc::now());
            }
            Err(e) => {
                warn!("Failed to update user {}: {}", user_id, e);
                view.commit_failed(Utc::now());
            }
        }
        Ok(())
    }

    pub async fn request_delete(&self, view_id: Uuid, user_id: i64) -> Result<(), ViewError> {
        let view = self.view(view_id).await;
        let mut view = view.lock().await;
        view.request_delete(user_id)
    }

    pub async fn cancel_delete(&self, view_id: Uuid) {
        let view = self.view(view_id).await;
        view.lock().await.cancel_delete();
    }

    /// Deletes a user whose deletion was requested and confirmed.
    ///
    /// A server answer outside 2xx counts as a failure, as does a transport
    /// error. The list is not re-fetched afterwards. A confirmation with no
    /// matching request only raises an error banner.
    pub async fn confirm_delete(&self, view_id: Uuid, user_id: i64) {
        let view = self.view(view_id).await;
        {
            let mut view = view.lock().await;
            if let Err(e) = view.confirm_delete(user_id) {
                warn!("Ignoring delete confirmation: {}", e);
                view.reject_stale_form(&e, Utc::now());
                return;
            }
        }

        let result = self.api.delete_user(user_id).await;

        let mut view = view.lock().await;
        match result {
            Ok(true) => {
                info!("Deleted user {}", user_id);
                view.delete_succeeded(user_id, Utc::now());
            }
            Ok(false) => {
                warn!("Server refused to delete user {}", user_id);
                view.delete_failed(Utc::now());
            }
            Err(e) => {
                warn!("Failed to delete user {}: {}", user_id, e);
                view.delete_failed(Utc::now());
            }
        }
    }

    /// A copy of the view for rendering, with an expired banner cleared
    pub async fn snapshot(&self, view_id: Uuid) -> UsersView {
        let view = self.view(view_id).await;
        let mut view = view.lock().await;
        view.expire_notification(Utc::now());
        view.clone()
    }

    /// Forgets a view, e.g. when its visitor logs in again
    pub async fn discard(&self, view_id: Uuid) {
        self.views.discard(view_id).await;
    }

    pub async fn prune_idle(&self, max_idle: Duration) {
        let pruned = self.views.prune_idle(max_idle).await;
        if pruned > 0 {
            debug!("Pruned {} idle users views", pruned);
        }
    }
}

fn prepare_update(
    view: &mut UsersView,
    user_id: i64,
    fields: &DraftFields,
) -> Result<(User, UserUpdate), ViewError> {
    view.update_draft(user_id, fields)?;
    let draft = view.begin_commit(user_id)?;
    let original = view
        .users()
        .iter()
        .find(|user| user.id == user_id)
        .ok_or(ViewError::UnknownUser(user_id))?;
    let update = UserUpdate::between(original, &draft);
    Ok((draft, update))
}
