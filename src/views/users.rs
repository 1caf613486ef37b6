//! State machine behind the users table
//!
//! [`UsersView`] owns everything the table shows: the current page of users,
//! the pagination estimate, the single inline-edit draft, the row awaiting
//! delete confirmation and the transient notification banner. It performs no
//! I/O. Callers ask it for a [`FetchTicket`] or a draft, talk to the API, and
//! report the outcome back.
//!
//! # Request epochs
//!
//! Every list fetch is tagged with a strictly increasing sequence number.
//! Only the response carrying the latest ticket is applied, so a slow response
//! for an old page can never overwrite the page the visitor navigated to since.

use crate::models::{DraftFields, User, UsersPage};
use crate::views::notification::Notification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FETCH_FAILED: &str = "Failed to fetch users";
pub const UPDATE_FAILED: &str = "Failed to update user";
pub const UPDATE_SUCCEEDED: &str = "User updated successfully";
pub const DELETE_FAILED: &str = "Failed to delete user";
pub const DELETE_SUCCEEDED: &str = "User deleted successfully";
pub const EDIT_NOT_OPEN: &str = "This user is no longer being edited";
pub const DELETE_NOT_PENDING: &str = "This deletion is no longer pending";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("User {0} is not on the current page")]
    UnknownUser(i64),
    #[error("No user is being edited")]
    NotEditing,
    #[error("User {0} is not the one being edited")]
    EditMismatch(i64),
    #[error("Deletion of user {0} was not requested")]
    DeleteNotRequested(i64),
}

/// Identifies one list fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTicket {
    pub seq: u64,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Previous,
    Next,
}

/// Display state of a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState<'a> {
    Viewing,
    Editing(&'a User),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersView {
    users: Vec<User>,
    page: u32,
    total_pages: u32,
    loading: bool,
    // The one draft allowed at a time; RowState is derived from it
    editing: Option<User>,
    pending_delete: Option<i64>,
    notification: Option<Notification>,
    latest_seq: u64,
}

impl Default for UsersView {
    fn default() -> Self {
        Self::new()
    }
}

impl UsersView {
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            page: 1,
            total_pages: 1,
            loading: true,
            editing: None,
            pending_delete: None,
            notification: None,
            latest_seq: 0,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// True until the first fetch of this view has completed, either way
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    // Pagination

    /// Ticket for fetching the current page again
    pub fn reload(&mut self) -> FetchTicket {
        self.go_to_page(self.page)
    }

    /// Steps back one page; `None` at page 1
    pub fn previous(&mut self) -> Option<FetchTicket> {
        if !self.has_previous() {
            return None;
        }
        Some(self.go_to_page(self.page - 1))
    }

    /// Steps forward one page; `None` at the last known page
    pub fn next(&mut self) -> Option<FetchTicket> {
        if !self.has_next() {
            return None;
        }
        Some(self.go_to_page(self.page + 1))
    }

    pub fn step(&mut self, direction: Direction) -> Option<FetchTicket> {
        match direction {
            Direction::Previous => self.previous(),
            Direction::Next => self.next(),
        }
    }

    fn go_to_page(&mut self, page: u32) -> FetchTicket {
        self.page = page.clamp(1, self.total_pages.max(1));
        self.latest_seq += 1;
        FetchTicket {
            seq: self.latest_seq,
            page: self.page,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.seq == self.latest_seq
    }

    /// Replaces the displayed list with a fetched page.
    ///
    /// Returns `false` without touching anything when a newer fetch has been
    /// issued since `ticket`.
    ///
    /// The total page count is an estimate: while the fetched page is below
    /// the server's count, one more page is assumed to exist; otherwise the
    /// fetched page is taken as the last one.
    pub fn apply_page(&mut self, ticket: FetchTicket, page: UsersPage) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.users = page.data;
        self.total_pages = if ticket.page < page.total_pages {
            ticket.page + 1
        } else {
            ticket.page
        };
        self.loading = false;

        // A draft or confirmation for a row that left the table is dropped
        let orphaned_draft = self
            .editing
            .as_ref()
            .is_some_and(|draft| !self.contains(draft.id));
        if orphaned_draft {
            self.editing = None;
        }
        if self.pending_delete.is_some_and(|id| !self.contains(id)) {
            self.pending_delete = None;
        }
        true
    }

    /// Records a failed fetch; stale tickets are ignored like in `apply_page`
    pub fn fetch_failed(&mut self, ticket: FetchTicket, now: DateTime<Utc>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;
        self.notify(Notification::error(FETCH_FAILED, now));
        true
    }

    fn contains(&self, id: i64) -> bool {
        self.users.iter().any(|user| user.id == id)
    }

    // Inline editing

    pub fn row_state(&self, id: i64) -> RowState<'_> {
        match &self.editing {
            Some(draft) if draft.id == id => RowState::Editing(draft),
            _ => RowState::Viewing,
        }
    }

    pub fn draft(&self) -> Option<&User> {
        self.editing.as_ref()
    }

    /// Starts editing a row with a copy of it as the draft, replacing any
    /// other draft
    pub fn start_edit(&mut self, id: i64) -> Result<(), ViewError> {
        let user = self
            .users
            .iter()
            .find(|user| user.id == id)
            .ok_or(ViewError::UnknownUser(id))?;
        self.editing = Some(user.clone());
        Ok(())
    }

    pub fn update_draft(&mut self, id: i64, fields: &DraftFields) -> Result<(), ViewError> {
        let draft = self.editing.as_mut().ok_or(ViewError::NotEditing)?;
        if draft.id != id {
            return Err(ViewError::EditMismatch(id));
        }
        draft.first_name = fields.first_name.clone();
        draft.last_name = fields.last_name.clone();
        draft.email = fields.email.clone();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Hands out a copy of the draft to send to the API
    pub fn begin_commit(&self, id: i64) -> Result<User, ViewError> {
        match &self.editing {
            Some(draft) if draft.id == id => Ok(draft.clone()),
            Some(_) => Err(ViewError::EditMismatch(id)),
            None => Err(ViewError::NotEditing),
        }
    }

    /// The update went through: the row takes the draft's values and editing ends
    pub fn commit_succeeded(&mut self, draft: User, now: DateTime<Utc>) {
        if matches!(&self.editing, Some(current) if current.id == draft.id) {
            self.editing = None;
        }
        for user in self.users.iter_mut().filter(|user| user.id == draft.id) {
            *user = draft.clone();
        }
        self.notify(Notification::success(UPDATE_SUCCEEDED, now));
    }

    /// The update failed: the draft stays open for another try or a cancel
    pub fn commit_failed(&mut self, now: DateTime<Utc>) {
        self.notify(Notification::error(UPDATE_FAILED, now));
    }

    // Deletion

    pub fn request_delete(&mut self, id: i64) -> Result<(), ViewError> {
        if !self.contains(id) {
            return Err(ViewError::UnknownUser(id));
        }
        self.pending_delete = Some(id);
        Ok(())
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Consumes the confirmation for `id`
    pub fn confirm_delete(&mut self, id: i64) -> Result<(), ViewError> {
        if self.pending_delete != Some(id) {
            return Err(ViewError::DeleteNotRequested(id));
        }
        self.pending_delete = None;
        Ok(())
    }

    pub fn delete_succeeded(&mut self, id: i64, now: DateTime<Utc>) {
        self.users.retain(|user| user.id != id);
        if matches!(&self.editing, Some(draft) if draft.id == id) {
            self.editing = None;
        }
        self.notify(Notification::success(DELETE_SUCCEEDED, now));
    }

    pub fn delete_failed(&mut self, now: DateTime<Utc>) {
        self.notify(Notification::error(DELETE_FAILED, now));
    }

    /// Reports a form posted against state that has since moved on, such as a
    /// Save from a page rendered before a page change dropped the draft
    pub fn reject_stale_form(&mut self, error: &ViewError, now: DateTime<Utc>) {
        let message = match error {
            ViewError::DeleteNotRequested(_) => DELETE_NOT_PENDING,
            _ => EDIT_NOT_OPEN,
        };
        self.notify(Notification::error(message, now));
    }

    // Notifications

    fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    pub fn visible_notification(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.notification
            .as_ref()
            .filter(|notification| !notification.is_expired(now))
    }

    pub fn expire_notification(&mut self, now: DateTime<Utc>) {
        if self
            .notification
            .as_ref()
            .is_some_and(|notification| notification.is_expired(now))
        {
            self.notification = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::sample_page;
    use chrono::Duration;

    fn loaded_view(page: u32, total_pages: u32, ids: &[i64]) -> UsersView {
        let mut view = UsersView::new();
        let ticket = view.reload();
        assert!(view.apply_page(ticket, sample_page(1, 3, &[1, 2, 3])));
        while view.page() < page {
            let ticket = view.next().expect("next page available");
            let ids = if ticket.page == page { ids } else { &[1, 2, 3][..] };
            assert!(view.apply_page(ticket, sample_page(ticket.page, total_pages, ids)));
        }
        if page == 1 {
            let ticket = view.reload();
            assert!(view.apply_page(ticket, sample_page(1, total_pages, ids)));
        }
        view
    }

    fn fields(first: &str, last: &str, email: &str) -> DraftFields {
        DraftFields {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_new_view_is_loading_on_page_one() {
        let view = UsersView::new();
        assert!(view.is_loading());
        assert_eq!(view.page(), 1);
        assert_eq!(view.total_pages(), 1);
        assert!(view.users().is_empty());
    }

    #[test]
    fn test_fetch_replaces_list_in_server_order() {
        let mut view = loaded_view(1, 2, &[1, 2, 3]);
        let ticket = view.reload();
        assert!(view.apply_page(ticket, sample_page(1, 2, &[9, 4, 6])));

        let ids: Vec<i64> = view.users().iter().map(|user| user.id).collect();
        assert_eq!(ids, vec![9, 4, 6]);
        assert!(!view.is_loading());
    }

    #[test]
    fn test_total_pages_estimate_grows_one_page_at_a_time() {
        let mut view = UsersView::new();
        let ticket = view.reload();
        view.apply_page(ticket, sample_page(1, 3, &[1]));
        assert_eq!(view.total_pages(), 2);

        let ticket = view.next().unwrap();
        view.apply_page(ticket, sample_page(2, 3, &[7]));
        assert_eq!(view.total_pages(), 3);

        let ticket = view.next().unwrap();
        view.apply_page(ticket, sample_page(3, 3, &[13]));
        assert_eq!(view.total_pages(), 3);
        assert!(!view.has_next());

        // Going back shrinks the estimate to one page ahead
        let ticket = view.previous().unwrap();
        view.apply_page(ticket, sample_page(2, 3, &[7]));
        let ticket = view.previous().unwrap();
        view.apply_page(ticket, sample_page(1, 3, &[1]));
        assert_eq!(view.total_pages(), 2);
        assert!(view.page() <= view.total_pages());
    }

    #[test]
    fn test_previous_at_first_page_is_noop() {
        let mut view = loaded_view(1, 2, &[1, 2]);
        assert!(view.previous().is_none());
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_next_at_last_known_page_is_noop() {
        let mut view = loaded_view(2, 2, &[7, 8]);
        assert_eq!(view.total_pages(), 2);
        assert!(view.next().is_none());
        assert_eq!(view.page(), 2);
        assert_eq!(view.users().len(), 2);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut view = loaded_view(1, 3, &[1, 2]);

        let to_page_two = view.next().unwrap();
        let reload_two = view.reload();
        assert!(to_page_two.seq < reload_two.seq);

        assert!(view.apply_page(reload_two, sample_page(2, 3, &[7, 8])));
        assert!(!view.apply_page(to_page_two, sample_page(1, 3, &[1, 2])));
        assert!(!view.fetch_failed(to_page_two, Utc::now()));

        let ids: Vec<i64> = view.users().iter().map(|user| user.id).collect();
        assert_eq!(ids, vec![7, 8]);
        assert!(view.visible_notification(Utc::now()).is_none());
    }

    #[test]
    fn test_fetch_failure_shows_error_and_stops_loading() {
        let mut view = UsersView::new();
        let now = Utc::now();
        let ticket = view.reload();
        assert!(view.fetch_failed(ticket, now));

        assert!(!view.is_loading());
        let banner = view.visible_notification(now).unwrap();
        assert!(banner.is_error());
        assert_eq!(banner.message, FETCH_FAILED);
    }

    #[test]
    fn test_only_one_row_edits_at_a_time() {
        let mut view = loaded_view(1, 1, &[1, 2, 3]);
        view.start_edit(1).unwrap();
        view.start_edit(2).unwrap();

        assert_eq!(view.row_state(1), RowState::Viewing);
        assert!(matches!(view.row_state(2), RowState::Editing(draft) if draft.id == 2));
        assert_eq!(view.row_state(3), RowState::Viewing);
    }

    #[test]
    fn test_start_edit_unknown_user() {
        let mut view = loaded_view(1, 1, &[1, 2]);
        assert_eq!(view.start_edit(42), Err(ViewError::UnknownUser(42)));
        assert!(view.draft().is_none());
    }

    #[test]
    fn test_cancel_edit_leaves_row_untouched() {
        let mut view = loaded_view(1, 1, &[1, 2]);
        let before = view.users()[0].clone();

        view.start_edit(1).unwrap();
        view.update_draft(1, &fields("Changed", "Name", "changed@example.com"))
            .unwrap();
        view.cancel_edit();

        assert_eq!(view.users()[0], before);
        assert_eq!(view.row_state(1), RowState::Viewing);
    }

    #[test]
    fn test_commit_success_applies_draft() {
        let mut view = loaded_view(1, 1, &[1, 2]);
        let now = Utc::now();
        view.start_edit(2).unwrap();
        view.update_draft(2, &fields("Janet", "Weaver-Smith", "janet@example.com"))
            .unwrap();

        let draft = view.begin_commit(2).unwrap();
        view.commit_succeeded(draft.clone(), now);

        assert_eq!(view.users()[1], draft);
        assert_eq!(view.users()[1].last_name, "Weaver-Smith");
        assert!(view.draft().is_none());
        let banner = view.visible_notification(now).unwrap();
        assert!(!banner.is_error());
        assert_eq!(banner.message, UPDATE_SUCCEEDED);
    }

    #[test]
    fn test_commit_failure_keeps_editing() {
        let mut view = loaded_view(1, 1, &[1, 2]);
        let before = view.users().to_vec();
        let now = Utc::now();
        view.start_edit(1).unwrap();
        view.update_draft(1, &fields("Eve", "Holt", "eve@example.com"))
            .unwrap();

        let _draft = view.begin_commit(1).unwrap();
        view.commit_failed(now);

        assert_eq!(view.users(), &before[..]);
        assert!(matches!(view.row_state(1), RowState::Editing(draft) if draft.first_name == "Eve"));
        assert_eq!(view.visible_notification(now).unwrap().message, UPDATE_FAILED);
    }

    #[test]
    fn test_commit_requires_matching_draft() {
        let mut view = loaded_view(1, 1, &[1, 2]);
        assert_eq!(view.begin_commit(1), Err(ViewError::NotEditing));
        view.start_edit(1).unwrap();
        assert_eq!(view.begin_commit(2), Err(ViewError::EditMismatch(2)));
        assert_eq!(
            view.update_draft(2, &fields("a", "b", "c")),
            Err(ViewError::EditMismatch(2))
        );
    }

    #[test]
    fn test_confirmed_delete_removes_only_that_row() {
        let mut view = loaded_view(1, 1, &[1, 2, 3, 4]);
        let now = Utc::now();

        view.request_delete(3).unwrap();
        view.confirm_delete(3).unwrap();
        view.delete_succeeded(3, now);

        let ids: Vec<i64> = view.users().iter().map(|user| user.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert_eq!(view.pending_delete(), None);
        assert_eq!(view.visible_notification(now).unwrap().message, DELETE_SUCCEEDED);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut view = loaded_view(1, 1, &[1, 2, 3]);
        assert_eq!(view.confirm_delete(3), Err(ViewError::DeleteNotRequested(3)));

        view.request_delete(2).unwrap();
        assert_eq!(view.confirm_delete(3), Err(ViewError::DeleteNotRequested(3)));

        view.cancel_delete();
        assert_eq!(view.confirm_delete(2), Err(ViewError::DeleteNotRequested(2)));
        assert_eq!(view.users().len(), 3);
    }

    #[test]
    fn test_stale_forms_raise_error_banners() {
        let mut view = loaded_view(1, 1, &[1, 2]);
        let now = Utc::now();

        view.reject_stale_form(&ViewError::NotEditing, now);
        let banner = view.visible_notification(now).unwrap();
        assert!(banner.is_error());
        assert_eq!(banner.message, EDIT_NOT_OPEN);

        view.reject_stale_form(&ViewError::DeleteNotRequested(2), now);
        assert_eq!(view.visible_notification(now).unwrap().message, DELETE_NOT_PENDING);
        assert_eq!(view.users().len(), 2);
    }

    #[test]
    fn test_delete_failure_keeps_list() {
        let mut view = loaded_view(1, 1, &[1, 2, 3]);
        let now = Utc::now();
        view.request_delete(1).unwrap();
        view.confirm_delete(1).unwrap();
        view.delete_failed(now);

        assert_eq!(view.users().len(), 3);
        assert_eq!(view.visible_notification(now).unwrap().message, DELETE_FAILED);
    }

    #[test]
    fn test_notification_expires_after_three_seconds() {
        let mut view = loaded_view(1, 1, &[1, 2]);
        let now = Utc::now();
        view.delete_failed(now);

        assert!(view.visible_notification(now + Duration::milliseconds(2500)).is_some());
        assert!(view.visible_notification(now + Duration::seconds(3)).is_none());

        view.expire_notification(now + Duration::seconds(3));
        assert!(view.visible_notification(now).is_none());
    }

    #[test]
    fn test_newer_notification_replaces_pending_one() {
        let mut view = loaded_view(1, 1, &[1, 2]);
        let first = Utc::now();
        let second = first + Duration::seconds(2);

        view.delete_failed(first);
        view.start_edit(1).unwrap();
        let draft = view.begin_commit(1).unwrap();
        view.commit_succeeded(draft, second);

        // The first banner's deadline passes without clearing the second one
        view.expire_notification(first + Duration::seconds(3));
        let banner = view.visible_notification(first + Duration::seconds(3)).unwrap();
        assert_eq!(banner.message, UPDATE_SUCCEEDED);
        assert!(view.visible_notification(second + Duration::seconds(3)).is_none());
        assert_eq!(view.users().len(), 2);
    }

    #[test]
    fn test_page_change_drops_draft_for_missing_row() {
        let mut view = loaded_view(1, 3, &[1, 2]);
        view.start_edit(1).unwrap();
        view.request_delete(2).unwrap();

        let ticket = view.next().unwrap();
        view.apply_page(ticket, sample_page(2, 3, &[7, 8]));

        assert!(view.draft().is_none());
        assert_eq!(view.pending_delete(), None);
    }
}
