use crate::views::users::UsersView;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

struct Entry {
    view: Arc<Mutex<UsersView>>,
    last_used: Instant,
}

/// Live users views, one per login
///
/// Views are shared between concurrent requests of the same visitor so that
/// fetch tickets from one request are visible to the others. They are not
/// persisted: after a restart a visitor simply gets a fresh view.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the view for `id`, creating an empty one if needed
    pub async fn get_or_create(&self, id: Uuid) -> Arc<Mutex<UsersView>> {
        let mut views = self.views.write().await;
        let entry = views.entry(id).or_insert_with(|| {
            debug!("Creating users view {}", id);
            Entry {
                view: Arc::new(Mutex::new(UsersView::new())),
                last_used: Instant::now(),
            }
        });
        entry.last_used = Instant::now();
        entry.view.clone()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.views.read().await.contains_key(&id)
    }

    pub async fn discard(&self, id: Uuid) {
        if self.views.write().await.remove(&id).is_some() {
            debug!("Discarded users view {}", id);
        }
    }

    /// Drops views nobody touched for `max_idle`, returns how many went away
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut views = self.views.write().await;
        let before = views.len();
        views.retain(|_, entry| entry.last_used.elapsed() < max_idle);
        before - views.len()
    }

    pub async fn len(&self) -> usize {
        self.views.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.views.read().await.is_empty()
    }
}
