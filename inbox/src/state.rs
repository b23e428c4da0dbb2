//! Notification state and its reducer.
//!
//! [`NotificationState::reduce`] is the only way state changes; it performs no
//! I/O. [`NotificationHub`] shares one state between the ingestion stage and
//! readers behind a mutex that is never held across a side effect.

use std::sync::Arc;

use corelib::models::{
    Category, Notification, NotificationDraft, NotificationId, NotificationSettings, SettingsPatch,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::store::NotificationStore;

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    Add(Notification),
    AddMany(Vec<Notification>),
    MarkRead(NotificationId),
    MarkAllRead,
    Remove(NotificationId),
    ClearAll,
    UpdateSettings(SettingsPatch),
    SetEnabled(bool),
}

#[derive(Debug, Clone)]
pub struct NotificationState {
    store: NotificationStore,
    settings: NotificationSettings,
    is_enabled: bool,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self::new(NotificationSettings::default())
    }
}

impl NotificationState {
    pub fn new(settings: NotificationSettings) -> Self {
        Self {
            store: NotificationStore::default(),
            settings,
            is_enabled: true,
        }
    }

    pub fn reduce(&mut self, action: NotificationAction) {
        match action {
            NotificationAction::Add(n) => {
                let evicted = self.store.admit(n);
                if !evicted.is_empty() {
                    debug!(evicted = evicted.len(), "notifications evicted");
                }
            }
            NotificationAction::AddMany(batch) => {
                let evicted = self.store.admit_many(batch);
                if !evicted.is_empty() {
                    debug!(evicted = evicted.len(), "notifications evicted");
                }
            }
            NotificationAction::MarkRead(id) => {
                self.store.mark_read(&id);
            }
            NotificationAction::MarkAllRead => {
                self.store.mark_all_read();
            }
            NotificationAction::Remove(id) => {
                self.store.remove(&id);
            }
            NotificationAction::ClearAll => self.store.clear_all(),
            NotificationAction::UpdateSettings(patch) => self.settings.apply(&patch),
            NotificationAction::SetEnabled(enabled) => self.is_enabled = enabled,
        }
    }

    /// Master flag and category flag must both be on.
    pub fn admits(&self, category: Category) -> bool {
        self.is_enabled && self.settings.category_enabled(category)
    }

    pub fn admits_draft(&self, draft: &NotificationDraft) -> bool {
        self.admits(draft.category)
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }

    /// Newest-first snapshot.
    pub fn notifications(&self) -> Vec<Notification> {
        self.store.iter().cloned().collect()
    }
}

/// Shared handle: `dispatch` an action, `select` a view.
#[derive(Debug, Clone, Default)]
pub struct NotificationHub {
    inner: Arc<Mutex<NotificationState>>,
}

impl NotificationHub {
    pub fn new(state: NotificationState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn dispatch(&self, action: NotificationAction) {
        self.inner.lock().reduce(action);
    }

    pub fn select<R>(&self, f: impl FnOnce(&NotificationState) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Runs the settings filter and the admission under one lock acquisition.
    ///
    /// Drafts whose category is disabled are dropped. The survivors are stamped
    /// and admitted as one batch, so the last draft ends up nearest the front.
    pub fn admit_drafts(
        &self,
        drafts: Vec<NotificationDraft>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Admitted {
        let mut state = self.inner.lock();
        let total = drafts.len();
        let notifications: Vec<Notification> = drafts
            .into_iter()
            .filter(|d| state.admits_draft(d))
            .map(|d| Notification::from_draft(d, now))
            .collect();

        let filtered = total - notifications.len();
        if filtered > 0 {
            debug!(filtered, "drafts dropped by notification settings");
        }

        match notifications.len() {
            0 => {}
            1 => state.reduce(NotificationAction::Add(notifications[0].clone())),
            _ => state.reduce(NotificationAction::AddMany(notifications.clone())),
        }

        Admitted {
            notifications,
            settings: state.settings,
        }
    }

    pub fn admit_draft(
        &self,
        draft: NotificationDraft,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Option<(Notification, NotificationSettings)> {
        let Admitted {
            mut notifications,
            settings,
        } = self.admit_drafts(vec![draft], now);
        notifications.pop().map(|n| (n, settings))
    }
}

/// Records admitted by one [`NotificationHub::admit_drafts`] call and the
/// settings that were in force.
#[derive(Debug, Clone)]
pub struct Admitted {
    pub notifications: Vec<Notification>,
    pub settings: NotificationSettings,
}
