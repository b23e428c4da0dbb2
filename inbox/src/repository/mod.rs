pub mod feed;
pub mod sqlite;

use async_trait::async_trait;
use corelib::models::{NotificationDraft, NotificationRow, RowFilter};

use crate::error::StoreError;
pub use feed::{ChangeBus, ChangeStream};

/// One page of a user's notifications, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPage {
    pub rows: Vec<NotificationRow>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// CRUD over the managed database's `notifications` table.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, user_id: &str, draft: &NotificationDraft)
    -> Result<NotificationRow, StoreError>;

    /// `page` is 1-based.
    async fn page(&self, user_id: &str, page: u32, limit: u32)
    -> Result<NotificationPage, StoreError>;

    async fn mark_read(&self, id: &str) -> Result<NotificationRow, StoreError>;

    /// Returns how many rows changed.
    async fn mark_all_read(&self, user_id: &str) -> Result<u64, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Row-level change subscription.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, table: &str, filter: RowFilter) -> anyhow::Result<ChangeStream>;
}
