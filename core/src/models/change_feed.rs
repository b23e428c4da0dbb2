//! Row and event shapes of the managed database's `notifications` table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Category, NotificationDraft, Priority};

pub const NOTIFICATIONS_TABLE: &str = "notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row exactly as the database stores it (snake_case columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationRow {
    /// Maps the row into the local record shape. Non-object metadata is dropped.
    pub fn to_draft(&self) -> NotificationDraft {
        NotificationDraft {
            category: self.category,
            priority: self.priority,
            title: self.title.clone(),
            body: self.message.clone(),
            action_url: self.action_url.clone().filter(|u| !u.is_empty()),
            metadata: match &self.metadata {
                Some(Value::Object(m)) => Some(m.clone()),
                _ => None,
            },
        }
    }
}

/// One row-level change pushed by the change feed.
///
/// `new_row` is present for inserts and updates; deletes carry only `old_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub new_row: Option<NotificationRow>,
    pub old_id: Option<String>,
}

/// Equality filter in the `column=eq.value` form used by the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn for_user(user_id: &str) -> Self {
        Self::eq("user_id", user_id)
    }

    /// Only `user_id` and `id` are filterable on this table.
    pub fn matches(&self, row: &NotificationRow) -> bool {
        match self.column.as_str() {
            "user_id" => row.user_id == self.value,
            "id" => row.id == self.value,
            _ => false,
        }
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(metadata: Option<Value>) -> NotificationRow {
        let now = Utc::now();
        NotificationRow {
            id: "n1".into(),
            user_id: "u1".into(),
            category: Category::Transaction,
            priority: Priority::Medium,
            title: "Transaction Confirmed".into(),
            message: "Transaction confirmed successfully".into(),
            is_read: false,
            action_url: Some(String::new()),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn to_draft_maps_snake_case_row() {
        let draft = row(Some(json!({ "txHash": "0xabc" }))).to_draft();

        assert_eq!(draft.category, Category::Transaction);
        assert_eq!(draft.body, "Transaction confirmed successfully");
        assert_eq!(draft.action_url, None, "empty url collapses to none");
        assert_eq!(draft.metadata.unwrap()["txHash"], "0xabc");
    }

    #[test]
    fn to_draft_drops_non_object_metadata() {
        assert!(row(Some(json!([1, 2]))).to_draft().metadata.is_none());
    }

    #[test]
    fn row_parses_database_json() {
        let raw = json!({
            "id": "n9",
            "user_id": "u1",
            "type": "liquidity",
            "priority": "low",
            "title": "Pool drained",
            "message": "Reserves below threshold",
            "is_read": false,
            "action_url": null,
            "metadata": null,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        });
        let row: NotificationRow = serde_json::from_value(raw).unwrap();
        assert_eq!(row.category, Category::Liquidity);
    }

    #[test]
    fn filter_renders_and_matches() {
        let f = RowFilter::for_user("u1");
        assert_eq!(f.to_string(), "user_id=eq.u1");
        assert!(f.matches(&row(None)));
        assert!(!RowFilter::for_user("u2").matches(&row(None)));
        assert!(!RowFilter::eq("title", "x").matches(&row(None)));
    }
}
