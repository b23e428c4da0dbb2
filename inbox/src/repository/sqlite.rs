//! SqliteNotificationRepository
//! ----------------------------
//! SQLite-backed implementation of [`NotificationRepository`]. It mirrors the
//! managed database's `notifications` table and publishes one change event per
//! written row on its [`ChangeBus`], which is what the change-feed producer
//! listens to.
//!
//! Timestamps are stored as fixed-width RFC 3339 text so they sort as strings;
//! metadata is stored as JSON text.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use common::logger::warn_if_slow;
use corelib::models::{
    ChangeEvent, ChangeKind, Category, NotificationDraft, NotificationRow, Priority,
    change_feed::NOTIFICATIONS_TABLE,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{ChangeBus, NotificationPage, NotificationRepository};
use crate::error::StoreError;

const SLOW_QUERY: Duration = Duration::from_millis(50);

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
    bus: ChangeBus,
}

impl SqliteNotificationRepository {
    pub async fn from_pool(pool: SqlitePool, bus: ChangeBus) -> Result<Self, StoreError> {
        let repo = Self { pool, bus };
        repo.migrate().await?;
        Ok(repo)
    }

    /// Connects to `url`, creating the database file if needed, and ensures the
    /// schema exists.
    pub async fn connect(url: &str, bus: ChangeBus) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::from_pool(pool, bus).await
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                type TEXT NOT NULL,
                priority TEXT NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                action_url TEXT,
                metadata TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notifications_user_created \
             ON notifications (user_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_one(&self, id: &str) -> Result<NotificationRow, StoreError> {
        let row = sqlx::query("SELECT * FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        decode_row(&row)
    }

    fn publish(&self, kind: ChangeKind, new_row: Option<NotificationRow>, old_id: Option<String>) {
        self.bus.publish(ChangeEvent {
            table: NOTIFICATIONS_TABLE.to_string(),
            kind,
            new_row,
            old_id,
        });
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    #[instrument(skip(self, draft), fields(category = %draft.category))]
    async fn create(
        &self,
        user_id: &str,
        draft: &NotificationDraft,
    ) -> Result<NotificationRow, StoreError> {
        let now = Utc::now().trunc_subsecs(6);
        let row = NotificationRow {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category: draft.category,
            priority: draft.priority,
            title: draft.title.clone(),
            message: draft.body.clone(),
            is_read: false,
            action_url: draft.action_url.clone(),
            metadata: draft.metadata.clone().map(serde_json::Value::Object),
            created_at: now,
            updated_at: now,
        };
        let metadata_json = row.metadata.as_ref().map(serde_json::to_string).transpose()?;

        warn_if_slow("notifications.create", SLOW_QUERY, async {
            sqlx::query(
                r#"
                INSERT INTO notifications (
                    id, user_id, type, priority, title, message,
                    is_read, action_url, metadata, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            )
            .bind(&row.id)
            .bind(&row.user_id)
            .bind(row.category.as_str())
            .bind(row.priority.as_str())
            .bind(&row.title)
            .bind(&row.message)
            .bind(row.is_read)
            .bind(&row.action_url)
            .bind(&metadata_json)
            .bind(fmt_ts(row.created_at))
            .bind(fmt_ts(row.updated_at))
            .execute(&self.pool)
            .await
        })
        .await?;

        debug!(id = %row.id, "notification row created");
        self.publish(ChangeKind::Insert, Some(row.clone()), None);
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn page(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<NotificationPage, StoreError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = u64::from(page - 1) * u64::from(limit);

        let (rows, total) = warn_if_slow("notifications.page", SLOW_QUERY, async {
            let rows = sqlx::query(
                "SELECT * FROM notifications WHERE user_id = ? \
                 ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            )
            .bind(user_id)
            .bind(i64::from(limit))
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

            let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM notifications WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
                .get("total");

            Ok::<_, sqlx::Error>((rows, total as u64))
        })
        .await?;

        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        let has_next = offset + (rows.len() as u64) < total;

        Ok(NotificationPage {
            rows,
            total,
            page,
            limit,
            has_next,
            has_prev: page > 1,
        })
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: &str) -> Result<NotificationRow, StoreError> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1, updated_at = ? WHERE id = ?")
            .bind(fmt_ts(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let row = self.fetch_one(id).await?;
        self.publish(ChangeKind::Update, Some(row.clone()), None);
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self, user_id: &str) -> Result<u64, StoreError> {
        let now = Utc::now().trunc_subsecs(6);
        let mut tx = self.pool.begin().await?;

        let unread = sqlx::query("SELECT * FROM notifications WHERE user_id = ? AND is_read = 0")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("UPDATE notifications SET is_read = 1, updated_at = ? WHERE user_id = ? AND is_read = 0")
            .bind(fmt_ts(now))
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let changed = unread.len() as u64;
        for raw in &unread {
            let mut row = decode_row(raw)?;
            row.is_read = true;
            row.updated_at = now;
            self.publish(ChangeKind::Update, Some(row), None);
        }

        debug!(changed, "notifications marked read");
        Ok(changed)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        self.publish(ChangeKind::Delete, None, Some(id.to_string()));
        Ok(())
    }
}

fn decode_row(row: &SqliteRow) -> Result<NotificationRow, StoreError> {
    let category: String = row.get("type");
    let priority: String = row.get("priority");
    let metadata: Option<String> = row.get("metadata");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(NotificationRow {
        id: row.get("id"),
        user_id: row.get("user_id"),
        category: Category::from_str(&category)?,
        priority: Priority::from_str(&priority)?,
        title: row.get("title"),
        message: row.get("message"),
        is_read: row.get("is_read"),
        action_url: row.get("action_url"),
        metadata: metadata.as_deref().map(serde_json::from_str).transpose()?,
        created_at: parse_ts(created_at)?,
        updated_at: parse_ts(updated_at)?,
    })
}

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(value: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| StoreError::Timestamp { value, source })
}
