//! User-defined price alerts, persisted client-side as a JSON array.
//!
//! Every operation announces itself through the local producer, including the
//! validation failure on a bad target price.

use std::sync::Arc;

use chrono::Utc;
use corelib::models::{AlertCondition, Category, Metadata, NotificationDraft, NotificationId, PriceAlert, Priority};
use corelib::storage::{KeyValueStore, StorageError, load_json, save_json};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::local::{self, LocalProducer};

pub const ALERTS_KEY: &str = "signaldesk-price-alerts";
pub const DEFAULT_SYMBOL: &str = "BTM";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("invalid target price: {0:?}")]
    InvalidPrice(String),

    #[error("price alert not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct PriceAlertBook {
    storage: Arc<dyn KeyValueStore>,
    producer: LocalProducer,
    alerts: Vec<PriceAlert>,
}

/// Accepts finite decimal text, surrounding whitespace allowed.
fn parse_target(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl PriceAlertBook {
    /// Loads persisted alerts. Unreadable data is logged and replaced by an
    /// empty book on the next write.
    pub fn load(storage: Arc<dyn KeyValueStore>, producer: LocalProducer) -> Self {
        let alerts = match load_json::<Vec<PriceAlert>>(storage.as_ref(), ALERTS_KEY) {
            Ok(alerts) => alerts.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "stored price alerts unreadable; starting empty");
                Vec::new()
            }
        };
        Self {
            storage,
            producer,
            alerts,
        }
    }

    /// Newest first.
    pub fn alerts(&self) -> &[PriceAlert] {
        &self.alerts
    }

    pub fn get(&self, id: &str) -> Option<&PriceAlert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Writes `next` and only then adopts it; a failed write leaves the book as
    /// it was.
    fn commit(&mut self, next: Vec<PriceAlert>) -> Result<(), AlertError> {
        save_json(self.storage.as_ref(), ALERTS_KEY, &next)?;
        self.alerts = next;
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize, AlertError> {
        self.alerts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| AlertError::NotFound(id.to_string()))
    }

    /// An empty `symbol` falls back to [`DEFAULT_SYMBOL`].
    pub fn create(
        &mut self,
        symbol: &str,
        condition: AlertCondition,
        target_price: &str,
    ) -> Result<PriceAlert, AlertError> {
        let Some(target) = parse_target(target_price) else {
            self.producer.try_push(local::system(
                "Invalid Price",
                "Please enter a valid target price",
                Priority::Low,
            ));
            return Err(AlertError::InvalidPrice(target_price.to_string()));
        };

        let symbol = match symbol.trim() {
            "" => DEFAULT_SYMBOL,
            s => s,
        };
        let now = Utc::now();
        let alert = PriceAlert {
            id: NotificationId::generate(now).to_string(),
            symbol: symbol.to_string(),
            condition,
            target_price: target,
            is_active: true,
            created_at: now,
            triggered_at: None,
        };

        let mut next = Vec::with_capacity(self.alerts.len() + 1);
        next.push(alert.clone());
        next.extend(self.alerts.iter().cloned());
        self.commit(next)?;
        info!(id = %alert.id, symbol = %alert.symbol, "price alert created");

        self.producer.try_push(NotificationDraft::new(
            Category::Price,
            Priority::Low,
            "Price Alert Created",
            format!("Alert set for {} {} ${}", alert.symbol, alert.condition, alert.target_price),
        ));
        Ok(alert)
    }

    /// Flips `is_active`; returns the new value.
    pub fn toggle(&mut self, id: &str) -> Result<bool, AlertError> {
        let idx = self.position(id)?;
        let mut next = self.alerts.clone();
        next[idx].is_active = !next[idx].is_active;
        let active = next[idx].is_active;
        self.commit(next)?;
        Ok(active)
    }

    pub fn delete(&mut self, id: &str) -> Result<PriceAlert, AlertError> {
        let idx = self.position(id)?;
        let mut next = self.alerts.clone();
        let removed = next.remove(idx);
        self.commit(next)?;

        self.producer.try_push(local::system(
            "Alert Deleted",
            "Price alert has been removed",
            Priority::Low,
        ));
        Ok(removed)
    }

    /// Fires a high-priority notification as if the alert had been crossed.
    pub fn test_fire(&self, id: &str) -> Result<(), AlertError> {
        let alert = &self.alerts[self.position(id)?];
        let mut metadata = Metadata::new();
        metadata.insert(
            "alert".to_string(),
            serde_json::to_value(alert).map_err(StorageError::from)?,
        );
        metadata.insert("isTest".to_string(), json!(true));

        self.producer.try_push(
            NotificationDraft::new(
                Category::Price,
                Priority::High,
                format!("Price Alert: {}", alert.symbol),
                format!(
                    "{} is now {} ${} (Test Alert)",
                    alert.symbol, alert.condition, alert.target_price
                ),
            )
            .with_metadata(metadata),
        );
        Ok(())
    }
}
