//! In-process change feed.
//!
//! Every successful repository write is published on a broadcast channel;
//! subscribers see only events for their table that pass their row filter.

use corelib::models::{ChangeEvent, RowFilter};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::ChangeFeed;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }
}

impl ChangeBus {
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn watch(&self, table: &str, filter: RowFilter) -> ChangeStream {
        debug!(table, filter = %filter, "change feed subscribed");
        ChangeStream {
            rx: self.tx.subscribe(),
            table: table.to_string(),
            filter,
        }
    }
}

impl ChangeFeed for ChangeBus {
    fn subscribe(&self, table: &str, filter: RowFilter) -> anyhow::Result<ChangeStream> {
        Ok(self.watch(table, filter))
    }
}

pub struct ChangeStream {
    rx: broadcast::Receiver<ChangeEvent>,
    table: String,
    filter: RowFilter,
}

impl ChangeStream {
    pub fn filter(&self) -> &RowFilter {
        &self.filter
    }

    /// Next matching event, or `None` once the bus is gone.
    ///
    /// Deletes carry no row, so they only pass an `id` filter.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if event.table == self.table && self.passes(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, table = %self.table, "change feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn passes(&self, event: &ChangeEvent) -> bool {
        match &event.new_row {
            Some(row) => self.filter.matches(row),
            None => self.filter.column == "id" && event.old_id.as_deref() == Some(&self.filter.value),
        }
    }
}
