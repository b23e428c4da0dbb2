use corelib::models::{ChangeEvent, ChangeKind, NotificationDraft};
use inbox::repository::ChangeStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info};

use super::IngestEvent;

/// Only inserts produce notifications; updates and deletes are echoes of
/// actions the user already took.
pub fn draft_from_change(event: &ChangeEvent) -> Option<NotificationDraft> {
    match (event.kind, &event.new_row) {
        (ChangeKind::Insert, Some(row)) => Some(row.to_draft()),
        _ => None,
    }
}

/// Forwards every change event for the subscribed user into ingestion until the
/// feed or the channel closes.
pub fn spawn_change_feed_producer(
    mut stream: ChangeStream,
    tx: mpsc::Sender<IngestEvent>,
) -> JoinHandle<()> {
    let span = tracing::info_span!("change_feed", filter = %stream.filter());
    tokio::spawn(
        async move {
            while let Some(event) = stream.next().await {
                debug!(kind = ?event.kind, "change event received");
                if tx.send(IngestEvent::Change(event)).await.is_err() {
                    debug!("ingestion closed; stopping change feed producer");
                    return;
                }
            }
            info!("change feed closed");
        }
        .instrument(span),
    )
}
