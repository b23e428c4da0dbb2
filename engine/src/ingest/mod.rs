//! Realtime ingestion.
//!
//! Three producers (local actions, the change feed, the socket) push
//! [`IngestEvent`]s onto one mpsc channel. A single [`Ingestor`] normalizes each
//! event into drafts, runs the settings filter and store admission through the
//! hub, then hands every admitted record to delivery and the entrance animation.

pub mod change_feed;
pub mod parser;
pub mod socket;

use std::sync::Arc;

use chrono::Utc;
use common::logger::{TraceId, child_span, root_span};
use corelib::models::{ChangeEvent, Notification, NotificationDraft, Priority};
use inbox::{Admitted, NotificationHub};
use parking_lot::Mutex;
use scheduler::{
    FrameLoop, Motion, MotionPreference, MotionSpec, RenderSink, RetryBoundary, TaskPriority,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

use crate::delivery::DeliveryDispatcher;

pub use change_feed::{draft_from_change, spawn_change_feed_producer};
pub use parser::{FrameParseError, SocketFrame, parse_frame};
pub use socket::spawn_socket_producer;

#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    Local(NotificationDraft),
    Change(ChangeEvent),
    SocketFrame(String),
}

impl IngestEvent {
    pub fn source(&self) -> &'static str {
        match self {
            IngestEvent::Local(_) => "local",
            IngestEvent::Change(_) => "change_feed",
            IngestEvent::SocketFrame(_) => "socket",
        }
    }

    /// Malformed socket frames are logged and yield nothing.
    pub fn into_drafts(self) -> Vec<NotificationDraft> {
        match self {
            IngestEvent::Local(draft) => vec![draft],
            IngestEvent::Change(event) => draft_from_change(&event).into_iter().collect(),
            IngestEvent::SocketFrame(raw) => match parse_frame(&raw) {
                Ok(Some(frame)) => {
                    debug!(kind = frame.kind(), "socket frame received");
                    frame.into_drafts()
                }
                Ok(None) => Vec::new(),
                Err(e) => {
                    warn!(error = %e, "dropping malformed socket frame");
                    Vec::new()
                }
            },
        }
    }
}

/// Queues the slide-down entrance of each admitted notification on the frame loop.
///
/// A failed render is handed to a [`RetryBoundary`] that retries it after 1s,
/// 2s and 4s on a background task.
#[derive(Clone)]
pub struct EntranceAnimator {
    frames: FrameLoop,
    sink: Arc<dyn RenderSink>,
    retries: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl EntranceAnimator {
    pub fn new(frames: FrameLoop, sink: Arc<dyn RenderSink>) -> Self {
        Self {
            frames,
            sink,
            retries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn band(priority: Priority) -> TaskPriority {
        match priority {
            Priority::High => TaskPriority::High,
            Priority::Medium => TaskPriority::Normal,
            Priority::Low => TaskPriority::Low,
        }
    }

    pub fn animate(&self, notification: &Notification) {
        let sink = Arc::clone(&self.sink);
        let retries = Arc::clone(&self.retries);
        let motion: MotionPreference = self.frames.motion().clone();
        let target = format!("notification-{}", notification.id);

        let queued = self.frames.enqueue(
            move || {
                let spec = Motion::SlideDown.spec_for(&motion);
                if let Err(e) = sink.animate(&target, &spec) {
                    schedule_retry(&retries, sink, target, spec, e);
                }
            },
            Self::band(notification.priority),
        );
        if let Err(e) = queued {
            debug!(error = %e, "entrance animation skipped");
        }
    }

    /// Retries still waiting or running.
    pub fn pending_retries(&self) -> usize {
        let mut retries = self.retries.lock();
        retries.retain(|h| !h.is_finished());
        retries.len()
    }

    pub fn teardown(&self) {
        for handle in self.retries.lock().drain(..) {
            handle.abort();
        }
    }
}

fn schedule_retry(
    retries: &Mutex<Vec<JoinHandle<()>>>,
    sink: Arc<dyn RenderSink>,
    target: String,
    spec: MotionSpec,
    error: anyhow::Error,
) {
    let mut boundary = RetryBoundary::default();
    let Some(delay) = boundary.on_error(format!("{error:#}")) else {
        return;
    };
    let Ok(runtime) = Handle::try_current() else {
        warn!(element = %target, "no runtime for render retry; giving up");
        return;
    };

    let handle = runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        boundary.on_retry_elapsed();
        match boundary.render_with_retry(|| sink.animate(&target, &spec)).await {
            Ok(()) => debug!(element = %target, "entrance animation recovered"),
            Err(e) => warn!(error = %e, element = %target, "entrance animation needs a manual retry"),
        }
    });

    let mut retries = retries.lock();
    retries.retain(|h| !h.is_finished());
    retries.push(handle);
}

pub struct Ingestor {
    hub: NotificationHub,
    dispatcher: Arc<DeliveryDispatcher>,
    animator: Option<EntranceAnimator>,
}

impl Ingestor {
    pub fn new(hub: NotificationHub, dispatcher: Arc<DeliveryDispatcher>) -> Self {
        Self {
            hub,
            dispatcher,
            animator: None,
        }
    }

    pub fn with_animator(mut self, animator: EntranceAnimator) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn dispatcher(&self) -> &DeliveryDispatcher {
        &self.dispatcher
    }

    /// Consumes events until every producer has dropped its sender.
    pub async fn run(self, mut rx: mpsc::Receiver<IngestEvent>) {
        let trace_id = TraceId::new();
        async move {
            info!("ingestor started");
            while let Some(event) = rx.recv().await {
                self.handle(event);
            }
            info!("ingest channel closed; ingestor stopping");
        }
        .instrument(root_span("ingestor", &trace_id))
        .await
    }

    /// Normalize, filter, admit, deliver. Returns the admitted records.
    pub fn handle(&self, event: IngestEvent) -> Vec<Notification> {
        let _span = child_span("ingest_event").entered();
        let source = event.source();
        let drafts = event.into_drafts();
        if drafts.is_empty() {
            return Vec::new();
        }

        let Admitted {
            notifications,
            settings,
        } = self.hub.admit_drafts(drafts, Utc::now());
        debug!(source, admitted = notifications.len(), "ingest event handled");

        for notification in &notifications {
            let report = self.dispatcher.deliver(notification, &settings);
            if !report.failures.is_empty() {
                debug!(id = %notification.id, failures = report.failures.len(), "delivery degraded");
            }
            if let Some(animator) = &self.animator {
                animator.animate(notification);
            }
        }
        notifications
    }
}
