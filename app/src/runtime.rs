//! Process wiring: builds every component once, starts the producers and the
//! ingestor, and tears them down in order.

use std::sync::Arc;
use std::time::Duration;

use adapters::desktop::{BannerPresenter, NotifyRustBanner, SoundPlayer, TerminalBell};
use adapters::render::LogRenderSink;
use adapters::socket::{SocketClient, SocketExit, TungsteniteConnector, authenticate_frame};
use adapters::storage::FileKeyValueStore;
use anyhow::Context;
use corelib::models::{Priority, RowFilter, change_feed::NOTIFICATIONS_TABLE};
use corelib::storage::{KeyValueStore, MemoryStore};
use engine::ingest::{spawn_change_feed_producer, spawn_socket_producer};
use engine::local;
use engine::{DeliveryDispatcher, EntranceAnimator, Ingestor, LocalProducer, PriceAlertBook};
use inbox::NotificationHub;
use inbox::repository::sqlite::SqliteNotificationRepository;
use inbox::repository::{ChangeBus, ChangeFeed};
use scheduler::{FrameLoop, MotionPreference, RenderSink, SchedulerConfig};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::prefs;

pub const APP_NAME: &str = "SignalDesk";

/// How long shutdown waits for producers and the ingestor to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The host-facing collaborators.
pub struct Collaborators {
    pub sound: Arc<dyn SoundPlayer>,
    pub banner: Arc<dyn BannerPresenter>,
    pub render: Arc<dyn RenderSink>,
}

impl Collaborators {
    pub fn desktop() -> Self {
        Self {
            sound: Arc::new(TerminalBell),
            banner: Arc::new(NotifyRustBanner::new(APP_NAME)),
            render: Arc::new(LogRenderSink),
        }
    }
}

pub struct Runtime {
    hub: NotificationHub,
    frames: FrameLoop,
    animator: EntranceAnimator,
    motion: MotionPreference,
    producer: LocalProducer,
    dispatcher: Arc<DeliveryDispatcher>,
    storage: Arc<dyn KeyValueStore>,
    repository: Arc<SqliteNotificationRepository>,
    ingestor: JoinHandle<()>,
    change_feed: Option<JoinHandle<()>>,
    socket: Option<JoinHandle<SocketExit>>,
}

impl Runtime {
    #[instrument(skip_all, fields(user_id = ?cfg.user_id))]
    pub async fn start(cfg: &AppConfig, collaborators: Collaborators) -> anyhow::Result<Self> {
        let storage: Arc<dyn KeyValueStore> = match &cfg.storage_path {
            Some(path) => Arc::new(
                FileKeyValueStore::open(path)
                    .with_context(|| format!("opening client storage at {}", path.display()))?,
            ),
            None => Arc::new(MemoryStore::new()),
        };

        let repository = Arc::new(
            SqliteNotificationRepository::connect(&cfg.database_url, ChangeBus::default())
                .await
                .with_context(|| format!("opening notification database {}", cfg.database_url))?,
        );

        let motion = MotionPreference::new(cfg.reduced_motion);
        let frames = FrameLoop::spawn(
            SchedulerConfig {
                performance_threshold_fps: cfg.performance_threshold_fps,
                ..Default::default()
            },
            motion.clone(),
        );

        let hub = NotificationHub::default();
        let dispatcher = Arc::new(DeliveryDispatcher::new(
            collaborators.sound,
            collaborators.banner,
        ));
        let permission = dispatcher.prepare(&hub.select(|s| *s.settings()));
        info!(permission = %permission, "banner permission");

        let (tx, rx) = mpsc::channel(cfg.ingest_queue_capacity);
        let animator = EntranceAnimator::new(frames.clone(), collaborators.render);
        let ingestor =
            Ingestor::new(hub.clone(), Arc::clone(&dispatcher)).with_animator(animator.clone());
        let ingestor = tokio::spawn(ingestor.run(rx));

        let change_feed = match &cfg.user_id {
            Some(user_id) => {
                let stream = repository
                    .bus()
                    .subscribe(NOTIFICATIONS_TABLE, RowFilter::for_user(user_id))?;
                Some(spawn_change_feed_producer(stream, tx.clone()))
            }
            None => {
                info!("no user configured; change feed disabled");
                None
            }
        };

        let socket = if cfg.enable_socket {
            let hello = authenticate_frame(&cfg.wallet_addresses);
            let client = SocketClient::new(TungsteniteConnector, cfg.socket_url.clone(), hello);
            Some(spawn_socket_producer(client, tx.clone()))
        } else {
            None
        };

        info!(
            socket = cfg.enable_socket,
            change_feed = change_feed.is_some(),
            reduced_motion = cfg.reduced_motion,
            "runtime started"
        );

        Ok(Self {
            hub,
            frames,
            animator,
            motion,
            producer: LocalProducer::new(tx),
            dispatcher,
            storage,
            repository,
            ingestor,
            change_feed,
            socket,
        })
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    pub fn frames(&self) -> &FrameLoop {
        &self.frames
    }

    pub fn motion(&self) -> &MotionPreference {
        &self.motion
    }

    pub fn producer(&self) -> &LocalProducer {
        &self.producer
    }

    pub fn dispatcher(&self) -> &DeliveryDispatcher {
        &self.dispatcher
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    pub fn repository(&self) -> &SqliteNotificationRepository {
        &self.repository
    }

    /// Drop the book before [`Runtime::shutdown`]; it holds a producer.
    pub fn alert_book(&self) -> PriceAlertBook {
        PriceAlertBook::load(Arc::clone(&self.storage), self.producer.clone())
    }

    /// Posts the welcome notification once per storage. Returns whether it did.
    pub async fn greet_first_run(&self) -> anyhow::Result<bool> {
        if prefs::welcome_seen(self.storage())? {
            return Ok(false);
        }
        self.producer
            .push(local::system(
                "Welcome to SignalDesk",
                "Price, transaction and security notifications will appear here",
                Priority::Low,
            ))
            .await;
        prefs::mark_welcome_seen(self.storage())?;
        Ok(true)
    }

    /// Stops the socket, lets the change feed, the ingestor and queued banners
    /// drain, then cancels banner timers, render retries and the frame loop.
    pub async fn shutdown(self) {
        let Runtime {
            frames,
            animator,
            producer,
            dispatcher,
            repository,
            mut ingestor,
            change_feed,
            socket,
            ..
        } = self;

        if let Some(socket) = socket {
            socket.abort();
        }
        drop(producer);
        // The change feed ends once the repository, and with it the bus, is gone.
        drop(repository);

        if let Some(mut feed) = change_feed {
            if timeout(SHUTDOWN_GRACE, &mut feed).await.is_err() {
                warn!("change feed still open after grace period; aborting");
                feed.abort();
            }
        }
        if timeout(SHUTDOWN_GRACE, &mut ingestor).await.is_err() {
            warn!("ingestor still running after grace period; aborting");
            ingestor.abort();
        }

        if timeout(SHUTDOWN_GRACE, dispatcher.flush()).await.is_err() {
            warn!("banners still showing after grace period");
        }
        dispatcher.teardown();
        animator.teardown();
        frames.teardown();
        info!("runtime stopped");
    }
}
