//! Delivery dispatcher
//! -------------------
//! Side channels for an admitted notification: a sound cue for high-priority
//! records and an OS banner when push is on and permission was granted. Channel
//! failures are logged and reported, never propagated; the record stays in the
//! store either way.
//!
//! Showing a banner can block on the platform daemon, so it runs on the
//! blocking pool and [`DeliveryDispatcher::deliver`] returns before it lands.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use adapters::desktop::{Banner, BannerHandle, BannerPresenter, Permission, SoundCue, SoundPlayer};
use corelib::models::{Notification, NotificationId, NotificationSettings, Priority};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::{self, JoinHandle};
use tracing::{Instrument, debug, info, warn};

pub const SOUND_VOLUME: f32 = 0.3;
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(5);
pub const BANNER_TAG: &str = "signaldesk-notification";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("sound playback failed: {0:#}")]
    Sound(anyhow::Error),

    #[error("banner could not be shown: {0:#}")]
    Banner(anyhow::Error),
}

/// What [`DeliveryDispatcher::deliver`] did for one notification.
///
/// Banner failures surface later, in the log, since the banner is shown off
/// the caller's task.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub sound_played: bool,
    pub banner_queued: bool,
    pub failures: Vec<DeliveryError>,
}

#[derive(Default)]
struct Banners {
    showing: Vec<JoinHandle<()>>,
    timers: HashMap<BannerHandle, JoinHandle<()>>,
    closed: bool,
}

pub struct DeliveryDispatcher {
    sound: Arc<dyn SoundPlayer>,
    banner: Arc<dyn BannerPresenter>,
    banners: Arc<Mutex<Banners>>,
}

impl DeliveryDispatcher {
    pub fn new(sound: Arc<dyn SoundPlayer>, banner: Arc<dyn BannerPresenter>) -> Self {
        Self {
            sound,
            banner,
            banners: Arc::new(Mutex::new(Banners::default())),
        }
    }

    /// Asks for banner permission once, when push is on and the user has not
    /// answered yet.
    pub fn prepare(&self, settings: &NotificationSettings) -> Permission {
        let permission = self.banner.permission();
        if settings.push_notifications && permission == Permission::Default {
            return self.banner.request_permission();
        }
        permission
    }

    /// Must be called from within a tokio runtime: the banner and its
    /// auto-dismiss run on spawned tasks.
    pub fn deliver(&self, notification: &Notification, settings: &NotificationSettings) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if settings.sound_enabled && notification.priority == Priority::High {
            match self.sound.play(SoundCue { volume: SOUND_VOLUME }) {
                Ok(()) => report.sound_played = true,
                Err(e) => {
                    debug!(error = ?e, id = %notification.id, "notification sound failed");
                    report.failures.push(DeliveryError::Sound(e));
                }
            }
        }

        if settings.push_notifications && self.banner.permission() == Permission::Granted {
            let banner = Banner {
                tag: BANNER_TAG.to_string(),
                title: notification.title.clone(),
                body: notification.body.clone(),
                timeout: BANNER_TIMEOUT,
            };
            report.banner_queued = self.spawn_banner(notification.id.clone(), banner);
        }

        report
    }

    fn spawn_banner(&self, id: NotificationId, banner: Banner) -> bool {
        let mut state = self.banners.lock();
        if state.closed {
            return false;
        }

        let presenter = Arc::clone(&self.banner);
        let banners = Arc::clone(&self.banners);
        let show = async move {
            let shown = task::spawn_blocking({
                let presenter = Arc::clone(&presenter);
                move || presenter.show(&banner)
            })
            .await;
            match shown {
                Ok(Ok(handle)) => schedule_dismiss(&banners, presenter, handle),
                Ok(Err(e)) => {
                    let err = DeliveryError::Banner(e);
                    warn!(error = %err, id = %id, "banner delivery failed");
                }
                Err(e) => warn!(error = %e, id = %id, "banner worker did not finish"),
            }
        };
        let showing = tokio::spawn(show.in_current_span());

        state.showing.retain(|h| !h.is_finished());
        state.showing.push(showing);
        true
    }

    /// Waits until every banner queued so far has been shown or has failed.
    pub async fn flush(&self) {
        let showing: Vec<_> = self.banners.lock().showing.drain(..).collect();
        for handle in showing {
            let _ = handle.await;
        }
    }

    /// Click on a banner: focus the application and close the banner now.
    pub fn on_banner_click(&self, handle: BannerHandle) {
        if let Some(timer) = self.banners.lock().timers.remove(&handle) {
            timer.abort();
        }
        self.banner.focus_app();
        self.banner.close(handle);
    }

    pub fn open_banners(&self) -> usize {
        self.banners.lock().timers.len()
    }

    /// Aborts banners still being shown and every pending auto-dismiss timer.
    /// Later deliveries skip the banner channel.
    pub fn teardown(&self) {
        let (showing, timers) = {
            let mut state = self.banners.lock();
            state.closed = true;
            (
                std::mem::take(&mut state.showing),
                std::mem::take(&mut state.timers),
            )
        };
        if !timers.is_empty() {
            info!(pending = timers.len(), "aborting banner timers");
        }
        for handle in showing.into_iter().chain(timers.into_values()) {
            handle.abort();
        }
    }
}

fn schedule_dismiss(banners: &Arc<Mutex<Banners>>, presenter: Arc<dyn BannerPresenter>, handle: BannerHandle) {
    let mut state = banners.lock();
    if state.closed {
        return;
    }
    let timers = Arc::clone(banners);
    let timer = tokio::spawn(async move {
        tokio::time::sleep(BANNER_TIMEOUT).await;
        timers.lock().timers.remove(&handle);
        presenter.close(handle);
    });
    if let Some(previous) = state.timers.insert(handle, timer) {
        previous.abort();
    }
}
