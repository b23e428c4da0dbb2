use std::sync::atomic::{AtomicU32, Ordering};

use notify_rust::{Notification, Timeout};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{Banner, BannerHandle, BannerPresenter, Permission};

/// Desktop banners through the platform notification daemon.
///
/// Desktop daemons never prompt, so requesting permission grants it unless the
/// user opted out with [`NotifyRustBanner::deny`]. Closing relies on the
/// banner's own timeout.
pub struct NotifyRustBanner {
    app_name: String,
    permission: Mutex<Permission>,
    next_handle: AtomicU32,
}

impl NotifyRustBanner {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            permission: Mutex::new(Permission::Default),
            next_handle: AtomicU32::new(1),
        }
    }

    pub fn deny(&self) {
        *self.permission.lock() = Permission::Denied;
    }
}

impl BannerPresenter for NotifyRustBanner {
    fn permission(&self) -> Permission {
        *self.permission.lock()
    }

    fn request_permission(&self) -> Permission {
        let mut permission = self.permission.lock();
        if *permission == Permission::Default {
            *permission = Permission::Granted;
        }
        info!(permission = %*permission, "notification permission resolved");
        *permission
    }

    fn show(&self, banner: &Banner) -> anyhow::Result<BannerHandle> {
        Notification::new()
            .appname(&self.app_name)
            .summary(&banner.title)
            .body(&banner.body)
            .timeout(Timeout::Milliseconds(banner.timeout.as_millis() as u32))
            .show()?;

        let handle = BannerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        debug!(tag = %banner.tag, handle = handle.0, "banner shown");
        Ok(handle)
    }

    fn close(&self, handle: BannerHandle) {
        debug!(handle = handle.0, "banner closed");
    }

    fn focus_app(&self) {
        debug!(app = %self.app_name, "focus requested");
    }
}
