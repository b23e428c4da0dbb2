//! OS-facing delivery channels: banners and audio cues.

pub mod banner;
pub mod sound;

use std::fmt;
use std::time::Duration;

pub use banner::NotifyRustBanner;
pub use sound::TerminalBell;

/// OS notification permission, as reported by the banner collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Permission::Default => "default",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    /// Replacing tag; a second banner with the same tag replaces the first.
    pub tag: String,
    pub title: String,
    pub body: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BannerHandle(pub u32);

pub trait BannerPresenter: Send + Sync {
    fn permission(&self) -> Permission;
    fn request_permission(&self) -> Permission;
    fn show(&self, banner: &Banner) -> anyhow::Result<BannerHandle>;
    fn close(&self, handle: BannerHandle);
    /// Brings the application window to the foreground.
    fn focus_app(&self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundCue {
    pub volume: f32,
}

pub trait SoundPlayer: Send + Sync {
    fn play(&self, cue: SoundCue) -> anyhow::Result<()>;
}
