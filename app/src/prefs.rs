//! Plain key/value preferences: theme and the first-run welcome flag.

use std::fmt;
use std::str::FromStr;

use corelib::storage::{KeyValueStore, StorageError};
use tracing::warn;

pub const THEME_KEY: &str = "signaldesk-theme";
pub const WELCOME_KEY: &str = "signaldesk-welcome-seen";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Unknown stored values fall back to the default theme.
pub fn load_theme(store: &dyn KeyValueStore) -> Result<Theme, StorageError> {
    Ok(match store.get(THEME_KEY)? {
        Some(raw) => raw.parse().unwrap_or_else(|e: String| {
            warn!(error = %e, "ignoring stored theme");
            Theme::default()
        }),
        None => Theme::default(),
    })
}

pub fn save_theme(store: &dyn KeyValueStore, theme: Theme) -> Result<(), StorageError> {
    store.set(THEME_KEY, theme.as_str())
}

pub fn welcome_seen(store: &dyn KeyValueStore) -> Result<bool, StorageError> {
    Ok(store.get(WELCOME_KEY)?.as_deref() == Some("true"))
}

pub fn mark_welcome_seen(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.set(WELCOME_KEY, "true")
}
