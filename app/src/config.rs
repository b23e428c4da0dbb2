use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// SQLite connection string for the notifications table.
    ///
    /// The file is created on first start.
    pub database_url: String,

    // =========================
    // Realtime sources
    // =========================
    /// WebSocket endpoint of the notification server.
    pub socket_url: String,

    /// Whether the socket producer runs at all.
    ///
    /// Off by default: a dashboard without a notification server still gets
    /// local and change-feed notifications.
    pub enable_socket: bool,

    /// Authenticated user. The change-feed producer subscribes with
    /// `user_id=eq.<id>`; without a user there is no change-feed producer.
    pub user_id: Option<String>,

    /// Connected wallet addresses, sent in the `authenticate` frame on every
    /// (re)connect. Comma separated in the environment.
    pub wallet_addresses: Vec<String>,

    // =========================
    // Client state
    // =========================
    /// JSON file holding theme, welcome flag and price alerts.
    ///
    /// Unset means process-local storage that is gone on exit.
    pub storage_path: Option<PathBuf>,

    // =========================
    // Animation scheduling
    // =========================
    /// Frame rate the performance monitor compares its trailing average against.
    ///
    /// Below it the scheduler steps down towards smaller, slower batches; well
    /// above it, back up. Fixed for the lifetime of the process.
    pub performance_threshold_fps: f64,

    /// Reduced-motion accessibility preference. Animations run synchronously
    /// with no transition.
    pub reduced_motion: bool,

    // =========================
    // Ingestion
    // =========================
    /// Capacity of the channel all producers share.
    ///
    /// Acts as backpressure: a slow ingestor makes producers wait instead of
    /// growing memory.
    pub ingest_queue_capacity: usize,

    /// `APP_ENV=production` switches logs to JSON lines.
    pub is_production: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://signaldesk.db".to_string(),
            socket_url: "ws://localhost:3001".to_string(),
            enable_socket: false,
            user_id: None,
            wallet_addresses: Vec::new(),
            storage_path: None,
            performance_threshold_fps: 30.0,
            reduced_motion: false,
            ingest_queue_capacity: 256,
            is_production: false,
        }
    }
}

fn var(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(None),
    }
}

fn flag(key: &'static str) -> Result<Option<bool>, ConfigError> {
    match var(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
        None => Ok(None),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cfg = Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            socket_url: var("SOCKET_URL").unwrap_or(defaults.socket_url),
            enable_socket: flag("ENABLE_SOCKET")?.unwrap_or(defaults.enable_socket),
            user_id: var("USER_ID"),
            wallet_addresses: var("WALLET_ADDRESSES")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            storage_path: var("STORAGE_PATH").map(PathBuf::from),
            performance_threshold_fps: parsed("PERFORMANCE_THRESHOLD_FPS")?
                .unwrap_or(defaults.performance_threshold_fps),
            reduced_motion: flag("REDUCED_MOTION")?.unwrap_or(defaults.reduced_motion),
            ingest_queue_capacity: parsed("INGEST_QUEUE_CAPACITY")?
                .unwrap_or(defaults.ingest_queue_capacity),
            is_production: var("APP_ENV").as_deref() == Some("production"),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.performance_threshold_fps.is_finite() && self.performance_threshold_fps > 0.0) {
            return Err(ConfigError::Invalid {
                key: "PERFORMANCE_THRESHOLD_FPS",
                value: self.performance_threshold_fps.to_string(),
            });
        }
        if self.ingest_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "INGEST_QUEUE_CAPACITY",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.performance_threshold_fps, 30.0);
        assert_eq!(cfg.ingest_queue_capacity, 256);
        assert!(!cfg.enable_socket);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = AppConfig {
            ingest_queue_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { key: "INGEST_QUEUE_CAPACITY", .. })
        ));
    }

    #[test]
    fn wallet_list_ignores_blanks() {
        assert_eq!(split_list(" 0xa, ,0xb,"), ["0xa", "0xb"]);
        assert!(split_list("").is_empty());
    }
}
