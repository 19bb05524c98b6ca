use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub scheduler: SchedulerSettings,
    pub notification_queue_capacity: usize,
    /// Snapshot file for the in-memory store; none means nothing is persisted.
    pub data_file: Option<PathBuf>,
    pub lifecycle: LifecycleConfig,
}

impl Default for Settings {
    fn default() -> Self {
        from_lookup(|_| None)
    }
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();
    from_lookup(|key| env::var(key).ok())
}

/// Builds settings from any key/value source. Unparseable values fall back to
/// their defaults.
pub fn from_lookup<F>(lookup: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
    let flag = |key: &str, default: bool| {
        lookup(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(default)
    };

    let defaults = LifecycleConfig::default();

    Settings {
        host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
        port: lookup("PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(3001),
        scheduler: SchedulerSettings {
            enabled: flag("SCHEDULER_ENABLED", true),
            interval: Duration::from_secs(parsed("SCHEDULER_INTERVAL_SECS").filter(|s| *s > 0).unwrap_or(60)),
        },
        notification_queue_capacity: parsed("NOTIFICATION_QUEUE_CAPACITY")
            .map(|n| n as usize)
            .filter(|n| *n > 0)
            .unwrap_or(1024),
        data_file: lookup("AUCTION_DATA_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        lifecycle: LifecycleConfig {
            bid_retry_limit: parsed("BID_RETRY_LIMIT")
                .map(|n| n as usize)
                .unwrap_or(defaults.bid_retry_limit),
            close_retry_limit: parsed("CLOSE_RETRY_LIMIT")
                .map(|n| n as usize)
                .unwrap_or(defaults.close_retry_limit),
        },
    }
}
