//! Watcher checkpoint state (C5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Arbitrary structured checkpoint for one watched external key
/// (e.g. a repository URL or blockchain address), persisted so a restart
/// does not lose progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherState {
    pub watcher_name: String,
    pub external_key: String,
    pub checkpoint: serde_json::Value,
    pub last_check: DateTime<Utc>,
}

impl WatcherState {
    pub fn new(
        watcher_name: impl Into<String>,
        external_key: impl Into<String>,
        checkpoint: serde_json::Value,
    ) -> Self {
        Self {
            watcher_name: watcher_name.into(),
            external_key: external_key.into(),
            checkpoint,
            last_check: Utc::now(),
        }
    }
}
