//! Scheduled-action configuration and state (C7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single configured periodic invocation of an action, keyed by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub name: String,
    pub command_string: String,
    pub interval_minutes: u32,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
}

impl ScheduledAction {
    pub fn new(
        name: impl Into<String>,
        command_string: impl Into<String>,
        interval_minutes: u32,
        enabled: bool,
    ) -> Self {
        Self {
            name: name.into(),
            command_string: command_string.into(),
            interval_minutes,
            enabled,
            last_run: None,
        }
    }
}

/// The shape a `scheduled_actions` config block parses into.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledActionConfig {
    pub command: String,
    pub interval_minutes: u32,
    #[serde(default)]
    pub enabled: bool,
}
