//! The shape of the project's configuration file and its defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::models::ScheduledActionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub webhook: WebhookConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
    pub extensions: ExtensionsConfig,
    pub notifications: NotificationConfig,
    /// Module paths the watcher subsystem is allowed to load watcher
    /// classes from.
    pub active_watchers: Vec<String>,
    /// Scheduled action instances, keyed by the name they're invoked under.
    pub scheduled_actions: HashMap<String, ScheduledActionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook: WebhookConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            llm: LlmConfig::default(),
            extensions: ExtensionsConfig::default(),
            notifications: NotificationConfig::default(),
            active_watchers: Vec::new(),
            scheduled_actions: HashMap::new(),
        }
    }
}

/// Outbound notification transport. The database-backed queue is always
/// active; `webhook_url`, when set, fans every message out to a chat
/// transport too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub port: u16,
    pub bind_address: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: ".sentryd/sentryd.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub log_dir: Option<String>,
    pub retention_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            log_dir: None,
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    pub directory: String,
    pub active: Vec<String>,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            directory: "extensions".to_string(),
            active: Vec::new(),
        }
    }
}
