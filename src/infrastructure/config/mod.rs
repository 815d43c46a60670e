//! Hierarchical configuration: programmatic defaults, a project config file,
//! an optional local override file, and environment variables, in that
//! order of increasing precedence.

mod loader;
mod settings;

pub use loader::{ConfigError, ConfigLoader};
pub use settings::{Config, DatabaseConfig, ExtensionsConfig, LlmConfig, LoggingConfig, NotificationConfig, WebhookConfig};
