//! Narrow interfaces consumers depend on. Concrete wiring happens only in
//! the composition root (`cli`/`main`); nothing below this module knows
//! about SQLite, axum, or the Anthropic API.

pub mod action;
pub mod handler;
pub mod llm;
pub mod notifier;
pub mod stores;
pub mod watcher;
pub mod webhook;

pub use action::{ActionArgs, ActionHandler, ActionOutcome};
pub use handler::EventHandler;
pub use llm::{ChatMessage, ChatRole, LlmClient};
pub use notifier::Notifier;
pub use stores::{EventLogStore, JobStore, ScheduleStore, WatcherStateStore};
pub use watcher::{WatcherCycle, WatcherJob};
pub use webhook::{WebhookHandler, WebhookRouter};
