//! Concrete orchestration built on top of `domain::ports`. Each module here
//! is one of the ten execution-substrate components; composition happens
//! in the `cli` module, not here.

pub mod action_registry;
pub mod ask_action;
pub mod builtin_webhooks;
pub mod command_parser;
pub mod event_bus;
pub mod extension_loader;
pub mod job_manager;
pub mod notification;
pub mod planner;
pub mod scheduler;
pub mod watcher;
pub mod webhook_server;

pub use action_registry::ActionRegistry;
pub use ask_action::AskAction;
pub use builtin_webhooks::{CodeHostWebhook, QuicknodeWebhook};
pub use event_bus::EventBus;
pub use extension_loader::{ExtensionLoader, ExtensionRegistrationApi};
pub use job_manager::{JobManager, JobTask};
pub use notification::{CompositeNotifier, WebhookNotifier};
pub use planner::{Planner, PlannerConfig};
pub use scheduler::Scheduler;
pub use watcher::WatcherManager;
pub use webhook_server::WebhookServer;
