//! Command-line entry point: the composition root.
//!
//! Everything under `domain`/`services`/`infrastructure` is wired together
//! here and nowhere else. The CLI surface itself is out of scope for the
//! execution substrate proper — a single `server start` command that loads
//! configuration, runs migrations, starts watchers and the webhook server,
//! and blocks until a termination signal.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::infrastructure::config::{Config, ConfigLoader};
use crate::infrastructure::database::{DatabaseConnection, DatabaseNotifier, SqliteEventLogStore, SqliteJobStore, SqliteScheduleStore, SqliteWatcherStateStore};
use crate::infrastructure::llm::AnthropicClient;
use crate::infrastructure::logging::{LogConfig, LogFormat, LoggerImpl, RotationPolicy};
use crate::services::{ActionRegistry, AskAction, CodeHostWebhook, CompositeNotifier, EventBus, ExtensionLoader, JobManager, Planner, QuicknodeWebhook, Scheduler, WatcherManager, WebhookNotifier, WebhookServer};

#[derive(Parser)]
#[command(name = "sentryd")]
#[command(about = "Execution substrate for an autonomous web3 security research agent", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Server lifecycle commands.
    #[command(subcommand)]
    Server(ServerCommands),
}

#[derive(Subcommand)]
pub enum ServerCommands {
    /// Load configuration, start watchers and the webhook server, and run
    /// until a termination signal.
    Start,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Server(ServerCommands::Start) => handle_server_start().await,
    }
}

fn log_config_from(config: &Config) -> anyhow::Result<LogConfig> {
    let format = match config.logging.format.as_str() {
        "json" => LogFormat::Json,
        "pretty" => LogFormat::Pretty,
        other => anyhow::bail!("unknown log format: {other}"),
    };

    Ok(LogConfig {
        level: config.logging.level.clone(),
        format,
        log_dir: config.logging.log_dir.clone().map(std::path::PathBuf::from),
        enable_stdout: true,
        rotation: RotationPolicy::Daily,
        retention_days: i64::from(config.logging.retention_days),
    })
}

async fn handle_server_start() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _logger = LoggerImpl::init(&log_config_from(&config)?).context("failed to initialize logging")?;

    tracing::info!("starting sentryd server");

    let database_url = format!("sqlite:{}", config.database.path);
    let db = DatabaseConnection::new(&database_url).await.context("failed to connect to database")?;
    db.migrate().await.context("failed to run database migrations")?;

    let job_store = Arc::new(SqliteJobStore::new(db.pool().clone()));
    let event_log_store = Arc::new(SqliteEventLogStore::new(db.pool().clone()));
    let schedule_store = Arc::new(SqliteScheduleStore::new(db.pool().clone()));
    let watcher_state_store = Arc::new(SqliteWatcherStateStore::new(db.pool().clone()));

    let mut notification_targets: Vec<Arc<dyn crate::domain::ports::Notifier>> = vec![Arc::new(DatabaseNotifier::new(db.pool().clone()))];
    if let Some(webhook_url) = &config.notifications.webhook_url {
        notification_targets.push(Arc::new(WebhookNotifier::new(webhook_url, config.notifications.webhook_timeout_secs)?));
    }
    let notifier = Arc::new(CompositeNotifier::new(notification_targets));

    let event_bus = Arc::new(EventBus::new(event_log_store));
    let actions = Arc::new(ActionRegistry::new());
    let jobs = Arc::new(JobManager::new(job_store, notifier));

    let extension_loader = ExtensionLoader::new(actions.clone(), event_bus.clone());
    let watchers = extension_loader.load(&config.extensions).await;

    let mut webhook_server = WebhookServer::new();
    webhook_server.register("quicknode", Arc::new(QuicknodeWebhook::new(event_bus.clone())));
    webhook_server.register("github", Arc::new(CodeHostWebhook::new(event_bus.clone())));
    for watcher in &watchers {
        watcher.register_routes(&mut webhook_server);
    }

    let watcher_manager = Arc::new(WatcherManager::new(jobs.clone(), event_bus.clone(), watcher_state_store));
    watcher_manager.start(watchers).await.context("failed to start watchers")?;

    let scheduler = Arc::new(Scheduler::new(actions.clone(), schedule_store));
    scheduler.start().await.context("failed to start scheduler")?;

    webhook_server.start(&config.webhook.bind_address, config.webhook.port).await.context("failed to start webhook server")?;

    if !config.llm.api_key.is_empty() {
        let llm = Arc::new(AnthropicClient::new(
            config.llm.api_key.clone(),
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            config.llm.max_tokens,
            config.llm.timeout_secs,
        )?);
        let planner = Arc::new(Planner::new(actions.clone(), jobs.clone(), llm));
        actions.register("ask", AskAction::spec(), Arc::new(AskAction::new(planner))).await.context("failed to register ask action")?;
    }

    tracing::info!(bind = %config.webhook.bind_address, port = config.webhook.port, "sentryd server is running");

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    tracing::info!("received shutdown signal, stopping sentryd server");

    webhook_server.stop().await;
    scheduler.stop().await;
    watcher_manager.stop().await.context("failed to stop watchers")?;

    Ok(())
}
