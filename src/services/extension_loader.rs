//! Extension loader (C9): manifest-driven explicit registration.
//!
//! Rust has no runtime module loading, so the directory-scan-and-import
//! idiom this is grounded on becomes a two-step lookup instead: each active
//! extension directory carries an `extension.yaml` naming a registration
//! function, which is resolved from a compiled-in table of known
//! extensions rather than discovered by reflection. One extension's
//! registration failure is caught and logged; the rest continue.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::ActionSpec;
use crate::domain::ports::{ActionHandler, EventHandler, WatcherJob};
use crate::infrastructure::config::ExtensionsConfig;
use crate::services::action_registry::ActionRegistry;
use crate::services::event_bus::EventBus;

/// What an extension's `extension.yaml` declares.
#[derive(Debug, Clone, Deserialize)]
struct ExtensionManifest {
    name: String,
    entry_point: String,
}

/// Handed to a registration function so it can add its actions, handlers,
/// and watchers without knowing how the surrounding system is wired.
pub struct ExtensionRegistrationApi {
    actions: Arc<ActionRegistry>,
    event_bus: Arc<EventBus>,
    discovered_watchers: Mutex<Vec<Arc<dyn WatcherJob>>>,
}

impl ExtensionRegistrationApi {
    pub async fn register_action(&self, name: &str, spec: ActionSpec, handler: Arc<dyn ActionHandler>) -> CoreResult<()> {
        self.actions.register(name, spec, handler).await
    }

    pub async fn register_handler(&self, handler: Arc<dyn EventHandler>) {
        self.event_bus.subscribe(handler).await;
    }

    pub async fn register_watcher(&self, watcher: Arc<dyn WatcherJob>) {
        self.discovered_watchers.lock().await.push(watcher);
    }
}

/// A registration function an extension exposes. Resolved by name from the
/// compiled-in table below, never loaded reflectively. Plain `fn` pointers
/// can't be `async fn`, so implementations that need to await
/// `ExtensionRegistrationApi`'s methods do so via `futures::executor::block_on`.
type RegistrationFn = fn(&ExtensionRegistrationApi) -> CoreResult<()>;

/// The compiled-in set of known extension entry points. Extending the
/// system with a new extension means adding a module and a row here, the
/// Rust equivalent of the base crate's reflective directory scan.
fn builtin_registrations() -> HashMap<&'static str, RegistrationFn> {
    HashMap::new()
}

pub struct ExtensionLoader {
    actions: Arc<ActionRegistry>,
    event_bus: Arc<EventBus>,
    registrations: HashMap<&'static str, RegistrationFn>,
}

impl ExtensionLoader {
    pub fn new(actions: Arc<ActionRegistry>, event_bus: Arc<EventBus>) -> Self {
        Self {
            actions,
            event_bus,
            registrations: builtin_registrations(),
        }
    }

    #[cfg(test)]
    fn with_registrations(actions: Arc<ActionRegistry>, event_bus: Arc<EventBus>, registrations: HashMap<&'static str, RegistrationFn>) -> Self {
        Self { actions, event_bus, registrations }
    }

    /// Load every extension named in `config.active`, returning the
    /// watchers any of them registered (for the caller to hand to
    /// `WatcherManager::start`). A missing manifest, unreadable YAML, an
    /// unknown entry point, or a registration function returning an error
    /// are all logged and skipped rather than aborting the whole load.
    pub async fn load(&self, config: &ExtensionsConfig) -> Vec<Arc<dyn WatcherJob>> {
        let api = ExtensionRegistrationApi {
            actions: self.actions.clone(),
            event_bus: self.event_bus.clone(),
            discovered_watchers: Mutex::new(Vec::new()),
        };

        let base = Path::new(&config.directory);
        for name in &config.active {
            if let Err(e) = self.load_one(base, name, &api).await {
                warn!(extension = %name, error = %e, "skipping extension that failed to load");
                continue;
            }
            info!(extension = %name, "extension loaded");
        }

        api.discovered_watchers.into_inner()
    }

    async fn load_one(&self, base: &Path, name: &str, api: &ExtensionRegistrationApi) -> CoreResult<()> {
        let manifest_path = base.join(name).join("extension.yaml");
        let raw = std::fs::read_to_string(&manifest_path)
            .map_err(|e| CoreError::Config(format!("reading {}: {e}", manifest_path.display())))?;
        let manifest: ExtensionManifest =
            serde_yaml::from_str(&raw).map_err(|e| CoreError::Config(format!("parsing {}: {e}", manifest_path.display())))?;

        let register = self
            .registrations
            .get(manifest.entry_point.as_str())
            .ok_or_else(|| CoreError::Config(format!("unknown extension entry point '{}'", manifest.entry_point)))?;

        register(api).map_err(|e| {
            error!(extension = %manifest.name, error = %e, "extension registration function failed");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ActionArgs, ActionOutcome};
    use crate::infrastructure::database::{DatabaseConnection, SqliteEventLogStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Dummy;

    #[async_trait]
    impl ActionHandler for Dummy {
        async fn call(&self, _args: ActionArgs) -> CoreResult<ActionOutcome> {
            Ok(ActionOutcome::Text("ok".to_string()))
        }
    }

    fn register_probe(api: &ExtensionRegistrationApi) -> CoreResult<()> {
        futures::executor::block_on(api.register_action(
            "probe",
            ActionSpec {
                name: "probe".to_string(),
                description: String::new(),
                help_text: String::new(),
                agent_hint: String::new(),
                arguments: vec![],
            },
            Arc::new(Dummy),
        ))
    }

    fn register_failing(_api: &ExtensionRegistrationApi) -> CoreResult<()> {
        Err(CoreError::Config("deliberately broken extension".to_string()))
    }

    async fn fresh_deps() -> (Arc<ActionRegistry>, Arc<EventBus>) {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let event_log_store = Arc::new(SqliteEventLogStore::new(conn.pool().clone()));
        (Arc::new(ActionRegistry::new()), Arc::new(EventBus::new(event_log_store)))
    }

    #[tokio::test]
    async fn loads_a_known_extension_and_registers_its_action() {
        let (actions, event_bus) = fresh_deps().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("probe-ext")).unwrap();
        std::fs::write(dir.path().join("probe-ext/extension.yaml"), "name: probe-ext\nentry_point: probe\n").unwrap();

        let mut registrations: HashMap<&'static str, RegistrationFn> = HashMap::new();
        registrations.insert("probe", register_probe);

        let loader = ExtensionLoader::with_registrations(actions.clone(), event_bus, registrations);
        let config = ExtensionsConfig {
            directory: dir.path().to_string_lossy().to_string(),
            active: vec!["probe-ext".to_string()],
        };

        let watchers = loader.load(&config).await;
        assert!(watchers.is_empty());
        assert!(actions.get_spec("probe").await.is_some());
    }

    #[tokio::test]
    async fn one_failing_extension_does_not_block_the_others() {
        let (actions, event_bus) = fresh_deps().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("broken")).unwrap();
        std::fs::write(dir.path().join("broken/extension.yaml"), "name: broken\nentry_point: boom\n").unwrap();
        std::fs::create_dir_all(dir.path().join("probe-ext")).unwrap();
        std::fs::write(dir.path().join("probe-ext/extension.yaml"), "name: probe-ext\nentry_point: probe\n").unwrap();

        let mut registrations: HashMap<&'static str, RegistrationFn> = HashMap::new();
        registrations.insert("boom", register_failing);
        registrations.insert("probe", register_probe);

        let loader = ExtensionLoader::with_registrations(actions.clone(), event_bus, registrations);
        let config = ExtensionsConfig {
            directory: dir.path().to_string_lossy().to_string(),
            active: vec!["broken".to_string(), "probe-ext".to_string()],
        };

        loader.load(&config).await;
        assert!(actions.get_spec("probe").await.is_some());
    }

    #[tokio::test]
    async fn missing_manifest_is_skipped_not_fatal() {
        let (actions, event_bus) = fresh_deps().await;
        let dir = tempfile::tempdir().unwrap();

        let loader = ExtensionLoader::new(actions, event_bus);
        let config = ExtensionsConfig {
            directory: dir.path().to_string_lossy().to_string(),
            active: vec!["does-not-exist".to_string()],
        };

        let watchers = loader.load(&config).await;
        assert!(watchers.is_empty());
    }

    #[test]
    fn counter_sanity() {
        let calls = AtomicUsize::new(0);
        calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
