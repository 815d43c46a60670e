//! Action registry (C1): the authoritative name → (handler, spec) mapping.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::{ActionSpec, Command};
use crate::domain::ports::{ActionArgs, ActionHandler, ActionOutcome};
use crate::services::command_parser;

struct Entry {
    spec: ActionSpec,
    handler: Arc<dyn ActionHandler>,
}

/// Read-mostly after startup: registration only happens during extension
/// loading (C9); dispatch never needs to write.
pub struct ActionRegistry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, name: &str, spec: ActionSpec, handler: Arc<dyn ActionHandler>) -> CoreResult<()> {
        if spec.name != name {
            return Err(CoreError::InvalidActionSpec {
                name: name.to_string(),
                spec_name: spec.name.clone(),
            });
        }

        let mut entries = self.entries.write().await;
        if entries.contains_key(name) {
            return Err(CoreError::ActionAlreadyRegistered(name.to_string()));
        }
        entries.insert(name.to_string(), Entry { spec, handler });
        Ok(())
    }

    /// Validate and invoke `name` with `args`, the shape the parser produced.
    pub async fn dispatch(&self, name: &str, args: ActionArgs) -> CoreResult<ActionOutcome> {
        let (handler, spec) = {
            let entries = self.entries.read().await;
            let entry = entries.get(name).ok_or_else(|| CoreError::ActionNotFound(name.to_string()))?;
            (entry.handler.clone(), entry.spec.clone())
        };

        command_parser::validate(name, Some(&spec), &args)?;
        handler.call(args).await
    }

    pub async fn get_spec(&self, name: &str) -> Option<ActionSpec> {
        self.entries.read().await.get(name).map(|e| e.spec.clone())
    }

    pub async fn list(&self) -> HashMap<String, ActionSpec> {
        self.entries.read().await.iter().map(|(k, v)| (k.clone(), v.spec.clone())).collect()
    }

    /// Derive `Command` projections for the planner. `filter`, when given,
    /// restricts the result to those names.
    pub async fn commands(&self, filter: Option<&std::collections::HashSet<String>>) -> HashMap<String, Command> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(name, _)| filter.is_none_or(|f| f.contains(*name)))
            .map(|(name, entry)| (name.clone(), Command::from(&entry.spec)))
            .collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
