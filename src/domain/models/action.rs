//! Action catalog types: the declared shape of a callable operation.

use serde::{Deserialize, Serialize};

/// A single declared argument of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl ArgSpec {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// The immutable, declared shape of a callable action.
///
/// Argument order defines positional interpretation when a caller supplies
/// a list rather than a name-keyed map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    pub help_text: String,
    pub agent_hint: String,
    pub arguments: Vec<ArgSpec>,
}

impl ActionSpec {
    pub fn required_count(&self) -> usize {
        self.arguments.iter().filter(|a| a.required).count()
    }

    pub fn arg_names(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().map(|a| a.name.as_str())
    }
}

/// The planner-facing projection of an `ActionSpec`.
///
/// Derived, never stored independently — `ActionRegistry::commands` builds
/// these on demand from the registered specs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub help: String,
    pub hint: String,
    pub required_params: Vec<String>,
    pub optional_params: Vec<String>,
    pub positional_params: Vec<String>,
}

impl From<&ActionSpec> for Command {
    fn from(spec: &ActionSpec) -> Self {
        let required_params = spec
            .arguments
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.clone())
            .collect();
        let optional_params = spec
            .arguments
            .iter()
            .filter(|a| !a.required)
            .map(|a| a.name.clone())
            .collect();
        let positional_params = spec.arguments.iter().map(|a| a.name.clone()).collect();

        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            help: spec.help_text.clone(),
            hint: spec.agent_hint.clone(),
            required_params,
            optional_params,
            positional_params,
        }
    }
}
