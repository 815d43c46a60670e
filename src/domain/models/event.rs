//! Event bus types: trigger kinds, handler outcomes, and the append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// A named event kind that fans out to subscribed handlers.
///
/// The built-in variants cover the domain events the core knows about.
/// `Other` is the runtime-extension escape hatch: `register_custom` mints
/// (or returns an existing) interned name so repeated registration of the
/// same string is idempotent.
///
/// Serializes as its bare name string (`"GITHUB_PUSH"`, `"MY_CUSTOM_EVENT"`)
/// rather than as a tagged enum, since `Other` carries an open string space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandlerTrigger {
    NewProject,
    ProjectUpdate,
    ProjectRemove,
    NewAsset,
    AssetUpdate,
    AssetRemove,
    GithubPush,
    GithubPr,
    BlockchainEvent,
    ContractUpgraded,
    Other(String),
}

impl Serialize for HandlerTrigger {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for HandlerTrigger {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::register_custom(&name))
    }
}

impl HandlerTrigger {
    pub fn name(&self) -> &str {
        match self {
            Self::NewProject => "NEW_PROJECT",
            Self::ProjectUpdate => "PROJECT_UPDATE",
            Self::ProjectRemove => "PROJECT_REMOVE",
            Self::NewAsset => "NEW_ASSET",
            Self::AssetUpdate => "ASSET_UPDATE",
            Self::AssetRemove => "ASSET_REMOVE",
            Self::GithubPush => "GITHUB_PUSH",
            Self::GithubPr => "GITHUB_PR",
            Self::BlockchainEvent => "BLOCKCHAIN_EVENT",
            Self::ContractUpgraded => "CONTRACT_UPGRADED",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Resolve a trigger by name, minting a new `Other` member if the name
    /// does not match a built-in and has not been seen before. Two calls
    /// with the same custom name always return equal values.
    pub fn register_custom(name: &str) -> Self {
        if let Some(builtin) = Self::builtin_by_name(name) {
            return builtin;
        }
        static SEEN: RwLock<Option<HashMap<String, ()>>> = RwLock::new(None);
        let mut guard = SEEN.write().unwrap_or_else(|e| e.into_inner());
        guard.get_or_insert_with(HashMap::new).entry(name.to_string()).or_insert(());
        Self::Other(name.to_string())
    }

    fn builtin_by_name(name: &str) -> Option<Self> {
        Some(match name {
            "NEW_PROJECT" => Self::NewProject,
            "PROJECT_UPDATE" => Self::ProjectUpdate,
            "PROJECT_REMOVE" => Self::ProjectRemove,
            "NEW_ASSET" => Self::NewAsset,
            "ASSET_UPDATE" => Self::AssetUpdate,
            "ASSET_REMOVE" => Self::AssetRemove,
            "GITHUB_PUSH" => Self::GithubPush,
            "GITHUB_PR" => Self::GithubPr,
            "BLOCKCHAIN_EVENT" => Self::BlockchainEvent,
            "CONTRACT_UPGRADED" => Self::ContractUpgraded,
            _ => return None,
        })
    }
}

impl std::fmt::Display for HandlerTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a single handler invocation produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerResult {
    pub success: bool,
    pub data: Option<serde_json::Value>,
}

impl HandlerResult {
    pub fn ok(data: Option<serde_json::Value>) -> Self {
        Self { success: true, data }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(serde_json::json!({ "error": message.into() })),
        }
    }
}

/// One append-only record of a handler invocation. Exactly one is written
/// per `(trigger, handler)` pair each time `publish` runs, whether the
/// handler succeeded or raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    pub id: Uuid,
    pub handler_name: String,
    pub trigger: String,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
