//! Per-plugin lifecycle state.
//!
//! State transitions happen only inside the manager:
//! `Loading → Loaded → Unloading → (removed)`, with `Loading → Error`
//! on a failed load. A hook-dispatch failure is reported per-call and
//! never changes the record's state.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hooks::HookKind;
use crate::module::PluginModule;

/// Plugin lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    /// No load has been attempted (implicit; no record exists).
    Unloaded,
    /// A load attempt is in progress.
    Loading,
    /// The plugin is loaded and its hooks may be dispatched.
    Loaded,
    /// The load sequence failed; the record stays visible for inspection.
    Error,
    /// Unload is in progress; the record is about to be removed.
    Unloading,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
            Self::Unloading => "unloading",
        };
        write!(f, "{name}")
    }
}

/// One tracked plugin.
///
/// `instance` is `Some` iff the state is `Loaded` or `Unloading`.
pub(crate) struct PluginRecord {
    /// Unique plugin name.
    pub name: String,
    /// Current lifecycle state.
    pub state: PluginState,
    /// Opaque configuration fragment, read-only after assignment.
    pub config: serde_json::Value,
    /// Hook kinds the module actually implements.
    pub hooks: HashSet<HookKind>,
    /// Handle to the loaded module.
    pub instance: Option<Arc<dyn PluginModule>>,
    /// Set once on transition to `Loaded`, never mutated afterward.
    pub loaded_at: Option<DateTime<Utc>>,
    /// Most recent failure captured while in or entering `Error` state.
    pub last_error: Option<String>,
}

impl PluginRecord {
    /// Creates a record at the start of a load attempt.
    pub fn new(name: &str, config: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            state: PluginState::Loading,
            config,
            hooks: HashSet::new(),
            instance: None,
            loaded_at: None,
            last_error: None,
        }
    }

    /// Builds a read-only snapshot of this record.
    pub fn info(&self) -> PluginInfo {
        let mut hooks: Vec<HookKind> = self.hooks.iter().copied().collect();
        hooks.sort_by_key(|h| h.as_str());
        PluginInfo {
            name: self.name.clone(),
            state: self.state,
            config: self.config.clone(),
            hooks,
            loaded_at: self.loaded_at,
            last_error: self.last_error.clone(),
        }
    }
}

impl std::fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecord")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("hooks", &self.hooks)
            .field("loaded_at", &self.loaded_at)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// Read-only snapshot of a plugin record for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    /// Plugin name.
    pub name: String,
    /// Current lifecycle state.
    pub state: PluginState,
    /// Opaque configuration fragment assigned at load time.
    pub config: serde_json::Value,
    /// Registered hook kinds.
    pub hooks: Vec<HookKind>,
    /// When the plugin reached `Loaded`, if it did.
    pub loaded_at: Option<DateTime<Utc>>,
    /// Most recent load failure, if any.
    pub last_error: Option<String>,
}

/// Health report for one plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginHealth {
    /// Whether the plugin is considered healthy.
    pub healthy: bool,
    /// Lifecycle state, when the plugin is known to the manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PluginState>,
    /// When the plugin reached `Loaded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
    /// Output of the plugin's `healthCheck` hook, if it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<serde_json::Value>,
    /// Failure description when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
