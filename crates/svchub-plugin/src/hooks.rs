//! Lifecycle hook vocabulary.
//!
//! A plugin may implement any subset of the four hook kinds. Hooks are
//! dispatched by the manager only; plugins never invoke each other's
//! hooks directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The hook kinds the runtime knows about.
///
/// A module may expose other capabilities, but only these are
/// registered and dispatched by the lifecycle runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    /// One-time initialization after the plugin set has loaded.
    Setup,
    /// Registration of the plugin's routes with the host.
    RegisterRoutes,
    /// Resource teardown, invoked during unload.
    Cleanup,
    /// Liveness probe folded into health reporting.
    HealthCheck,
}

impl HookKind {
    /// All hook kinds, in dispatch-documentation order.
    pub const ALL: [HookKind; 4] = [
        HookKind::Setup,
        HookKind::RegisterRoutes,
        HookKind::Cleanup,
        HookKind::HealthCheck,
    ];

    /// Returns the wire name of this hook kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::RegisterRoutes => "registerRoutes",
            Self::Cleanup => "cleanup",
            Self::HealthCheck => "healthCheck",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arguments handed to a hook invocation — a flexible key-value map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookArgs {
    /// Arbitrary data keyed by string.
    pub data: HashMap<String, serde_json::Value>,
}

impl HookArgs {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a typed data value.
    pub fn with(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// Inserts a string value.
    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.with(key, serde_json::json!(value))
    }

    /// Gets a data value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Gets a string data value.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

/// Result of dispatching one hook on one plugin.
///
/// Distinguishes "the hook ran" from "the plugin does not implement
/// this hook kind" — the latter is an explicit no-op, not a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HookOutcome {
    /// The hook ran to completion, optionally producing a value.
    Completed(Option<serde_json::Value>),
    /// The plugin has no registered hook of the requested kind.
    NotRegistered,
}

impl HookOutcome {
    /// Returns the produced value, if the hook ran and produced one.
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Completed(value) => value.as_ref(),
            Self::NotRegistered => None,
        }
    }

    /// Returns whether this outcome is the explicit no-op marker.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NotRegistered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_kinds_have_stable_wire_names() {
        assert_eq!(HookKind::Setup.as_str(), "setup");
        assert_eq!(HookKind::RegisterRoutes.as_str(), "registerRoutes");
        assert_eq!(HookKind::Cleanup.as_str(), "cleanup");
        assert_eq!(HookKind::HealthCheck.as_str(), "healthCheck");
    }

    #[test]
    fn args_builder_round_trips() {
        let args = HookArgs::new()
            .with_string("reason", "startup")
            .with("attempt", serde_json::json!(2));
        assert_eq!(args.get_string("reason"), Some("startup"));
        assert_eq!(args.get("attempt"), Some(&serde_json::json!(2)));
        assert!(args.get("missing").is_none());
    }

    #[test]
    fn noop_marker_is_distinguishable() {
        assert!(HookOutcome::NotRegistered.is_noop());
        assert!(!HookOutcome::Completed(None).is_noop());
        let ran = HookOutcome::Completed(Some(serde_json::json!({"ok": true})));
        assert_eq!(ran.value(), Some(&serde_json::json!({"ok": true})));
    }
}
