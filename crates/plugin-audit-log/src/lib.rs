//! Audit log plugin for SvcHub.
//!
//! Writes lifecycle events to the structured log under a configurable
//! channel name and reports how many events it has recorded through
//! its health check.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use svchub_plugin::{BoxError, HookArgs, HookKind, ModuleDefinition, PluginModule};

/// Audit log plugin instance.
#[derive(Debug)]
pub struct AuditLogPlugin {
    /// Channel name under which events are logged.
    channel: String,
    /// Number of events recorded since setup.
    events: AtomicU64,
    /// When the plugin was constructed.
    started_at: DateTime<Utc>,
}

impl AuditLogPlugin {
    /// Builds the plugin from its opaque configuration fragment.
    ///
    /// Recognized option: `channel` (string, defaults to `"audit"`).
    pub fn from_config(config: &serde_json::Value) -> Self {
        let channel = config
            .get("channel")
            .and_then(|v| v.as_str())
            .unwrap_or("audit")
            .to_string();
        Self {
            channel,
            events: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    /// Module definition for registration with the host.
    pub fn definition() -> ModuleDefinition {
        ModuleDefinition::new(|config| Ok(Arc::new(AuditLogPlugin::from_config(&config))))
    }

    fn record(&self, event: &str) {
        self.events.fetch_add(1, Ordering::Relaxed);
        info!(channel = %self.channel, event = %event, "audit event");
    }
}

#[async_trait]
impl PluginModule for AuditLogPlugin {
    fn hooks(&self) -> Vec<HookKind> {
        vec![HookKind::Setup, HookKind::Cleanup, HookKind::HealthCheck]
    }

    async fn invoke(
        &self,
        kind: HookKind,
        args: HookArgs,
    ) -> Result<Option<serde_json::Value>, BoxError> {
        match kind {
            HookKind::Setup => {
                let reason = args.get_string("reason").unwrap_or("startup");
                self.record(&format!("setup:{reason}"));
                Ok(None)
            }
            HookKind::Cleanup => {
                self.record("cleanup");
                Ok(None)
            }
            HookKind::HealthCheck => Ok(Some(serde_json::json!({
                "status": "ok",
                "channel": self.channel,
                "events": self.events.load(Ordering::Relaxed),
                "since": self.started_at,
            }))),
            HookKind::RegisterRoutes => Ok(None),
        }
    }
}
