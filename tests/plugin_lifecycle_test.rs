//! End-to-end plugin lifecycle: configuration → load order → hook
//! dispatch → health → unload, using the real audit-log plugin plus a
//! synthetic dashboard plugin that depends on it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use plugin_audit_log::AuditLogPlugin;
use svchub_core::config::plugin::PluginSettings;
use svchub_plugin::{
    BoxError, HookArgs, HookKind, HookOutcome, ModuleDefinition, ModuleRegistry, PluginManager,
    PluginModule, PluginState,
};

/// Synthetic admin-dashboard plugin; registers routes and depends on
/// the audit log being loaded first.
#[derive(Debug)]
struct DashboardPlugin {
    routes: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PluginModule for DashboardPlugin {
    fn hooks(&self) -> Vec<HookKind> {
        vec![HookKind::RegisterRoutes, HookKind::HealthCheck]
    }

    async fn invoke(
        &self,
        kind: HookKind,
        _args: HookArgs,
    ) -> Result<Option<serde_json::Value>, BoxError> {
        match kind {
            HookKind::RegisterRoutes => {
                let mut routes = self.routes.lock().unwrap();
                routes.push("/admin/dashboard".to_string());
                Ok(Some(serde_json::json!({"routes": 1})))
            }
            HookKind::HealthCheck => {
                let routes = self.routes.lock().unwrap();
                Ok(Some(serde_json::json!({"routes": routes.len()})))
            }
            _ => Ok(None),
        }
    }
}

fn settings(raw: serde_json::Value) -> PluginSettings {
    serde_json::from_value(raw).unwrap()
}

fn host_config() -> BTreeMap<String, PluginSettings> {
    let mut config = BTreeMap::new();
    config.insert(
        "audit_log".to_string(),
        settings(serde_json::json!({"use": true, "channel": "security"})),
    );
    config.insert(
        "dashboard".to_string(),
        settings(serde_json::json!({"use": true})),
    );
    config.insert(
        "billing".to_string(),
        settings(serde_json::json!({"use": false})),
    );
    config
}

fn host_registry(
    load_log: Arc<Mutex<Vec<String>>>,
    routes: Arc<Mutex<Vec<String>>>,
) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register("audit_log", AuditLogPlugin::definition());

    let migration_log = load_log.clone();
    registry.register(
        "dashboard",
        ModuleDefinition::new(move |_config| {
            load_log.lock().unwrap().push("dashboard:init".to_string());
            Ok(Arc::new(DashboardPlugin {
                routes: routes.clone(),
            }))
        })
        .with_dependencies(&["audit_log", "billing"])
        .with_migration(move || {
            let migration_log = migration_log.clone();
            async move {
                migration_log
                    .lock()
                    .unwrap()
                    .push("dashboard:migration".to_string());
                Ok(())
            }
        }),
    );

    registry
}

#[tokio::test]
async fn full_lifecycle_against_real_plugins() {
    let load_log = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(Mutex::new(Vec::new()));

    let manager = PluginManager::new(host_registry(load_log.clone(), routes.clone()));
    manager.initialize(host_config()).await;
    manager.load_plugins().await.unwrap();

    // The disabled billing plugin is ignored even though dashboard
    // declares it as a dependency.
    assert_eq!(
        manager.get_loaded_plugins().await,
        vec!["audit_log".to_string(), "dashboard".to_string()]
    );
    assert!(manager.get_plugin_info("billing").await.is_none());

    // Migration ran before the module factory.
    assert_eq!(
        *load_log.lock().unwrap(),
        vec!["dashboard:migration".to_string(), "dashboard:init".to_string()]
    );

    // The opaque config fragment reached the record verbatim.
    let audit_info = manager.get_plugin_info("audit_log").await.unwrap();
    assert_eq!(audit_info.state, PluginState::Loaded);
    assert_eq!(audit_info.config["channel"], serde_json::json!("security"));

    // Setup dispatch: audit_log implements it, dashboard does not.
    let setup = manager
        .execute_hook_for_all(HookKind::Setup, HookArgs::new())
        .await;
    assert_eq!(setup.len(), 2);
    assert!(setup["audit_log"].is_ok());
    assert_eq!(
        setup["dashboard"].as_ref().unwrap(),
        &HookOutcome::NotRegistered
    );

    // Route registration reaches only the plugin that implements it.
    manager
        .execute_hook_for_all(HookKind::RegisterRoutes, HookArgs::new())
        .await;
    assert_eq!(*routes.lock().unwrap(), vec!["/admin/dashboard".to_string()]);

    // Health aggregates every tracked plugin and folds in hook output.
    let health = manager.get_all_plugins_health().await;
    assert!(health["audit_log"].healthy);
    assert_eq!(
        health["audit_log"].health_check.as_ref().unwrap()["status"],
        serde_json::json!("ok")
    );
    assert_eq!(
        health["dashboard"].health_check.as_ref().unwrap()["routes"],
        serde_json::json!(1)
    );

    // Unload everything; cleanup runs where registered and records go away.
    for name in manager.get_loaded_plugins().await {
        manager.unload_plugin(&name).await;
    }
    assert!(manager.get_loaded_plugins().await.is_empty());
}

#[tokio::test]
async fn single_plugin_failure_degrades_gracefully() {
    let mut registry = ModuleRegistry::new();
    registry.register("audit_log", AuditLogPlugin::definition());
    registry.register(
        "flaky",
        ModuleDefinition::new(|_| Ok(Arc::new(FlakyPlugin))),
    );

    let mut config = BTreeMap::new();
    config.insert(
        "audit_log".to_string(),
        settings(serde_json::json!({"use": true})),
    );
    config.insert(
        "flaky".to_string(),
        settings(serde_json::json!({"use": true})),
    );

    let manager = PluginManager::new(registry);
    manager.initialize(config).await;
    manager.load_plugins().await.unwrap();

    let results = manager
        .execute_hook_for_all(HookKind::Setup, HookArgs::new())
        .await;
    assert!(results["audit_log"].is_ok());
    let err = results["flaky"].as_ref().unwrap_err();
    assert_eq!(err.plugin(), Some("flaky"));

    // The flaky plugin stays loaded and the healthy one is unaffected.
    assert_eq!(
        manager.get_plugin_info("flaky").await.unwrap().state,
        PluginState::Loaded
    );
    assert!(manager.get_plugin_health("audit_log").await.healthy);
}

/// Plugin whose setup hook always fails.
#[derive(Debug)]
struct FlakyPlugin;

#[async_trait]
impl PluginModule for FlakyPlugin {
    fn hooks(&self) -> Vec<HookKind> {
        vec![HookKind::Setup]
    }

    async fn invoke(
        &self,
        _kind: HookKind,
        _args: HookArgs,
    ) -> Result<Option<serde_json::Value>, BoxError> {
        Err("upstream unreachable".into())
    }
}
