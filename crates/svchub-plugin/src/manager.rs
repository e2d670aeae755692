//! Plugin manager — lifecycle orchestration for all plugins.
//!
//! The manager owns the plugin table and is the only component that
//! mutates plugin state. Loading is strictly sequential in dependency
//! order; hook dispatch reads a snapshot under a read lock and invokes
//! plugin code outside it. Concurrent `load_plugins` / `unload_plugin`
//! calls against the same manager must be serialized by the caller.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::future;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use svchub_core::config::plugin::PluginSettings;

use crate::boundary::guard;
use crate::error::PluginError;
use crate::graph::resolve_load_order;
use crate::hooks::{HookArgs, HookKind, HookOutcome};
use crate::module::{ModuleRegistry, PluginModule};
use crate::state::{PluginHealth, PluginInfo, PluginRecord, PluginState};

/// Manages the full lifecycle of plugins: load order, loading, hook
/// dispatch, health, and unloading.
#[derive(Debug)]
pub struct PluginManager {
    /// Lookup table from plugin name to module definition.
    registry: ModuleRegistry,
    /// Plugin name → lifecycle record.
    plugins: RwLock<HashMap<String, PluginRecord>>,
    /// Dependency-edge set, recomputed on each load cycle.
    dependencies: RwLock<HashMap<String, Vec<String>>>,
    /// Per-plugin configuration, supplied by `initialize`.
    config: RwLock<Option<BTreeMap<String, PluginSettings>>>,
}

impl PluginManager {
    /// Creates a new plugin manager over a module registry.
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            registry,
            plugins: RwLock::new(HashMap::new()),
            dependencies: RwLock::new(HashMap::new()),
            config: RwLock::new(None),
        }
    }

    /// Stores the per-plugin configuration tree.
    ///
    /// Must be called before [`load_plugins`](Self::load_plugins);
    /// calling it again replaces the stored tree.
    pub async fn initialize(&self, plugins: BTreeMap<String, PluginSettings>) {
        let mut config = self.config.write().await;
        *config = Some(plugins);
        info!("plugin manager initialized");
    }

    /// Loads every enabled plugin, in dependency order.
    ///
    /// Plugins load strictly one at a time, so a later plugin may rely
    /// on side effects of every plugin before it in the order. The
    /// first failure aborts the call: already-loaded plugins stay
    /// loaded, the failing one is left in `Error` state, and the error
    /// is returned.
    pub async fn load_plugins(&self) -> Result<(), PluginError> {
        let config = {
            let config = self.config.read().await;
            config.clone().ok_or(PluginError::NotInitialized)?
        };

        let enabled: Vec<String> = config
            .iter()
            .filter(|(_, settings)| settings.enabled)
            .map(|(name, _)| name.clone())
            .collect();

        if enabled.is_empty() {
            info!("no plugins enabled");
            return Ok(());
        }

        info!(
            count = enabled.len(),
            plugins = %enabled.join(", "),
            "loading plugins"
        );

        // Fresh edge set each cycle; declarations of disabled plugins
        // are never consulted.
        let edges: HashMap<String, Vec<String>> = enabled
            .iter()
            .filter_map(|name| {
                self.registry
                    .dependencies(name)
                    .map(|deps| (name.clone(), deps.to_vec()))
            })
            .collect();
        {
            let mut dependencies = self.dependencies.write().await;
            *dependencies = edges.clone();
        }

        let order = resolve_load_order(&enabled, &edges)?;
        debug!(order = %order.join(" -> "), "resolved load order");

        for name in &order {
            self.load_plugin(name).await?;
        }

        info!("all plugins loaded");
        Ok(())
    }

    /// Loads a single plugin by name.
    ///
    /// A name that is already present in the plugin table is a logged
    /// no-op. On failure the record is left in `Error` state with
    /// `last_error` set, and the error is returned to the caller.
    pub async fn load_plugin(&self, name: &str) -> Result<(), PluginError> {
        {
            let plugins = self.plugins.read().await;
            if plugins.contains_key(name) {
                warn!(plugin = %name, "plugin is already loaded");
                return Ok(());
            }
        }

        if !self.registry.contains(name) {
            return Err(PluginError::UnknownModule {
                plugin: name.to_string(),
            });
        }

        let config = {
            let config = self.config.read().await;
            let settings = config.as_ref().ok_or(PluginError::NotInitialized)?;
            settings
                .get(name)
                .map(PluginSettings::options_value)
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()))
        };

        {
            let mut plugins = self.plugins.write().await;
            plugins.insert(name.to_string(), PluginRecord::new(name, config.clone()));
        }

        match self.run_load_sequence(name, config).await {
            Ok((instance, hooks)) => {
                let mut plugins = self.plugins.write().await;
                if let Some(record) = plugins.get_mut(name) {
                    info!(plugin = %name, hooks = hooks.len(), "plugin loaded");
                    record.hooks = hooks;
                    record.instance = Some(instance);
                    record.state = PluginState::Loaded;
                    record.loaded_at = Some(Utc::now());
                }
                Ok(())
            }
            Err(err) => {
                {
                    let mut plugins = self.plugins.write().await;
                    if let Some(record) = plugins.get_mut(name) {
                        record.state = PluginState::Error;
                        record.last_error = Some(err.to_string());
                    }
                }
                error!(plugin = %name, error = %err, "plugin load failed");
                Err(err)
            }
        }
    }

    /// Pre-load migration, module construction, and hook registration.
    async fn run_load_sequence(
        &self,
        name: &str,
        config: serde_json::Value,
    ) -> Result<(Arc<dyn PluginModule>, HashSet<HookKind>), PluginError> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| PluginError::UnknownModule {
                plugin: name.to_string(),
            })?;

        if let Some(migration) = &definition.migration {
            guard(name, "migration", migration(), |message, source| {
                PluginError::MigrationFailed {
                    plugin: name.to_string(),
                    message,
                    source,
                }
            })
            .await?;
            debug!(plugin = %name, "pre-load migration applied");
        }

        let factory = definition.factory.clone();
        let instance = guard(
            name,
            "module init",
            async move { factory(config) },
            |message, source| PluginError::InitFailed {
                plugin: name.to_string(),
                message,
                source,
            },
        )
        .await?;

        let mut hooks = HashSet::new();
        for kind in instance.hooks() {
            debug!(plugin = %name, hook = %kind, "hook registered");
            hooks.insert(kind);
        }

        Ok((instance, hooks))
    }

    /// Dispatches one hook on one plugin.
    ///
    /// Fails with `NotFound` if the plugin is absent and `NotLoaded`
    /// if it is in any state other than `Loaded`. A loaded plugin
    /// without the requested hook kind yields the explicit
    /// [`HookOutcome::NotRegistered`] marker.
    pub async fn execute_hook(
        &self,
        name: &str,
        kind: HookKind,
        args: HookArgs,
    ) -> Result<HookOutcome, PluginError> {
        let instance = {
            let plugins = self.plugins.read().await;
            let record = plugins.get(name).ok_or_else(|| PluginError::NotFound {
                plugin: name.to_string(),
            })?;

            if record.state != PluginState::Loaded {
                return Err(PluginError::NotLoaded {
                    plugin: name.to_string(),
                    state: record.state,
                });
            }

            if !record.hooks.contains(&kind) {
                return Ok(HookOutcome::NotRegistered);
            }

            match record.instance.clone() {
                Some(instance) => instance,
                // instance is Some whenever the state is Loaded
                None => {
                    return Err(PluginError::NotLoaded {
                        plugin: name.to_string(),
                        state: record.state,
                    });
                }
            }
        };

        let value = guard(
            name,
            kind.as_str(),
            instance.invoke(kind, args),
            |message, source| PluginError::HookFailed {
                plugin: name.to_string(),
                hook: kind,
                message,
                source,
            },
        )
        .await?;

        Ok(HookOutcome::Completed(value))
    }

    /// Dispatches a hook across every currently-loaded plugin.
    ///
    /// Calls are issued independently and the aggregate waits for all
    /// of them to settle; one plugin's failure never prevents dispatch
    /// to the others. The per-plugin outcomes are returned rather than
    /// raised so the caller can inspect each one.
    pub async fn execute_hook_for_all(
        &self,
        kind: HookKind,
        args: HookArgs,
    ) -> BTreeMap<String, Result<HookOutcome, PluginError>> {
        let targets: Vec<(String, Option<Arc<dyn PluginModule>>)> = {
            let plugins = self.plugins.read().await;
            plugins
                .values()
                .filter(|record| record.state == PluginState::Loaded)
                .map(|record| {
                    let instance = record
                        .hooks
                        .contains(&kind)
                        .then(|| record.instance.clone())
                        .flatten();
                    (record.name.clone(), instance)
                })
                .collect()
        };

        let calls = targets.into_iter().map(|(name, instance)| {
            let args = args.clone();
            async move {
                let outcome = match instance {
                    None => Ok(HookOutcome::NotRegistered),
                    Some(module) => guard(
                        &name,
                        kind.as_str(),
                        module.invoke(kind, args),
                        |message, source| PluginError::HookFailed {
                            plugin: name.clone(),
                            hook: kind,
                            message,
                            source,
                        },
                    )
                    .await
                    .map(HookOutcome::Completed),
                };
                (name, outcome)
            }
        });

        let mut results = BTreeMap::new();
        for (name, outcome) in future::join_all(calls).await {
            if let Err(err) = &outcome {
                error!(plugin = %name, hook = %kind, error = %err, "hook dispatch failed");
            }
            results.insert(name, outcome);
        }
        results
    }

    /// Reports the health of one plugin.
    ///
    /// Attempts the `healthCheck` hook and folds any failure into the
    /// report instead of propagating it.
    pub async fn get_plugin_health(&self, name: &str) -> PluginHealth {
        let snapshot = {
            let plugins = self.plugins.read().await;
            plugins
                .get(name)
                .map(|record| (record.state, record.loaded_at, record.last_error.clone()))
        };

        let Some((state, loaded_at, last_error)) = snapshot else {
            return PluginHealth {
                healthy: false,
                state: None,
                loaded_at: None,
                health_check: None,
                error: Some("plugin not found".to_string()),
            };
        };

        if state == PluginState::Error {
            return PluginHealth {
                healthy: false,
                state: Some(state),
                loaded_at,
                health_check: None,
                error: last_error,
            };
        }

        match self
            .execute_hook(name, HookKind::HealthCheck, HookArgs::new())
            .await
        {
            Ok(outcome) => PluginHealth {
                healthy: true,
                state: Some(state),
                loaded_at,
                health_check: outcome.value().cloned(),
                error: None,
            },
            Err(err) => PluginHealth {
                healthy: false,
                state: Some(state),
                loaded_at,
                health_check: None,
                error: Some(err.to_string()),
            },
        }
    }

    /// Reports the health of every tracked plugin.
    pub async fn get_all_plugins_health(&self) -> BTreeMap<String, PluginHealth> {
        let names = self.get_loaded_plugins().await;
        let mut health = BTreeMap::new();
        for name in names {
            let report = self.get_plugin_health(&name).await;
            health.insert(name, report);
        }
        health
    }

    /// Unloads a plugin: cleanup hook, then record removal.
    ///
    /// A cleanup failure is logged but never blocks removal. Unloading
    /// a name that is not tracked is a logged no-op.
    pub async fn unload_plugin(&self, name: &str) {
        let cleanup = {
            let mut plugins = self.plugins.write().await;
            let Some(record) = plugins.get_mut(name) else {
                warn!(plugin = %name, "plugin not found for unloading");
                return;
            };
            record.state = PluginState::Unloading;
            record
                .hooks
                .contains(&HookKind::Cleanup)
                .then(|| record.instance.clone())
                .flatten()
        };

        if let Some(module) = cleanup {
            let result = guard(
                name,
                "cleanup",
                module.invoke(HookKind::Cleanup, HookArgs::new()),
                |message, source| PluginError::HookFailed {
                    plugin: name.to_string(),
                    hook: HookKind::Cleanup,
                    message,
                    source,
                },
            )
            .await;
            if let Err(err) = result {
                warn!(plugin = %name, error = %err, "cleanup hook failed during unload");
            }
        }

        {
            let mut plugins = self.plugins.write().await;
            plugins.remove(name);
        }
        info!(plugin = %name, "plugin unloaded");
    }

    /// Returns a read-only snapshot of one plugin record.
    pub async fn get_plugin_info(&self, name: &str) -> Option<PluginInfo> {
        let plugins = self.plugins.read().await;
        plugins.get(name).map(PluginRecord::info)
    }

    /// Returns the names of every tracked plugin, sorted.
    pub async fn get_loaded_plugins(&self) -> Vec<String> {
        let plugins = self.plugins.read().await;
        let mut names: Vec<String> = plugins.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the dependency declaration recorded for a plugin during
    /// the most recent load cycle.
    pub async fn plugin_dependencies(&self, name: &str) -> Option<Vec<String>> {
        let dependencies = self.dependencies.read().await;
        dependencies.get(name).cloned()
    }
}
