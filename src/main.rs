//! SvcHub Server — host entry point.
//!
//! Wires configuration, logging, and the plugin lifecycle runtime
//! together: load config, build the module registry, drive every
//! enabled plugin through load / setup / route registration, then run
//! until shutdown and unload everything.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use plugin_audit_log::AuditLogPlugin;
use svchub_core::config::AppConfig;
use svchub_core::error::AppError;
use svchub_plugin::{HookArgs, HookKind, ModuleRegistry, PluginManager};

#[tokio::main]
async fn main() {
    let env = std::env::var("SVCHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).init();
        }
    }
}

/// Builds the lookup table of every plugin compiled into this host.
fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register("audit_log", AuditLogPlugin::definition());
    registry
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting SvcHub v{}",
        env!("CARGO_PKG_VERSION")
    );

    let manager = Arc::new(PluginManager::new(build_registry()));
    manager.initialize(config.plugins.clone()).await;
    manager.load_plugins().await.map_err(AppError::from)?;

    // Per-plugin setup and route registration; individual failures are
    // captured in the aggregates and logged by the manager.
    manager
        .execute_hook_for_all(HookKind::Setup, HookArgs::new())
        .await;
    manager
        .execute_hook_for_all(HookKind::RegisterRoutes, HookArgs::new())
        .await;

    tracing::info!("Plugin lifecycle management completed");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;

    tracing::info!("Shutting down, unloading plugins");
    for name in manager.get_loaded_plugins().await {
        manager.unload_plugin(&name).await;
    }

    Ok(())
}
