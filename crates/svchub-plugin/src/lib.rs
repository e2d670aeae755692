//! # svchub-plugin
//!
//! Plugin lifecycle runtime for SvcHub. Provides:
//!
//! - Dependency-ordered plugin loading with cycle detection
//! - Per-plugin lifecycle state machine (loading, loaded, error, unloading)
//! - Hook registration and dispatch (`setup`, `registerRoutes`, `cleanup`, `healthCheck`)
//! - An error boundary attributing any plugin failure to the plugin that caused it
//!
//! The manager is an explicit instance constructed once at startup and
//! threaded through the host; there is no global singleton.

pub mod boundary;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod manager;
pub mod module;
pub mod state;

pub use error::{BoxError, PluginError};
pub use hooks::{HookArgs, HookKind, HookOutcome};
pub use manager::PluginManager;
pub use module::{ModuleDefinition, ModuleRegistry, PluginModule};
pub use state::{PluginHealth, PluginInfo, PluginState};
