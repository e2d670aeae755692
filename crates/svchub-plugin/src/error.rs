//! Plugin runtime error types.
//!
//! Every plugin-attributable variant carries the plugin name, so a
//! failure can always be traced to the plugin that caused it rather
//! than surfacing as a bare underlying error.

use thiserror::Error;

use svchub_core::error::{AppError, ErrorKind};

use crate::hooks::HookKind;
use crate::state::PluginState;

/// Boxed error type accepted from plugin code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the plugin lifecycle runtime.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The dependency graph contains a cycle reachable from the
    /// requested plugin set. Fatal to the whole load cycle.
    #[error("circular dependency detected at plugin '{plugin}'")]
    DependencyCycle {
        /// The plugin at which the cycle was detected.
        plugin: String,
    },

    /// No module is registered under the requested plugin name.
    #[error("plugin '{plugin}': no module registered under this name")]
    UnknownModule { plugin: String },

    /// The plugin's pre-load migration step failed.
    #[error("plugin '{plugin}': migration failed: {message}")]
    MigrationFailed {
        plugin: String,
        message: String,
        #[source]
        source: BoxError,
    },

    /// The plugin's module factory failed to build an instance.
    #[error("plugin '{plugin}': module initialization failed: {message}")]
    InitFailed {
        plugin: String,
        message: String,
        #[source]
        source: BoxError,
    },

    /// A registered hook raised during dispatch. Reported per-call;
    /// the plugin remains loaded.
    #[error("plugin '{plugin}': hook '{hook}' failed: {message}")]
    HookFailed {
        plugin: String,
        hook: HookKind,
        message: String,
        #[source]
        source: BoxError,
    },

    /// The operation referenced a plugin name absent from the manager.
    #[error("plugin '{plugin}' not found")]
    NotFound { plugin: String },

    /// Hook dispatch was attempted on a plugin that is not loaded.
    #[error("plugin '{plugin}' is not in loaded state (current: {state})")]
    NotLoaded { plugin: String, state: PluginState },

    /// The manager was used before `initialize` supplied configuration.
    #[error("plugin manager is not initialized")]
    NotInitialized,
}

impl PluginError {
    /// Returns the name of the plugin this error is attributed to, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Self::DependencyCycle { plugin }
            | Self::UnknownModule { plugin }
            | Self::MigrationFailed { plugin, .. }
            | Self::InitFailed { plugin, .. }
            | Self::HookFailed { plugin, .. }
            | Self::NotFound { plugin }
            | Self::NotLoaded { plugin, .. } => Some(plugin),
            Self::NotInitialized => None,
        }
    }
}

impl From<PluginError> for AppError {
    fn from(err: PluginError) -> Self {
        AppError::with_source(ErrorKind::Plugin, err.to_string(), err)
    }
}
