//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod logging;
pub mod plugin;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::logging::LoggingConfig;
use self::plugin::PluginSettings;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-plugin settings, keyed by plugin name.
    ///
    /// A `BTreeMap` so that iteration over the plugin set is
    /// deterministic regardless of file order.
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginSettings>,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `SVCHUB_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SVCHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugins_section_defaults_to_empty() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(config.plugins.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn plugin_settings_parse_use_flag_and_opaque_options() {
        let raw = r#"
            {
                "plugins": {
                    "telegram": { "use": true, "token": "abc123" },
                    "webgui": { "use": false }
                }
            }
        "#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert!(config.plugins["telegram"].enabled);
        assert!(!config.plugins["webgui"].enabled);
        assert_eq!(
            config.plugins["telegram"].options["token"],
            serde_json::json!("abc123")
        );
    }
}
