//! Per-plugin configuration.

use serde::{Deserialize, Serialize};

/// Settings for a single plugin under `plugins.<name>`.
///
/// The `use` flag gates enablement; every other key is owned by the
/// plugin and handed to its instance verbatim, without interpretation
/// by the lifecycle runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Whether this plugin should be loaded.
    #[serde(rename = "use", default)]
    pub enabled: bool,
    /// Opaque plugin-owned configuration.
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl PluginSettings {
    /// Returns the opaque configuration fragment as a single JSON value.
    pub fn options_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.options.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_flag_defaults_to_disabled() {
        let settings: PluginSettings = serde_json::from_str("{}").unwrap();
        assert!(!settings.enabled);
        assert!(settings.options.is_empty());
    }

    #[test]
    fn unknown_keys_are_preserved_opaquely() {
        let settings: PluginSettings =
            serde_json::from_str(r#"{"use": true, "token": "t", "retries": 3}"#).unwrap();
        let options = settings.options_value();
        assert_eq!(options["token"], serde_json::json!("t"));
        assert_eq!(options["retries"], serde_json::json!(3));
        // The flag itself is not part of the plugin-owned fragment.
        assert!(options.get("use").is_none());
    }
}
