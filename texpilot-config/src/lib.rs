//! Persisted settings: YAML file + environment overlays.
//!
//! Settings are loaded exactly once at startup and threaded explicitly into
//! whatever needs them; nothing re-reads them mid-session. `${VAR}`
//! placeholders in the file are expanded from the environment so keys can
//! stay out of the file itself, and `TEXPILOT_`-prefixed variables override
//! file values outright.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use texpilot_common::{credential::validate_api_key, TexpilotError, DEFAULT_MODEL};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// What the settings store holds: both fields optional, the credential
/// contract enforced when saving and again at generation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Settings {
    /// The model to use for this session.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// The credential, shape-checked. Generation cannot start without it.
    pub fn require_api_key(&self) -> texpilot_common::Result<&str> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TexpilotError::Config("no API key configured".to_string()))?;
        validate_api_key(key)?;
        Ok(key)
    }

    /// Persist the settings, rejecting malformed credentials before they
    /// ever reach the store — the save-time half of the credential contract.
    pub fn store(&self, path: &Path) -> texpilot_common::Result<()> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TexpilotError::Config("an API key is required".to_string()))?;
        validate_api_key(key)?;

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| TexpilotError::Config(format!("could not encode settings: {e}")))?;
        std::fs::write(path, yaml)
            .map_err(|e| TexpilotError::Config(format!("could not write {}: {e}", path.display())))
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct SettingsLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Start with the defaults: `TEXPILOT_` env overrides on top of
    /// whatever file sources get attached.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("TEXPILOT").separator("__"));
        Self { builder }
    }

    /// Attach a settings file; the `config` crate infers format by suffix.
    /// Missing files are tolerated so env-only setups work.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge inline YAML; used by tests and the CLI.
    ///
    /// ```
    /// use texpilot_config::SettingsLoader;
    ///
    /// let settings = SettingsLoader::new()
    ///     .with_yaml_str("model: claude-3-5-sonnet-20240620")
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(settings.model_or_default(), "claude-3-5-sonnet-20240620");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and materialise the
    /// typed settings.
    pub fn load(self) -> Result<Settings, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_placeholders_from_the_environment() {
        temp_env::with_var("TEX_KEY", Some("sk-ant-from-env"), || {
            let mut v = json!({ "api_key": "${TEX_KEY}" });
            expand_env_in_value(&mut v);
            assert_eq!(v, json!({ "api_key": "sk-ant-from-env" }));
        });
    }

    #[test]
    fn expansion_recurses_through_indirection() {
        temp_env::with_vars([("INNER", Some("sk-ant-x")), ("OUTER", Some("${INNER}"))], || {
            let mut v = json!("${OUTER}");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("sk-ant-x"));
        });
    }

    #[test]
    fn expansion_terminates_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("key=${A}");
            expand_env_in_value(&mut v);
            // The depth cap stops the loop; the unresolved placeholder stays.
            assert!(v.as_str().unwrap().contains("${"));
        });
    }

    #[test]
    fn unknown_placeholders_are_left_as_is() {
        let mut v = json!("x-${TEXPILOT_TEST_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("x-${TEXPILOT_TEST_DOES_NOT_EXIST}"));
    }

    #[test]
    fn require_api_key_applies_the_format_contract() {
        let bad = Settings {
            api_key: Some("sk-openai-x".into()),
            model: None,
        };
        assert!(bad.require_api_key().is_err());

        let none = Settings::default();
        assert!(none.require_api_key().is_err());

        let good = Settings {
            api_key: Some("sk-ant-api03-x".into()),
            model: None,
        };
        assert_eq!(good.require_api_key().unwrap(), "sk-ant-api03-x");
    }
}
