//! Formula engine configuration
//!
//! Controls which plug-in functions end up in a [`FunctionRegistry`]
//! built with [`FunctionRegistry::from_config`].
//!
//! [`FunctionRegistry`]: crate::FunctionRegistry
//! [`FunctionRegistry::from_config`]: crate::FunctionRegistry::from_config

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FormulaConfig {
    pub functions: RegistryConfig,
}

/// Plug-in function selection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Load plug-ins linked into the binary (built-ins are always present)
    pub discover_plugins: bool,
    /// Plug-in categories to leave out, e.g. `["array"]`
    pub disabled_categories: Vec<String>,
    /// Individual plug-in functions to leave out
    pub disabled_functions: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            discover_plugins: true,
            disabled_categories: Vec::new(),
            disabled_functions: Vec::new(),
        }
    }
}

impl RegistryConfig {
    pub fn is_enabled(&self, category: &str, name: &str) -> bool {
        !self.disabled_categories.iter().any(|c| c == category)
            && !self.disabled_functions.iter().any(|f| f == name)
    }
}

/// Load configuration from multiple sources
///
/// Priority (highest to lowest):
/// 1. Environment variables prefixed `FORMULA_`, nested keys split on `__`
///    (e.g. `FORMULA_FUNCTIONS__DISCOVER_PLUGINS=false`)
/// 2. `config/formula.json`
/// 3. `config/formula.yaml`
/// 4. `config/formula.toml`
/// 5. Default values
pub fn load_config() -> Result<FormulaConfig, ConfigError> {
    Figment::new()
        .merge(Toml::file("config/formula.toml"))
        .merge(Yaml::file("config/formula.yaml"))
        .merge(Json::file("config/formula.json"))
        .merge(Env::prefixed("FORMULA_").split("__"))
        .extract()
        .map_err(|e| ConfigError::load(format!("Failed to load configuration: {}", e)))
}

/// Load configuration from a specific file, format chosen by extension
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<FormulaConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ConfigError::load("Config file must have an extension"))?;

    let figment = match extension {
        "toml" => Figment::new().merge(Toml::file(path)),
        "yaml" | "yml" => Figment::new().merge(Yaml::file(path)),
        "json" => Figment::new().merge(Json::file(path)),
        _ => return Err(ConfigError::UnsupportedFormat(extension.to_string())),
    };

    figment.extract().map_err(|e| {
        ConfigError::load(format!(
            "Failed to load configuration from {}: {}",
            path.display(),
            e
        ))
    })
}
