//! Session engine settings
//!
//! Loaded from YAML (`--settings` in the demo binary) or built in code.
//! Missing or empty values fall back to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CliError;

pub const DEFAULT_PROMPT: &str = "cli> ";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_GRAMMAR_ENV: &str = "OPSHELL_GRAMMAR";
pub const DEFAULT_APP_NAME: &str = "CLI";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Base prompt; its trailing `>`/`#` is replaced inside contexts
    pub prompt: String,
    /// Printed as `<banner> v<version>` when a client attaches
    pub banner: Option<String>,
    pub version: String,
    /// Environment variable naming an alternate YAML grammar
    pub grammar_env: String,
    /// Shown in the header of exported grammars
    pub app_name: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            banner: None,
            version: DEFAULT_VERSION.to_string(),
            grammar_env: DEFAULT_GRAMMAR_ENV.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl CliConfig {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replace empty fields with their defaults
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.prompt.is_empty() {
            self.prompt = defaults.prompt;
        }
        if self.version.is_empty() {
            self.version = defaults.version;
        }
        if self.grammar_env.is_empty() {
            self.grammar_env = defaults.grammar_env;
        }
        if self.app_name.is_empty() {
            self.app_name = defaults.app_name;
        }
        if self.banner.as_deref().is_some_and(str::is_empty) {
            self.banner = None;
        }
        self
    }

    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self, CliError> {
        let config: CliConfig = serde_yaml::from_str(text).map_err(|e| CliError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(config.with_defaults())
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let path = path.as_ref();
        info!("Loading CLI settings from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| CliError::file_io(path, e))?;
        Self::from_yaml_str(&text, path)
    }

    /// Grammar file named by the `grammar_env` variable, if set
    pub fn grammar_from_env(&self) -> Option<PathBuf> {
        std::env::var_os(&self.grammar_env)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.prompt, "cli> ");
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.grammar_env, "OPSHELL_GRAMMAR");
        assert!(config.banner.is_none());
    }

    #[test]
    fn test_yaml_partial_and_empty_values() {
        let config = CliConfig::from_yaml_str(
            "prompt: \"router# \"\nbanner: \"\"\nversion: \"\"\n",
            Path::new("settings.yaml"),
        )
        .unwrap();
        assert_eq!(config.prompt, "router# ");
        assert_eq!(config.version, "1.0.0");
        assert!(config.banner.is_none());
        assert_eq!(config.app_name, "CLI");
    }

    #[test]
    fn test_yaml_errors() {
        let err = CliConfig::from_yaml_str("prompt: [1, 2]\n", Path::new("bad.yaml")).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));

        let err = CliConfig::from_yaml_file("/nonexistent/settings.yaml").unwrap_err();
        assert!(matches!(err, CliError::FileIo { .. }));
    }

    #[test]
    fn test_grammar_from_env() {
        let config = CliConfig {
            grammar_env: "OPSHELL_TEST_GRAMMAR_UNSET_VAR".into(),
            ..CliConfig::default()
        };
        assert!(config.grammar_from_env().is_none());
    }
}
