//! YAML configuration for the corpmatch pipeline.
//!
//! One file describes how names are normalized, how searches are bounded and
//! where the registry lives. Every section is optional; omitted values take
//! the defaults shown below.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # corpmatch pipeline configuration
//! version: "1.0"
//! name: "production"
//!
//! normalizer:
//!   fold_diacritics: false
//!
//! matcher:
//!   default_limit: 10
//!   default_theta: 0.0
//!   # max_limit: 1000   # optional cap; unbounded when omitted
//!
//! registry:
//!   backend: "redb"
//!   path: "/var/lib/corpmatch/registry.redb"
//! ```

use std::fs;
use std::path::Path;

use canonical::NormalizerConfig;
use matcher::MatchConfig;
use registry::{BackendConfig, RegistryConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CorpmatchConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub matcher: MatchYamlConfig,

    #[serde(default)]
    pub registry: RegistryYamlConfig,
}

impl CorpmatchConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: CorpmatchConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.matcher.validate()?;
        self.registry.validate()?;
        Ok(())
    }

    pub fn normalizer_config(&self) -> NormalizerConfig {
        self.normalizer
    }

    pub fn match_config(&self) -> MatchConfig {
        self.matcher.to_match_config()
    }

    pub fn registry_config(&self) -> RegistryConfig {
        self.registry.to_registry_config()
    }
}

impl Default for CorpmatchConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            normalizer: NormalizerConfig::default(),
            matcher: MatchYamlConfig::default(),
            registry: RegistryYamlConfig::default(),
        }
    }
}

/// Matcher YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchYamlConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default)]
    pub default_theta: f64,

    /// Optional cap on request limits.
    #[serde(default)]
    pub max_limit: Option<usize>,
}

impl MatchYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        self.to_match_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("matcher: {e}")))
    }

    fn to_match_config(&self) -> MatchConfig {
        MatchConfig {
            default_limit: self.default_limit,
            default_theta: self.default_theta,
            max_limit: self.max_limit,
        }
    }
}

impl Default for MatchYamlConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_theta: 0.0,
            max_limit: None,
        }
    }
}

/// Registry YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryYamlConfig {
    /// `in_memory` or `redb`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database file; required for `redb`.
    #[serde(default)]
    pub path: Option<String>,
}

impl RegistryYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "redb"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "registry.backend must be one of: {valid_backends:?}"
            )));
        }

        if self.backend == "redb" && self.path.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigLoadError::Validation(
                "registry.path is required when backend is 'redb'".to_string(),
            ));
        }

        Ok(())
    }

    fn to_registry_config(&self) -> RegistryConfig {
        let backend = match (self.backend.as_str(), &self.path) {
            ("redb", Some(path)) => BackendConfig::redb(path.clone()),
            _ => BackendConfig::in_memory(),
        };
        RegistryConfig::new().with_backend(backend)
    }
}

impl Default for RegistryYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
        }
    }
}

// Helper functions for serde defaults
fn default_limit() -> usize {
    10
}

fn default_backend() -> String {
    "in_memory".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
normalizer:
  fold_diacritics: true
matcher:
  default_limit: 25
"#;

        let config = CorpmatchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name, Some("test config".to_string()));
        assert!(config.normalizer_config().fold_diacritics);

        let match_cfg = config.match_config();
        assert_eq!(match_cfg.default_limit, 25);
        assert_eq!(match_cfg.max_limit, None);
        assert_eq!(match_cfg.default_theta, 0.0);
        assert_eq!(config.registry_config().backend, BackendConfig::InMemory);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
registry:
  backend: "redb"
  path: "/tmp/companies.redb"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = CorpmatchConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.registry_config().backend,
            BackendConfig::redb("/tmp/companies.redb")
        );
    }

    #[test]
    fn test_default_config() {
        let config = CorpmatchConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.name.is_none());
        assert!(config.validate().is_ok());
        assert_eq!(config.match_config(), MatchConfig::default());
    }

    #[test]
    fn test_unsupported_version() {
        let result = CorpmatchConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(
            result,
            Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"
        ));
    }

    #[test]
    fn test_matcher_validation() {
        let yaml = r#"
version: "1.0"
matcher:
  default_limit: 0
"#;
        let err = CorpmatchConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("default_limit"));

        let yaml = r#"
version: "1.0"
matcher:
  default_theta: .nan
"#;
        let err = CorpmatchConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("default_theta"));

        let yaml = r#"
version: "1.0"
matcher:
  default_limit: 20
  max_limit: 5
"#;
        let err = CorpmatchConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("max_limit"));
    }

    #[test]
    fn test_optional_limit_cap() {
        let yaml = r#"
version: "1.0"
matcher:
  max_limit: 50
"#;
        let config = CorpmatchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.match_config().max_limit, Some(50));
    }

    #[test]
    fn test_registry_validation() {
        let yaml = r#"
version: "1.0"
registry:
  backend: "redb"
"#;
        let err = CorpmatchConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("registry.path"));

        let yaml = r#"
version: "1.0"
registry:
  backend: "postgres"
"#;
        let err = CorpmatchConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("registry.backend"));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = CorpmatchConfig::from_yaml("version: [unclosed");
        assert!(matches!(result, Err(ConfigLoadError::YamlParse(_))));
    }
}
