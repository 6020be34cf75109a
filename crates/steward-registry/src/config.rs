//! Registry configuration (steward.toml)
//!
//! ```toml
//! domain = "acme.ops"
//! description = "Operations console objects"
//! publish_self = true
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Settings for a [`ManagementRegistry`](crate::ManagementRegistry)
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Domain the registry publishes itself under (default: "steward")
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Description of the registry's own entry
    #[serde(default = "default_description")]
    pub description: String,

    /// Whether the registry publishes itself at start (default: true)
    #[serde(default = "default_publish_self")]
    pub publish_self: bool,
}

fn default_domain() -> String {
    "steward".to_string()
}

fn default_description() -> String {
    "Objects registered with the management registry".to_string()
}

fn default_publish_self() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            description: default_description(),
            publish_self: default_publish_self(),
        }
    }
}

impl RegistryConfig {
    /// Load a config from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a config from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.is_empty() {
            return Err(ConfigError::ValidationError(
                "Registry domain cannot be empty".to_string(),
            ));
        }

        if self.domain.contains(':') {
            return Err(ConfigError::ValidationError(format!(
                "Invalid registry domain: {}. Must not contain ':'",
                self.domain
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::from_toml_str("").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.domain, "steward");
        assert!(config.publish_self);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            RegistryConfig::from_toml_str("domain = \"\""),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            RegistryConfig::from_toml_str("domain = \"a:b\""),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            RegistryConfig::from_toml_str("domian = \"typo\""),
            Err(ConfigError::ParseError(_))
        ));
    }
}
