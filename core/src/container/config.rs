//! Container configuration.

use crate::errors::ArcError;
use serde::{Deserialize, Serialize};

/// Container configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Maximum nesting of factories resolving further beans
    pub max_resolution_depth: usize,
    /// Warn when a registry with live instances is deactivated and nobody holds its state
    pub warn_on_orphaned_state: bool,
    /// Reject dependencies a factory resolves without declaring them
    pub strict_dependencies: bool,
    /// Shut the container down when its last handle is dropped
    pub destroy_on_drop: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: 64,
            warn_on_orphaned_state: true,
            strict_dependencies: false,
            destroy_on_drop: true,
        }
    }
}

impl ContainerConfig {
    /// Load from JSON; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ArcError> {
        let config: ContainerConfig =
            serde_json::from_str(raw).map_err(|e| ArcError::Config {
                message: format!("Invalid container config: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot honour.
    pub fn validate(&self) -> Result<(), ArcError> {
        if self.max_resolution_depth == 0 {
            return Err(ArcError::Config {
                message: "max_resolution_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_config_default() {
        let config = ContainerConfig::default();
        assert_eq!(config.max_resolution_depth, 64);
        assert!(config.warn_on_orphaned_state);
        assert!(!config.strict_dependencies);
        assert!(config.destroy_on_drop);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ContainerConfig::from_json(r#"{"strict_dependencies": true}"#).unwrap();
        assert!(config.strict_dependencies);
        assert_eq!(config.max_resolution_depth, 64);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ContainerConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ArcError::Config { .. }));

        let err = ContainerConfig::from_json(r#"{"max_resolution_depth": 0}"#).unwrap_err();
        assert!(err.to_string().contains("max_resolution_depth"));
    }
}
