//! Configuration types for the bridge

use crate::net::PeerId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors that can occur while loading or using configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid resource name: {0}")]
    InvalidResourceName(String),

    #[error("Resource directory not found: {0:?}")]
    MissingResourceRoot(PathBuf),
}

/// Safety limits applied to every script engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineLimits {
    pub max_expr_depth: usize,
    pub max_function_expr_depth: usize,
    pub max_call_levels: usize,
    pub max_operations: u64,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_expr_depth: 100,
            max_function_expr_depth: 100,
            max_call_levels: 50,
            max_operations: 100_000,
            max_string_size: 10_000,
            max_array_size: 10_000,
            max_map_size: 1_000,
        }
    }
}

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directory containing resource scripts
    pub resource_root: PathBuf,
    /// Extension of resource script files, without the dot
    pub script_extension: String,
    /// Exposed to scripts as `isDebug`
    pub debug: bool,
    /// This host's identity on the replication network
    pub peer_id: u32,
    /// Resources started at boot, in order
    pub resources: Vec<String>,
    /// Custom logging filter (None = default)
    pub log_filter: Option<String>,
    pub limits: EngineLimits,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            resource_root: PathBuf::from("resources"),
            script_extension: "rhai".to_string(),
            debug: false,
            peer_id: 1,
            resources: Vec::new(),
            log_filter: None,
            limits: EngineLimits::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = serde_json::from_str(&content)?;
        debug!(path = ?path, resources = config.resources.len(), "Loaded bridge config");
        Ok(config)
    }

    pub fn peer(&self) -> PeerId {
        PeerId(self.peer_id)
    }

    /// Get the full path to a resource script
    pub fn resource_path(&self, name: &str) -> Result<PathBuf, ConfigError> {
        // Validate name to prevent path traversal
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(ConfigError::InvalidResourceName(name.to_string()));
        }
        let path = self
            .resource_root
            .join(format!("{name}.{}", self.script_extension));
        debug!(name, path = ?path, "Generated resource path");
        Ok(path)
    }

    /// Resource name for a script path inside the resource root, if any
    pub fn resource_name(&self, path: &Path) -> Option<String> {
        if path.extension()?.to_str()? != self.script_extension {
            return None;
        }
        path.file_stem()?.to_str().map(str::to_string)
    }

    /// Check that the resource directory exists
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resource_root.is_dir() {
            return Err(ConfigError::MissingResourceRoot(self.resource_root.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_path() {
        let config = BridgeConfig {
            resource_root: PathBuf::from("server/resources"),
            ..Default::default()
        };

        let path = config.resource_path("chat").unwrap();
        assert_eq!(path, PathBuf::from("server/resources/chat.rhai"));
    }

    #[test]
    fn test_resource_path_rejects_traversal() {
        let config = BridgeConfig::default();
        for name in ["../evil", "some/path", "some\\path", ""] {
            assert!(matches!(
                config.resource_path(name),
                Err(ConfigError::InvalidResourceName(_))
            ));
        }
    }

    #[test]
    fn test_resource_name() {
        let config = BridgeConfig::default();
        assert_eq!(
            config.resource_name(Path::new("resources/chat.rhai")),
            Some("chat".to_string())
        );
        assert_eq!(config.resource_name(Path::new("resources/notes.txt")), None);
    }

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.resource_root, PathBuf::from("resources"));
        assert_eq!(config.script_extension, "rhai");
        assert_eq!(config.peer(), PeerId(1));
        assert_eq!(config.limits.max_call_levels, 50);
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        std::fs::write(
            &path,
            r#"{ "debug": true, "peer_id": 7, "resources": ["chat"], "limits": { "max_operations": 5 } }"#,
        )
        .unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert!(config.debug);
        assert_eq!(config.peer(), PeerId(7));
        assert_eq!(config.resources, vec!["chat".to_string()]);
        assert_eq!(config.limits.max_operations, 5);
        assert_eq!(config.limits.max_call_levels, 50);
        assert_eq!(config.script_extension, "rhai");
    }

    #[test]
    fn test_validate_missing_root() {
        let config = BridgeConfig {
            resource_root: PathBuf::from("definitely/not/here"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingResourceRoot(_))
        ));
    }
}
