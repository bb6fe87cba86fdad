use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration, supplied once at construction.
///
/// Reached-anchor callbacks are not part of this struct since they cannot be
/// serialized; pass them through [`crate::AnchorOptions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Throttle window for reached-anchor detection and per-anchor navigation
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Offset added on the x-axis when scrolling to an anchor
    #[serde(default)]
    pub offset_x: f64,
    /// Offset added on the y-axis when scrolling to an anchor
    #[serde(default)]
    pub offset_y: f64,
    /// Report the nearest anchor even when the viewport sits before the first one
    #[serde(default)]
    pub keep_in_bounds: bool,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            offset_x: 0.0,
            offset_y: 0.0,
            keep_in_bounds: false,
        }
    }
}

fn default_throttle_ms() -> u64 {
    200
}

impl AnchorConfig {
    /// Throttle window as a `Duration`
    #[inline]
    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn to_toml_string(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnchorConfig::default();
        assert_eq!(config.throttle_ms, 200);
        assert_eq!(config.offset_x, 0.0);
        assert_eq!(config.offset_y, 0.0);
        assert!(!config.keep_in_bounds);
        assert_eq!(config.throttle_window(), Duration::from_millis(200));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AnchorConfig::from_toml_str("offset_y = -12.5\nkeep_in_bounds = true\n").unwrap();
        assert_eq!(config.throttle_ms, 200);
        assert_eq!(config.offset_y, -12.5);
        assert!(config.keep_in_bounds);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AnchorConfig::from_toml_str("throttle_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let dir = std::env::temp_dir().join(format!("anchorscroll-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");

        let config = AnchorConfig {
            throttle_ms: 50,
            offset_x: 4.0,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AnchorConfig::load(&path).unwrap(), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("anchorscroll-does-not-exist.toml");
        assert_eq!(AnchorConfig::load(&path).unwrap(), AnchorConfig::default());
    }
}
