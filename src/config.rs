//! Viewer configuration.
//!
//! Read from a JSON file; every field is optional and falls back to its
//! default, so `{}` is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::matcher::StageComposition;
use crate::shadow::ShadowSettings;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Draw the terrain shadow overlay.
    pub shadow_map: bool,
    /// Soften one-level elevation steps, as when hex inclines are drawn.
    pub hex_inclines: bool,
    pub stage_composition: StageComposition,
    /// Directory tile image names are relative to. Defaults to the tileset's directory.
    pub images_dir: Option<PathBuf>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            shadow_map: true,
            hex_inclines: false,
            stage_composition: StageComposition::default(),
            images_dir: None,
        }
    }
}

impl ViewConfig {
    /// Read a configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file, or fall back to defaults if it is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using default configuration", e);
                Self::default()
            }
        }
    }

    /// The shadow switches this configuration asks for.
    pub fn shadow_settings(&self) -> ShadowSettings {
        ShadowSettings {
            enabled: self.shadow_map,
            hex_inclines: self.hex_inclines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config: ViewConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ViewConfig::default());
        assert!(config.shadow_map);
        assert_eq!(config.stage_composition, StageComposition::Independent);
    }

    #[test]
    fn test_partial_override() {
        let config: ViewConfig =
            serde_json::from_str(r#"{"hex_inclines": true, "stage_composition": "chained"}"#).unwrap();
        assert!(config.shadow_map);
        assert!(config.hex_inclines);
        assert_eq!(config.stage_composition, StageComposition::Chained);
        assert_eq!(
            config.shadow_settings(),
            ShadowSettings {
                enabled: true,
                hex_inclines: true
            }
        );
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = std::env::temp_dir().join("hex_terrain_view_no_such_config.json");
        assert!(matches!(ViewConfig::load(&path), Err(ConfigError::Io { .. })));
        assert_eq!(ViewConfig::load_or_default(&path), ViewConfig::default());
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("hex_terrain_view_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("view.json");
        std::fs::write(&path, "{ shadow_map: yes }").unwrap();
        assert!(matches!(ViewConfig::load(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(ViewConfig::load_or_default(&path), ViewConfig::default());
    }
}
