//! Tuning parameters shared by the scene databases.
//!
//! Settings can be built in code or loaded from a TOML file:
//!
//! ```toml
//! octree_max_depth = 6
//! octree_max_leaf_size = 16
//! radar_sort = "height"
//! cull_occluders = 0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Order in which radar nodes are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadarSortMode {
    /// The order the static nodes were added.
    Insertion,
    /// Lowest top first, so taller objects draw over shorter ones.
    #[default]
    Height,
}

/// Scene database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Deepest octree level; cells at this depth are always leaves.
    pub octree_max_depth: u32,
    /// Cells holding this many elements or fewer are not subdivided.
    pub octree_max_leaf_size: usize,
    pub radar_sort: RadarSortMode,
    /// Number of occluders to track; 0 disables occlusion culling. Other
    /// values are clamped to between 2 and [`MAX_OCCLUDERS`].
    ///
    /// [`MAX_OCCLUDERS`]: crate::MAX_OCCLUDERS
    pub cull_occluders: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            octree_max_depth: 6,
            octree_max_leaf_size: 16,
            radar_sort: RadarSortMode::Height,
            cull_occluders: 0,
        }
    }
}

impl SceneConfig {
    /// Load from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Rejects settings no database can honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.octree_max_leaf_size == 0 {
            return Err(ConfigError::Invalid(
                "octree_max_leaf_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SceneConfig::default();

        assert_eq!(config.octree_max_depth, 6);
        assert_eq!(config.octree_max_leaf_size, 16);
        assert_eq!(config.radar_sort, RadarSortMode::Height);
        assert_eq!(config.cull_occluders, 0);
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config = SceneConfig::from_toml_str(
            r#"
            octree_max_depth = 4
            radar_sort = "insertion"
            "#,
        )
        .unwrap();

        assert_eq!(config.octree_max_depth, 4);
        assert_eq!(config.radar_sort, RadarSortMode::Insertion);
        assert_eq!(config.octree_max_leaf_size, 16);
    }

    #[test]
    fn parse_rejects_bad_values() {
        let unknown_sort = SceneConfig::from_toml_str(r#"radar_sort = "color""#);
        assert!(matches!(unknown_sort, Err(ConfigError::Parse(_))));

        let empty_leaf = SceneConfig::from_toml_str("octree_max_leaf_size = 0");
        assert!(matches!(empty_leaf, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn large_occluder_count_is_accepted() {
        let config = SceneConfig::from_toml_str("cull_occluders = 100").unwrap();

        assert_eq!(config.cull_occluders, 100);
    }

    #[test]
    fn toml_round_trip() {
        let config = SceneConfig {
            octree_max_depth: 3,
            cull_occluders: 4,
            ..SceneConfig::default()
        };
        let text = config.to_toml_string().unwrap();

        assert_eq!(SceneConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = SceneConfig::load("/nonexistent/scene.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
