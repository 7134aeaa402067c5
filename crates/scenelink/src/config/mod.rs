//! Configuration for instance defaults
//!
//! Hosts usually stamp out many bindings with the same starting
//! parameters; [`InstanceDefaults`] captures those in a serializable,
//! validated struct loadable from TOML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::ShadowCasting;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML source failed to parse
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A parsed value is outside its valid range
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Default tuning applied to newly created geometry instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceDefaults {
    /// Render layer mask for new instances; must keep at least one bit set
    pub layer_mask: u32,

    /// Shadow casting mode for new instances
    pub cast_shadows: ShadowCasting,

    /// Default LOD window minimum distance
    pub lod_min_distance: f32,

    /// Default LOD window maximum distance
    pub lod_max_distance: f32,

    /// Default extra cull margin
    pub extra_cull_margin: f32,
}

impl Default for InstanceDefaults {
    fn default() -> Self {
        Self {
            layer_mask: 1,
            cast_shadows: ShadowCasting::On,
            lod_min_distance: 0.0,
            lod_max_distance: 0.0,
            extra_cull_margin: 0.0,
        }
    }
}

impl InstanceDefaults {
    /// Parse defaults from TOML source and validate them
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let defaults: Self = toml::from_str(source)?;
        defaults.validate()?;
        Ok(defaults)
    }

    /// Check every value is usable as a default
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layer_mask == 0 {
            return Err(ConfigError::Invalid(
                "layer_mask must keep at least one layer active".into(),
            ));
        }
        for (name, value) in [
            ("lod_min_distance", self.lod_min_distance),
            ("lod_max_distance", self.lod_max_distance),
            ("extra_cull_margin", self.extra_cull_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
