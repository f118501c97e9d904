//! Export configuration

use std::path::Path;

use gltfbridge_core::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};

/// Options controlling how scene resources are exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Give primitives without a shading group a neutral default material.
    /// Off unless asked for
    pub default_material: bool,

    /// Replace every material by a flat debug color, one hue per material
    pub colorize_materials: bool,

    /// Export no material for lambert/phong/blinn shaders
    pub skip_standard_materials: bool,

    /// Do not sample blend shape targets
    pub skip_blend_shapes: bool,

    /// Multiplier applied to every exported opacity
    pub opacity_factor: f64,

    /// Indent JSON output
    pub pretty_json: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            default_material: false,
            colorize_materials: false,
            skip_standard_materials: false,
            skip_blend_shapes: false,
            opacity_factor: 1.0,
            pretty_json: true,
        }
    }
}

impl ExportOptions {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text)
            .map_err(|e| Error::invalid_config(format!("export options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).with_context(|| format!("loading {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.opacity_factor.is_finite() || self.opacity_factor < 0.0 {
            return Err(Error::invalid_config(format!(
                "opacity_factor must be a finite, non-negative number (got {})",
                self.opacity_factor
            )));
        }
        Ok(())
    }
}
