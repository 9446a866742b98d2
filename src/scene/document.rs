use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::color::parse_css_color;
use crate::foundation::core::{BoundingBox, Rgba8};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::scene::layer::Layer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_grid_size")]
    pub size: f64,
    #[serde(default = "default_grid_color")]
    pub color: String,
    #[serde(default)]
    pub snap: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            size: default_grid_size(),
            color: default_grid_color(),
            snap: false,
        }
    }
}

fn default_grid_size() -> f64 {
    20.0
}

fn default_grid_color() -> String {
    "#ffffff1a".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Y positions of horizontal guides.
    #[serde(default)]
    pub horizontal: Vec<f64>,
    /// X positions of vertical guides.
    #[serde(default)]
    pub vertical: Vec<f64>,
}

/// Document-level canvas configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettings {
    pub width: f64,
    pub height: f64,
    /// CSS color, or `"transparent"`.
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub guides: GuideSettings,
    /// No fixed bounds: exports need an explicit capture region.
    #[serde(default)]
    pub is_infinite: bool,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 1024.0,
            background: default_background(),
            grid: GridSettings::default(),
            guides: GuideSettings::default(),
            is_infinite: false,
        }
    }
}

impl CanvasSettings {
    /// Fixed document bounds, `None` for an infinite canvas.
    pub fn bounds(&self) -> Option<BoundingBox> {
        (!self.is_infinite).then(|| BoundingBox::new(0.0, 0.0, self.width, self.height))
    }

    /// Parsed background; fully transparent backgrounds map to `None`.
    pub fn background_rgba(&self) -> ComposerResult<Option<Rgba8>> {
        let c = parse_css_color(&self.background)?;
        Ok((c.a != 0).then_some(c))
    }
}

/// Persisted document: canvas settings plus the topmost-first layer stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub canvas_settings: CanvasSettings,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Document {
    /// Parse and validate a document from JSON text.
    pub fn from_json_str(s: &str) -> ComposerResult<Self> {
        let doc: Document = serde_json::from_str(s)
            .map_err(|e| ComposerError::invalid_document(format!("parse document JSON: {e}")))?;
        doc.validate()?;
        Ok(doc)
    }

    /// Parse and validate a document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ComposerResult<Self> {
        let doc: Document = serde_json::from_reader(r)
            .map_err(|e| ComposerError::invalid_document(format!("parse document JSON: {e}")))?;
        doc.validate()?;
        Ok(doc)
    }

    /// Parse and validate a document from a JSON file on disk.
    #[tracing::instrument]
    pub fn from_path(path: &Path) -> ComposerResult<Self> {
        let f = File::open(path).map_err(|e| {
            ComposerError::invalid_document(format!("open document '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn to_json_string_pretty(&self) -> ComposerResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ComposerError::serde(e.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub fn write_path(&self, path: &Path) -> ComposerResult<()> {
        let s = self.to_json_string_pretty()?;
        std::fs::write(path, s)
            .with_context(|| format!("write document '{}'", path.display()))
            .map_err(ComposerError::from)
    }

    /// Check the semantic constraints serde cannot express.
    pub fn validate(&self) -> ComposerResult<()> {
        let cs = &self.canvas_settings;
        if !(cs.width.is_finite() && cs.height.is_finite() && cs.width > 0.0 && cs.height > 0.0) {
            return Err(ComposerError::invalid_document(
                "canvas width and height must be finite and > 0",
            ));
        }
        parse_css_color(&cs.background).map_err(|e| {
            ComposerError::invalid_document(format!("canvas background: {e}"))
        })?;

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(&layer.id) {
                return Err(ComposerError::invalid_document(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            if !layer.is_renderable() {
                return Err(ComposerError::invalid_document(format!(
                    "layer '{}' has non-finite geometry or non-positive size",
                    layer.id
                )));
            }
            if !(0.0..=100.0).contains(&layer.opacity) {
                return Err(ComposerError::invalid_document(format!(
                    "layer '{}' opacity must be within 0..=100",
                    layer.id
                )));
            }
            if let Some(t) = layer.text() {
                if !(t.font_size.is_finite() && t.font_size > 0.0) {
                    return Err(ComposerError::invalid_document(format!(
                        "layer '{}' fontSize must be > 0",
                        layer.id
                    )));
                }
                if !(t.line_height.is_finite() && t.line_height > 0.0) {
                    return Err(ComposerError::invalid_document(format!(
                        "layer '{}' lineHeight must be > 0",
                        layer.id
                    )));
                }
                parse_css_color(&t.color).map_err(|e| {
                    ComposerError::invalid_document(format!("layer '{}' color: {e}", layer.id))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
