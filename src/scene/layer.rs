use serde::{Deserialize, Serialize};

use crate::foundation::core::{BoundingBox, Point};

/// Smallest width/height a layer may be resized to.
pub const MIN_LAYER_SIZE: f64 = 1.0;

/// Opaque, never-reused layer identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    /// Allocate a fresh random identifier.
    pub fn fresh() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Compositing operator applied when painting a layer over the layers beneath it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Every supported mode, in menu order.
    pub const ALL: [BlendMode; 16] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Text content and styling of a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    #[serde(default = "default_font_weight")]
    pub font_weight: u16,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_transform: TextTransform,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default = "default_text_color")]
    pub color: String,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
}

impl TextContent {
    /// Text as it is drawn, after `textTransform`.
    pub fn display_text(&self) -> String {
        match self.text_transform {
            TextTransform::None => self.text.clone(),
            TextTransform::Uppercase => self.text.to_uppercase(),
        }
    }
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "Inter".to_string(),
            font_size: 48.0,
            font_weight: default_font_weight(),
            font_style: FontStyle::Normal,
            text_transform: TextTransform::None,
            text_align: TextAlign::Left,
            color: default_text_color(),
            line_height: default_line_height(),
        }
    }
}

fn default_font_weight() -> u16 {
    400
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

fn default_line_height() -> f64 {
    1.2
}

/// What a layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerContent {
    /// Raster content referenced by URL, relative path or `data:` URI.
    Image { source: String },
    /// Laid-out text.
    Text(TextContent),
}

/// A positioned, transformable visual unit of the scene.
///
/// Geometry is the unrotated box (`x`, `y` top-left, `width`, `height`); `rotation` is in
/// degrees about the box center. Equality is structural over every field and is what history
/// deduplication relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub content: LayerContent,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    /// 0..=100.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub is_locked: bool,
}

fn default_opacity() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}

impl Layer {
    fn with_content(content: LayerContent, name: String, bounds: BoundingBox) -> Self {
        Self {
            id: LayerId::fresh(),
            name,
            content,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width.max(MIN_LAYER_SIZE),
            height: bounds.height.max(MIN_LAYER_SIZE),
            rotation: 0.0,
            opacity: default_opacity(),
            blend_mode: BlendMode::Normal,
            is_visible: true,
            is_locked: false,
        }
    }

    /// New image layer with a fresh id.
    pub fn new_image(source: impl Into<String>, bounds: BoundingBox) -> Self {
        Self::with_content(
            LayerContent::Image {
                source: source.into(),
            },
            "Image".to_string(),
            bounds,
        )
    }

    /// New text layer with a fresh id.
    pub fn new_text(text: TextContent, bounds: BoundingBox) -> Self {
        let name = text.text.chars().take(24).collect::<String>();
        Self::with_content(LayerContent::Text(text), name, bounds)
    }

    /// Copy with a fresh id, translated by `(dx, dy)`.
    pub fn duplicated(&self, dx: f64, dy: f64) -> Self {
        let mut out = self.clone();
        out.id = LayerId::fresh();
        out.x += dx;
        out.y += dy;
        out
    }

    pub fn is_text(&self) -> bool {
        matches!(self.content, LayerContent::Text(_))
    }

    pub fn text(&self) -> Option<&TextContent> {
        match &self.content {
            LayerContent::Text(t) => Some(t),
            LayerContent::Image { .. } => None,
        }
    }

    /// Source of an image layer.
    pub fn image_source(&self) -> Option<&str> {
        match &self.content {
            LayerContent::Image { source } => Some(source),
            LayerContent::Text(_) => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextContent> {
        match &mut self.content {
            LayerContent::Text(t) => Some(t),
            LayerContent::Image { .. } => None,
        }
    }

    /// Unrotated box.
    pub fn frame(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }

    /// Rotation pivot.
    pub fn center(&self) -> Point {
        self.frame().center()
    }

    /// Place the unrotated box so that its center lands on `c`.
    pub fn set_center(&mut self, c: Point) {
        self.x = c.x - self.width / 2.0;
        self.y = c.y - self.height / 2.0;
    }

    /// Opacity as a `0.0..=1.0` factor.
    pub fn opacity_factor(&self) -> f32 {
        (self.opacity / 100.0).clamp(0.0, 1.0) as f32
    }

    /// Scale the box by `s` about its top-left; text layers scale their font with it.
    pub fn scale_size(&mut self, s: f64) {
        self.width = (self.width * s).max(MIN_LAYER_SIZE);
        self.height = (self.height * s).max(MIN_LAYER_SIZE);
        if let Some(t) = self.text_mut() {
            t.font_size = (t.font_size * s).max(1.0);
        }
    }

    /// Numeric fields must be finite and sizes positive for a layer to be renderable.
    pub fn is_renderable(&self) -> bool {
        let finite = [self.x, self.y, self.width, self.height, self.rotation, self.opacity]
            .iter()
            .all(|v| v.is_finite());
        finite && self.width > 0.0 && self.height > 0.0
    }
}

/// Index of the layer with `id` in a topmost-first stack.
pub fn index_of(layers: &[Layer], id: &LayerId) -> Option<usize> {
    layers.iter().position(|l| &l.id == id)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/layer.rs"]
mod tests;
