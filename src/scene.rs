pub(crate) mod document;
pub(crate) mod layer;
pub(crate) mod selection;

pub use document::{CanvasSettings, Document, GridSettings, GuideSettings};
pub use layer::{
    BlendMode, FontStyle, Layer, LayerContent, LayerId, MIN_LAYER_SIZE, TextAlign, TextContent,
    TextTransform,
};
pub use selection::Selection;
