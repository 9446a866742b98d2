pub(crate) mod composite;
pub(crate) mod raster;
pub(crate) mod text;

pub use raster::{RasterImage, RasterOpts, Rasterizer};
pub use composite::{PremulRgba8, blend_over_in_place, over};
pub use text::{TextBrush, TextEngine, wrap_lines};
