pub(crate) mod decode;
pub(crate) mod loader;

pub use decode::{DecodedImage, decode_data_uri, decode_image, encode_data_uri, encode_png_premul};
pub use loader::{ImageLoader, SourceLoader};
