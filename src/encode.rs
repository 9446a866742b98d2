pub(crate) mod png_meta;

pub use png_meta::{METADATA_CHUNK, embed_metadata, extract_metadata};
