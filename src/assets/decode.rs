use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// Decoded raster in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

pub fn decode_image(bytes: &[u8]) -> ComposerResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Encode premultiplied RGBA8 as a straight-alpha PNG.
pub fn encode_png_premul(rgba8_premul: &[u8], width: u32, height: u32) -> ComposerResult<Vec<u8>> {
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ComposerError::raster("pixel buffer length does not match dimensions"));
    }
    let mut straight = rgba8_premul.to_vec();
    unpremultiply_rgba8_in_place(&mut straight);
    let img = image::RgbaImage::from_raw(width, height, straight)
        .ok_or_else(|| ComposerError::raster("pixel buffer rejected by encoder"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Split a base64 `data:` URI into its media type and payload.
pub fn decode_data_uri(uri: &str) -> ComposerResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ComposerError::validation("not a data: URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ComposerError::validation("data: URI is missing ','"))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| ComposerError::validation("only base64 data: URIs are supported"))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .context("decode data: URI payload")?;
    Ok((mime.to_string(), bytes))
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
