//! Application metadata stored in a private PNG chunk.
//!
//! Chunk layout: 4-byte big-endian data length, 4-byte type, data, then a CRC-32 over
//! type + data. The metadata chunk carries UTF-8 JSON and is written immediately before `IEND`.

use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::Crc32;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Chunk type holding the JSON metadata.
pub const METADATA_CHUNK: [u8; 4] = *b"cMPs";

const IEND: [u8; 4] = *b"IEND";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk<'a> {
    kind: [u8; 4],
    data: &'a [u8],
    crc: u32,
    /// The whole chunk, length through CRC.
    raw: &'a [u8],
}

impl Chunk<'_> {
    fn crc_ok(&self) -> bool {
        Crc32::checksum(&[&self.kind, self.data]) == self.crc
    }
}

/// Iterates chunks after the signature, ending after `IEND`.
struct Chunks<'a> {
    rest: &'a [u8],
    done: bool,
}

fn chunks(png: &[u8]) -> ComposerResult<Chunks<'_>> {
    let rest = png
        .strip_prefix(&PNG_SIGNATURE[..])
        .ok_or_else(|| ComposerError::invalid_document("not a PNG: bad signature"))?;
    Ok(Chunks { rest, done: false })
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

impl<'a> Iterator for Chunks<'a> {
    type Item = ComposerResult<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.rest.is_empty() {
            return None;
        }
        if self.rest.len() < 12 {
            self.done = true;
            return Some(Err(ComposerError::invalid_document(
                "truncated PNG chunk header",
            )));
        }
        let len = be_u32(&self.rest[0..4]) as usize;
        let total = 12usize.saturating_add(len);
        if self.rest.len() < total {
            self.done = true;
            return Some(Err(ComposerError::invalid_document("truncated PNG chunk")));
        }
        let raw = &self.rest[..total];
        let kind = [raw[4], raw[5], raw[6], raw[7]];
        let chunk = Chunk {
            kind,
            data: &raw[8..8 + len],
            crc: be_u32(&raw[8 + len..]),
            raw,
        };
        self.rest = &self.rest[total..];
        self.done = kind == IEND;
        Some(Ok(chunk))
    }
}

fn write_chunk(out: &mut Vec<u8>, kind: [u8; 4], data: &[u8]) -> ComposerResult<()> {
    let len = u32::try_from(data.len())
        .map_err(|_| ComposerError::validation("metadata too large for a PNG chunk"))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&Crc32::checksum(&[&kind, data]).to_be_bytes());
    Ok(())
}

/// Return `png` with `meta` embedded, replacing any metadata chunk already present.
pub fn embed_metadata(png: &[u8], meta: &serde_json::Value) -> ComposerResult<Vec<u8>> {
    let payload = serde_json::to_vec(meta).map_err(|e| ComposerError::serde(e.to_string()))?;

    let mut out = Vec::with_capacity(png.len() + payload.len() + 12);
    out.extend_from_slice(&PNG_SIGNATURE);
    let mut saw_end = false;
    for chunk in chunks(png)? {
        let chunk = chunk?;
        if chunk.kind == METADATA_CHUNK {
            continue;
        }
        if chunk.kind == IEND {
            write_chunk(&mut out, METADATA_CHUNK, &payload)?;
            saw_end = true;
        }
        out.extend_from_slice(chunk.raw);
    }
    if !saw_end {
        return Err(ComposerError::invalid_document("PNG has no IEND chunk"));
    }
    Ok(out)
}

/// JSON stored in the metadata chunk, or `None` when the image has none.
pub fn extract_metadata(png: &[u8]) -> ComposerResult<Option<serde_json::Value>> {
    for chunk in chunks(png)? {
        let chunk = chunk?;
        if chunk.kind != METADATA_CHUNK {
            continue;
        }
        if !chunk.crc_ok() {
            return Err(ComposerError::invalid_document(
                "metadata chunk CRC mismatch",
            ));
        }
        let value = serde_json::from_slice(chunk.data).map_err(|e| {
            ComposerError::invalid_document(format!("metadata is not JSON: {e}"))
        })?;
        return Ok(Some(value));
    }
    Ok(None)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png_meta.rs"]
mod tests;
