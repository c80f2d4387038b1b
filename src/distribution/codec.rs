//! `docZip` payloads: base64 of a gzip-compressed XML document.

use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;

use crate::core::{Document, Result, SefazError};
use crate::xml::{Element, parse};

/// Decompress a gzip payload and parse the XML inside.
///
/// Returns the decompressed text together with its tree. Malformed gzip,
/// non-UTF-8 content, malformed XML and DOCTYPE declarations all fail with
/// [`SefazError::Decode`].
pub fn decode(compressed: &[u8]) -> Result<(String, Element)> {
    let mut bytes = Vec::new();
    GzDecoder::new(compressed)
        .read_to_end(&mut bytes)
        .map_err(|e| SefazError::Decode(format!("invalid gzip payload: {e}")))?;
    let raw = String::from_utf8(bytes)
        .map_err(|e| SefazError::Decode(format!("payload is not UTF-8: {e}")))?;
    let content = parse(&raw)?;
    Ok((raw, content))
}

/// Build a [`Document`] from one `docZip` element's attributes and text.
pub(crate) fn decode_doc_zip(
    sequence_number: Option<u64>,
    schema: &str,
    payload: &str,
) -> Result<Document> {
    let compressed = STANDARD
        .decode(payload.trim())
        .map_err(|e| SefazError::Decode(format!("docZip is not base64: {e}")))?;
    let (raw, content) = decode(&compressed)?;
    Ok(Document {
        sequence_number,
        schema: schema.to_string(),
        content,
        raw,
    })
}
