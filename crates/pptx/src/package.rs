//! Base64 transport form of a presentation package.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reuse_core::{Error, Result};

/// Prefix browsers put in front of base64 file contents.
const DATA_URL_MARKER: &str = "base64,";

/// Encode a package for the host's insert call.
pub fn encode_package(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 package, tolerating a leading `data:...;base64,` prefix.
pub fn decode_package(encoded: &str) -> Result<Vec<u8>> {
    let payload = match encoded.find(DATA_URL_MARKER) {
        Some(pos) => &encoded[pos + DATA_URL_MARKER.len()..],
        None => encoded,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::PptxParseError(format!("Invalid base64 package: {}", e)))
}
