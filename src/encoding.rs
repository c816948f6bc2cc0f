//! Text-encoding normalization for cached lyrics files.
//!
//! Cache files written by older tooling are sometimes GBK-encoded. Reads pass
//! through [`normalize`], which returns valid UTF-8 unchanged and otherwise
//! re-decodes the bytes as GBK. Inputs in any third encoding will be
//! mis-decoded; this heuristic is an accepted limitation, not a universal
//! charset detector.

use crate::error::{LyricsError, Result};

/// Normalize raw file bytes to a UTF-8 string.
///
/// Valid UTF-8 is returned as-is. Anything else is assumed to be GBK; if the
/// GBK decode itself hits unmappable bytes the error is surfaced rather than
/// silently emitting replacement characters.
pub fn normalize(bytes: Vec<u8>) -> Result<String> {
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, had_errors) = encoding_rs::GBK.decode(&bytes);
            if had_errors {
                return Err(LyricsError::Encoding(
                    "content is neither valid UTF-8 nor valid GBK".to_string(),
                ));
            }
            Ok(decoded.into_owned())
        }
    }
}
