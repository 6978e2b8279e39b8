//! Encoding-fallback JSON reader.
//!
//! Input files are mostly UTF-8 but older exports use Latin-1 or Windows-1252.
//! Each encoding is tried in turn; an attempt succeeds only if the text both
//! decodes and parses as JSON.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use serde_json::Value;

use crate::error::{GeoSieveError, Result};
use crate::error::util::safe_read_file;

/// Text encodings a GeoJSON file may be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Iso8859_1,
    Windows1252,
    Cp1252,
}

/// Order in which encodings are attempted
pub const FALLBACK_ENCODINGS: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Iso8859_1,
    TextEncoding::Windows1252,
    TextEncoding::Cp1252,
];

impl TextEncoding {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Iso8859_1 => "iso-8859-1",
            Self::Windows1252 => "windows-1252",
            Self::Cp1252 => "cp1252",
        }
    }

    /// Decode `bytes`, `None` when they are not valid in this encoding
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
            }
            Self::Iso8859_1 => Some(encoding_rs::mem::decode_latin1(bytes)),
            // cp1252 is an alias of windows-1252
            Self::Windows1252 | Self::Cp1252 => {
                WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decode and parse `bytes` as JSON, returning the encoding that worked
///
/// # Arguments
/// * `bytes` - Raw file content
/// * `file` - File name used in the error
pub fn decode_json(bytes: &[u8], file: &str) -> Result<(Value, TextEncoding)> {
    let mut last_error = String::from("no encoding attempted");
    for encoding in FALLBACK_ENCODINGS {
        let Some(text) = encoding.decode(bytes) else {
            last_error = format!("not valid {encoding}");
            continue;
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                if encoding != TextEncoding::Utf8 {
                    log::debug!("{file} decoded as {encoding}");
                }
                return Ok((value, encoding));
            }
            Err(e) => last_error = format!("{encoding}: {e}"),
        }
    }

    Err(GeoSieveError::file_processing(
        file,
        format!(
            "Could not decode file with any of the encodings {} (last error: {last_error})",
            itertools::join(FALLBACK_ENCODINGS.iter().map(|e| e.label()), ", ")
        ),
    ))
}

/// Read a file and decode it as JSON
pub fn read_json_file(path: &Path) -> Result<(Value, TextEncoding)> {
    let bytes = safe_read_file(path, "GeoJSON input")?;
    decode_json(&bytes, &path.display().to_string())
}
