//! Text encodings accepted for the serialized form of a document.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Character encoding of JSON text handed to or produced by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
    /// ISO-8859-1. Only code points up to U+00FF can be encoded.
    #[serde(rename = "iso-8859-1", alias = "latin-1")]
    Latin1,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Latin1 => "iso-8859-1",
        }
    }

    /// Decodes `bytes` into a string. A leading byte order mark is skipped.
    pub fn decode(self, bytes: &[u8]) -> Result<String, ValueError> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| ValueError::encoding(self, e.to_string()))
            }
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(ValueError::encoding(self, "odd number of bytes"));
                }
                let units = bytes.chunks_exact(2).map(|pair| {
                    if self == TextEncoding::Utf16Le {
                        u16::from_le_bytes([pair[0], pair[1]])
                    } else {
                        u16::from_be_bytes([pair[0], pair[1]])
                    }
                });
                let units: Vec<u16> = units.collect();
                let units = match units.first() {
                    Some(0xFEFF) => &units[1..],
                    _ => &units[..],
                };
                String::from_utf16(units).map_err(|e| ValueError::encoding(self, e.to_string()))
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Encodes `text`. No byte order mark is written.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, ValueError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            TextEncoding::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        ValueError::encoding(self, format!("character {c:?} is outside latin-1"))
                    })
                })
                .collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
