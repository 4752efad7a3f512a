use json_model_value::{TextEncoding, WriteOptions};
use serde::{Deserialize, Serialize};

use crate::convert::ConversionRegistry;

/// Per-document reading and writing options.
///
/// Shared by a document and every nested document resolved through its
/// properties. The serializable part can be loaded from a host config file:
///
/// ```toml
/// encoding = "utf-16le"
///
/// [write]
/// mode = "pretty"
/// escape_slashes = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSettings {
    pub write: WriteOptions,
    /// Encoding of the byte form produced by `to_encoded_bytes` and consumed
    /// by `deserialize_bytes`.
    pub encoding: TextEncoding,
    #[serde(skip)]
    pub conversions: ConversionRegistry,
}

impl JsonSettings {
    pub fn with_write(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_conversions(mut self, conversions: ConversionRegistry) -> Self {
        self.conversions = conversions;
        self
    }
}
