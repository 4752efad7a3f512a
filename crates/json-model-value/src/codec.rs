//! Reading and writing the JSON text form.

use std::io;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use tracing::debug;

use crate::encoding::TextEncoding;
use crate::error::ValueError;
use crate::store::ValueStore;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// No insignificant whitespace.
    #[default]
    Compact,
    /// Two-space indentation, one member per line.
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub mode: WriteMode,
    /// Write `/` as `\/` inside strings.
    pub escape_slashes: bool,
}

impl WriteOptions {
    pub fn pretty() -> Self {
        WriteOptions {
            mode: WriteMode::Pretty,
            ..Self::default()
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(o) => o.borrow().serialize(serializer),
        }
    }
}

impl Serialize for ValueStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl<'de> Deserialize<'de> for ValueStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Map::deserialize(deserializer).map(ValueStore::from)
    }
}

/// Formatter adapter that escapes forward slashes in string content.
struct EscapeSlashes<F>(F);

impl<F: Formatter> Formatter for EscapeSlashes<F> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut parts = fragment.split('/');
        if let Some(first) = parts.next() {
            self.0.write_string_fragment(writer, first)?;
        }
        for part in parts {
            writer.write_all(b"\\/")?;
            self.0.write_string_fragment(writer, part)?;
        }
        Ok(())
    }
}

fn write_with<T, F>(value: &T, formatter: F) -> Result<Vec<u8>, ValueError>
where
    T: Serialize + ?Sized,
    F: Formatter,
{
    let mut out = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Serializes `value` as UTF-8 JSON text. Object members keep insertion order.
pub fn to_vec<T>(value: &T, options: &WriteOptions) -> Result<Vec<u8>, ValueError>
where
    T: Serialize + ?Sized,
{
    match (options.mode, options.escape_slashes) {
        (WriteMode::Compact, false) => write_with(value, CompactFormatter),
        (WriteMode::Compact, true) => write_with(value, EscapeSlashes(CompactFormatter)),
        (WriteMode::Pretty, false) => write_with(value, PrettyFormatter::new()),
        (WriteMode::Pretty, true) => write_with(value, EscapeSlashes(PrettyFormatter::new())),
    }
}

pub fn to_string<T>(value: &T, options: &WriteOptions) -> Result<String, ValueError>
where
    T: Serialize + ?Sized,
{
    let bytes = to_vec(value, options)?;
    String::from_utf8(bytes).map_err(|e| ValueError::encoding(TextEncoding::Utf8, e.to_string()))
}

/// Parses text that must hold exactly one JSON object.
pub fn parse_object(text: &str) -> Result<ValueStore, ValueError> {
    let parsed: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        debug!(target: "json_model_value::codec", error = %e, "rejected malformed JSON");
        ValueError::Parse(e)
    })?;
    match parsed {
        serde_json::Value::Object(map) => Ok(ValueStore::from(map)),
        other => {
            let found = Value::from(other).kind_name();
            debug!(target: "json_model_value::codec", found, "rejected non-object JSON");
            Err(ValueError::NotAnObject { found })
        }
    }
}

/// Decodes `bytes` with `encoding`, then parses them as one JSON object.
pub fn parse_object_bytes(bytes: &[u8], encoding: TextEncoding) -> Result<ValueStore, ValueError> {
    let text = encoding.decode(bytes)?;
    parse_object(&text)
}
