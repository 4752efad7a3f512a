//! Conversion between stored JSON values and native property types.
//!
//! The store only holds `null`, booleans, numbers, strings, objects and
//! arrays. A native type either maps onto one of those directly, or it is
//! kept as a *canonical string* produced and parsed by a converter.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use json_model_value::Value;

use crate::settings::JsonSettings;

/// Canonical string standing for "no value".
pub const NULL_SENTINEL: &str = "<null>";

/// Accepted boolean spellings as `(false, true)` pairs, matched exactly.
pub const BOOLEAN_LITERALS: [(&str, &str); 4] =
    [("false", "true"), ("N", "Y"), ("OFF", "ON"), ("NO", "YES")];

/// Closed set of native categories a property type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Boolean,
    Integer,
    Decimal,
    Text,
    /// A nested document aliasing an object node.
    Document,
    /// An untyped JSON value.
    Raw,
    /// Stored through its canonical string form.
    Custom,
}

impl NativeKind {
    pub fn requires_conversion(self) -> bool {
        self == NativeKind::Custom
    }
}

/// A type that can be the value of a property or an array element.
///
/// Implemented for `bool`, the common integer types, `f64`, `String`,
/// `serde_json::Value` and every [`Document`](crate::Document). Other types
/// opt in with [`string_backed!`](crate::string_backed).
pub trait PropertyValue: Clone + PartialEq + 'static {
    const KIND: NativeKind;

    /// Reads a stored value that already has a native representation.
    fn from_native(value: &Value, settings: &Rc<JsonSettings>) -> Option<Self>;

    /// Parses the canonical string form.
    fn from_canonical(text: &str) -> Option<Self> {
        let _ = text;
        None
    }

    fn to_canonical(&self) -> String;

    /// The stored representation when no conversion is required.
    fn into_value(self) -> Value;
}

/// Implements [`PropertyValue`] for types that round-trip through
/// `Display`/`FromStr`. Values are stored as their canonical string.
///
/// ```
/// use std::net::Ipv4Addr;
/// use json_model::{string_backed, JsonModel};
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct Addr(Ipv4Addr);
/// # impl std::fmt::Display for Addr {
/// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
/// # }
/// # impl std::str::FromStr for Addr {
/// #     type Err = std::net::AddrParseError;
/// #     fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(Addr) }
/// # }
/// string_backed!(Addr);
///
/// let doc = JsonModel::new();
/// doc.define_property::<Addr>("host").set(Addr(Ipv4Addr::LOCALHOST));
/// assert_eq!(doc.to_json_string().unwrap(), r#"{"host":"127.0.0.1"}"#);
/// ```
#[macro_export]
macro_rules! string_backed {
    ($($t:ty),+ $(,)?) => {$(
        impl $crate::PropertyValue for $t {
            const KIND: $crate::NativeKind = $crate::NativeKind::Custom;

            fn from_native(
                _: &$crate::Value,
                _: &::std::rc::Rc<$crate::JsonSettings>,
            ) -> ::std::option::Option<Self> {
                ::std::option::Option::None
            }

            fn from_canonical(text: &str) -> ::std::option::Option<Self> {
                text.parse().ok()
            }

            fn to_canonical(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(self)
            }

            fn into_value(self) -> $crate::Value {
                $crate::Value::String(::std::string::ToString::to_string(&self))
            }
        }
    )+};
}

struct Converter<T> {
    to: Box<dyn Fn(&T) -> String>,
    from: Box<dyn Fn(&str) -> Option<T>>,
}

/// String converters registered for individual native types.
///
/// A registered converter takes precedence over the type's own canonical
/// form, and makes the type stored as a string even if it has a native
/// JSON representation.
#[derive(Clone, Default)]
pub struct ConversionRegistry {
    converters: HashMap<TypeId, Rc<dyn Any>>,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: PropertyValue>(
        &mut self,
        to_string: impl Fn(&T) -> String + 'static,
        from_string: impl Fn(&str) -> Option<T> + 'static,
    ) -> &mut Self {
        let converter = Converter {
            to: Box::new(to_string),
            from: Box::new(from_string),
        };
        self.converters
            .insert(TypeId::of::<T>(), Rc::new(converter));
        self
    }

    pub fn is_registered<T: PropertyValue>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    fn converter<T: PropertyValue>(&self) -> Option<&Converter<T>> {
        self.converters
            .get(&TypeId::of::<T>())
            .and_then(|c| c.downcast_ref::<Converter<T>>())
    }

    /// `false` when `T` maps directly onto a stored JSON value.
    pub fn is_conversion_required<T: PropertyValue>(&self) -> bool {
        T::KIND.requires_conversion() || self.is_registered::<T>()
    }

    /// Canonical string of `value`; `None` yields [`NULL_SENTINEL`].
    pub fn to_canonical_string<T: PropertyValue>(&self, value: Option<&T>) -> String {
        match (value, self.converter::<T>()) {
            (None, _) => NULL_SENTINEL.to_owned(),
            (Some(v), Some(converter)) => (converter.to)(v),
            (Some(v), None) => v.to_canonical(),
        }
    }

    /// Parses a canonical string. The sentinel and unparsable text both
    /// yield `None`.
    pub fn from_canonical_string<T: PropertyValue>(&self, text: &str) -> Option<T> {
        if text == NULL_SENTINEL {
            return None;
        }
        match self.converter::<T>() {
            Some(converter) => (converter.from)(text),
            None => T::from_canonical(text),
        }
    }

    /// The value written to the store for `value`.
    pub fn to_stored<T: PropertyValue>(&self, value: T) -> Value {
        if self.is_conversion_required::<T>() {
            Value::String(self.to_canonical_string(Some(&value)))
        } else {
            value.into_value()
        }
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("converters", &self.converters.len())
            .finish()
    }
}

/// Resolves a stored value into `T`.
///
/// Native representations are used as-is; strings fall back to the
/// canonical string pipeline. `Null` and anything unconvertible yield `None`.
pub(crate) fn resolve<T: PropertyValue>(raw: &Value, settings: &Rc<JsonSettings>) -> Option<T> {
    let registry = &settings.conversions;
    match raw {
        Value::Null => None,
        Value::String(text) if registry.is_conversion_required::<T>() => {
            registry.from_canonical_string(text)
        }
        Value::String(text) => {
            T::from_native(raw, settings).or_else(|| registry.from_canonical_string(text))
        }
        _ => T::from_native(raw, settings),
    }
}

pub(crate) fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    match full.find('<') {
        Some(generic) => full[..generic].rsplit("::").next().unwrap_or(full),
        None => full.rsplit("::").next().unwrap_or(full),
    }
}

/// Matches one of [`BOOLEAN_LITERALS`].
pub fn parse_boolean_literal(text: &str) -> Option<bool> {
    BOOLEAN_LITERALS.iter().find_map(|(no, yes)| {
        if text == *yes {
            Some(true)
        } else if text == *no {
            Some(false)
        } else {
            None
        }
    })
}

pub fn yn_string(value: bool) -> &'static str {
    if value {
        "Y"
    } else {
        "N"
    }
}

pub fn on_off_string(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

pub fn parse_yn(text: &str) -> Option<bool> {
    match text {
        "Y" => Some(true),
        "N" => Some(false),
        _ => None,
    }
}

pub fn parse_on_off(text: &str) -> Option<bool> {
    match text {
        "ON" => Some(true),
        "OFF" => Some(false),
        _ => None,
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    parse_boolean_literal(text)
        .map(i64::from)
        .or_else(|| text.parse().ok())
}

impl PropertyValue for bool {
    const KIND: NativeKind = NativeKind::Boolean;

    fn from_native(value: &Value, _: &Rc<JsonSettings>) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            _ => None,
        }
    }

    fn from_canonical(text: &str) -> Option<Self> {
        parse_boolean_literal(text).or_else(|| text.parse::<i64>().ok().map(|n| n != 0))
    }

    fn to_canonical(&self) -> String {
        self.to_string()
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

macro_rules! integer_value {
    ($($t:ty),*) => {$(
        impl PropertyValue for $t {
            const KIND: NativeKind = NativeKind::Integer;

            fn from_native(value: &Value, _: &Rc<JsonSettings>) -> Option<Self> {
                match value {
                    Value::Number(n) => match n.as_u64() {
                        Some(u) => <$t>::try_from(u).ok(),
                        None => integer_of(value).and_then(|i| <$t>::try_from(i).ok()),
                    },
                    _ => integer_of(value).and_then(|i| <$t>::try_from(i).ok()),
                }
            }

            fn from_canonical(text: &str) -> Option<Self> {
                match parse_integer(text) {
                    Some(i) => <$t>::try_from(i).ok(),
                    None => text.parse().ok(),
                }
            }

            fn to_canonical(&self) -> String {
                self.to_string()
            }

            fn into_value(self) -> Value {
                Value::from(self)
            }
        }
    )*};
}

integer_value!(i32, i64, u32, u64);

impl PropertyValue for f64 {
    const KIND: NativeKind = NativeKind::Decimal;

    fn from_native(value: &Value, _: &Rc<JsonSettings>) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    fn from_canonical(text: &str) -> Option<Self> {
        text.parse::<f64>().ok().filter(|f| f.is_finite())
    }

    fn to_canonical(&self) -> String {
        self.to_string()
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl PropertyValue for String {
    const KIND: NativeKind = NativeKind::Text;

    fn from_native(value: &Value, _: &Rc<JsonSettings>) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }

    fn from_canonical(text: &str) -> Option<Self> {
        Some(text.to_owned())
    }

    fn to_canonical(&self) -> String {
        self.clone()
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl PropertyValue for serde_json::Value {
    const KIND: NativeKind = NativeKind::Raw;

    fn from_native(value: &Value, _: &Rc<JsonSettings>) -> Option<Self> {
        Some(value.to_json())
    }

    fn to_canonical(&self) -> String {
        self.to_string()
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}
