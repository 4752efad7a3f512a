mod common;

use std::fmt;
use std::str::FromStr;

use common::{init_tracing, Person};
use json_model::{
    parse_yn, string_backed, yn_string, ConversionRegistry, Document, JsonModel, JsonSettings,
    NULL_SENTINEL,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Shade {
    Red,
    Green,
    Blue,
}

impl fmt::Display for Shade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shade::Red => "red",
            Shade::Green => "green",
            Shade::Blue => "blue",
        })
    }
}

impl FromStr for Shade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Shade::Red),
            "green" => Ok(Shade::Green),
            "blue" => Ok(Shade::Blue),
            other => Err(format!("unknown shade {other}")),
        }
    }
}

string_backed!(Shade);

/// Whole seconds, written as `"<n>s"` by a registered converter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Seconds(u64);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Seconds {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Seconds)
    }
}

string_backed!(Seconds);

fn yes_no_settings() -> JsonSettings {
    let mut conversions = ConversionRegistry::new();
    conversions
        .register::<bool>(|b| yn_string(*b).to_owned(), parse_yn)
        .register::<Seconds>(
            |s| format!("{}s", s.0),
            |text| text.strip_suffix('s')?.parse().ok().map(Seconds),
        );
    JsonSettings::default().with_conversions(conversions)
}

#[test]
fn custom_types_are_stored_as_canonical_strings() {
    init_tracing();
    let doc = JsonModel::new();
    let shade = doc.define_property::<Shade>("shade");
    shade.set(Shade::Green);
    assert_eq!(doc.to_json_string().unwrap(), r#"{"shade":"green"}"#);
    assert_eq!(shade.get(), Some(Shade::Green));

    shade.set(None);
    assert!(shade.is_null());
    assert_eq!(doc.to_json_string().unwrap(), r#"{"shade":null}"#);

    doc.set_value("shade", "mauve");
    assert_eq!(shade.get(), None);
    assert!(!shade.is_null_or_undefined());

    doc.set_value("shade", NULL_SENTINEL);
    assert_eq!(shade.get(), None);

    doc.set_value("shade", 3);
    assert_eq!(shade.get(), None);
}

#[test]
fn custom_type_arrays() {
    init_tracing();
    let doc = JsonModel::from_json_str(r#"{"palette": ["red", "teal", null, "blue"]}"#).unwrap();
    let palette = doc.define_array_property::<Shade>("palette");
    assert_eq!(
        palette.to_vec(),
        vec![Some(Shade::Red), None, None, Some(Shade::Blue)]
    );
    palette.append([Shade::Green]);
    assert_eq!(palette.index_of(Shade::Green, 0), Some(4));
    assert_eq!(
        doc.to_json_string().unwrap(),
        r#"{"palette":["red","teal",null,"blue","green"]}"#
    );
}

#[test]
fn registered_converters_apply_to_the_whole_tree() {
    init_tracing();
    let doc = JsonModel::with_settings(yes_no_settings());
    let active = doc.define_property::<bool>("active");
    let timeout = doc.define_property::<Seconds>("timeout");
    let nested = doc.define_property::<JsonModel>("nested");

    active.set(true);
    timeout.set(Seconds(30));
    nested.set(JsonModel::new());
    assert_eq!(
        doc.to_json_string().unwrap(),
        r#"{"active":"Y","timeout":"30s","nested":{}}"#
    );
    assert_eq!(active.get(), Some(true));
    assert_eq!(timeout.get(), Some(Seconds(30)));

    // The nested document resolved from the store shares the settings.
    doc.set_value("nested", json_model::ValueStore::new());
    let inner = nested.get().unwrap();
    inner.define_property::<bool>("enabled").set(false);
    assert_eq!(
        doc.to_json_string().unwrap(),
        r#"{"active":"Y","timeout":"30s","nested":{"enabled":"N"}}"#
    );

    // Text the converter rejects reads as missing.
    doc.set_value("active", "true");
    assert_eq!(active.get(), None);
    doc.set_value("timeout", "30");
    assert_eq!(timeout.get(), None);
}

#[test]
fn boolean_literals_read_from_a_document() {
    init_tracing();
    let doc = JsonModel::from_json_str(
        r#"{"a": "YES", "b": "OFF", "c": 1, "d": "nope", "e": false, "f": "N", "g": 0.0}"#,
    )
    .unwrap();
    let read = |name: &str| doc.define_property::<bool>(name).get();
    assert_eq!(read("a"), Some(true));
    assert_eq!(read("b"), Some(false));
    assert_eq!(read("c"), Some(true));
    assert_eq!(read("d"), None);
    assert_eq!(read("e"), Some(false));
    assert_eq!(read("f"), Some(false));
    assert_eq!(read("g"), Some(false));
    assert_eq!(read("missing"), None);
}

#[test]
fn numbers_convert_between_representations() {
    init_tracing();
    let doc = JsonModel::from_json_str(
        r#"{"count": "42", "whole": 3.0, "fraction": 3.5, "flag": true, "ratio": "0.5", "big": 3000000000}"#,
    )
    .unwrap();
    assert_eq!(doc.define_property::<i64>("count").get(), Some(42));
    assert_eq!(doc.define_property::<i64>("whole").get(), Some(3));
    assert_eq!(doc.define_property::<i64>("fraction").get(), None);
    assert_eq!(doc.define_property::<i64>("flag").get(), Some(1));
    assert_eq!(doc.define_property::<f64>("ratio").get(), Some(0.5));
    assert_eq!(doc.define_property::<f64>("flag").get(), Some(1.0));
    assert_eq!(doc.define_property::<i32>("big").get(), None);
    assert_eq!(doc.define_property::<u32>("big").get(), Some(3_000_000_000));
}

#[test]
fn retyping_a_property_keeps_the_stored_value() {
    init_tracing();
    let doc = JsonModel::new();
    doc.define_property::<i64>("level").set(7);
    let as_text = doc.define_property::<String>("level");
    assert_eq!(as_text.get(), None);
    assert_eq!(doc.property("level").unwrap().value_type_name(), "String");
    assert_eq!(doc.define_property::<f64>("level").get(), Some(7.0));
    assert_eq!(doc.to_json_string().unwrap(), r#"{"level":7}"#);
}

#[test]
fn defaults_apply_only_to_undefined_keys() {
    init_tracing();
    let doc = JsonModel::from_json_str(r#"{"retries": null, "name": "x"}"#).unwrap();
    let retries = doc.define_property_with_default("retries", 3_i64);
    let name = doc.define_property_with_default("name", "y".to_owned());
    let shade = doc.define_property_with_default("shade", Shade::Blue);
    assert!(retries.is_null());
    assert_eq!(name.get().as_deref(), Some("x"));
    assert_eq!(shade.get(), Some(Shade::Blue));
    assert_eq!(
        doc.to_json_string().unwrap(),
        r#"{"retries":null,"name":"x","shade":"blue"}"#
    );
}

#[test]
fn documents_as_property_values() {
    init_tracing();
    let person = Person::named("Ada", "King");
    let registry = ConversionRegistry::new();
    assert!(!registry.is_conversion_required::<Person>());
    assert!(registry.is_conversion_required::<Shade>());
    assert_eq!(
        registry.to_canonical_string(Some(&person)),
        r#"{"firstName":"Ada","lastName":"King"}"#
    );
    assert_eq!(registry.to_canonical_string::<Person>(None), NULL_SENTINEL);
    assert!(person.model().keys().contains(&"firstName".to_owned()));
}
