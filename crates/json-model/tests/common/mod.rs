#![allow(dead_code)]

use std::rc::Rc;
use std::sync::Once;

use json_model::{Document, JsonArrayProperty, JsonModel, JsonProperty};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber once per test binary. Filter with
/// `RUST_LOG=json_model=trace`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Person(JsonModel);

impl Document for Person {
    fn from_model(model: JsonModel) -> Self {
        Person(model)
    }

    fn model(&self) -> &JsonModel {
        &self.0
    }
}

impl Person {
    pub fn named(first: &str, last: &str) -> Self {
        let person = Person::new();
        person.first_name().set(first.to_owned());
        person.last_name().set(last.to_owned());
        person
    }

    pub fn first_name(&self) -> Rc<JsonProperty<String>> {
        self.0.define_property("firstName")
    }

    pub fn last_name(&self) -> Rc<JsonProperty<String>> {
        self.0.define_property("lastName")
    }

    pub fn age(&self) -> Rc<JsonProperty<i64>> {
        self.0.define_property("age")
    }

    pub fn relative(&self) -> Rc<JsonProperty<Person>> {
        self.0.define_property("relative")
    }

    pub fn children(&self) -> Rc<JsonArrayProperty<Person>> {
        self.0.define_array_property("children")
    }

    pub fn json(&self) -> String {
        self.0.to_json_string().expect("serialize person")
    }
}

pub fn hash_of<T: std::hash::Hash>(value: &T) -> u64 {
    use std::hash::{BuildHasher, BuildHasherDefault};
    BuildHasherDefault::<std::collections::hash_map::DefaultHasher>::default().hash_one(value)
}
