//! The document aggregate.
//!
//! A [`JsonModel`] owns one root store, the descriptors declared on it, an
//! optional edit snapshot and its change observers. Cloning a `JsonModel`
//! clones the handle: both values are the same document instance.
//!
//! Typed documents wrap a `JsonModel` and implement [`Document`]:
//!
//! ```
//! use std::rc::Rc;
//! use json_model::{Document, JsonArrayProperty, JsonModel, JsonProperty};
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! struct Person(JsonModel);
//!
//! impl Document for Person {
//!     fn from_model(model: JsonModel) -> Self {
//!         Person(model)
//!     }
//!     fn model(&self) -> &JsonModel {
//!         &self.0
//!     }
//! }
//!
//! impl Person {
//!     fn name(&self) -> Rc<JsonProperty<String>> {
//!         self.0.define_property("name")
//!     }
//!     fn children(&self) -> Rc<JsonArrayProperty<Person>> {
//!         self.0.define_array_property("children")
//!     }
//! }
//!
//! let parent = Person::new();
//! parent.name().set(String::from("Ann"));
//! let child = Person::new();
//! parent.children().append([child.clone()]);
//! child.name().set(String::from("Bo"));
//! assert_eq!(
//!     parent.model().to_json_string().unwrap(),
//!     r#"{"name":"Ann","children":[{"name":"Bo"}]}"#
//! );
//! ```

mod edit;
mod events;

use std::any::TypeId;
use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use json_model_value::hash::hash_store;
use json_model_value::{
    parse_object, parse_object_bytes, to_string, to_vec, ObjectRef, TextEncoding, Value,
    ValueStore, WriteOptions,
};
use tracing::{debug, warn};

use crate::convert::{NativeKind, PropertyValue};
use crate::error::ModelError;
use crate::property::{Binding, JsonArrayProperty, JsonProperty, PropertyDescriptor};
use crate::settings::JsonSettings;

pub use events::{ChangeEvent, ChangeOrigin, EditOutcome, ObserverId};

type Observer = Rc<RefCell<Box<dyn FnMut(&ChangeEvent)>>>;

struct ModelInner {
    store: ObjectRef,
    settings: Rc<JsonSettings>,
    properties: RefCell<IndexMap<String, Rc<dyn PropertyDescriptor>>>,
    snapshot: RefCell<Option<ValueStore>>,
    next_observer_id: Cell<u64>,
    observers: RefCell<BTreeMap<u64, Observer>>,
}

/// Untyped document handle.
#[derive(Clone)]
pub struct JsonModel {
    inner: Rc<ModelInner>,
}

/// A typed view over a [`JsonModel`].
///
/// Every `Document` can be the value of a property: it is stored as an alias
/// of its own store, and read back as a new view sharing that store.
pub trait Document: Clone + PartialEq + 'static {
    fn from_model(model: JsonModel) -> Self;

    fn model(&self) -> &JsonModel;

    fn new() -> Self {
        Self::from_model(JsonModel::new())
    }

    fn from_json_str(text: &str) -> Result<Self, ModelError> {
        JsonModel::from_json_str(text).map(Self::from_model)
    }

    /// A new document holding a deep copy of `other`'s content.
    fn copy_of<D: Document>(other: &D) -> Self {
        Self::from_model(JsonModel::from_document(other))
    }

    /// Equality across document types: same concrete type and structurally
    /// equal content.
    fn same_document_as<D: Document>(&self, other: &D) -> bool {
        TypeId::of::<Self>() == TypeId::of::<D>() && self.model().content_eq(other.model())
    }

    /// Runs when an edit ends with committed changes, before observers are
    /// notified. Persist the document here.
    fn save(&self) {}

    /// Ends the edit on [`model`](Self::model), calling [`save`](Self::save)
    /// on commit.
    fn end_edit(&self, commit: bool) -> EditOutcome {
        self.model().finish_edit(commit, || self.save())
    }
}

impl Document for JsonModel {
    fn from_model(model: JsonModel) -> Self {
        model
    }

    fn model(&self) -> &JsonModel {
        self
    }
}

impl<D: Document> PropertyValue for D {
    const KIND: NativeKind = NativeKind::Document;

    fn from_native(value: &Value, settings: &Rc<JsonSettings>) -> Option<Self> {
        let handle = value.as_object()?;
        Some(D::from_model(JsonModel::attach(
            handle.clone(),
            settings.clone(),
        )))
    }

    fn to_canonical(&self) -> String {
        self.model().to_json_string().unwrap_or_default()
    }

    fn into_value(self) -> Value {
        Value::Object(self.model().store_handle())
    }
}

impl JsonModel {
    pub fn new() -> Self {
        Self::with_settings(JsonSettings::default())
    }

    pub fn with_settings(settings: JsonSettings) -> Self {
        Self::attach(ValueStore::new().into_shared(), Rc::new(settings))
    }

    /// A document whose content is a deep copy of `store`.
    pub fn from_store(store: &ValueStore) -> Self {
        Self::attach(store.deep_copy().into_shared(), Rc::default())
    }

    /// Copy constructor: deep-copies `other`'s content and shares its
    /// settings. Descriptors and observers are not copied.
    pub fn from_document<D: Document>(other: &D) -> Self {
        let source = other.model();
        let content = source.inner.store.borrow().deep_copy();
        Self::attach(content.into_shared(), source.inner.settings.clone())
    }

    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        Self::from_json_str_with(text, JsonSettings::default())
    }

    pub fn from_json_str_with(text: &str, settings: JsonSettings) -> Result<Self, ModelError> {
        let store = parse_object(text)?;
        Ok(Self::attach(store.into_shared(), Rc::new(settings)))
    }

    pub fn from_json_bytes(bytes: &[u8], encoding: TextEncoding) -> Result<Self, ModelError> {
        let store = parse_object_bytes(bytes, encoding)?;
        let settings = JsonSettings::default().with_encoding(encoding);
        Ok(Self::attach(store.into_shared(), Rc::new(settings)))
    }

    /// Reads and parses a UTF-8 JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_json_bytes(&bytes, TextEncoding::Utf8)
    }

    /// A document over an existing store node. Used to resolve nested
    /// documents, which then alias the parent's sub-store.
    pub(crate) fn attach(store: ObjectRef, settings: Rc<JsonSettings>) -> Self {
        JsonModel {
            inner: Rc::new(ModelInner {
                store,
                settings,
                properties: RefCell::new(IndexMap::new()),
                snapshot: RefCell::new(None),
                next_observer_id: Cell::new(1),
                observers: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    pub fn settings(&self) -> &JsonSettings {
        &self.inner.settings
    }

    /// Borrows the live content.
    pub fn store(&self) -> Ref<'_, ValueStore> {
        self.inner.store.borrow()
    }

    /// Shared handle to the live content.
    pub fn store_handle(&self) -> ObjectRef {
        self.inner.store.clone()
    }

    /// Detached deep copy of the content.
    pub fn to_store(&self) -> ValueStore {
        self.inner.store.borrow().deep_copy()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.store.borrow().keys().cloned().collect()
    }

    /// Raw stored value under `key`; objects are returned as aliases.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner.store.borrow().get(key).cloned()
    }

    pub fn set_value(&self, key: &str, value: impl Into<Value>) {
        self.inner.store.borrow_mut().set(key, value);
    }

    pub fn remove_value(&self, key: &str) -> Option<Value> {
        self.inner.store.borrow_mut().remove(key)
    }

    /// Declares (or looks up) a scalar property.
    ///
    /// Declaring a name again with the same type returns the registered
    /// descriptor. Declaring it with another type replaces the descriptor;
    /// the stored value is left untouched.
    pub fn define_property<T: PropertyValue>(&self, name: &str) -> Rc<JsonProperty<T>> {
        self.declare(name, JsonProperty::new)
    }

    /// Like [`define_property`](Self::define_property), and stores `default`
    /// when the key is undefined.
    pub fn define_property_with_default<T: PropertyValue>(
        &self,
        name: &str,
        default: T,
    ) -> Rc<JsonProperty<T>> {
        let property = self.define_property::<T>(name);
        if property.is_undefined() {
            property.set(default);
        }
        property
    }

    pub fn define_array_property<T: PropertyValue>(&self, name: &str) -> Rc<JsonArrayProperty<T>> {
        self.declare(name, JsonArrayProperty::new)
    }

    fn declare<P: PropertyDescriptor>(&self, name: &str, make: impl FnOnce(Binding) -> P) -> Rc<P> {
        let existing = self.inner.properties.borrow().get(name).cloned();
        if let Some(existing) = existing {
            let previous = existing.value_type_name();
            match existing.into_any().downcast::<P>() {
                Ok(descriptor) => return descriptor,
                Err(_) => warn!(
                    target: "json_model::property",
                    property = name,
                    previous,
                    "property redeclared with a different type, replacing descriptor"
                ),
            }
        }
        let binding = Binding::new(name, self.inner.store.clone(), self.inner.settings.clone());
        let descriptor = Rc::new(make(binding));
        self.inner
            .properties
            .borrow_mut()
            .insert(name.to_owned(), descriptor.clone());
        descriptor
    }

    /// Registered descriptors in declaration order.
    pub fn properties(&self) -> Vec<Rc<dyn PropertyDescriptor>> {
        self.inner.properties.borrow().values().cloned().collect()
    }

    pub fn property(&self, name: &str) -> Option<Rc<dyn PropertyDescriptor>> {
        self.inner.properties.borrow().get(name).cloned()
    }

    /// For each property declared on `other`, copies its value into the
    /// same-named property of `self` when the types match. Everything else
    /// is skipped.
    pub fn copy_properties<D: Document>(&self, other: &D) {
        for theirs in other.model().properties() {
            if let Some(mine) = self.property(theirs.name()) {
                mine.copy_from(&*theirs);
            }
        }
    }

    /// Undefines every declared property. Undeclared keys are kept.
    pub fn reset(&self) {
        for property in self.properties() {
            property.undefine();
        }
    }

    pub fn to_json_string(&self) -> Result<String, ModelError> {
        self.to_json_string_with(&self.inner.settings.write)
    }

    pub fn to_json_string_with(&self, options: &WriteOptions) -> Result<String, ModelError> {
        Ok(to_string(&*self.inner.store.borrow(), options)?)
    }

    /// UTF-8 JSON text.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ModelError> {
        Ok(to_vec(&*self.inner.store.borrow(), &self.inner.settings.write)?)
    }

    /// JSON text in the configured encoding.
    pub fn to_encoded_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let text = self.to_json_string()?;
        Ok(self.inner.settings.encoding.encode(&text)?)
    }

    /// Replaces the whole content with the object parsed from `text`.
    ///
    /// On error the current content is left exactly as it was.
    pub fn deserialize(&self, text: &str) -> Result<(), ModelError> {
        let content = parse_object(text)?;
        self.replace_content(content);
        Ok(())
    }

    /// Like [`deserialize`](Self::deserialize) for bytes in the configured
    /// encoding.
    pub fn deserialize_bytes(&self, bytes: &[u8]) -> Result<(), ModelError> {
        let content = parse_object_bytes(bytes, self.inner.settings.encoding)?;
        self.replace_content(content);
        Ok(())
    }

    /// Swaps the root content in place, so parents aliasing this document
    /// stay attached, and drops every descriptor cache.
    fn replace_content(&self, content: ValueStore) {
        debug!(
            target: "json_model::edit",
            keys = content.len(),
            "replacing document content"
        );
        *self.inner.store.borrow_mut() = content;
        for property in self.properties() {
            property.invalidate();
        }
    }

    /// Structural equality of the content.
    pub fn content_eq(&self, other: &JsonModel) -> bool {
        Rc::ptr_eq(&self.inner.store, &other.inner.store)
            || *self.inner.store.borrow() == *other.inner.store.borrow()
    }

    /// `true` when both handles are the same document instance.
    pub fn is_same_instance(&self, other: &JsonModel) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// `true` when both documents read and write the same store, which is
    /// the case for a nested document and the value it was resolved from.
    pub fn shares_store_with(&self, other: &JsonModel) -> bool {
        Rc::ptr_eq(&self.inner.store, &other.inner.store)
    }
}

impl Default for JsonModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for JsonModel {
    fn eq(&self, other: &Self) -> bool {
        self.content_eq(other)
    }
}

impl Eq for JsonModel {}

impl Hash for JsonModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(hash_store(&self.inner.store.borrow()));
    }
}

impl fmt::Debug for JsonModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("JsonModel");
        match self.inner.store.try_borrow() {
            Ok(store) => s.field("content", &*store),
            Err(_) => s.field("content", &"<borrowed>"),
        };
        s.field("properties", &self.inner.properties.borrow().len())
            .field("editing", &self.is_editing())
            .finish()
    }
}
