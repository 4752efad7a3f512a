//! Typed accessors bound to one key of a document.
//!
//! A descriptor never owns data: it reads and writes the live store of the
//! document it was declared on, and caches the last resolved native value
//! together with the stored value it came from. A cached value is only used
//! while the stored value is still the same node, and a value resolved into
//! a detached copy of an object (anything but a document) is re-read on
//! every access, so writes that bypass the descriptor (through an alias, a
//! rollback or `deserialize`) are never served stale.

mod array;
mod scalar;

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use json_model_value::{ObjectRef, Value};

use crate::convert::{NativeKind, PropertyValue};
use crate::settings::JsonSettings;

pub use array::JsonArrayProperty;
pub use scalar::JsonProperty;

/// Whether a value of type `T` cached from `source` still stands for `raw`.
///
/// Documents alias the object they were resolved from, so node identity is
/// enough. Other types copy what they read; once an object is involved its
/// content can change under the same node.
pub(crate) fn cache_is_current<T: PropertyValue>(source: &Value, raw: &Value) -> bool {
    source.same_as(raw) && (T::KIND == NativeKind::Document || !raw.contains_object())
}

/// Observable state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyState {
    /// The key is absent.
    Undefined,
    /// The key holds JSON `null`.
    Null,
    /// The key holds a value, which may or may not resolve to the declared type.
    Defined,
}

/// Type-erased view of a declared property.
pub trait PropertyDescriptor: Any {
    fn name(&self) -> &str;

    /// Short name of the declared value type, for diagnostics.
    fn value_type_name(&self) -> &'static str;

    /// Reads the live store, never the cache.
    fn state(&self) -> PropertyState;

    fn is_null(&self) -> bool {
        self.state() == PropertyState::Null
    }

    fn is_undefined(&self) -> bool {
        self.state() == PropertyState::Undefined
    }

    fn is_null_or_undefined(&self) -> bool {
        self.state() != PropertyState::Defined
    }

    /// Stores JSON `null`.
    fn null(&self);

    /// Removes the key.
    fn undefine(&self);

    /// Drops the cached native value.
    fn invalidate(&self);

    /// Copies the resolved value of `other` into this property when both
    /// were declared with the same type. Returns whether a copy happened.
    fn copy_from(&self, other: &dyn PropertyDescriptor) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl PartialEq for dyn PropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.as_any().type_id() == other.as_any().type_id() && self.name() == other.name()
    }
}

impl Eq for dyn PropertyDescriptor {}

impl Hash for dyn PropertyDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_any().type_id().hash(state);
        self.name().hash(state);
    }
}

/// The (store, key) pair a descriptor reads and writes.
///
/// Holds the store handle rather than the owning document, so descriptors do
/// not keep their document alive. The handle stays valid for the document's
/// whole life: rollback and `deserialize` replace the store's content, never
/// the store.
pub(crate) struct Binding {
    name: String,
    store: ObjectRef,
    settings: Rc<JsonSettings>,
}

impl Binding {
    pub(crate) fn new(name: &str, store: ObjectRef, settings: Rc<JsonSettings>) -> Self {
        Binding {
            name: name.to_owned(),
            store,
            settings,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn settings(&self) -> &Rc<JsonSettings> {
        &self.settings
    }

    /// The stored value. Objects come back as aliases.
    pub(crate) fn raw(&self) -> Option<Value> {
        self.store.borrow().get(&self.name).cloned()
    }

    pub(crate) fn state(&self) -> PropertyState {
        match self.store.borrow().get(&self.name) {
            None => PropertyState::Undefined,
            Some(Value::Null) => PropertyState::Null,
            Some(_) => PropertyState::Defined,
        }
    }

    pub(crate) fn write(&self, value: Value) {
        self.store.borrow_mut().set(self.name.as_str(), value);
    }

    pub(crate) fn remove(&self) {
        self.store.borrow_mut().remove(&self.name);
    }

    /// Runs `f` on the stored array, materializing it first.
    ///
    /// A missing or `null` value becomes an empty array only when `init` is
    /// set; otherwise `f` is not called. A scalar becomes a one-element array.
    pub(crate) fn with_array<R>(
        &self,
        init: bool,
        f: impl FnOnce(&mut Vec<Value>) -> R,
    ) -> Option<R> {
        let mut store = self.store.borrow_mut();
        let present = store.get(&self.name).is_some_and(|v| !v.is_null());
        if !present {
            if !init {
                return None;
            }
            store.set(self.name.as_str(), Value::Array(Vec::new()));
        }
        let slot = store.get_mut(&self.name)?;
        if !matches!(slot, Value::Array(_)) {
            let scalar = std::mem::take(slot);
            *slot = Value::Array(vec![scalar]);
        }
        slot.as_array_mut().map(f)
    }
}
