use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use json_model_value::Value;
use tracing::trace;

use super::{cache_is_current, Binding, PropertyDescriptor, PropertyState};
use crate::convert::{resolve, short_type_name, NativeKind, PropertyValue};

struct Cached<T> {
    source: Value,
    value: Option<T>,
}

/// A single typed value stored under one key.
///
/// Obtained from [`JsonModel::define_property`](crate::JsonModel::define_property).
pub struct JsonProperty<T: PropertyValue> {
    binding: Binding,
    cache: RefCell<Option<Cached<T>>>,
}

impl<T: PropertyValue> JsonProperty<T> {
    pub(crate) fn new(binding: Binding) -> Self {
        JsonProperty {
            binding,
            cache: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.binding.name()
    }

    /// The resolved value, or `None` when the key is undefined, null, or
    /// holds something that does not convert to `T`.
    ///
    /// Nested documents are returned as live aliases of the stored object,
    /// and repeated reads return the same document instance for as long as
    /// the stored object stays in place.
    pub fn get(&self) -> Option<T> {
        let raw = self.binding.raw()?;
        if let Some(cached) = self.cache.borrow().as_ref() {
            if cache_is_current::<T>(&cached.source, &raw) {
                return cached.value.clone();
            }
        }
        trace!(
            target: "json_model::property",
            property = self.name(),
            "resolving stored value"
        );
        let value = resolve::<T>(&raw, self.binding.settings());
        *self.cache.borrow_mut() = Some(Cached {
            source: raw,
            value: value.clone(),
        });
        value
    }

    /// Stores `value`. `None` stores JSON `null`.
    ///
    /// A document is stored as an alias of its own store, so later writes
    /// through either side are visible to both.
    pub fn set(&self, value: impl Into<Option<T>>) {
        let Some(value) = value.into() else {
            self.null();
            return;
        };
        let settings = self.binding.settings();
        if T::KIND == NativeKind::Document && !settings.conversions.is_registered::<T>() {
            let stored = value.clone().into_value();
            self.binding.write(stored.clone());
            *self.cache.borrow_mut() = Some(Cached {
                source: stored,
                value: Some(value),
            });
        } else {
            self.binding.write(settings.conversions.to_stored(value));
            self.invalidate();
        }
    }

    pub fn state(&self) -> PropertyState {
        self.binding.state()
    }

    pub fn is_null(&self) -> bool {
        self.state() == PropertyState::Null
    }

    pub fn is_undefined(&self) -> bool {
        self.state() == PropertyState::Undefined
    }

    pub fn is_null_or_undefined(&self) -> bool {
        self.state() != PropertyState::Defined
    }

    pub fn null(&self) {
        self.binding.write(Value::Null);
        self.invalidate();
    }

    pub fn undefine(&self) {
        self.binding.remove();
        self.invalidate();
    }

    /// Copies `other`'s state and resolved value. Nested documents are
    /// aliased, not duplicated.
    pub fn copy(&self, other: &JsonProperty<T>) {
        match other.state() {
            PropertyState::Undefined => self.undefine(),
            PropertyState::Null => self.null(),
            PropertyState::Defined => self.set(other.get()),
        }
    }

    /// Compares the resolved values of two properties.
    pub fn value_eq(&self, other: &JsonProperty<T>) -> bool {
        self.get() == other.get()
    }
}

impl<T: PropertyValue> PropertyDescriptor for JsonProperty<T> {
    fn name(&self) -> &str {
        self.binding.name()
    }

    fn value_type_name(&self) -> &'static str {
        short_type_name::<T>()
    }

    fn state(&self) -> PropertyState {
        self.binding.state()
    }

    fn null(&self) {
        JsonProperty::null(self);
    }

    fn undefine(&self) {
        JsonProperty::undefine(self);
    }

    fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    fn copy_from(&self, other: &dyn PropertyDescriptor) -> bool {
        match other.as_any().downcast_ref::<JsonProperty<T>>() {
            Some(other) => {
                self.copy(other);
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Descriptors are equal when they bind the same key with the same type.
impl<T: PropertyValue> PartialEq for JsonProperty<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl<T: PropertyValue> Eq for JsonProperty<T> {}

impl<T: PropertyValue> Hash for JsonProperty<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::any::TypeId::of::<Self>().hash(state);
        self.name().hash(state);
    }
}

impl<T: PropertyValue> fmt::Debug for JsonProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonProperty")
            .field("name", &self.name())
            .field("type", &short_type_name::<T>())
            .field("state", &self.state())
            .finish()
    }
}
