use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use json_model_value::Value;
use tracing::trace;

use super::{cache_is_current, Binding, PropertyDescriptor, PropertyState};
use crate::convert::{resolve, short_type_name, NativeKind, PropertyValue};

struct CachedArray<T> {
    source: Value,
    items: Vec<Option<T>>,
}

/// An ordered sequence of typed elements stored as a JSON array.
///
/// Elements follow the same conversion and aliasing rules as
/// [`JsonProperty`](super::JsonProperty). An element that does not resolve to
/// `T` reads as `None` but keeps its slot, so indices stay contiguous. A
/// scalar stored where an array is expected reads as a one-element array and
/// is turned into a real array by the first mutation.
///
/// Indices are `isize`: negative indices never match anything, reads return
/// `None` and writes are ignored.
pub struct JsonArrayProperty<T: PropertyValue> {
    binding: Binding,
    cache: RefCell<Option<CachedArray<T>>>,
}

impl<T: PropertyValue> JsonArrayProperty<T> {
    pub(crate) fn new(binding: Binding) -> Self {
        JsonArrayProperty {
            binding,
            cache: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.binding.name()
    }

    /// All elements, or `None` when the property is undefined or null.
    pub fn values(&self) -> Option<Vec<Option<T>>> {
        let raw = self.binding.raw()?;
        if raw.is_null() {
            return None;
        }
        if let Some(cached) = self.cache.borrow().as_ref() {
            if cache_is_current::<T>(&cached.source, &raw) {
                return Some(cached.items.clone());
            }
        }
        trace!(
            target: "json_model::property",
            property = self.name(),
            "resolving stored array"
        );
        let items = self.resolve_items(&raw);
        *self.cache.borrow_mut() = Some(CachedArray {
            source: raw,
            items: items.clone(),
        });
        Some(items)
    }

    /// Resolves every element, reusing cached documents whose stored object
    /// is still present so their identity survives unrelated mutations.
    fn resolve_items(&self, raw: &Value) -> Vec<Option<T>> {
        let settings = self.binding.settings();
        let elements = match raw {
            Value::Array(items) => items.as_slice(),
            scalar => std::slice::from_ref(scalar),
        };
        let cache = self.cache.borrow();
        let previous = cache.as_ref().and_then(|c| match &c.source {
            Value::Array(sources) => Some((sources.as_slice(), c.items.as_slice())),
            _ => None,
        });
        elements
            .iter()
            .map(|element| {
                if T::KIND == NativeKind::Document && matches!(element, Value::Object(_)) {
                    if let Some((sources, items)) = previous {
                        if let Some(i) = sources.iter().position(|s| s.same_as(element)) {
                            if let Some(item) = items.get(i) {
                                return item.clone();
                            }
                        }
                    }
                }
                resolve::<T>(element, settings)
            })
            .collect()
    }

    /// Replaces the whole array. `None` stores JSON `null`.
    pub fn set_values(&self, values: impl Into<Option<Vec<Option<T>>>>) {
        match values.into() {
            None => self.null(),
            Some(values) => {
                let stored = values.into_iter().map(|v| self.to_stored(v)).collect();
                self.binding.write(Value::Array(stored));
            }
        }
    }

    /// Elements as a vector; empty when undefined or null.
    pub fn to_vec(&self) -> Vec<Option<T>> {
        self.values().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        match self.binding.raw() {
            None | Some(Value::Null) => 0,
            Some(Value::Array(items)) => items.len(),
            Some(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: isize) -> Option<T> {
        let index = usize::try_from(index).ok()?;
        self.values()?.into_iter().nth(index).flatten()
    }

    /// Writes one element. Writing past the end pads the gap with `null`;
    /// a negative index is ignored.
    pub fn set(&self, index: isize, value: impl Into<Option<T>>) {
        let Ok(index) = usize::try_from(index) else {
            trace!(
                target: "json_model::property",
                property = self.name(),
                index,
                "ignoring write at negative index"
            );
            return;
        };
        let stored = self.to_stored(value.into());
        self.binding.with_array(true, |items| {
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            items[index] = stored;
        });
    }

    /// First index at or after `start_at` holding `element`. A negative
    /// `start_at` is treated as `0`.
    pub fn index_of(&self, element: impl Into<Option<T>>, start_at: isize) -> Option<usize> {
        let element = element.into();
        let start = usize::try_from(start_at).unwrap_or(0);
        self.values()?
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, item)| **item == element)
            .map(|(i, _)| i)
    }

    pub fn contains(&self, element: impl Into<Option<T>>) -> bool {
        self.index_of(element, 0).is_some()
    }

    /// Appends `elements` in order, creating the array if needed.
    pub fn append<E: Into<Option<T>>>(&self, elements: impl IntoIterator<Item = E>) {
        let stored: Vec<Value> = elements
            .into_iter()
            .map(|e| self.to_stored(e.into()))
            .collect();
        self.binding.with_array(true, |items| items.extend(stored));
    }

    /// Inserts `elements` at the front, keeping their order: the first
    /// element given ends up first.
    pub fn prepend<E: Into<Option<T>>>(&self, elements: impl IntoIterator<Item = E>) {
        let stored: Vec<Value> = elements
            .into_iter()
            .map(|e| self.to_stored(e.into()))
            .collect();
        self.binding.with_array(true, |items| {
            items.splice(0..0, stored);
        });
    }

    /// Appends each element that is not already present. A missing element
    /// (`None`) counts as one value and is added at most once.
    pub fn union<E: Into<Option<T>>>(&self, elements: impl IntoIterator<Item = E>) {
        for element in elements {
            let element = element.into();
            if !self.contains(element.clone()) {
                self.append([element]);
            }
        }
    }

    /// Removes every occurrence of each given element. Does nothing when
    /// the property is undefined or null.
    pub fn remove_all<E: Into<Option<T>>>(&self, elements: impl IntoIterator<Item = E>) {
        for element in elements {
            let element = element.into();
            while let Some(index) = self.index_of(element.clone(), 0) {
                self.binding.with_array(false, |items| items.remove(index));
            }
        }
    }

    /// Removes and returns the element at `index`; out of range returns
    /// `None` and changes nothing.
    pub fn remove_at(&self, index: isize) -> Option<T> {
        let index = usize::try_from(index).ok()?;
        if index >= self.len() {
            return None;
        }
        let removed = self.get(index as isize);
        self.binding.with_array(false, |items| items.remove(index));
        removed
    }

    /// Empties the array. An undefined or null property is left as it is.
    pub fn clear(&self) {
        self.binding.with_array(false, Vec::clear);
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

    /// Copies `other`'s state and elements. The copy is a new array; nested
    /// documents inside it are aliased.
    pub fn copy(&self, other: &JsonArrayProperty<T>) {
        match other.state() {
            PropertyState::Undefined => self.undefine(),
            PropertyState::Null => self.null(),
            PropertyState::Defined => self.set_values(other.values()),
        }
    }

    pub fn value_eq(&self, other: &JsonArrayProperty<T>) -> bool {
        self.values() == other.values()
    }

    fn to_stored(&self, value: Option<T>) -> Value {
        match value {
            None => Value::Null,
            Some(v) => self.binding.settings().conversions.to_stored(v),
        }
    }

    fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }
}

impl<T: PropertyValue> PropertyDescriptor for JsonArrayProperty<T> {
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
        JsonArrayProperty::null(self);
    }

    fn undefine(&self) {
        JsonArrayProperty::undefine(self);
    }

    fn invalidate(&self) {
        JsonArrayProperty::invalidate(self);
    }

    fn copy_from(&self, other: &dyn PropertyDescriptor) -> bool {
        match other.as_any().downcast_ref::<JsonArrayProperty<T>>() {
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

impl<T: PropertyValue> PartialEq for JsonArrayProperty<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl<T: PropertyValue> Eq for JsonArrayProperty<T> {}

impl<T: PropertyValue> Hash for JsonArrayProperty<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::any::TypeId::of::<Self>().hash(state);
        self.name().hash(state);
    }
}

impl<T: PropertyValue> fmt::Debug for JsonArrayProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonArrayProperty")
            .field("name", &self.name())
            .field("type", &short_type_name::<T>())
            .field("len", &self.len())
            .finish()
    }
}
