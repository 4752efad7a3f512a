use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::map::{Iter, Keys};
use indexmap::IndexMap;
use serde_json::Map;

use crate::value::{ObjectRef, Value};

/// Ordered, mutable key/value map backing one document node.
///
/// Keys keep insertion order; overwriting a key keeps its position and
/// removing a key shifts later keys down. Every mutation is in place.
///
/// The store is deliberately not `Clone`: a copy is either an alias (share
/// the [`ObjectRef`]) or a [`deep_copy`](ValueStore::deep_copy).
#[derive(Default)]
pub struct ValueStore {
    entries: IndexMap<String, Value>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.entries.keys()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns a fully independent copy: nested objects and arrays are copied
    /// recursively, so no node of the result aliases a node of `self`.
    pub fn deep_copy(&self) -> ValueStore {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.deep_copy()))
            .collect()
    }

    /// Moves the store behind a fresh shared handle.
    pub fn into_shared(self) -> ObjectRef {
        Rc::new(RefCell::new(self))
    }

    pub fn to_json_map(&self) -> Map<String, serde_json::Value> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ValueStore {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ValueStore {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<Map<String, serde_json::Value>> for ValueStore {
    fn from(map: Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

impl fmt::Debug for ValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
