//! Structural equality.
//!
//! Objects compare key-by-key regardless of insertion order, arrays compare
//! element-by-element, and numbers compare by numeric value so `1` and `1.0`
//! are equal. Two handles to the same store are equal without being read.

use std::rc::Rc;

use serde_json::Number;

use crate::store::ValueStore;
use crate::value::Value;

/// Exact integer value of `n`, including floats with no fractional part.
fn integral_value(n: &Number) -> Option<i128> {
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0; // 2^127
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < LIMIT)
                .map(|f| f as i128)
        })
}

/// Integers and integral floats compare exactly; fractional floats only
/// equal fractional floats.
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (integral_value(a), integral_value(b)) {
        (Some(a), Some(b)) => a == b,
        (None, None) => a.as_f64() == b.as_f64(),
        _ => false,
    }
}

pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            Rc::ptr_eq(a, b) || stores_equal(&a.borrow(), &b.borrow())
        }
        _ => false,
    }
}

pub fn stores_equal(a: &ValueStore, b: &ValueStore) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(key, value)| match b.get(key) {
        Some(other) => deep_equal(value, other),
        None => false,
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(self, other)
    }
}

impl Eq for Value {}

impl PartialEq for ValueStore {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || stores_equal(self, other)
    }
}

impl Eq for ValueStore {}
