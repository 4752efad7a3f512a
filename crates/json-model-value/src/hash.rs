//! Structural hash consistent with structural equality.
//!
//! Same mixing step as the json-hash routine of json-joy: 32-bit wrapping
//! `state * 33 + n`, one discriminator per value kind. Object keys are
//! visited in sorted order so insertion order does not affect the result,
//! and numbers are mixed as their `f64` bits so `1` and `1.0` hash alike.

use std::hash::{Hash, Hasher};

use serde_json::Number;

use crate::store::ValueStore;
use crate::value::Value;

pub const START_STATE: i32 = 5381;

pub const NULL_CONST: i32 = 982452847_u32 as i32;
pub const TRUE_CONST: i32 = 982453247_u32 as i32;
pub const FALSE_CONST: i32 = 982454243_u32 as i32;
pub const NUMBER_CONST: i32 = 982451653_u32 as i32;
pub const ARRAY_CONST: i32 = 982452259_u32 as i32;
pub const STRING_CONST: i32 = 982453601_u32 as i32;
pub const OBJECT_CONST: i32 = 982454533_u32 as i32;

pub fn update_num(state: i32, num: i32) -> i32 {
    state.wrapping_shl(5).wrapping_add(state).wrapping_add(num)
}

pub fn update_str(mut state: i32, s: &str) -> i32 {
    state = update_num(state, STRING_CONST);
    state = update_num(state, s.len() as i32);
    for &byte in s.as_bytes().iter().rev() {
        state = update_num(state, i32::from(byte));
    }
    state
}

fn update_number(state: i32, n: &Number) -> i32 {
    let f = n.as_f64().unwrap_or(0.0);
    // -0.0 == 0.0, so they must hash alike.
    let bits = if f == 0.0 { 0 } else { f.to_bits() };
    let state = update_num(state, NUMBER_CONST);
    let state = update_num(state, bits as i32);
    update_num(state, (bits >> 32) as i32)
}

pub fn update_value(state: i32, value: &Value) -> i32 {
    match value {
        Value::Null => update_num(state, NULL_CONST),
        Value::Bool(b) => update_num(state, if *b { TRUE_CONST } else { FALSE_CONST }),
        Value::Number(n) => update_number(state, n),
        Value::String(s) => update_str(state, s),
        Value::Array(items) => {
            let mut state = update_num(state, ARRAY_CONST);
            state = update_num(state, items.len() as i32);
            for item in items {
                state = update_value(state, item);
            }
            state
        }
        Value::Object(o) => update_store(state, &o.borrow()),
    }
}

pub fn update_store(state: i32, store: &ValueStore) -> i32 {
    let mut state = update_num(state, OBJECT_CONST);
    let mut entries: Vec<(&String, &Value)> = store.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        state = update_str(state, key);
        state = update_value(state, value);
    }
    state
}

pub fn hash_value(value: &Value) -> u32 {
    update_value(START_STATE, value) as u32
}

pub fn hash_store(store: &ValueStore) -> u32 {
    update_store(START_STATE, store) as u32
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(hash_value(self));
    }
}

impl Hash for ValueStore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(hash_store(self));
    }
}
