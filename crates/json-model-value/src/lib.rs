//! Mutable, shareable JSON value trees.
//!
//! A [`ValueStore`] is an insertion-ordered object node. Nested objects live
//! behind [`ObjectRef`] handles so several owners can alias one node; arrays
//! and scalars are held by value. Equality and hashing are structural and
//! ignore object key order, while serialization keeps it.

pub mod codec;
pub mod encoding;
pub mod equal;
pub mod error;
pub mod hash;
mod store;
mod value;

pub use codec::{parse_object, parse_object_bytes, to_string, to_vec, WriteMode, WriteOptions};
pub use encoding::TextEncoding;
pub use error::ValueError;
pub use store::ValueStore;
pub use value::{ObjectRef, Value};
