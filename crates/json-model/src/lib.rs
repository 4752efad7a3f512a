//! Typed properties over schema-less JSON documents.
//!
//! A [`JsonModel`] owns an insertion-ordered JSON object. Properties are
//! declared at run time by name and type, and read or write that object
//! through the conversion rules in [`convert`]. Nested documents stored in a
//! property are live aliases of the parent's sub-object. Edits can be
//! bracketed with [`JsonModel::begin_edit`] / [`JsonModel::end_edit`] to
//! commit with notification or roll back to a deep-copied snapshot.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); a document shared
//! across threads must be wrapped by the host.

pub mod convert;
pub mod error;
pub mod model;
pub mod property;
pub mod settings;

pub use convert::{
    on_off_string, parse_on_off, parse_yn, yn_string, ConversionRegistry, NativeKind,
    PropertyValue, NULL_SENTINEL,
};
pub use error::ModelError;
pub use json_model_value::{
    ObjectRef, TextEncoding, Value, ValueError, ValueStore, WriteMode, WriteOptions,
};
pub use model::{ChangeEvent, ChangeOrigin, Document, EditOutcome, JsonModel, ObserverId};
pub use property::{JsonArrayProperty, JsonProperty, PropertyDescriptor, PropertyState};
pub use settings::JsonSettings;
