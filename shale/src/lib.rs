//! Binary object codec with schema evolution.
//!
//! Records describe themselves through `#[derive(Reflect)]`. A stream carries the field names
//! and wire tags of every class it uses, so data written by an older or newer version of a type
//! is matched field by field against the running program's layout when it is read.
mod cache;
mod class_def;
mod de;
mod error;
mod io;
mod options;
mod reader;
mod ser;
mod tags;

pub use de::Deserializer;
pub use error::{Error, ErrorKind, Result};
pub use options::Options;
pub use ser::Serializer;

pub use shale_base::{
    is_backwards_compatible, Action, ClassMeta, FieldMeta, Nullable, Object, Reflect, RoughType,
    TypeDesc, TypeRegistry, Typed, Value, ValueError,
};
pub use shale_derive::Reflect;

/// Encodes `value` with default options.
pub fn to_bytes<T: Typed>(value: &T) -> Result<Vec<u8>> {
    Serializer::default().to_bytes(value)
}

/// Decodes a `T` with default options.
pub fn from_bytes<T: Typed>(bytes: &[u8]) -> Result<T> {
    Deserializer::default().from_bytes(bytes)
}
