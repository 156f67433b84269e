use crate::object::ClassMeta;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Declared shape of a field or top-level value, as seen by the running program.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Bool,
    Char,
    F32,
    F64,
    DateTime,
    TimeSpan,
    String,
    Enum(EnumRef),
    /// Fixed-size native array (`Box<[T]>`).
    Array(Box<TypeDesc>),
    /// Growable list (`Vec<T>`).
    List(Box<TypeDesc>),
    /// Any other collection filled element by element (sets, deques).
    Collection(Box<TypeDesc>),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    /// A concrete record type.
    Record(RecordRef),
    /// Any record type, resolved through the class id in the stream.
    Object,
    /// Method bound by name to the object currently being filled, taking one argument.
    Action(Box<TypeDesc>),
    /// Untyped slot, every value carries its own tag.
    Any,
}

impl TypeDesc {
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            TypeDesc::I8
                | TypeDesc::U8
                | TypeDesc::I16
                | TypeDesc::U16
                | TypeDesc::I32
                | TypeDesc::U32
                | TypeDesc::I64
                | TypeDesc::U64
                | TypeDesc::Bool
                | TypeDesc::Char
                | TypeDesc::F32
                | TypeDesc::F64
                | TypeDesc::DateTime
                | TypeDesc::TimeSpan
                | TypeDesc::String
        )
    }

    pub fn is_record(&self) -> bool {
        matches!(self, TypeDesc::Record(_) | TypeDesc::Object)
    }
}

impl Display for TypeDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDesc::I8 => write!(f, "i8"),
            TypeDesc::U8 => write!(f, "u8"),
            TypeDesc::I16 => write!(f, "i16"),
            TypeDesc::U16 => write!(f, "u16"),
            TypeDesc::I32 => write!(f, "i32"),
            TypeDesc::U32 => write!(f, "u32"),
            TypeDesc::I64 => write!(f, "i64"),
            TypeDesc::U64 => write!(f, "u64"),
            TypeDesc::Bool => write!(f, "bool"),
            TypeDesc::Char => write!(f, "char"),
            TypeDesc::F32 => write!(f, "f32"),
            TypeDesc::F64 => write!(f, "f64"),
            TypeDesc::DateTime => write!(f, "DateTime"),
            TypeDesc::TimeSpan => write!(f, "TimeSpan"),
            TypeDesc::String => write!(f, "String"),
            TypeDesc::Enum(e) => write!(f, "{}", e.name),
            TypeDesc::Array(e) => write!(f, "[{e}]"),
            TypeDesc::List(e) => write!(f, "List<{e}>"),
            TypeDesc::Collection(e) => write!(f, "Collection<{e}>"),
            TypeDesc::Map(k, v) => write!(f, "Map<{k}, {v}>"),
            TypeDesc::Record(r) => write!(f, "{}", r.name),
            TypeDesc::Object => write!(f, "Object"),
            TypeDesc::Action(a) => write!(f, "Action<{a}>"),
            TypeDesc::Any => write!(f, "Any"),
        }
    }
}

/// Lazy reference to a record descriptor.
///
/// Goes through a function pointer so that self-referential types can describe their fields
/// while their own descriptor is still being built. Equality and hashing use the wire name only.
#[derive(Clone, Copy)]
pub struct RecordRef {
    pub name: &'static str,
    pub meta: fn() -> &'static ClassMeta,
}

impl RecordRef {
    pub fn of<T: crate::Reflect>() -> Self {
        RecordRef {
            name: T::WIRE_NAME,
            meta: T::meta,
        }
    }
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RecordRef {}

impl Hash for RecordRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Debug for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecordRef({})", self.name)
    }
}

/// Unit-only enum, encoded as the position of the variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnumRef {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}
