use crate::type_desc::TypeDesc;
use std::fmt::{Display, Formatter};

/// Wire-level shape of a value.
///
/// Written in front of every value whose type cannot be known from static context: top-level
/// values, field descriptors of a schema definition and entries of untyped slots.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoughType {
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Bool,
    Char,
    Float,
    Double,
    DateTime,
    TimeSpan,
    String,
    Any,
    Record,
    Sequence(Box<RoughType>),
    Mapping(Box<RoughType>, Box<RoughType>),
}

impl RoughType {
    pub const SBYTE: u8 = 1;
    pub const BYTE: u8 = 2;
    pub const SHORT: u8 = 3;
    pub const USHORT: u8 = 4;
    pub const INT: u8 = 5;
    pub const UINT: u8 = 6;
    pub const LONG: u8 = 7;
    pub const ULONG: u8 = 8;
    pub const BOOL: u8 = 9;
    pub const CHAR: u8 = 10;
    pub const FLOAT: u8 = 11;
    pub const DOUBLE: u8 = 12;
    pub const DATE_TIME: u8 = 14;
    pub const TIME_SPAN: u8 = 15;
    pub const STRING: u8 = 16;
    pub const ANY: u8 = 17;
    pub const RECORD: u8 = 32;
    pub const SEQUENCE: u8 = 33;
    pub const MAPPING: u8 = 34;

    /// Tag byte of this node, nested tags of sequences and mappings follow it on the wire.
    pub fn code(&self) -> u8 {
        match self {
            RoughType::SByte => Self::SBYTE,
            RoughType::Byte => Self::BYTE,
            RoughType::Short => Self::SHORT,
            RoughType::UShort => Self::USHORT,
            RoughType::Int => Self::INT,
            RoughType::UInt => Self::UINT,
            RoughType::Long => Self::LONG,
            RoughType::ULong => Self::ULONG,
            RoughType::Bool => Self::BOOL,
            RoughType::Char => Self::CHAR,
            RoughType::Float => Self::FLOAT,
            RoughType::Double => Self::DOUBLE,
            RoughType::DateTime => Self::DATE_TIME,
            RoughType::TimeSpan => Self::TIME_SPAN,
            RoughType::String => Self::STRING,
            RoughType::Any => Self::ANY,
            RoughType::Record => Self::RECORD,
            RoughType::Sequence(_) => Self::SEQUENCE,
            RoughType::Mapping(_, _) => Self::MAPPING,
        }
    }

    /// Tags that are complete without nested tags.
    pub fn leaf(code: u8) -> Option<RoughType> {
        let rt = match code {
            Self::SBYTE => RoughType::SByte,
            Self::BYTE => RoughType::Byte,
            Self::SHORT => RoughType::Short,
            Self::USHORT => RoughType::UShort,
            Self::INT => RoughType::Int,
            Self::UINT => RoughType::UInt,
            Self::LONG => RoughType::Long,
            Self::ULONG => RoughType::ULong,
            Self::BOOL => RoughType::Bool,
            Self::CHAR => RoughType::Char,
            Self::FLOAT => RoughType::Float,
            Self::DOUBLE => RoughType::Double,
            Self::DATE_TIME => RoughType::DateTime,
            Self::TIME_SPAN => RoughType::TimeSpan,
            Self::STRING => RoughType::String,
            Self::ANY => RoughType::Any,
            Self::RECORD => RoughType::Record,
            _ => return None,
        };
        Some(rt)
    }

    /// Classifies a declared type.
    pub fn of(desc: &TypeDesc) -> RoughType {
        match desc {
            TypeDesc::I8 => RoughType::SByte,
            TypeDesc::U8 => RoughType::Byte,
            TypeDesc::I16 => RoughType::Short,
            TypeDesc::U16 => RoughType::UShort,
            TypeDesc::I32 | TypeDesc::Enum(_) => RoughType::Int,
            TypeDesc::U32 => RoughType::UInt,
            TypeDesc::I64 => RoughType::Long,
            TypeDesc::U64 => RoughType::ULong,
            TypeDesc::Bool => RoughType::Bool,
            TypeDesc::Char => RoughType::Char,
            TypeDesc::F32 => RoughType::Float,
            TypeDesc::F64 => RoughType::Double,
            TypeDesc::DateTime => RoughType::DateTime,
            TypeDesc::TimeSpan => RoughType::TimeSpan,
            TypeDesc::String | TypeDesc::Action(_) => RoughType::String,
            TypeDesc::Array(e) | TypeDesc::List(e) | TypeDesc::Collection(e) => {
                RoughType::Sequence(Box::new(RoughType::of(e)))
            }
            TypeDesc::Map(k, v) => {
                RoughType::Mapping(Box::new(RoughType::of(k)), Box::new(RoughType::of(v)))
            }
            TypeDesc::Record(_) | TypeDesc::Object => RoughType::Record,
            TypeDesc::Any => RoughType::Any,
        }
    }

    /// Whether a value tagged `self` can be decoded into `expected` without loss.
    ///
    /// Atoms must match exactly, enums only take `Int`, containers are checked element-wise and
    /// `Record` goes into any record type.
    pub fn accepts(&self, expected: &TypeDesc) -> bool {
        match expected {
            TypeDesc::Enum(_) => *self == RoughType::Int,
            TypeDesc::Action(_) => *self == RoughType::String,
            TypeDesc::Array(e) | TypeDesc::List(e) | TypeDesc::Collection(e) => match self {
                RoughType::Sequence(elem) => elem.accepts(e),
                _ => false,
            },
            TypeDesc::Map(k, v) => match self {
                RoughType::Mapping(rk, rv) => rk.accepts(k) && rv.accepts(v),
                _ => false,
            },
            TypeDesc::Record(_) | TypeDesc::Object => *self == RoughType::Record,
            TypeDesc::Any => *self == RoughType::Any,
            atom => *self == RoughType::of(atom),
        }
    }

    /// Runtime type reconstructed from the tag alone.
    pub fn type_desc(&self) -> TypeDesc {
        match self {
            RoughType::SByte => TypeDesc::I8,
            RoughType::Byte => TypeDesc::U8,
            RoughType::Short => TypeDesc::I16,
            RoughType::UShort => TypeDesc::U16,
            RoughType::Int => TypeDesc::I32,
            RoughType::UInt => TypeDesc::U32,
            RoughType::Long => TypeDesc::I64,
            RoughType::ULong => TypeDesc::U64,
            RoughType::Bool => TypeDesc::Bool,
            RoughType::Char => TypeDesc::Char,
            RoughType::Float => TypeDesc::F32,
            RoughType::Double => TypeDesc::F64,
            RoughType::DateTime => TypeDesc::DateTime,
            RoughType::TimeSpan => TypeDesc::TimeSpan,
            RoughType::String => TypeDesc::String,
            RoughType::Any => TypeDesc::Any,
            RoughType::Record => TypeDesc::Object,
            RoughType::Sequence(e) => TypeDesc::List(Box::new(e.type_desc())),
            RoughType::Mapping(k, v) => {
                TypeDesc::Map(Box::new(k.type_desc()), Box::new(v.type_desc()))
            }
        }
    }
}

impl Display for RoughType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RoughType::Sequence(e) => write!(f, "Sequence<{e}>"),
            RoughType::Mapping(k, v) => write!(f, "Mapping<{k}, {v}>"),
            leaf => write!(f, "{leaf:?}"),
        }
    }
}
