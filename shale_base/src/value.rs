use crate::object::{ActionFn, Object};
use chrono::{NaiveDateTime, TimeDelta};
use std::fmt::{Debug, Formatter};

/// Dynamically typed value moved between the codec and the typed fields of a record.
///
/// Enums travel as `I32` holding the variant position. Arrays, lists and other collections
/// all become `Seq`. `Null` stands for a missing reference: null string, list, map, record
/// or an unset action.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Bool(bool),
    Char(char),
    F32(f32),
    F64(f64),
    DateTime(NaiveDateTime),
    TimeSpan(TimeDelta),
    String(String),
    Seq(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Record(Box<dyn Object>),
    Action(ActionRef),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::DateTime(_) => "DateTime",
            Value::TimeSpan(_) => "TimeSpan",
            Value::String(_) => "String",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
            Value::Record(obj) => obj.class_meta().name,
            Value::Action(_) => "action",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&dyn Object> {
        match self {
            Value::Record(obj) => Some(&**obj),
            _ => None,
        }
    }
}

/// Method of a record bound by name.
#[derive(Clone)]
pub struct ActionRef {
    pub name: String,
    pub invoke: ActionFn,
}

impl PartialEq for ActionRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Debug for ActionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActionRef({})", self.name)
    }
}
