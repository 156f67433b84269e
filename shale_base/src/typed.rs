use crate::error::ValueError;
use crate::object::{ActionFn, Object};
use crate::type_desc::TypeDesc;
use crate::value::{ActionRef, Value};
use chrono::{NaiveDateTime, TimeDelta};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::marker::PhantomData;

/// Conversion between a Rust field type and the dynamic [`Value`] model.
pub trait Typed: Sized {
    fn type_desc() -> TypeDesc;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueError>;

    /// Adds the elements carried by `value` to `self`. Only collections and maps support this.
    fn merge_value(&mut self, value: Value) -> Result<(), ValueError> {
        Err(ValueError::mismatch(
            format!("mergeable {}", Self::type_desc()),
            &value,
        ))
    }

    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        None
    }
}

/// Types that have a null representation on the wire and may be wrapped in `Option`.
pub trait Nullable: Typed {}

macro_rules! impl_atom {
    ($ty:ty, $variant:ident, $desc:ident) => {
        impl Typed for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::$desc
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(ValueError::mismatch(TypeDesc::$desc, &other)),
                }
            }
        }
    };
}

impl_atom!(i8, I8, I8);
impl_atom!(u8, U8, U8);
impl_atom!(i16, I16, I16);
impl_atom!(u16, U16, U16);
impl_atom!(i32, I32, I32);
impl_atom!(u32, U32, U32);
impl_atom!(i64, I64, I64);
impl_atom!(u64, U64, U64);
impl_atom!(bool, Bool, Bool);
impl_atom!(char, Char, Char);
impl_atom!(f32, F32, F32);
impl_atom!(f64, F64, F64);
impl_atom!(NaiveDateTime, DateTime, DateTime);
impl_atom!(TimeDelta, TimeSpan, TimeSpan);

impl Typed for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::String
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Err(ValueError::UnexpectedNull("String".into())),
            other => Err(ValueError::mismatch(TypeDesc::String, &other)),
        }
    }
}

impl Nullable for String {}

impl<T: Nullable> Typed for Option<T> {
    fn type_desc() -> TypeDesc {
        T::type_desc()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }

    fn merge_value(&mut self, value: Value) -> Result<(), ValueError> {
        match self {
            Some(v) => v.merge_value(value),
            None => Err(ValueError::MergeIntoNull(T::type_desc().to_string())),
        }
    }

    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        self.as_mut().and_then(|v| v.as_object_mut())
    }
}

fn elements<T: Typed>(desc: impl FnOnce() -> TypeDesc, value: Value) -> Result<Vec<T>, ValueError> {
    match value {
        Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
        Value::Null => Err(ValueError::UnexpectedNull(desc().to_string())),
        other => Err(ValueError::mismatch(desc(), &other)),
    }
}

fn pairs<K: Typed, V: Typed>(
    desc: impl FnOnce() -> TypeDesc,
    value: Value,
) -> Result<Vec<(K, V)>, ValueError> {
    match value {
        Value::Map(items) => items
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect(),
        Value::Null => Err(ValueError::UnexpectedNull(desc().to_string())),
        other => Err(ValueError::mismatch(desc(), &other)),
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::List(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Typed::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        elements(Self::type_desc, value)
    }

    fn merge_value(&mut self, value: Value) -> Result<(), ValueError> {
        self.extend(elements::<T>(Self::type_desc, value)?);
        Ok(())
    }
}

impl<T: Typed> Nullable for Vec<T> {}

impl<T: Typed> Typed for Box<[T]> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Array(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Typed::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        elements(Self::type_desc, value).map(Vec::into_boxed_slice)
    }
}

impl<T: Typed> Nullable for Box<[T]> {}

impl<T: Typed> Typed for VecDeque<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Collection(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Typed::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        elements(Self::type_desc, value).map(VecDeque::from)
    }

    fn merge_value(&mut self, value: Value) -> Result<(), ValueError> {
        self.extend(elements::<T>(Self::type_desc, value)?);
        Ok(())
    }
}

impl<T: Typed> Nullable for VecDeque<T> {}

impl<T: Typed + Eq + Hash> Typed for HashSet<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Collection(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Typed::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(elements(Self::type_desc, value)?.into_iter().collect())
    }

    fn merge_value(&mut self, value: Value) -> Result<(), ValueError> {
        self.extend(elements::<T>(Self::type_desc, value)?);
        Ok(())
    }
}

impl<T: Typed + Eq + Hash> Nullable for HashSet<T> {}

impl<T: Typed + Ord> Typed for BTreeSet<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Collection(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Typed::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(elements(Self::type_desc, value)?.into_iter().collect())
    }

    fn merge_value(&mut self, value: Value) -> Result<(), ValueError> {
        self.extend(elements::<T>(Self::type_desc, value)?);
        Ok(())
    }
}

impl<T: Typed + Ord> Nullable for BTreeSet<T> {}

impl<K: Typed + Eq + Hash, V: Typed> Typed for HashMap<K, V> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Map(Box::new(K::type_desc()), Box::new(V::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        let mut map = Self::new();
        map.merge_value(value)?;
        Ok(map)
    }

    fn merge_value(&mut self, value: Value) -> Result<(), ValueError> {
        for (k, v) in pairs::<K, V>(Self::type_desc, value)? {
            if self.contains_key(&k) {
                return Err(ValueError::DuplicateKey(Self::type_desc().to_string()));
            }
            self.insert(k, v);
        }
        Ok(())
    }
}

impl<K: Typed + Eq + Hash, V: Typed> Nullable for HashMap<K, V> {}

impl<K: Typed + Ord, V: Typed> Typed for BTreeMap<K, V> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Map(Box::new(K::type_desc()), Box::new(V::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        let mut map = Self::new();
        map.merge_value(value)?;
        Ok(map)
    }

    fn merge_value(&mut self, value: Value) -> Result<(), ValueError> {
        for (k, v) in pairs::<K, V>(Self::type_desc, value)? {
            if self.contains_key(&k) {
                return Err(ValueError::DuplicateKey(Self::type_desc().to_string()));
            }
            self.insert(k, v);
        }
        Ok(())
    }
}

impl<K: Typed + Ord, V: Typed> Nullable for BTreeMap<K, V> {}

/// Polymorphic record field, any registered class may be stored in it.
impl Typed for Box<dyn Object> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Object
    }

    fn to_value(&self) -> Value {
        Value::Record(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Record(obj) => Ok(obj),
            Value::Null => Err(ValueError::UnexpectedNull("Object".into())),
            other => Err(ValueError::mismatch(TypeDesc::Object, &other)),
        }
    }

    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut **self)
    }
}

impl Nullable for Box<dyn Object> {}

/// Untyped slot.
impl Typed for Value {
    fn type_desc() -> TypeDesc {
        TypeDesc::Any
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

/// Method of the owning record, stored by name.
///
/// Calling it needs the owner, which is passed explicitly.
pub struct Action<T> {
    target: ActionRef,
    _arg: PhantomData<fn(T)>,
}

impl<T: Typed> Action<T> {
    pub fn new(name: impl Into<String>, invoke: ActionFn) -> Self {
        Action {
            target: ActionRef {
                name: name.into(),
                invoke,
            },
            _arg: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn call(&self, owner: &mut dyn Object, arg: T) -> Result<(), ValueError> {
        (self.target.invoke)(owner, arg.to_value())
    }
}

impl<T> Clone for Action<T> {
    fn clone(&self) -> Self {
        Action {
            target: self.target.clone(),
            _arg: PhantomData,
        }
    }
}

impl<T> PartialEq for Action<T> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

impl<T> Debug for Action<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action({})", self.target.name)
    }
}

impl<T: Typed> Typed for Action<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Action(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Action(self.target.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Action(target) => Ok(Action {
                target,
                _arg: PhantomData,
            }),
            Value::Null => Err(ValueError::UnexpectedNull(Self::type_desc().to_string())),
            other => Err(ValueError::mismatch(Self::type_desc(), &other)),
        }
    }
}

impl<T: Typed> Nullable for Action<T> {}
