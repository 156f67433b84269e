use crate::error::ValueError;
use crate::type_desc::TypeDesc;
use crate::typed::Typed;
use crate::value::Value;
use crate::Reflect;
use dyn_clone::DynClone;
use std::any::Any;
use std::fmt::Debug;

/// Record instance seen through its descriptor table.
///
/// `index` arguments are declaration indices, see [`FieldMeta::index`].
pub trait Object: Any + Debug + DynClone {
    fn class_meta(&self) -> &'static ClassMeta;

    fn get_field(&self, index: usize) -> Value;

    fn set_field(&mut self, index: usize, value: Value) -> Result<(), ValueError>;

    /// Adds the contents of `value` to the current value of the field.
    fn merge_field(&mut self, index: usize, value: Value) -> Result<(), ValueError>;

    /// Existing nested record held by the field, if any.
    fn field_object_mut(&mut self, index: usize) -> Option<&mut dyn Object>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

dyn_clone::clone_trait_object!(Object);

impl PartialEq for dyn Object {
    fn eq(&self, other: &Self) -> bool {
        let meta = self.class_meta();
        std::ptr::eq(meta, other.class_meta())
            && meta
                .fields
                .iter()
                .all(|f| self.get_field(f.index) == other.get_field(f.index))
    }
}

pub type ActionFn = fn(&mut dyn Object, Value) -> Result<(), ValueError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Reference type, a null class id decodes to a missing object.
    Class,
    /// Value type, a null class id decodes to "no struct" and converts to the default instance.
    Struct,
}

#[derive(Clone, Debug)]
pub struct FieldMeta {
    /// Name written into the stream, fields are ordered by it.
    pub tag: &'static str,
    /// Position of the field in the type declaration, used with [`Object`] accessors.
    pub index: usize,
    pub ty: TypeDesc,
    /// Optional fields may be absent from a stream and are not written when equal to their default.
    pub optional: bool,
    /// Merge-only fields are filled through [`Object::merge_field`] instead of being replaced.
    pub settable: bool,
}

#[derive(Clone, Debug)]
pub struct MethodMeta {
    pub name: &'static str,
    pub arg: TypeDesc,
    pub invoke: ActionFn,
}

pub struct ClassMeta {
    pub name: &'static str,
    pub kind: RecordKind,
    /// Compact records are written without field slot markers, every field is always present.
    pub compact: bool,
    /// Sorted by tag, ascending byte order.
    pub fields: Vec<FieldMeta>,
    pub methods: Vec<MethodMeta>,
    pub construct: fn() -> Box<dyn Object>,
    pub after_deserialization: Vec<fn(&mut dyn Object)>,
}

impl ClassMeta {
    pub fn builder(
        name: &'static str,
        kind: RecordKind,
        construct: fn() -> Box<dyn Object>,
    ) -> ClassMetaBuilder {
        ClassMetaBuilder {
            meta: ClassMeta {
                name,
                kind,
                compact: false,
                fields: Vec::new(),
                methods: Vec::new(),
                construct,
                after_deserialization: Vec::new(),
            },
        }
    }

    pub fn field(&self, tag: &str) -> Option<&FieldMeta> {
        self.fields
            .binary_search_by(|f| f.tag.cmp(tag))
            .ok()
            .map(|idx| &self.fields[idx])
    }

    pub fn method(&self, name: &str) -> Option<&MethodMeta> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn run_after_deserialization(&self, obj: &mut dyn Object) {
        for hook in &self.after_deserialization {
            hook(obj);
        }
    }
}

impl Debug for ClassMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassMeta")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("compact", &self.compact)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

pub struct ClassMetaBuilder {
    meta: ClassMeta,
}

impl ClassMetaBuilder {
    pub fn compact(mut self, compact: bool) -> Self {
        self.meta.compact = compact;
        self
    }

    pub fn field(mut self, field: FieldMeta) -> Self {
        self.meta.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodMeta) -> Self {
        self.meta.methods.push(method);
        self
    }

    pub fn after_deserialization(mut self, hook: fn(&mut dyn Object)) -> Self {
        self.meta.after_deserialization.push(hook);
        self
    }

    pub fn build(mut self) -> ClassMeta {
        self.meta.fields.sort_by(|a, b| a.tag.cmp(b.tag));
        self.meta
    }
}

pub fn construct<T: Reflect>() -> Box<dyn Object> {
    Box::new(T::default())
}

/// Declared argument type of an action method.
pub fn action_arg<S, A: Typed>(_method: fn(&mut S, A)) -> TypeDesc {
    A::type_desc()
}

pub fn record_from_value<T: Reflect>(value: Value) -> Result<T, ValueError> {
    match value {
        Value::Record(obj) => {
            let found = obj.class_meta().name;
            match obj.into_any().downcast::<T>() {
                Ok(record) => Ok(*record),
                Err(_) => Err(ValueError::Mismatch {
                    expected: T::WIRE_NAME.to_string(),
                    found: found.to_string(),
                }),
            }
        }
        Value::Null if T::meta().kind == RecordKind::Struct => Ok(T::default()),
        Value::Null => Err(ValueError::UnexpectedNull(T::WIRE_NAME.to_string())),
        other => Err(ValueError::mismatch(T::WIRE_NAME, &other)),
    }
}
