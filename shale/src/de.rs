use crate::class_def::{ClassDef, FieldAction};
use crate::error::{ErrorKind, Result};
use crate::io::ByteReader;
use crate::options::Options;
use crate::reader::{merger, reader, Merger};
use log::trace;
use shale_base::{
    ActionRef, ClassMeta, Object, RecordRef, RoughType, TypeDesc, TypeRegistry, Typed, Value,
    ValueError,
};
use std::io::Read;
use std::rc::Rc;

/// Binary decoder.
///
/// Every call reads one top-level value with its own class id table, so values written by
/// consecutive [`Serializer`](crate::Serializer) calls can be read back one after another
/// from the same reader.
#[derive(Clone, Debug, Default)]
pub struct Deserializer {
    options: Options,
    registry: TypeRegistry,
}

impl Deserializer {
    pub fn new(options: Options) -> Self {
        Deserializer {
            options,
            registry: TypeRegistry::new(),
        }
    }

    /// Makes `T` and the records reachable from it resolvable by name. Records reachable from
    /// the requested type are found without registration, polymorphic fields need it.
    pub fn with<T: shale_base::Reflect>(mut self) -> Self {
        self.registry.register::<T>();
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn from_reader<T: Typed, R: Read>(&self, mut input: R) -> Result<T> {
        let desc = T::type_desc();
        let value = self.session(&mut input, &desc, |s| {
            if desc == TypeDesc::Any {
                return s.read_any();
            }
            s.expect_tag(&desc)?;
            let read = reader(&desc)?;
            read(s)
        })?;
        Ok(T::from_value(value)?)
    }

    pub fn from_bytes<T: Typed>(&self, mut bytes: &[u8]) -> Result<T> {
        self.from_reader(&mut bytes)
    }

    /// Reads a value of whatever type the stream announces.
    pub fn read_any<R: Read>(&self, mut input: R) -> Result<Value> {
        self.session(&mut input, &TypeDesc::Any, |s| s.read_any())
    }

    /// Fills an existing instance: records field by field, collections and maps get the
    /// decoded elements added.
    pub fn merge_into<T: Typed, R: Read>(&self, mut input: R, target: &mut T) -> Result<()> {
        let desc = T::type_desc();
        if desc == TypeDesc::Any {
            return Err(ErrorKind::UnsupportedType(desc.to_string()).into());
        }
        self.session(&mut input, &desc, |s| {
            s.expect_tag(&desc)?;
            match merger(&desc)? {
                Merger::Object => {
                    let obj = target
                        .as_object_mut()
                        .ok_or_else(|| ValueError::MergeIntoNull(desc.to_string()))?;
                    s.read_into_object(obj)
                }
                Merger::Elements(read) => {
                    let value = read(s)?;
                    if !value.is_null() {
                        target.merge_value(value)?;
                    }
                    Ok(())
                }
            }
        })
    }

    fn session<V>(
        &self,
        input: &mut dyn Read,
        desc: &TypeDesc,
        f: impl FnOnce(&mut ReadSession<'_>) -> Result<V>,
    ) -> Result<V> {
        let mut implied = TypeRegistry::new();
        implied.register_type(desc);
        let mut session = ReadSession {
            input: ByteReader::new(input).with_max_depth(self.options.max_depth),
            options: &self.options,
            registry: &self.registry,
            implied,
            class_defs: Vec::new(),
            objects: Vec::new(),
            depth: 0,
        };
        f(&mut session).map_err(|e| {
            if self.options.report_error_position {
                e.at(session.input.position())
            } else {
                e
            }
        })
    }
}

/// State of one decode call.
pub(crate) struct ReadSession<'a> {
    input: ByteReader<'a>,
    options: &'a Options,
    registry: &'a TypeRegistry,
    /// Records reachable from the requested type.
    implied: TypeRegistry,
    /// Class id `n` is at `n - 1`, id 0 is null.
    class_defs: Vec<Rc<ClassDef>>,
    /// Records being filled, innermost last. Actions are looked up on the last one.
    objects: Vec<&'static ClassMeta>,
    /// Untyped values and records currently being read.
    depth: usize,
}

impl<'a> ReadSession<'a> {
    pub(crate) fn input(&mut self) -> &mut ByteReader<'a> {
        &mut self.input
    }

    pub(crate) fn options(&self) -> &Options {
        self.options
    }

    pub(crate) fn lookup_class(&self, name: &str) -> Option<&'static ClassMeta> {
        self.registry.get(name).or_else(|| self.implied.get(name))
    }

    fn expect_tag(&mut self, desc: &TypeDesc) -> Result<()> {
        let tag = self.input.read_tag()?;
        if !tag.accepts(desc) {
            return Err(ErrorKind::IncompatibleType {
                found: tag.to_string(),
                expected: desc.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub(crate) fn read_any(&mut self) -> Result<Value> {
        self.nested(|s| {
            let tag = s.input.read_tag()?;
            if tag == RoughType::Any {
                return Err(ErrorKind::UnsupportedType(TypeDesc::Any.to_string()).into());
            }
            let read = reader(&tag.type_desc())?;
            read(s)
        })
    }

    fn nested<V>(&mut self, f: impl FnOnce(&mut Self) -> Result<V>) -> Result<V> {
        if self.depth >= self.options.max_depth {
            return Err(ErrorKind::TooDeep(self.options.max_depth).into());
        }
        self.depth += 1;
        let r = f(self);
        self.depth -= 1;
        r
    }

    fn class_def(&mut self, class_id: i16) -> Result<Rc<ClassDef>> {
        let known = self.class_defs.len();
        if class_id > 0 && class_id as usize <= known {
            return Ok(self.class_defs[class_id as usize - 1].clone());
        }
        if class_id as usize != known + 1 {
            return Err(ErrorKind::BadClassId(class_id).into());
        }
        let def = Rc::new(self.define_class()?);
        trace!("Class {} is #{class_id}", def.meta.name);
        self.class_defs.push(def.clone());
        Ok(def)
    }

    /// Reads a class id and a fresh instance of that class. `expected` restricts the class.
    pub(crate) fn read_object(&mut self, expected: Option<&RecordRef>) -> Result<Value> {
        let class_id = self.input.read_i16()?;
        if class_id == 0 {
            return Ok(Value::Null);
        }
        let def = self.class_def(class_id)?;
        if let Some(expected) = expected {
            if def.meta.name != expected.name {
                return Err(ErrorKind::IncompatibleType {
                    found: def.meta.name.to_string(),
                    expected: expected.name.to_string(),
                }
                .into());
            }
        }
        let mut obj = (def.meta.construct)();
        self.read_fields(&def, &mut *obj)?;
        Ok(Value::Record(obj))
    }

    pub(crate) fn read_into_object(&mut self, obj: &mut dyn Object) -> Result<()> {
        let class_id = self.input.read_i16()?;
        let name = obj.class_meta().name;
        if class_id == 0 {
            return Err(ErrorKind::NullObject(name.to_string()).into());
        }
        let def = self.class_def(class_id)?;
        if def.meta.name != name {
            return Err(ErrorKind::IncompatibleType {
                found: def.meta.name.to_string(),
                expected: name.to_string(),
            }
            .into());
        }
        self.read_fields(&def, obj)
    }

    fn read_fields(&mut self, def: &ClassDef, obj: &mut dyn Object) -> Result<()> {
        self.nested(|s| {
            s.objects.push(def.meta);
            let r = s.read_field_values(def, &mut *obj);
            s.objects.pop();
            r
        })?;
        def.meta.run_after_deserialization(obj);
        Ok(())
    }

    fn read_field_values(&mut self, def: &ClassDef, obj: &mut dyn Object) -> Result<()> {
        if def.meta.compact {
            for field in &def.fields {
                self.read_field(&field.action, obj)?;
            }
            return Ok(());
        }
        let mut actual = self.input.read_i16()?;
        for (i, field) in def.fields.iter().enumerate() {
            let slot = i as i16 + 1;
            if actual == 0 || slot < actual {
                if field.optional {
                    continue;
                }
                return Err(ErrorKind::UnexpectedFieldSlot {
                    expected: slot,
                    field: field.name.clone(),
                    found: actual,
                }
                .into());
            }
            self.read_field(&field.action, obj)?;
            actual = self.input.read_i16()?;
        }
        if actual != 0 {
            return Err(ErrorKind::UnfinishedObject(actual).into());
        }
        Ok(())
    }

    fn read_field(&mut self, action: &FieldAction, obj: &mut dyn Object) -> Result<()> {
        match action {
            FieldAction::Discard(read) => {
                read(self)?;
            }
            FieldAction::Assign { index, read } => {
                let value = read(self)?;
                obj.set_field(*index, value)?;
            }
            FieldAction::Merge {
                index,
                merger: Merger::Elements(read),
            } => {
                let value = read(self)?;
                if !value.is_null() {
                    obj.merge_field(*index, value)?;
                }
            }
            FieldAction::Merge {
                index,
                merger: Merger::Object,
            } => {
                let class = obj.class_meta().name;
                let nested = obj
                    .field_object_mut(*index)
                    .ok_or_else(|| ErrorKind::NullObject(format!("field #{index} of {class}")))?;
                self.read_into_object(nested)?;
            }
        }
        Ok(())
    }

    /// Action names are bound to a method of the record being filled, empty means unset.
    pub(crate) fn read_action(&mut self, arg: &TypeDesc) -> Result<Value> {
        let name = self.input.read_str()?;
        if name.is_empty() {
            return Ok(Value::Null);
        }
        let method = self
            .objects
            .last()
            .and_then(|meta| meta.method(&name))
            .filter(|method| method.arg == *arg)
            .ok_or_else(|| ErrorKind::UnknownAction(name.clone()))?;
        Ok(Value::Action(ActionRef {
            name,
            invoke: method.invoke,
        }))
    }
}
