use crate::object::ClassMeta;
use crate::type_desc::TypeDesc;
use crate::Reflect;
use std::collections::HashMap;

/// Record descriptors known to a program, looked up by wire name when a stream defines a class.
#[derive(Clone, Default, Debug)]
pub struct TypeRegistry {
    classes: HashMap<&'static str, &'static ClassMeta>,
}

impl TypeRegistry {
    pub fn new() -> TypeRegistry {
        TypeRegistry {
            classes: HashMap::new(),
        }
    }

    pub fn with<T: Reflect>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Registers `T` and every record type reachable from its fields.
    pub fn register<T: Reflect>(&mut self) -> &mut Self {
        T::reflect(self);
        self
    }

    pub fn register_meta(&mut self, meta: &'static ClassMeta) {
        if self.classes.contains_key(meta.name) {
            return;
        }
        self.classes.insert(meta.name, meta);
        for field in &meta.fields {
            self.register_type(&field.ty);
        }
    }

    /// Registers the records named by a declared type.
    pub fn register_type(&mut self, ty: &TypeDesc) {
        match ty {
            TypeDesc::Record(r) => self.register_meta((r.meta)()),
            TypeDesc::Array(e) | TypeDesc::List(e) | TypeDesc::Collection(e) => {
                self.register_type(e)
            }
            TypeDesc::Map(k, v) => {
                self.register_type(k);
                self.register_type(v);
            }
            _ => {}
        }
    }

    pub fn get(&self, name: &str) -> Option<&'static ClassMeta> {
        self.classes.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
