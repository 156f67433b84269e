use crate::cache::TypeCache;
use crate::error::{ErrorKind, Result};
use crate::io::ByteWriter;
use crate::options::Options;
use log::trace;
use shale_base::date_time::{date_time_to_ticks, time_span_to_ticks};
use shale_base::{ClassMeta, Object, RecordRef, RoughType, TypeDesc, Typed, Value, ValueError};
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, OnceLock};

type WriteFn = Arc<dyn Fn(&mut WriteSession<'_>, &Value) -> Result<()> + Send + Sync>;

/// Binary encoder.
///
/// Every call writes one top-level value, prefixed with its rough type and with its own class
/// id table.
#[derive(Clone, Debug, Default)]
pub struct Serializer {
    options: Options,
}

impl Serializer {
    pub fn new(options: Options) -> Self {
        Serializer { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn to_writer<T: Typed, W: Write>(&self, value: &T, mut output: W) -> Result<()> {
        let desc = T::type_desc();
        let value = value.to_value();
        self.session(&mut output, |s| {
            if desc == TypeDesc::Any {
                return s.write_any(&value);
            }
            s.output.write_tag(&RoughType::of(&desc))?;
            let write = writer(&desc)?;
            write(s, &value)
        })
    }

    pub fn to_bytes<T: Typed>(&self, value: &T) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.to_writer(value, &mut bytes)?;
        Ok(bytes)
    }

    /// Writes a dynamic value, the tag is inferred from its contents.
    ///
    /// Containers whose elements do not share one tag are written as sequences of `Any`.
    pub fn write_value<W: Write>(&self, value: &Value, mut output: W) -> Result<()> {
        self.session(&mut output, |s| s.write_any(value))
    }

    fn session(
        &self,
        output: &mut dyn Write,
        f: impl FnOnce(&mut WriteSession<'_>) -> Result<()>,
    ) -> Result<()> {
        let mut session = WriteSession {
            output: ByteWriter::new(output),
            classes: HashMap::new(),
        };
        f(&mut session).map_err(|e| {
            if self.options.report_error_position {
                e.at(session.output.position())
            } else {
                e
            }
        })
    }
}

/// Class id and field writers of a class already defined in the current stream.
struct ClassPlan {
    id: i16,
    writers: Vec<WriteFn>,
    /// Values of a fresh instance, for optional fields only.
    defaults: Vec<Option<Value>>,
}

struct WriteSession<'a> {
    output: ByteWriter<'a>,
    classes: HashMap<&'static str, Rc<ClassPlan>>,
}

impl WriteSession<'_> {
    fn write_any(&mut self, value: &Value) -> Result<()> {
        let tag = infer_tag(value)?;
        self.output.write_tag(&tag)?;
        let write = writer(&tag.type_desc())?;
        write(self, value)
    }

    fn write_object(&mut self, value: &Value, expected: Option<&RecordRef>) -> Result<()> {
        let obj = match value {
            Value::Null => return self.output.write_i16(0),
            Value::Record(obj) => &**obj,
            other => return Err(ValueError::mismatch(TypeDesc::Object, other).into()),
        };
        let meta = obj.class_meta();
        if let Some(expected) = expected {
            if meta.name != expected.name {
                return Err(ErrorKind::IncompatibleType {
                    found: meta.name.to_string(),
                    expected: expected.name.to_string(),
                }
                .into());
            }
        }
        let plan = self.class_plan(meta)?;
        self.write_fields(meta, &plan, obj)
    }

    /// Writes the class id, preceded on first use by the class definition.
    fn class_plan(&mut self, meta: &'static ClassMeta) -> Result<Rc<ClassPlan>> {
        if let Some(plan) = self.classes.get(meta.name) {
            self.output.write_i16(plan.id)?;
            return Ok(plan.clone());
        }
        let id = i16::try_from(self.classes.len() + 1).map_err(|_| ErrorKind::TooManyClasses)?;
        let field_count = i16::try_from(meta.fields.len())
            .map_err(|_| ErrorKind::InvalidLength(meta.fields.len() as i64))?;
        let writers = meta
            .fields
            .iter()
            .map(|f| writer(&f.ty))
            .collect::<Result<Vec<_>>>()?;
        let fresh = (meta.construct)();
        let defaults = meta
            .fields
            .iter()
            .map(|f| f.optional.then(|| fresh.get_field(f.index)))
            .collect();
        trace!("Class {} is #{id}", meta.name);

        self.output.write_i16(id)?;
        self.output.write_str(meta.name)?;
        self.output.write_i16(field_count)?;
        for field in &meta.fields {
            self.output.write_str(field.tag)?;
            self.output.write_tag(&RoughType::of(&field.ty))?;
        }
        let plan = Rc::new(ClassPlan {
            id,
            writers,
            defaults,
        });
        self.classes.insert(meta.name, plan.clone());
        Ok(plan)
    }

    fn write_fields(&mut self, meta: &ClassMeta, plan: &ClassPlan, obj: &dyn Object) -> Result<()> {
        if meta.compact {
            for (field, write) in meta.fields.iter().zip(&plan.writers) {
                write(self, &obj.get_field(field.index))?;
            }
            return Ok(());
        }
        for (i, field) in meta.fields.iter().enumerate() {
            let value = obj.get_field(field.index);
            if plan.defaults[i].as_ref() == Some(&value) {
                continue;
            }
            self.output.write_i16(i as i16 + 1)?;
            (plan.writers[i])(self, &value)?;
        }
        self.output.write_i16(0)
    }
}

fn write_fn(
    f: impl Fn(&mut WriteSession<'_>, &Value) -> Result<()> + Send + Sync + 'static,
) -> WriteFn {
    Arc::new(f)
}

fn writer(desc: &TypeDesc) -> Result<WriteFn> {
    static WRITERS: OnceLock<TypeCache<WriteFn>> = OnceLock::new();
    WRITERS
        .get_or_init(TypeCache::new)
        .get_or_try_insert(desc, || make_writer(desc))
}

macro_rules! atom_writer {
    ($desc:expr, $variant:ident, $write:ident) => {{
        let desc = TypeDesc::clone($desc);
        write_fn(move |s, value| match value {
            Value::$variant(v) => s.output.$write(*v),
            other => Err(ValueError::mismatch(&desc, other).into()),
        })
    }};
}

fn make_writer(desc: &TypeDesc) -> Result<WriteFn> {
    let f = match desc {
        TypeDesc::I8 => atom_writer!(desc, I8, write_i8),
        TypeDesc::U8 => atom_writer!(desc, U8, write_u8),
        TypeDesc::I16 => atom_writer!(desc, I16, write_i16),
        TypeDesc::U16 => atom_writer!(desc, U16, write_u16),
        TypeDesc::I32 | TypeDesc::Enum(_) => atom_writer!(desc, I32, write_i32),
        TypeDesc::U32 => atom_writer!(desc, U32, write_u32),
        TypeDesc::I64 => atom_writer!(desc, I64, write_i64),
        TypeDesc::U64 => atom_writer!(desc, U64, write_u64),
        TypeDesc::Bool => atom_writer!(desc, Bool, write_bool),
        TypeDesc::Char => atom_writer!(desc, Char, write_char),
        TypeDesc::F32 => atom_writer!(desc, F32, write_f32),
        TypeDesc::F64 => atom_writer!(desc, F64, write_f64),
        TypeDesc::DateTime => write_fn(|s, value| match value {
            Value::DateTime(dt) => {
                let ticks = date_time_to_ticks(dt)
                    .ok_or_else(|| ValueError::OutOfRange(format!("DateTime {dt}")))?;
                s.output.write_i64(ticks)
            }
            other => Err(ValueError::mismatch(TypeDesc::DateTime, other).into()),
        }),
        TypeDesc::TimeSpan => write_fn(|s, value| match value {
            Value::TimeSpan(span) => {
                let ticks = time_span_to_ticks(span)
                    .ok_or_else(|| ValueError::OutOfRange(format!("TimeSpan {span}")))?;
                s.output.write_i64(ticks)
            }
            other => Err(ValueError::mismatch(TypeDesc::TimeSpan, other).into()),
        }),
        TypeDesc::String => write_fn(|s, value| match value {
            Value::String(v) => s.output.write_nullable_str(Some(v.as_str())),
            Value::Null => s.output.write_nullable_str(None),
            other => Err(ValueError::mismatch(TypeDesc::String, other).into()),
        }),
        TypeDesc::Array(element) | TypeDesc::List(element) | TypeDesc::Collection(element) => {
            let element = writer(element)?;
            let desc = TypeDesc::clone(desc);
            write_fn(move |s, value| match value {
                Value::Null => s.output.write_len(None),
                Value::Seq(items) => {
                    s.output.write_len(Some(items.len()))?;
                    for item in items {
                        element(s, item)?;
                    }
                    Ok(())
                }
                other => Err(ValueError::mismatch(&desc, other).into()),
            })
        }
        TypeDesc::Map(key, value) => {
            let key = writer(key)?;
            let value = writer(value)?;
            let desc = TypeDesc::clone(desc);
            write_fn(move |s, map| match map {
                Value::Null => s.output.write_len(None),
                Value::Map(pairs) => {
                    s.output.write_len(Some(pairs.len()))?;
                    for (k, v) in pairs {
                        key(s, k)?;
                        value(s, v)?;
                    }
                    Ok(())
                }
                other => Err(ValueError::mismatch(&desc, other).into()),
            })
        }
        TypeDesc::Action(_) => {
            let desc = TypeDesc::clone(desc);
            write_fn(move |s, value| match value {
                Value::Null => s.output.write_str(""),
                Value::Action(action) => s.output.write_str(&action.name),
                other => Err(ValueError::mismatch(&desc, other).into()),
            })
        }
        TypeDesc::Record(record) => {
            let record = *record;
            write_fn(move |s, value| s.write_object(value, Some(&record)))
        }
        TypeDesc::Object => write_fn(|s, value| s.write_object(value, None)),
        TypeDesc::Any => write_fn(|s, value| s.write_any(value)),
    };
    Ok(f)
}

/// Tag announcing a dynamic value. Null is written as a null record.
fn infer_tag(value: &Value) -> Result<RoughType> {
    let tag = match value {
        Value::Null | Value::Record(_) => RoughType::Record,
        Value::I8(_) => RoughType::SByte,
        Value::U8(_) => RoughType::Byte,
        Value::I16(_) => RoughType::Short,
        Value::U16(_) => RoughType::UShort,
        Value::I32(_) => RoughType::Int,
        Value::U32(_) => RoughType::UInt,
        Value::I64(_) => RoughType::Long,
        Value::U64(_) => RoughType::ULong,
        Value::Bool(_) => RoughType::Bool,
        Value::Char(_) => RoughType::Char,
        Value::F32(_) => RoughType::Float,
        Value::F64(_) => RoughType::Double,
        Value::DateTime(_) => RoughType::DateTime,
        Value::TimeSpan(_) => RoughType::TimeSpan,
        Value::String(_) => RoughType::String,
        Value::Seq(items) => RoughType::Sequence(Box::new(common_tag(items.iter())?)),
        Value::Map(pairs) => RoughType::Mapping(
            Box::new(common_tag(pairs.iter().map(|(k, _)| k))?),
            Box::new(common_tag(pairs.iter().map(|(_, v)| v))?),
        ),
        Value::Action(action) => {
            return Err(ErrorKind::UnsupportedType(format!("untyped action {}", action.name)).into())
        }
    };
    Ok(tag)
}

/// Tag shared by all elements, `Any` when they differ or when there are none.
fn common_tag<'v>(items: impl Iterator<Item = &'v Value>) -> Result<RoughType> {
    let mut common = None;
    let mut has_null = false;
    for item in items {
        if item.is_null() {
            has_null = true;
            continue;
        }
        let tag = infer_tag(item)?;
        match &common {
            None => common = Some(tag),
            Some(c) if *c == tag => {}
            Some(_) => return Ok(RoughType::Any),
        }
    }
    Ok(match common {
        Some(tag) if !has_null || is_nullable(&tag) => tag,
        Some(_) => RoughType::Any,
        None if has_null => RoughType::Record,
        None => RoughType::Any,
    })
}

fn is_nullable(tag: &RoughType) -> bool {
    matches!(
        tag,
        RoughType::String | RoughType::Record | RoughType::Sequence(_) | RoughType::Mapping(_, _)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_sequences_fall_back_to_any() {
        let mixed = Value::Seq(vec![Value::I32(1), Value::String("a".into())]);
        assert_eq!(
            infer_tag(&mixed).unwrap(),
            RoughType::Sequence(Box::new(RoughType::Any))
        );
        let empty = Value::Seq(vec![]);
        assert_eq!(
            infer_tag(&empty).unwrap(),
            RoughType::Sequence(Box::new(RoughType::Any))
        );
    }

    #[test]
    fn nulls_join_nullable_tags_only() {
        let strings = Value::Seq(vec![Value::Null, Value::String("a".into())]);
        assert_eq!(
            infer_tag(&strings).unwrap(),
            RoughType::Sequence(Box::new(RoughType::String))
        );
        let ints = Value::Seq(vec![Value::Null, Value::I32(1)]);
        assert_eq!(
            infer_tag(&ints).unwrap(),
            RoughType::Sequence(Box::new(RoughType::Any))
        );
    }

    #[test]
    fn map_tags() {
        let map = Value::Map(vec![(Value::String("k".into()), Value::U8(1))]);
        assert_eq!(
            infer_tag(&map).unwrap(),
            RoughType::Mapping(Box::new(RoughType::String), Box::new(RoughType::Byte))
        );
    }
}
