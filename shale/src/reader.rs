//! Reader and merger dispatch over declared types.
use crate::cache::TypeCache;
use crate::de::ReadSession;
use crate::error::{ErrorKind, Result};
use shale_base::date_time::{ticks_to_date_time, ticks_to_time_span};
use shale_base::{TypeDesc, Value, ValueError};
use std::sync::{Arc, OnceLock};

pub(crate) type ReadFn = Arc<dyn Fn(&mut ReadSession<'_>) -> Result<Value> + Send + Sync>;

/// How a field without a setter is filled.
#[derive(Clone)]
pub(crate) enum Merger {
    /// Elements read are added to the existing collection or map.
    Elements(ReadFn),
    /// The existing record is filled field by field.
    Object,
}

fn read_fn(f: impl Fn(&mut ReadSession<'_>) -> Result<Value> + Send + Sync + 'static) -> ReadFn {
    Arc::new(f)
}

pub(crate) fn reader(desc: &TypeDesc) -> Result<ReadFn> {
    static READERS: OnceLock<TypeCache<ReadFn>> = OnceLock::new();
    READERS
        .get_or_init(TypeCache::new)
        .get_or_try_insert(desc, || make_reader(desc))
}

pub(crate) fn merger(desc: &TypeDesc) -> Result<Merger> {
    static MERGERS: OnceLock<TypeCache<Merger>> = OnceLock::new();
    MERGERS
        .get_or_init(TypeCache::new)
        .get_or_try_insert(desc, || make_merger(desc))
}

fn make_reader(desc: &TypeDesc) -> Result<ReadFn> {
    let f = match desc {
        TypeDesc::I8 => read_fn(|s| Ok(Value::I8(s.input().read_i8()?))),
        TypeDesc::U8 => read_fn(|s| Ok(Value::U8(s.input().read_u8()?))),
        TypeDesc::I16 => read_fn(|s| Ok(Value::I16(s.input().read_i16()?))),
        TypeDesc::U16 => read_fn(|s| Ok(Value::U16(s.input().read_u16()?))),
        TypeDesc::I32 | TypeDesc::Enum(_) => read_fn(|s| Ok(Value::I32(s.input().read_i32()?))),
        TypeDesc::U32 => read_fn(|s| Ok(Value::U32(s.input().read_u32()?))),
        TypeDesc::I64 => read_fn(|s| Ok(Value::I64(s.input().read_i64()?))),
        TypeDesc::U64 => read_fn(|s| Ok(Value::U64(s.input().read_u64()?))),
        TypeDesc::Bool => read_fn(|s| Ok(Value::Bool(s.input().read_bool()?))),
        TypeDesc::Char => read_fn(|s| Ok(Value::Char(s.input().read_char()?))),
        TypeDesc::F32 => read_fn(|s| Ok(Value::F32(s.input().read_f32()?))),
        TypeDesc::F64 => read_fn(|s| Ok(Value::F64(s.input().read_f64()?))),
        TypeDesc::DateTime => read_fn(|s| {
            let ticks = s.input().read_i64()?;
            match ticks_to_date_time(ticks) {
                Some(dt) => Ok(Value::DateTime(dt)),
                None => Err(ValueError::OutOfRange(format!("DateTime of {ticks} ticks")).into()),
            }
        }),
        TypeDesc::TimeSpan => {
            read_fn(|s| Ok(Value::TimeSpan(ticks_to_time_span(s.input().read_i64()?))))
        }
        TypeDesc::String => read_fn(|s| {
            Ok(s.input()
                .read_nullable_str()?
                .map_or(Value::Null, Value::String))
        }),
        TypeDesc::Array(element) | TypeDesc::List(element) | TypeDesc::Collection(element) => {
            let element = reader(element)?;
            read_fn(move |s| {
                let Some(len) = s.input().read_len()? else {
                    return Ok(Value::Null);
                };
                let mut items = Vec::with_capacity(len.min(s.options().preallocation_limit));
                for _ in 0..len {
                    items.push(element(s)?);
                }
                Ok(Value::Seq(items))
            })
        }
        TypeDesc::Map(key, value) => {
            let key = reader(key)?;
            let value = reader(value)?;
            read_fn(move |s| {
                let Some(len) = s.input().read_len()? else {
                    return Ok(Value::Null);
                };
                let mut pairs = Vec::with_capacity(len.min(s.options().preallocation_limit));
                for _ in 0..len {
                    let k = key(s)?;
                    pairs.push((k, value(s)?));
                }
                Ok(Value::Map(pairs))
            })
        }
        TypeDesc::Action(arg) => {
            let arg = TypeDesc::clone(arg);
            read_fn(move |s| s.read_action(&arg))
        }
        TypeDesc::Record(record) => {
            let record = *record;
            read_fn(move |s| s.read_object(Some(&record)))
        }
        TypeDesc::Object => read_fn(|s| s.read_object(None)),
        TypeDesc::Any => read_fn(|s| s.read_any()),
    };
    Ok(f)
}

fn make_merger(desc: &TypeDesc) -> Result<Merger> {
    match desc {
        TypeDesc::List(_) | TypeDesc::Collection(_) | TypeDesc::Map(_, _) => {
            Ok(Merger::Elements(reader(desc)?))
        }
        TypeDesc::Record(_) | TypeDesc::Object => Ok(Merger::Object),
        other => Err(ErrorKind::UnmergeableField(other.to_string()).into()),
    }
}
