//! Per-stream class schemas and the field merge between the writer's layout and ours.
use crate::de::ReadSession;
use crate::error::{ErrorKind, Result};
use crate::reader::{merger, reader, Merger, ReadFn};
use log::{debug, trace};
use shale_base::ClassMeta;
use std::cmp::Ordering;

pub(crate) struct ClassDef {
    pub(crate) meta: &'static ClassMeta,
    /// In the order the writer emitted them.
    pub(crate) fields: Vec<FieldDef>,
}

pub(crate) struct FieldDef {
    pub(crate) name: String,
    /// Absent fields that are optional on our side, or unknown to us, may be skipped.
    pub(crate) optional: bool,
    pub(crate) action: FieldAction,
}

pub(crate) enum FieldAction {
    /// Field unknown to us, the value is read and dropped.
    Discard(ReadFn),
    Assign { index: usize, read: ReadFn },
    Merge { index: usize, merger: Merger },
}

impl ReadSession<'_> {
    /// Reads a class definition: type name, field count and the writer's `(name, tag)` pairs,
    /// binding each of them to one of our fields.
    pub(crate) fn define_class(&mut self) -> Result<ClassDef> {
        let type_name = self.input().read_str()?;
        let meta = self
            .lookup_class(&type_name)
            .ok_or_else(|| ErrorKind::UnknownClass(type_name.clone()))?;
        let their_count = self.input().read_i16()?;
        if their_count < 0 {
            return Err(ErrorKind::InvalidLength(i64::from(their_count)).into());
        }
        let their_count = their_count as usize;
        trace!("Define class {type_name}, {their_count} fields in stream");

        let ours = &meta.fields;
        let mut fields = Vec::with_capacity(their_count);
        let (mut our_idx, mut their_idx) = (0, 0);
        // Their name is read before comparing, keep it if our cursor is the one to advance.
        let mut their_name = None;
        while our_idx < ours.len() && their_idx < their_count {
            let our = &ours[our_idx];
            let name = match their_name.take() {
                Some(name) => name,
                None => self.input().read_str()?,
            };
            match our.tag.cmp(name.as_str()) {
                Ordering::Less => {
                    if !our.optional {
                        return Err(missing_field(our.tag, meta));
                    }
                    our_idx += 1;
                    their_name = Some(name);
                }
                Ordering::Greater => {
                    fields.push(self.unknown_field(name, meta)?);
                    their_idx += 1;
                }
                Ordering::Equal => {
                    let tag = self.input().read_tag()?;
                    if !tag.accepts(&our.ty) {
                        return Err(ErrorKind::IncompatibleFieldType {
                            field: name,
                            class: meta.name.to_string(),
                            found: tag.to_string(),
                            expected: our.ty.to_string(),
                        }
                        .into());
                    }
                    let action = if our.settable {
                        FieldAction::Assign {
                            index: our.index,
                            read: reader(&our.ty)?,
                        }
                    } else {
                        FieldAction::Merge {
                            index: our.index,
                            merger: merger(&our.ty)?,
                        }
                    };
                    fields.push(FieldDef {
                        name,
                        optional: our.optional,
                        action,
                    });
                    our_idx += 1;
                    their_idx += 1;
                }
            }
        }
        if let Some(our) = ours[our_idx..].iter().find(|f| !f.optional) {
            return Err(missing_field(our.tag, meta));
        }
        while their_idx < their_count {
            let name = match their_name.take() {
                Some(name) => name,
                None => self.input().read_str()?,
            };
            fields.push(self.unknown_field(name, meta)?);
            their_idx += 1;
        }
        Ok(ClassDef { meta, fields })
    }

    fn unknown_field(&mut self, name: String, meta: &ClassMeta) -> Result<FieldDef> {
        if !self.options().ignore_unknown_fields {
            return Err(ErrorKind::UnknownFieldRejected {
                field: name,
                class: meta.name.to_string(),
            }
            .into());
        }
        let tag = self.input().read_tag()?;
        debug!("Skipping field {name}: {tag} of class {}", meta.name);
        Ok(FieldDef {
            name,
            optional: true,
            action: FieldAction::Discard(reader(&tag.type_desc())?),
        })
    }
}

fn missing_field(tag: &str, meta: &ClassMeta) -> crate::Error {
    ErrorKind::MissingRequiredField {
        field: tag.to_string(),
        class: meta.name.to_string(),
    }
    .into()
}
