use crate::object::{ClassMeta, FieldMeta};
use crate::rough_type::RoughType;
use crate::type_desc::TypeDesc;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Checks whether data written with `previous` can be read by a program using `next`:
/// * Adding fields is allowed if they are optional.
/// * Removing fields is allowed only if unknown fields are ignored by the reader.
/// * Changing a field type is allowed only if the old wire tag is accepted by the new type.
/// * Enums are encoded by position, new variants may only be appended.
///
/// Nested records referenced by both versions are checked the same way.
pub fn is_backwards_compatible(
    previous: &ClassMeta,
    next: &ClassMeta,
    ignore_unknown_fields: bool,
) -> bool {
    let mut visited = HashSet::new();
    is_class_compatible(previous, next, ignore_unknown_fields, &mut visited)
}

fn is_class_compatible(
    previous: &ClassMeta,
    next: &ClassMeta,
    ignore_unknown_fields: bool,
    visited: &mut HashSet<&'static str>,
) -> bool {
    if !visited.insert(next.name) {
        return true;
    }
    if previous.compact != next.compact {
        return false;
    }
    let theirs = &previous.fields;
    let ours = &next.fields;
    let (mut our_idx, mut their_idx) = (0, 0);
    while our_idx < ours.len() && their_idx < theirs.len() {
        let (our, their) = (&ours[our_idx], &theirs[their_idx]);
        match our.tag.cmp(their.tag) {
            Ordering::Less => {
                if !our.optional {
                    return false;
                }
                our_idx += 1;
            }
            Ordering::Greater => {
                if !ignore_unknown_fields {
                    return false;
                }
                their_idx += 1;
            }
            Ordering::Equal => {
                if !is_field_compatible(their, our, ignore_unknown_fields, visited) {
                    return false;
                }
                our_idx += 1;
                their_idx += 1;
            }
        }
    }
    if ours[our_idx..].iter().any(|f| !f.optional) {
        return false;
    }
    their_idx == theirs.len() || ignore_unknown_fields
}

fn is_field_compatible(
    previous: &FieldMeta,
    next: &FieldMeta,
    ignore_unknown_fields: bool,
    visited: &mut HashSet<&'static str>,
) -> bool {
    RoughType::of(&previous.ty).accepts(&next.ty)
        && is_type_compatible(&previous.ty, &next.ty, ignore_unknown_fields, visited)
}

fn is_type_compatible(
    previous: &TypeDesc,
    next: &TypeDesc,
    ignore_unknown_fields: bool,
    visited: &mut HashSet<&'static str>,
) -> bool {
    match (previous, next) {
        (TypeDesc::Enum(prev_enum), TypeDesc::Enum(next_enum)) => {
            prev_enum.variants.len() <= next_enum.variants.len()
        }
        (TypeDesc::Record(prev_rec), TypeDesc::Record(next_rec)) => {
            if prev_rec.name != next_rec.name {
                return false;
            }
            is_class_compatible(
                (prev_rec.meta)(),
                (next_rec.meta)(),
                ignore_unknown_fields,
                visited,
            )
        }
        (
            TypeDesc::Array(prev_e) | TypeDesc::List(prev_e) | TypeDesc::Collection(prev_e),
            TypeDesc::Array(next_e) | TypeDesc::List(next_e) | TypeDesc::Collection(next_e),
        ) => is_type_compatible(prev_e, next_e, ignore_unknown_fields, visited),
        (TypeDesc::Map(prev_k, prev_v), TypeDesc::Map(next_k, next_v)) => {
            is_type_compatible(prev_k, next_k, ignore_unknown_fields, visited)
                && is_type_compatible(prev_v, next_v, ignore_unknown_fields, visited)
        }
        _ => true,
    }
}
