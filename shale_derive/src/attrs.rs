use proc_macro_error::abort;
use syn::{Attribute, Ident, LitStr};

#[derive(Default)]
pub struct ContainerAttrs {
    pub name: Option<String>,
    pub compact: bool,
    pub value_type: bool,
    pub after_deserialization: Vec<Ident>,
    pub actions: Vec<Ident>,
}

#[derive(Default)]
pub struct FieldAttrs {
    pub rename: Option<String>,
    pub optional: bool,
    pub merge: bool,
    pub skip: bool,
}

pub fn container_attrs(attrs: &[Attribute]) -> ContainerAttrs {
    let mut out = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("shale")) {
        let r = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let s: LitStr = meta.value()?.parse()?;
                out.name = Some(s.value());
            } else if meta.path.is_ident("compact") {
                out.compact = true;
            } else if meta.path.is_ident("value_type") {
                out.value_type = true;
            } else if meta.path.is_ident("after_deserialization") {
                let s: LitStr = meta.value()?.parse()?;
                out.after_deserialization.push(s.parse()?);
            } else if meta.path.is_ident("action") {
                let s: LitStr = meta.value()?.parse()?;
                out.actions.push(s.parse()?);
            } else {
                return Err(meta.error("unknown shale container attribute"));
            }
            Ok(())
        });
        if let Err(e) = r {
            abort!(e.span(), "{}", e);
        }
    }
    out
}

pub fn field_attrs(attrs: &[Attribute]) -> FieldAttrs {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("shale")) {
        let r = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let s: LitStr = meta.value()?.parse()?;
                out.rename = Some(s.value());
            } else if meta.path.is_ident("optional") {
                out.optional = true;
            } else if meta.path.is_ident("merge") {
                out.merge = true;
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else {
                return Err(meta.error("unknown shale field attribute"));
            }
            Ok(())
        });
        if let Err(e) = r {
            abort!(e.span(), "{}", e);
        }
    }
    out
}
