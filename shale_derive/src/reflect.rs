use crate::attrs::{container_attrs, field_attrs};
use proc_macro2::{Literal, TokenStream};
use proc_macro_error::abort;
use quote::quote;
use std::collections::HashSet;
use syn::spanned::Spanned;
use syn::{Attribute, DataEnum, DataStruct, Fields, Ident, Index, Member};

pub fn process_struct(ident: &Ident, attrs: &[Attribute], ds: DataStruct) -> TokenStream {
    let container = container_attrs(attrs);
    let name = container.name.unwrap_or_else(|| ident.to_string());
    let kind = if container.value_type {
        quote!(shale_base::RecordKind::Struct)
    } else {
        quote!(shale_base::RecordKind::Class)
    };
    let compact = container.compact;

    let mut field_metas = Vec::new();
    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();
    let mut merge_arms = Vec::new();
    let mut object_arms = Vec::new();
    let mut tags = HashSet::new();

    for (idx, f) in ds.fields.iter().enumerate() {
        let fa = field_attrs(&f.attrs);
        if fa.skip {
            continue;
        }
        let member = match &f.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(idx)),
        };
        let tag = match (&fa.rename, &f.ident) {
            (Some(rename), _) => rename.clone(),
            (None, Some(ident)) => ident.to_string(),
            (None, None) => idx.to_string(),
        };
        if !tags.insert(tag.clone()) {
            abort!(f.span(), "Duplicate field tag \"{}\"", tag);
        }
        let ty = &f.ty;
        let optional = fa.optional;
        let settable = !fa.merge;
        field_metas.push(quote!(
            shale_base::FieldMeta {
                tag: #tag,
                index: #idx,
                ty: <#ty as shale_base::Typed>::type_desc(),
                optional: #optional,
                settable: #settable,
            }
        ));
        get_arms.push(quote!(
            #idx => shale_base::Typed::to_value(&self.#member),
        ));
        if settable {
            set_arms.push(quote!(
                #idx => {
                    self.#member = shale_base::Typed::from_value(value)?;
                    Ok(())
                }
            ));
        }
        merge_arms.push(quote!(
            #idx => shale_base::Typed::merge_value(&mut self.#member, value),
        ));
        object_arms.push(quote!(
            #idx => shale_base::Typed::as_object_mut(&mut self.#member),
        ));
    }

    let hooks = container.after_deserialization.iter().map(|hook| {
        quote!(
            .after_deserialization(|obj: &mut dyn shale_base::Object| {
                if let Some(this) = obj.as_any_mut().downcast_mut::<Self>() {
                    this.#hook();
                }
            })
        )
    });
    let actions = container.actions.iter().map(|action| {
        let action_name = action.to_string();
        quote!(
            .method(shale_base::MethodMeta {
                name: #action_name,
                arg: shale_base::action_arg(Self::#action),
                invoke: |obj: &mut dyn shale_base::Object, value: shale_base::Value| {
                    let this = obj
                        .as_any_mut()
                        .downcast_mut::<Self>()
                        .ok_or(shale_base::ValueError::WrongTarget(#name))?;
                    this.#action(shale_base::Typed::from_value(value)?);
                    Ok(())
                },
            })
        )
    });

    quote!(
        impl shale_base::Object for #ident {
            fn class_meta(&self) -> &'static shale_base::ClassMeta {
                <Self as shale_base::Reflect>::meta()
            }

            fn get_field(&self, index: usize) -> shale_base::Value {
                match index {
                    #(#get_arms)*
                    _ => shale_base::Value::Null,
                }
            }

            fn set_field(
                &mut self,
                index: usize,
                value: shale_base::Value,
            ) -> Result<(), shale_base::ValueError> {
                match index {
                    #(#set_arms)*
                    _ => Err(shale_base::ValueError::NoSuchField { class: #name, index }),
                }
            }

            fn merge_field(
                &mut self,
                index: usize,
                value: shale_base::Value,
            ) -> Result<(), shale_base::ValueError> {
                match index {
                    #(#merge_arms)*
                    _ => Err(shale_base::ValueError::NoSuchField { class: #name, index }),
                }
            }

            fn field_object_mut(&mut self, index: usize) -> Option<&mut dyn shale_base::Object> {
                match index {
                    #(#object_arms)*
                    _ => None,
                }
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::core::any::Any> {
                self
            }
        }

        impl shale_base::Reflect for #ident {
            const WIRE_NAME: &'static str = #name;

            fn meta() -> &'static shale_base::ClassMeta {
                static META: ::std::sync::OnceLock<shale_base::ClassMeta> =
                    ::std::sync::OnceLock::new();
                META.get_or_init(|| {
                    shale_base::ClassMeta::builder(
                        #name,
                        #kind,
                        shale_base::construct::<Self>,
                    )
                    .compact(#compact)
                    #(.field(#field_metas))*
                    #(#hooks)*
                    #(#actions)*
                    .build()
                })
            }
        }

        impl shale_base::Typed for #ident {
            fn type_desc() -> shale_base::TypeDesc {
                shale_base::TypeDesc::Record(shale_base::RecordRef::of::<Self>())
            }

            fn to_value(&self) -> shale_base::Value {
                shale_base::Value::Record(Box::new(::core::clone::Clone::clone(self)))
            }

            fn from_value(value: shale_base::Value) -> Result<Self, shale_base::ValueError> {
                shale_base::record_from_value::<Self>(value)
            }

            fn as_object_mut(&mut self) -> Option<&mut dyn shale_base::Object> {
                Some(self)
            }
        }

        impl shale_base::Nullable for #ident {}
    )
}

pub fn process_enum(ident: &Ident, attrs: &[Attribute], de: DataEnum) -> TokenStream {
    let container = container_attrs(attrs);
    let name = container.name.unwrap_or_else(|| ident.to_string());
    if de.variants.is_empty() {
        abort!(ident.span(), "Empty enums are not supported");
    }

    let mut variant_idents = Vec::new();
    let mut variant_names = Vec::new();
    let mut positions = Vec::new();
    for (idx, variant) in de.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            abort!(variant.span(), "Only unit variants are supported");
        }
        variant_idents.push(variant.ident.clone());
        variant_names.push(variant.ident.to_string());
        positions.push(Literal::i32_unsuffixed(idx as i32));
    }

    quote!(
        impl shale_base::Typed for #ident {
            fn type_desc() -> shale_base::TypeDesc {
                shale_base::TypeDesc::Enum(shale_base::EnumRef {
                    name: #name,
                    variants: &[#(#variant_names),*],
                })
            }

            fn to_value(&self) -> shale_base::Value {
                shale_base::Value::I32(match self {
                    #(Self::#variant_idents => #positions,)*
                })
            }

            fn from_value(value: shale_base::Value) -> Result<Self, shale_base::ValueError> {
                match value {
                    shale_base::Value::I32(position) => match position {
                        #(#positions => Ok(Self::#variant_idents),)*
                        _ => Err(shale_base::ValueError::EnumOutOfRange {
                            name: #name,
                            value: position,
                        }),
                    },
                    other => Err(shale_base::ValueError::mismatch(#name, &other)),
                }
            }
        }
    )
}
