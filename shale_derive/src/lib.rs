mod attrs;
mod reflect;

use proc_macro::TokenStream;
use proc_macro_error::{abort, proc_macro_error};
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput};

/// Generates the descriptor table of a record type (`Object`, `Reflect` and `Typed` impls), or
/// the `Typed` impl of a unit-only enum.
///
/// Container attributes: `#[shale(name = "..", compact, value_type,
/// after_deserialization = "method", action = "method")]`.
/// Field attributes: `#[shale(optional, merge, rename = "..", skip)]`.
#[proc_macro_derive(Reflect, attributes(shale))]
#[proc_macro_error]
pub fn reflect_fn(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    if input.generics.lt_token.is_some() {
        abort!(input.generics.span(), "Generics are not supported");
    }

    let ts = match input.data {
        Data::Struct(ds) => reflect::process_struct(&input.ident, &input.attrs, ds),
        Data::Enum(de) => reflect::process_enum(&input.ident, &input.attrs, de),
        Data::Union(_) => {
            abort!(input.ident.span(), "Unions are not supported");
        }
    };
    ts.into()
}
