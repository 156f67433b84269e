pub mod date_time;
pub mod error;
pub mod evolution_check;
pub mod object;
pub mod registry;
pub mod rough_type;
pub mod type_desc;
pub mod typed;
pub mod value;

pub use error::ValueError;
pub use evolution_check::is_backwards_compatible;
pub use object::{
    action_arg, construct, record_from_value, ActionFn, ClassMeta, ClassMetaBuilder, FieldMeta,
    MethodMeta, Object, RecordKind,
};
pub use registry::TypeRegistry;
pub use rough_type::RoughType;
pub use type_desc::{EnumRef, RecordRef, TypeDesc};
pub use typed::{Action, Nullable, Typed};
pub use value::{ActionRef, Value};

/// Implemented by `#[derive(Reflect)]` for every record type.
///
/// The descriptor table is built once on first use and lives for the rest of the process.
pub trait Reflect: Object + Clone + Default {
    /// Name written into the stream when the schema of this type is defined.
    const WIRE_NAME: &'static str;

    fn meta() -> &'static ClassMeta;

    fn reflect(to: &mut TypeRegistry) {
        to.register_meta(Self::meta());
    }
}
