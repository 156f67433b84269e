use thiserror::Error;

/// Failure to convert between a dynamic [`Value`](crate::Value) and a typed field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },

    #[error("null value for non-nullable {0}")]
    UnexpectedNull(String),

    #[error("{value} is not a variant of enum {name}")]
    EnumOutOfRange { name: &'static str, value: i32 },

    #[error("class {class} has no field #{index}")]
    NoSuchField { class: &'static str, index: usize },

    #[error("field #{index} of {class} cannot be merged")]
    Unmergeable { class: &'static str, index: usize },

    #[error("cannot merge into a null {0}")]
    MergeIntoNull(String),

    #[error("duplicate key in {0}")]
    DuplicateKey(String),

    #[error("action target is not a {0}")]
    WrongTarget(&'static str),

    #[error("{0} is out of range")]
    OutOfRange(String),
}

impl ValueError {
    pub fn mismatch(expected: impl ToString, found: &crate::Value) -> Self {
        ValueError::Mismatch {
            expected: expected.to_string(),
            found: found.kind_name().to_string(),
        }
    }
}
