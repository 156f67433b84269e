use shale_base::ValueError;
use std::fmt::{Display, Formatter};
use std::string::FromUtf8Error;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Decode or encode failure, optionally tagged with the stream offset where it happened.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    position: Option<u64>,
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("Bad class id: {0}")]
    BadClassId(i16),

    #[error("Missing required field {field} for class {class}")]
    MissingRequiredField { field: String, class: String },

    #[error("New field {field} for class {class}")]
    UnknownFieldRejected { field: String, class: String },

    #[error("Incompatible type {found} for field {field} of class {class}, expected {expected}")]
    IncompatibleFieldType {
        field: String,
        class: String,
        found: String,
        expected: String,
    },

    #[error("Incompatible type {found}, expected {expected}")]
    IncompatibleType { found: String, expected: String },

    #[error("Unknown rough type {0}")]
    UnknownRoughType(u8),

    #[error("Unsupported type {0}")]
    UnsupportedType(String),

    #[error("Unable to merge field of type {0}")]
    UnmergeableField(String),

    #[error("Class {0} is not registered")]
    UnknownClass(String),

    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("Unable to read null into {0}")]
    NullObject(String),

    #[error("Expected field {expected} ({field}), but found {found}")]
    UnexpectedFieldSlot {
        expected: i16,
        field: String,
        found: i16,
    },

    #[error("Unfinished object, expected zero, but got {0}")]
    UnfinishedObject(i16),

    #[error("Invalid bool encoding: {0}")]
    InvalidBool(u8),

    #[error("Invalid char lead: {0}")]
    InvalidChar(u8),

    #[error(transparent)]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("Invalid length: {0}")]
    InvalidLength(i64),

    #[error("Nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("More than {} classes in one stream", i16::MAX)]
    TooManyClasses,

    #[error("Options: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Offset of the failure, only set when position reporting is enabled.
    ///
    /// Counted from where the failing call started reading, so for the second of two values
    /// read from one stream it is relative to the start of that value.
    pub fn position(&self) -> Option<u64> {
        self.position
    }

    pub(crate) fn at(mut self, position: u64) -> Self {
        self.position.get_or_insert(position);
        self
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} at position {}", self.kind, position),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            position: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        ErrorKind::Io(e).into()
    }
}

impl From<ValueError> for Error {
    fn from(e: ValueError) -> Self {
        ErrorKind::Value(e).into()
    }
}

impl From<FromUtf8Error> for Error {
    fn from(e: FromUtf8Error) -> Self {
        ErrorKind::InvalidUtf8(e).into()
    }
}
