//! Defines error types.
//!
//! Every failure of the bridge is a synchronous, recoverable programmer error raised at the
//! offending constructor call or property write. Script runtimes convert an [`Error`] into
//! a catchable script exception with [`Error::to_exception`].

/// The error type for bridge operations.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<uuid::Error>,
    message: String,
}

impl Error {
    pub(crate) fn new<S: ToString>(kind: ErrorKind, source: Option<uuid::Error>, message: S) -> Self {
        Error {
            kind,
            source,
            message: message.to_string(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Converts this error into the exception value thrown into the calling script context.
    pub fn to_exception(&self) -> ScriptException {
        ScriptException {
            name: self.kind.exception_name(),
            message: self.to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", &self.kind)
        } else {
            write!(f, "{}: {}", &self.kind, &self.message)
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|x| {
            let x: &(dyn std::error::Error + 'static) = x;
            x
        })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            source: None,
            message: String::new(),
        }
    }
}

/// A list of general categories of bridge error.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// the value cannot be canonicalized into a Bluetooth UUID
    InvalidIdentifier,
    /// the value does not satisfy the required capability
    InvalidCapability,
    /// the handle is attached to a peripheral and cannot be rebound or mutated
    IllegalRebind,
    /// the same handle appears more than once in a sequence
    DuplicateHandle,
    /// the property is read-only
    ReadOnlyProperty,
    /// no such property
    UnknownProperty,
    /// no such script class
    UnknownClass,
    /// invalid parameter
    InvalidParameter,
}

impl ErrorKind {
    /// The name of the script-level exception raised for this kind of error.
    pub fn exception_name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidIdentifier => "InvalidIdentifier",
            ErrorKind::InvalidCapability => "InvalidCapability",
            ErrorKind::IllegalRebind => "IllegalRebind",
            ErrorKind::DuplicateHandle => "DuplicateHandle",
            ErrorKind::ReadOnlyProperty => "ReadOnlyProperty",
            ErrorKind::UnknownProperty => "UnknownProperty",
            ErrorKind::UnknownClass => "UnknownClass",
            ErrorKind::InvalidParameter => "TypeError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidIdentifier => f.write_str("invalid Bluetooth UUID"),
            ErrorKind::InvalidCapability => {
                f.write_str("value does not satisfy the required capability")
            }
            ErrorKind::IllegalRebind => f.write_str("the handle is attached to a peripheral"),
            ErrorKind::DuplicateHandle => f.write_str("duplicate handle in sequence"),
            ErrorKind::ReadOnlyProperty => f.write_str("property is read-only"),
            ErrorKind::UnknownProperty => f.write_str("no such property"),
            ErrorKind::UnknownClass => f.write_str("no such class"),
            ErrorKind::InvalidParameter => f.write_str("invalid parameter"),
        }
    }
}

/// A script-level exception carrying a bridge [`Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptException {
    /// Exception class name, see [`ErrorKind::exception_name`].
    pub name: &'static str,
    /// Human readable message.
    pub message: String,
}

impl std::fmt::Display for ScriptException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for ScriptException {}

impl From<Error> for ScriptException {
    fn from(err: Error) -> Self {
        err.to_exception()
    }
}
