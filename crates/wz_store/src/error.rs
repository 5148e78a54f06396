//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;
use wz_node::NodeKind;

/// Boxed error of a codec implementation
pub type CodecSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`walkdir::Error`]
    #[error(transparent)]
    WalkError(#[from] walkdir::Error),

    /// no category, unit or node exists under the given name
    #[error("not found: {0}")]
    NotFound(String),

    /// the node exists but is not of the expected kind
    #[error("expected {expected} at '{path}', found {found}")]
    TypeMismatch {
        /// Path of the offending node
        path: String,
        /// Kind the operation needed
        expected: &'static str,
        /// Kind that was actually present
        found: NodeKind,
    },

    /// a link could not be followed to an existing node
    #[error("link at '{path}' is broken: {reason}")]
    BrokenLink {
        /// Path of the link node
        path: String,
        /// Why the link could not be followed
        reason: String,
    },

    /// a unit, bitmap or audio payload could not be decoded or encoded
    #[error("codec error for {context}")]
    CodecError {
        /// What was being decoded or encoded
        context: String,
        #[source]
        source: CodecSource,
    },

    /// a unit could not be written back to its source
    #[error("unable to persist {unit}")]
    #[diagnostic(help("check that the archive directory is writable"))]
    PersistenceError {
        /// The unit being saved
        unit: String,
        #[source]
        source: std::io::Error,
    },

    /// {0}
    #[error("{0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn codec(context: impl Into<String>, source: impl Into<CodecSource>) -> Self {
        Error::CodecError {
            context: context.into(),
            source: source.into(),
        }
    }
}

impl From<wz_node::error::Error> for Error {
    fn from(value: wz_node::error::Error) -> Self {
        use wz_node::error::Error as NodeError;

        match value {
            NodeError::NotFound(path) => Error::NotFound(path),
            NodeError::TypeMismatch {
                path,
                expected,
                found,
            } => Error::TypeMismatch {
                path,
                expected,
                found,
            },
            NodeError::DuplicateName { parent, name } => Error::InvalidArgument(format!(
                "a child named '{name}' already exists under '{parent}'"
            )),
            NodeError::InvalidArgument(message) => Error::InvalidArgument(message),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
