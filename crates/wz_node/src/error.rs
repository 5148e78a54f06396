//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::node::NodeKind;

/// Error type for library
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum Error {
    /// no node exists at the requested path
    #[error("node not found at path '{0}'")]
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

    /// a child with this name already exists under the parent
    #[error("a child named '{name}' already exists under '{parent}'")]
    DuplicateName {
        /// Path of the parent node
        parent: String,
        /// The conflicting name
        name: String,
    },

    /// {0}
    #[error("{0}")]
    InvalidArgument(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
