//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for [`wz_node::error::Error`]
    #[error(transparent)]
    NodeError(#[from] wz_node::error::Error),

    /// data is not a valid img unit
    #[error("invalid img unit: {0}")]
    #[diagnostic(help("the file may be truncated or written by an incompatible tool"))]
    InvalidUnit(String),

    /// the body does not match the checksum stored in the header
    #[error("checksum mismatch: header has {expected:#010X}, body hashes to {actual:#010X}")]
    ChecksumMismatch {
        /// Checksum stored in the header
        expected: u32,
        /// Checksum of the decompressed body
        actual: u32,
    },

    /// a value does not fit the field the format stores it in
    #[error("{0} is too large to encode")]
    TooLarge(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
