//! This module contains the primary error type for the analyzer's interface.
//! It also re-exports the more specific error types that are
//! subsystem-specific.

pub mod container;
pub mod disassembly;
pub mod query;

use thiserror::Error;

/// The interface result type for the library.
///
/// # Usage
///
/// Any function considered to be part of the public interface of the library
/// should return this result type. Subsystems should return the more-specific
/// child error types as appropriate.
pub type Result<T> = std::result::Result<T, Error>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by the
/// clients of the library) should be members of this enum.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Errors that come from reading or decoding the bytecode.
    #[error(transparent)]
    Disassembly(#[from] disassembly::LocatedError),

    /// Errors from querying a decoded program.
    #[error(transparent)]
    Query(#[from] query::Error),

    /// A contract could not be loaded from a file.
    #[error("Could not load contract from {path}: {reason}")]
    ContractFile { path: String, reason: String },

    /// An unknown error, represented as a string.
    #[error("Unknown Error: {_0:?}")]
    Other(String),
}

impl Error {
    /// Constructs an unknown error with the provided `message`.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Checks if this error was caused by malformed hexadecimal input.
    #[must_use]
    pub fn is_malformed_hex(&self) -> bool {
        matches!(self, Self::Disassembly(e) if e.payload.is_malformed_hex())
    }
}
