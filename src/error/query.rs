//! This module contains the errors returned when querying a decoded program.

use thiserror::Error;

/// Errors that occur when looking up an instruction by its offset.
///
/// These are ordinary, recoverable results. Asking for an offset that is not
/// the start of an instruction is a normal question to ask of a program.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Offset {offset:#x} lies inside the immediate data of the instruction at {owner:#x}")]
    InsideImmediate { offset: u32, owner: u32 },

    #[error("Offset {offset:#x} is out of range for a program of {length} bytes")]
    OutOfRange { offset: u32, length: usize },
}

impl Error {
    /// Gets the offset that was requested.
    #[must_use]
    pub fn offset(&self) -> u32 {
        match self {
            Self::InsideImmediate { offset, .. } | Self::OutOfRange { offset, .. } => *offset,
        }
    }
}

/// The result type for functions that may return query errors.
pub type Result<T> = std::result::Result<T, Error>;
