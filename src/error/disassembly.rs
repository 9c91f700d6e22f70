//! This module contains the error type that pertains to reading and decoding
//! bytecode.

use thiserror::Error;

use crate::error::container;

/// Errors that occur while turning input into a [`crate::disassembly::Program`].
///
/// A truncated trailing push immediate is deliberately _not_ an error here.
/// The decoder keeps the bytes that are available and marks the instruction
/// via [`crate::disassembly::Instruction::is_truncated`].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("The provided hexadecimal input had an odd length")]
    InvalidHexLength,

    #[error("Encountered invalid hex char {_0:?} at index {_1:?}")]
    InvalidHexCharacter(char, usize),

    #[error("The length of the bytecode exceeded {}", u32::MAX)]
    BytecodeTooLarge,

    #[error("Invalid size {_0:?} provided to the `PUSH` opcode")]
    InvalidPushSize(usize),

    #[error("The bytecode is {size} bytes long, exceeding the limit of {limit} bytes")]
    CodeTooLarge { size: usize, limit: usize },
}

impl Error {
    /// Checks if the error reports malformed hexadecimal input, as opposed to
    /// a size violation.
    #[must_use]
    pub fn is_malformed_hex(&self) -> bool {
        matches!(self, Self::InvalidHexLength | Self::InvalidHexCharacter(..))
    }
}

/// A disassembly error with an associated location in the input.
pub type LocatedError = container::Located<Error>;

/// The result type for functions that may return disassembly errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, offset: u32) -> Self::Located {
        container::Located {
            location: offset,
            payload:  self,
        }
    }
}
