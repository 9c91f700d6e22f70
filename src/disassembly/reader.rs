//! This module contains the reader that normalises the supported input forms
//! into a canonical sequence of bytes.

use hex::FromHexError;

use crate::{
    constant::PROGRAM_MAX_SIZE,
    error::{
        container::Locatable,
        disassembly::{Error, Result},
    },
};

/// The forms of input from which a program can be read.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BytecodeInput<'a> {
    /// A hexadecimal string, with or without a leading `0x` or `0X`.
    Hex(&'a str),

    /// Raw bytes, used as they are.
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for BytecodeInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Hex(value)
    }
}

impl<'a> From<&'a String> for BytecodeInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Hex(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for BytecodeInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for BytecodeInput<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Self::Bytes(value.as_slice())
    }
}

/// Reads `input` into the byte sequence it represents.
///
/// Empty input, including a bare `0x`, yields an empty byte sequence rather
/// than an error.
///
/// # Errors
///
/// Returns [`Err`] if a hexadecimal `input` has an odd number of digits after
/// the prefix, contains a character outside `[0-9a-fA-F]`, or if the input is
/// too large to be addressed with [`u32`] offsets.
pub fn parse<'a>(input: impl Into<BytecodeInput<'a>>) -> Result<Vec<u8>> {
    match input.into() {
        BytecodeInput::Hex(text) => parse_hex(text),
        BytecodeInput::Bytes(bytes) => {
            check_addressable(bytes.len())?;
            Ok(bytes.to_vec())
        }
    }
}

/// Decodes the hexadecimal string `text`, stripping an optional `0x` or `0X`
/// prefix.
///
/// The locations attached to errors are indices into `text` as provided,
/// including the prefix.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let (prefix_len, digits) = match text.get(..2) {
        Some("0x" | "0X") => (2, &text[2..]),
        _ => (0, text),
    };

    let bytes = hex::decode(digits).map_err(|e| {
        let (error, index) = match e {
            FromHexError::InvalidHexCharacter { c, index } => {
                (Error::InvalidHexCharacter(c, index + prefix_len), index + prefix_len)
            }
            _ => (Error::InvalidHexLength, text.len()),
        };
        match u32::try_from(index) {
            Ok(location) => error.locate(location),
            Err(_) => Error::BytecodeTooLarge.locate(u32::MAX),
        }
    })?;

    check_addressable(bytes.len())?;
    Ok(bytes)
}

/// Checks that a program of `len` bytes can be addressed with [`u32`] offsets.
pub(crate) fn check_addressable(len: usize) -> Result<()> {
    if len > PROGRAM_MAX_SIZE {
        return Err(Error::BytecodeTooLarge.locate(u32::MAX));
    }
    Ok(())
}
