use std::fmt::Formatter;

use thiserror::Error;

/// An error that is localised to a particular location in the input.
///
/// For errors arising while decoding a program the location is a byte offset
/// into the bytecode. For errors arising while reading a hex string it is the
/// index of the offending character in that string.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Located<E>
where
    E: Clone,
{
    /// The offset in the input where the error occurred.
    pub location: u32,

    /// The error data
    pub payload: E,
}

/// Displays the error associated with the hexadecimal-encoded offset in the
/// input where the error occurred.
impl<E> std::fmt::Display for Located<E>
where
    E: std::fmt::Display + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:#06x}]: {}", self.location, self.payload)
    }
}

/// A trait for types that can have an offset location attached to them.
pub trait Locatable
where
    Self: Sized,
{
    /// The return type with the attached location.
    type Located;

    /// Attach the location described by `offset` to the error.
    fn locate(self, offset: u32) -> Self::Located;
}

/// A blanket implementation that allows for attaching a location to any result.
impl<T, E> Locatable for Result<T, E>
where
    E: std::error::Error + Clone,
{
    type Located = Result<T, Located<E>>;

    fn locate(self, offset: u32) -> Self::Located {
        self.map_err(|e| Located {
            location: offset,
            payload:  e,
        })
    }
}
