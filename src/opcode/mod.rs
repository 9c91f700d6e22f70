//! This module contains the [`Opcode`] type, the classification of opcodes
//! into the classes that matter for control flow, and the per-revision lookup
//! [`table::InstructionSet`] that resolves a byte into its meaning.
//!
//! # Classes, not Constants
//!
//! The decoder and the control-flow analysis never match on raw byte values.
//! Instead they ask the instruction set which [`class::OpcodeClass`] a byte
//! belongs to, which keeps the algorithms independent of the instruction-set
//! revision in use.

pub mod class;
pub mod table;
pub mod util;

use serde::Serialize;

use crate::constant::{PUSH_OPCODE_BASE_VALUE, PUSH_OPCODE_HIGH_VALUE, PUSH_OPCODE_LOW_VALUE};

/// A single opcode byte.
///
/// The opcode itself carries no meaning beyond its value. Its mnemonic and
/// class depend on the [`table::InstructionSet`] it is interpreted with.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Opcode(u8);

impl Opcode {
    /// Wraps the provided `byte` as an opcode.
    #[must_use]
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    /// Gets the byte representation of the opcode.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Checks if the opcode is one of `PUSH1..=PUSH32`, the opcodes that are
    /// followed by immediate data.
    #[must_use]
    pub const fn is_push(self) -> bool {
        self.0 >= PUSH_OPCODE_LOW_VALUE && self.0 <= PUSH_OPCODE_HIGH_VALUE
    }

    /// Gets the number of immediate bytes that follow the opcode in the
    /// bytecode.
    #[must_use]
    pub const fn immediate_size(self) -> u8 {
        if self.is_push() {
            self.0 - PUSH_OPCODE_BASE_VALUE
        } else {
            0
        }
    }

    /// Gets the byte encoding of the opcode on its own.
    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        vec![self.0]
    }
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        value.0
    }
}

impl std::fmt::LowerHex for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::LowerHex::fmt(&self.0, f)
    }
}

/// The broad group that an opcode belongs to, used when reporting opcode
/// frequencies by category.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Category {
    /// Arithmetic on words (`ADD`, `MULMOD`, `EXP`, ...).
    Arithmetic,

    /// Comparisons and bitwise logic (`LT`, `ISZERO`, `SHR`, ...).
    Logic,

    /// Queries of, and effects on, the execution environment (`CALLER`,
    /// `KECCAK256`, `LOG2`, `CREATE`, ...).
    Environment,

    /// Memory, storage and stack manipulation (`MSTORE`, `SLOAD`, `PUSH1`,
    /// `DUP2`, `SWAP1`, `POP`, ...).
    Memory,

    /// Control flow, calls and halting (`JUMP`, `JUMPDEST`, `CALL`, `RETURN`,
    /// ...).
    Control,

    /// Bytes that have no opcode assigned in the instruction set.
    Undefined,
}
