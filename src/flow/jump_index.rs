//! This module contains the index of the offsets in a program that are legal
//! targets for a jump.

use bitvec::prelude::{BitVec, Lsb0};
use serde::{Serialize, Serializer};

use crate::{
    disassembly::Instruction,
    opcode::{class::OpcodeClass, table::InstructionSet},
};

/// The set of offsets in a program that hold a genuine jump marker.
///
/// The set stores one bit per byte of code, so lookups are constant time and
/// iteration yields offsets in ascending order.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct JumpDestinationSet {
    bits: BitVec<usize, Lsb0>,
}

impl JumpDestinationSet {
    /// Checks if `offset` is a valid jump destination.
    ///
    /// Offsets beyond the end of the program are never valid.
    #[must_use]
    pub fn contains(&self, offset: u32) -> bool {
        self.bits.get(offset as usize).map_or(false, |bit| *bit)
    }

    /// Iterates over the valid jump destinations in ascending order.
    #[allow(clippy::cast_possible_truncation)] // Programs are addressable with u32
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter_ones().map(|offset| offset as u32)
    }

    /// Gets the number of valid jump destinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    /// Checks if the program has no valid jump destinations at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }
}

impl Serialize for JumpDestinationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Builds the set of valid jump destinations from the decoded `instructions`.
///
/// An offset is a member exactly when an instruction starts there and its
/// opcode is the jump marker under `set`. Bytes inside push immediates never
/// start an instruction, so a marker value in push data is never a member.
#[must_use]
pub fn build_jump_index(instructions: &[Instruction], set: &InstructionSet) -> JumpDestinationSet {
    let code_len = instructions.last().map_or(0, |last| last.end() as usize);
    let mut bits = BitVec::repeat(false, code_len);

    for instruction in instructions {
        if set.class(instruction.opcode()) == OpcodeClass::JumpMarker {
            bits.set(instruction.offset() as usize, true);
        }
    }

    let destinations = JumpDestinationSet { bits };
    tracing::debug!(count = destinations.len(), "indexed jump destinations");

    destinations
}
