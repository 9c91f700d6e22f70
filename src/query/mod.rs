//! This module contains the queries that can be asked of a decoded
//! [`Program`], from simple opcode counts to the full [`stats::Report`].
//!
//! All of the queries are pure functions of the program. The ones that need
//! the control-flow graph use the view cached in the program, so asking many
//! questions of one program only analyzes it once.

pub mod stats;

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    disassembly::{Instruction, Program},
    error::query,
    flow::loops::LoopDescriptor,
    opcode::{Category, Opcode},
};

/// Counts the instructions in `program` whose opcode is `opcode`.
///
/// Bytes in push immediates are not instructions, and are never counted.
#[must_use]
pub fn count_opcode(program: &Program, opcode: impl Into<Opcode>) -> usize {
    let opcode = opcode.into();
    program
        .instructions()
        .iter()
        .filter(|instruction| instruction.opcode() == opcode)
        .count()
}

/// Gets the number of instructions in `program`.
#[must_use]
pub fn instruction_count(program: &Program) -> usize {
    program.instructions().len()
}

/// Counts how often each opcode occurs in `program`.
///
/// The counts sum to [`instruction_count`].
#[must_use]
pub fn opcode_histogram(program: &Program) -> BTreeMap<Opcode, usize> {
    program
        .instructions()
        .iter()
        .map(Instruction::opcode)
        .counts()
        .into_iter()
        .collect()
}

/// Counts how many instructions of each [`Category`] occur in `program`.
#[must_use]
pub fn category_histogram(program: &Program) -> BTreeMap<Category, usize> {
    let set = program.instruction_set();
    program
        .instructions()
        .iter()
        .map(|instruction| set.category(instruction.opcode()))
        .counts()
        .into_iter()
        .collect()
}

/// Gets the loops in `program`, ordered by the offset of the jump that closes
/// each of them.
#[must_use]
pub fn loops(program: &Program) -> Vec<LoopDescriptor> {
    program.control_flow().loops()
}

/// Gets the instruction that starts at `offset` in `program`.
///
/// # Errors
///
/// If `offset` is inside the immediate data of another instruction, or is
/// beyond the end of the program.
pub fn instruction_at(program: &Program, offset: u32) -> query::Result<&Instruction> {
    let index = program.index_of(offset)?;
    Ok(&program.instructions()[index])
}
