//! This module contains the decoder for turning a stream of bytes into a
//! sequence of [`Instruction`]s.
//!
//! # Implementation Note
//!
//! The decoder is a single forward pass. The only thing that makes it more
//! than a byte-to-opcode mapping is that push-class opcodes swallow the bytes
//! that follow them, so a byte's meaning depends on everything before it.

use crate::{
    disassembly::{reader::check_addressable, Instruction},
    error::{
        container::Locatable,
        disassembly::{Error, Result},
    },
    opcode::{class::OpcodeClass, table::InstructionSet, Opcode},
};

/// Disassembles the input `bytes` into the ordered sequence of
/// [`Instruction`]s that they encode, interpreting opcodes with `set`.
///
/// Every byte is accounted for by exactly one instruction, either as its
/// opcode or as part of its immediate.
///
/// # Truncated Immediates
///
/// Compilers emit code that ends part way through the immediate of a push,
/// usually because metadata that is never executed follows the code. Rather
/// than failing, the final instruction takes the bytes that remain and is
/// marked as truncated (see [`Instruction::is_truncated`]). The EVM reads the
/// missing bytes as zero at runtime.
///
/// # Unknown Opcodes
///
/// Bytes that the instruction set does not define are decoded as single-byte
/// instructions, as they occupy one byte in the stream whatever they mean.
///
/// # Errors
///
/// When `bytes` is too large to address with [`u32`] offsets.
pub fn disassemble(bytes: &[u8], set: &InstructionSet) -> Result<Vec<Instruction>> {
    check_addressable(bytes.len())?;

    let mut instructions = Vec::with_capacity(bytes.len());
    let mut cursor = 0;

    while cursor < bytes.len() {
        let offset = u32::try_from(cursor).map_err(|_| Error::BytecodeTooLarge.locate(u32::MAX))?;
        let opcode = Opcode::new(bytes[cursor]);
        let declared = match set.class(opcode) {
            OpcodeClass::Push { immediate_size } => immediate_size,
            _ => 0,
        };

        let immediate_start = cursor + 1;
        let immediate_end = usize::min(immediate_start + usize::from(declared), bytes.len());
        let immediate = bytes[immediate_start..immediate_end].to_vec();

        if immediate.len() < usize::from(declared) {
            tracing::warn!(
                offset,
                declared,
                available = immediate.len(),
                "push immediate truncated by end of code"
            );
        }

        instructions.push(Instruction::new(offset, opcode, immediate, declared));
        cursor = immediate_end;
    }

    tracing::debug!(
        bytes = bytes.len(),
        instructions = instructions.len(),
        "disassembled bytecode"
    );

    Ok(instructions)
}
