//! Utilities for working with opcodes in tests and examples.

/// Constructs a bytecode input from anything that has an `encode` method
/// returning the bytes, such as [`crate::opcode::Opcode`] and
/// [`crate::disassembly::Instruction`].
///
/// # Usage
///
/// ```
/// use bytecode_flow_analyzer::{bytecode, disassembly::Instruction, opcode::Opcode};
///
/// let bytes = bytecode![
///     Instruction::push(vec![0x04u8]).unwrap(),
///     Opcode::new(0x56),
///     Opcode::new(0x00),
///     Opcode::new(0x5b),
/// ];
///
/// assert_eq!(bytes, vec![0x60, 0x04, 0x56, 0x00, 0x5b]);
/// ```
#[macro_export]
macro_rules! bytecode {
    ($($path:expr),*$(,)?) => {{
        let mut vec: Vec<u8> = vec![];
        $(vec.extend($path.encode()));*;
        vec
    }};
}
