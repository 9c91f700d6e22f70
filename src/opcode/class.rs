//! The classes into which opcodes are sorted for decoding and control-flow
//! analysis.

use serde::Serialize;

/// The role that an opcode plays in decoding and control flow.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum OpcodeClass {
    /// An opcode that is followed by `immediate_size` bytes of data that must
    /// not be interpreted as further opcodes.
    Push { immediate_size: u8 },

    /// The opcode that marks its own offset as a legal branch destination.
    JumpMarker,

    /// A transfer of control to the destination on top of the stack.
    UnconditionalJump,

    /// A transfer of control to the destination on top of the stack that only
    /// happens when the second stack item is non-zero.
    ConditionalJump,

    /// An opcode that ends execution of the current context.
    Halt,

    /// Any other defined opcode.
    Plain,

    /// A byte that has no opcode assigned to it.
    Undefined,
}

impl OpcodeClass {
    /// Gets the number of immediate bytes that follow an opcode of this class.
    #[must_use]
    pub fn immediate_size(self) -> usize {
        match self {
            Self::Push { immediate_size } => immediate_size as usize,
            _ => 0,
        }
    }

    /// Checks if the class is one that may redirect execution to a
    /// non-sequential offset.
    #[must_use]
    pub fn is_control_transfer(self) -> bool {
        matches!(self, Self::UnconditionalJump | Self::ConditionalJump)
    }

    /// Checks if the class is one that ends execution.
    #[must_use]
    pub fn is_halt(self) -> bool {
        matches!(self, Self::Halt)
    }

    /// Checks if the class is the push class.
    #[must_use]
    pub fn is_push(self) -> bool {
        matches!(self, Self::Push { .. })
    }
}
