//! This module contains constants that are needed throughout the codebase.

/// The maximum size that a contract can have when being deployed on the
/// blockchain.
///
/// This is specified in [EIP-170](https://eips.ethereum.org/EIPS/eip-170).
pub const CONTRACT_MAXIMUM_SIZE_BYTES: usize = 24_576;

/// The maximum size of a program that can be decoded, in bytes.
///
/// Offsets into the bytecode are represented as [`u32`], so anything larger
/// cannot be addressed.
pub const PROGRAM_MAX_SIZE: usize = u32::MAX as usize;

/// The base byte value for the `PUSH` opcode, for `N > 0`.
///
/// This is constructed such that for `PUSHN`, `PUSH_OPCODE_BASE_VALUE` + `N`
/// equals the byte value for the corresponding `PUSH` opcode.
pub const PUSH_OPCODE_BASE_VALUE: u8 = 0x5f;

/// The byte value of the lowest push-class opcode, `PUSH1`.
pub const PUSH_OPCODE_LOW_VALUE: u8 = PUSH_OPCODE_BASE_VALUE + 1;

/// The byte value of the highest push-class opcode, `PUSH32`.
pub const PUSH_OPCODE_HIGH_VALUE: u8 = PUSH_OPCODE_BASE_VALUE + PUSH_OPCODE_MAX_BYTES;

/// The maximum number of bytes that can be pushed at once using the `PUSH`
/// opcode.
pub const PUSH_OPCODE_MAX_BYTES: u8 = 32;

/// The base byte value for the `DUP` opcode.
///
/// This is constructed such that for `DUPN`, `DUP_OPCODE_BASE_VALUE` + `N`
/// equals the byte value for the corresponding `DUP` opcode.
pub const DUP_OPCODE_BASE_VALUE: u8 = 0x7f;

/// The base byte value for the `SWAP` opcode.
///
/// This is constructed such that for `SWAPN`, `SWAP_OPCODE_BASE_VALUE` + `N`
/// equals the byte value for the corresponding `SWAP` opcode.
pub const SWAP_OPCODE_BASE_VALUE: u8 = 0x8f;

/// The base byte value for the `LOG` opcode.
///
/// This is constructed such that for `LOGN`, `LOG_OPCODE_BASE_VALUE` + `N`
/// equals the byte value for the corresponding `LOG` opcode.
pub const LOG_OPCODE_BASE_VALUE: u8 = 0xa0;

/// The byte value of the `STOP` opcode.
pub const STOP: u8 = 0x00;

/// The byte value of the `JUMP` opcode.
pub const JUMP: u8 = 0x56;

/// The byte value of the `JUMPI` opcode.
pub const JUMPI: u8 = 0x57;

/// The byte value of the `JUMPDEST` opcode.
pub const JUMPDEST: u8 = 0x5b;

/// The byte value of the `PUSH0` opcode.
pub const PUSH0: u8 = 0x5f;

/// The byte value of the `RETURN` opcode.
pub const RETURN: u8 = 0xf3;

/// The byte value of the `REVERT` opcode.
pub const REVERT: u8 = 0xfd;

/// The byte value of the designated `INVALID` opcode.
pub const INVALID: u8 = 0xfe;

/// The byte value of the `SELFDESTRUCT` opcode.
pub const SELFDESTRUCT: u8 = 0xff;

/// The default length of the opcode sequences counted when producing a report.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 2;

/// The default number of most-frequent opcode sequences kept in a report.
pub const DEFAULT_SEQUENCE_TOP: usize = 10;
