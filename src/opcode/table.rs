//! This module contains the [`InstructionSet`], a lookup table that resolves
//! each of the 256 possible opcode bytes into its mnemonic, [`OpcodeClass`] and
//! [`Category`] for a given revision of the EVM.

use std::{borrow::Cow, sync::Arc};

use crate::{
    analyzer::chain::version::{ChainVersion, EthereumVersion},
    constant::{
        DUP_OPCODE_BASE_VALUE,
        INVALID,
        JUMP,
        JUMPDEST,
        JUMPI,
        LOG_OPCODE_BASE_VALUE,
        PUSH_OPCODE_BASE_VALUE,
        RETURN,
        REVERT,
        SELFDESTRUCT,
        STOP,
        SWAP_OPCODE_BASE_VALUE,
    },
    opcode::{class::OpcodeClass, Category, Opcode},
};

/// Everything the instruction set knows about a single opcode byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OpcodeInfo {
    /// The opcode being described.
    pub opcode: Opcode,

    /// The mnemonic of the opcode, or [`None`] if the byte is undefined.
    pub mnemonic: Option<&'static str>,

    /// The role the opcode plays in decoding and control flow.
    pub class: OpcodeClass,

    /// The broad group the opcode belongs to.
    pub category: Category,
}

/// A lookup table describing every opcode byte for one revision of the EVM.
///
/// Cloning the instruction set is cheap as the table itself is shared.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstructionSet {
    version: EthereumVersion,
    entries: Arc<[OpcodeInfo]>,
}

impl InstructionSet {
    /// Builds the instruction set that is in effect as of `version`.
    ///
    /// Opcodes that were introduced by a later fork are treated as undefined.
    #[must_use]
    pub fn for_version(version: EthereumVersion) -> Self {
        let entries = (0..=u8::MAX)
            .map(|byte| {
                let opcode = Opcode::new(byte);
                match describe(byte) {
                    Some((mnemonic, category, introduced)) if introduced <= version => OpcodeInfo {
                        opcode,
                        mnemonic: Some(mnemonic),
                        class: classify(opcode),
                        category,
                    },
                    _ => OpcodeInfo {
                        opcode,
                        mnemonic: None,
                        class: OpcodeClass::Undefined,
                        category: Category::Undefined,
                    },
                }
            })
            .collect();

        Self { version, entries }
    }

    /// Gets the revision that this instruction set describes.
    #[must_use]
    pub fn version(&self) -> EthereumVersion {
        self.version
    }

    /// Gets the full description of `opcode`.
    #[must_use]
    pub fn info(&self, opcode: impl Into<Opcode>) -> &OpcodeInfo {
        &self.entries[opcode.into().as_byte() as usize]
    }

    /// Gets the class of `opcode`.
    #[must_use]
    pub fn class(&self, opcode: impl Into<Opcode>) -> OpcodeClass {
        self.info(opcode).class
    }

    /// Gets the category of `opcode`.
    #[must_use]
    pub fn category(&self, opcode: impl Into<Opcode>) -> Category {
        self.info(opcode).category
    }

    /// Checks if `opcode` is assigned in this instruction set.
    #[must_use]
    pub fn is_defined(&self, opcode: impl Into<Opcode>) -> bool {
        self.info(opcode).mnemonic.is_some()
    }

    /// Gets a textual representation of `opcode`.
    ///
    /// Undefined bytes are rendered as `INVALID(0xNN)`.
    #[must_use]
    pub fn mnemonic(&self, opcode: impl Into<Opcode>) -> Cow<'static, str> {
        let info = self.info(opcode);
        match info.mnemonic {
            Some(mnemonic) => Cow::Borrowed(mnemonic),
            None => Cow::Owned(format!("INVALID({:#04x})", info.opcode)),
        }
    }

    /// Iterates over the descriptions of all 256 opcode bytes in order.
    pub fn iter(&self) -> impl Iterator<Item = &OpcodeInfo> {
        self.entries.iter()
    }
}

/// The default instruction set is the one for the latest Ethereum fork.
impl Default for InstructionSet {
    fn default() -> Self {
        Self::for_version(EthereumVersion::latest())
    }
}

/// Sorts a defined `opcode` into its class.
///
/// The push-class range is the same in every revision; `PUSH0` carries no
/// immediate and is therefore a plain opcode.
fn classify(opcode: Opcode) -> OpcodeClass {
    match opcode.as_byte() {
        _ if opcode.is_push() => OpcodeClass::Push {
            immediate_size: opcode.immediate_size(),
        },
        JUMPDEST => OpcodeClass::JumpMarker,
        JUMP => OpcodeClass::UnconditionalJump,
        JUMPI => OpcodeClass::ConditionalJump,
        STOP | RETURN | REVERT | INVALID | SELFDESTRUCT => OpcodeClass::Halt,
        _ => OpcodeClass::Plain,
    }
}

const PUSH_MNEMONICS: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
    "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
    "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
    "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

const DUP_MNEMONICS: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
    "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

const SWAP_MNEMONICS: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
    "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];

const LOG_MNEMONICS: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

/// Gets the mnemonic, category and introducing fork of `byte`, or [`None`] if
/// no fork assigns it.
#[allow(clippy::too_many_lines)] // Splitting the table up brings no benefit
fn describe(byte: u8) -> Option<(&'static str, Category, EthereumVersion)> {
    use Category::{Arithmetic, Control, Environment, Logic, Memory};
    use EthereumVersion::{
        Byzantium,
        Cancun,
        Constantinople,
        Frontier,
        Homestead,
        Istanbul,
        London,
        Shanghai,
    };

    let entry = match byte {
        0x00 => ("STOP", Control, Frontier),
        0x01 => ("ADD", Arithmetic, Frontier),
        0x02 => ("MUL", Arithmetic, Frontier),
        0x03 => ("SUB", Arithmetic, Frontier),
        0x04 => ("DIV", Arithmetic, Frontier),
        0x05 => ("SDIV", Arithmetic, Frontier),
        0x06 => ("MOD", Arithmetic, Frontier),
        0x07 => ("SMOD", Arithmetic, Frontier),
        0x08 => ("ADDMOD", Arithmetic, Frontier),
        0x09 => ("MULMOD", Arithmetic, Frontier),
        0x0a => ("EXP", Arithmetic, Frontier),
        0x0b => ("SIGNEXTEND", Arithmetic, Frontier),
        0x10 => ("LT", Logic, Frontier),
        0x11 => ("GT", Logic, Frontier),
        0x12 => ("SLT", Logic, Frontier),
        0x13 => ("SGT", Logic, Frontier),
        0x14 => ("EQ", Logic, Frontier),
        0x15 => ("ISZERO", Logic, Frontier),
        0x16 => ("AND", Logic, Frontier),
        0x17 => ("OR", Logic, Frontier),
        0x18 => ("XOR", Logic, Frontier),
        0x19 => ("NOT", Logic, Frontier),
        0x1a => ("BYTE", Logic, Frontier),
        0x1b => ("SHL", Logic, Constantinople),
        0x1c => ("SHR", Logic, Constantinople),
        0x1d => ("SAR", Logic, Constantinople),
        0x20 => ("KECCAK256", Environment, Frontier),
        0x30 => ("ADDRESS", Environment, Frontier),
        0x31 => ("BALANCE", Environment, Frontier),
        0x32 => ("ORIGIN", Environment, Frontier),
        0x33 => ("CALLER", Environment, Frontier),
        0x34 => ("CALLVALUE", Environment, Frontier),
        0x35 => ("CALLDATALOAD", Memory, Frontier),
        0x36 => ("CALLDATASIZE", Memory, Frontier),
        0x37 => ("CALLDATACOPY", Memory, Frontier),
        0x38 => ("CODESIZE", Memory, Frontier),
        0x39 => ("CODECOPY", Memory, Frontier),
        0x3a => ("GASPRICE", Environment, Frontier),
        0x3b => ("EXTCODESIZE", Memory, Frontier),
        0x3c => ("EXTCODECOPY", Memory, Frontier),
        0x3d => ("RETURNDATASIZE", Memory, Byzantium),
        0x3e => ("RETURNDATACOPY", Memory, Byzantium),
        0x3f => ("EXTCODEHASH", Environment, Constantinople),
        0x40 => ("BLOCKHASH", Environment, Frontier),
        0x41 => ("COINBASE", Environment, Frontier),
        0x42 => ("TIMESTAMP", Environment, Frontier),
        0x43 => ("NUMBER", Environment, Frontier),
        0x44 => ("PREVRANDAO", Environment, Frontier),
        0x45 => ("GASLIMIT", Environment, Frontier),
        0x46 => ("CHAINID", Environment, Istanbul),
        0x47 => ("SELFBALANCE", Environment, Istanbul),
        0x48 => ("BASEFEE", Environment, London),
        0x49 => ("BLOBHASH", Environment, Cancun),
        0x4a => ("BLOBBASEFEE", Environment, Cancun),
        0x50 => ("POP", Memory, Frontier),
        0x51 => ("MLOAD", Memory, Frontier),
        0x52 => ("MSTORE", Memory, Frontier),
        0x53 => ("MSTORE8", Memory, Frontier),
        0x54 => ("SLOAD", Memory, Frontier),
        0x55 => ("SSTORE", Memory, Frontier),
        0x56 => ("JUMP", Control, Frontier),
        0x57 => ("JUMPI", Control, Frontier),
        0x58 => ("PC", Control, Frontier),
        0x59 => ("MSIZE", Memory, Frontier),
        0x5a => ("GAS", Environment, Frontier),
        0x5b => ("JUMPDEST", Control, Frontier),
        0x5c => ("TLOAD", Memory, Cancun),
        0x5d => ("TSTORE", Memory, Cancun),
        0x5e => ("MCOPY", Memory, Cancun),
        0x5f => ("PUSH0", Memory, Shanghai),
        0x60..=0x7f => (
            PUSH_MNEMONICS[(byte - PUSH_OPCODE_BASE_VALUE - 1) as usize],
            Memory,
            Frontier,
        ),
        0x80..=0x8f => (
            DUP_MNEMONICS[(byte - DUP_OPCODE_BASE_VALUE - 1) as usize],
            Memory,
            Frontier,
        ),
        0x90..=0x9f => (
            SWAP_MNEMONICS[(byte - SWAP_OPCODE_BASE_VALUE - 1) as usize],
            Memory,
            Frontier,
        ),
        0xa0..=0xa4 => (
            LOG_MNEMONICS[(byte - LOG_OPCODE_BASE_VALUE) as usize],
            Environment,
            Frontier,
        ),
        0xf0 => ("CREATE", Environment, Frontier),
        0xf1 => ("CALL", Control, Frontier),
        0xf2 => ("CALLCODE", Control, Frontier),
        0xf3 => ("RETURN", Control, Frontier),
        0xf4 => ("DELEGATECALL", Control, Homestead),
        0xf5 => ("CREATE2", Environment, Constantinople),
        0xfa => ("STATICCALL", Control, Byzantium),
        0xfd => ("REVERT", Control, Byzantium),
        0xfe => ("INVALID", Control, Frontier),
        0xff => ("SELFDESTRUCT", Environment, Frontier),
        _ => return None,
    };

    Some(entry)
}

#[cfg(test)]
mod test {
    use crate::{
        analyzer::chain::version::EthereumVersion,
        opcode::{class::OpcodeClass, table::InstructionSet, Category},
    };

    #[test]
    fn classifies_control_flow_opcodes() {
        let set = InstructionSet::default();
        assert_eq!(set.class(0x5bu8), OpcodeClass::JumpMarker);
        assert_eq!(set.class(0x56u8), OpcodeClass::UnconditionalJump);
        assert_eq!(set.class(0x57u8), OpcodeClass::ConditionalJump);
        assert_eq!(set.class(0x00u8), OpcodeClass::Halt);
        assert_eq!(set.class(0xfeu8), OpcodeClass::Halt);
        assert_eq!(set.class(0x01u8), OpcodeClass::Plain);
    }

    #[test]
    fn push_class_spans_push1_to_push32() {
        let set = InstructionSet::default();
        for byte in 0x60..=0x7fu8 {
            assert_eq!(
                set.class(byte),
                OpcodeClass::Push {
                    immediate_size: byte - 0x5f,
                }
            );
        }
        assert_eq!(set.class(0x5fu8), OpcodeClass::Plain);
        assert_eq!(set.class(0x80u8), OpcodeClass::Plain);
    }

    #[test]
    fn later_opcodes_are_undefined_in_earlier_forks() {
        let frontier = InstructionSet::for_version(EthereumVersion::Frontier);
        let shanghai = InstructionSet::for_version(EthereumVersion::Shanghai);
        let cancun = InstructionSet::for_version(EthereumVersion::Cancun);

        assert!(!frontier.is_defined(0x5fu8));
        assert!(shanghai.is_defined(0x5fu8));
        assert!(!shanghai.is_defined(0x5cu8));
        assert!(cancun.is_defined(0x5cu8));
        assert_eq!(frontier.class(0xfdu8), OpcodeClass::Undefined);
        assert_eq!(frontier.category(0xfdu8), Category::Undefined);
    }

    #[test]
    fn renders_mnemonics() {
        let set = InstructionSet::default();
        assert_eq!(set.mnemonic(0x60u8), "PUSH1");
        assert_eq!(set.mnemonic(0x7fu8), "PUSH32");
        assert_eq!(set.mnemonic(0x8fu8), "DUP16");
        assert_eq!(set.mnemonic(0x90u8), "SWAP1");
        assert_eq!(set.mnemonic(0xa4u8), "LOG4");
        assert_eq!(set.mnemonic(0x0cu8), "INVALID(0x0c)");
    }

    #[test]
    fn table_covers_every_byte() {
        let set = InstructionSet::default();
        assert_eq!(set.iter().count(), 256);
        assert!(set.iter().enumerate().all(|(i, info)| info.opcode.as_byte() as usize == i));
    }
}
