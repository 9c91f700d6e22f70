//! This module contains the implementation of the [`Program`], the immutable
//! decoded representation of a piece of bytecode, and of the [`Instruction`]s
//! that it consists of.

pub mod disassembler;
pub mod reader;

use std::sync::OnceLock;

use derivative::Derivative;
use ethnum::U256;
use serde::{Serialize, Serializer};

use crate::{
    constant::{PUSH0, PUSH_OPCODE_BASE_VALUE, PUSH_OPCODE_MAX_BYTES},
    disassembly::reader::BytecodeInput,
    error::{disassembly, query},
    flow::{
        self,
        cfg::{BasicBlock, ControlFlowGraph},
        jump_index::JumpDestinationSet,
    },
    opcode::{table::InstructionSet, Opcode},
};

/// A single decoded instruction.
///
/// # Byte-Instruction Correspondence
///
/// Where most opcodes occupy a single byte, the push-class opcodes are followed
/// in the bytecode by their immediate data. The instruction owns that data, so
/// that [`Instruction::size`] is the number of bytes the instruction occupies
/// and the next instruction starts at [`Instruction::end`].
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct Instruction {
    /// The offset of the opcode byte in the bytecode.
    offset: u32,

    /// The opcode of the instruction.
    opcode: Opcode,

    /// The immediate data in the order it appears in the bytecode. Empty for
    /// anything other than a push.
    #[serde(serialize_with = "serialize_hex")]
    immediate: Vec<u8>,

    /// The number of immediate bytes that the opcode asks for.
    declared_immediate_size: u8,
}

impl Instruction {
    /// Constructs a new instruction.
    #[must_use]
    pub fn new(offset: u32, opcode: Opcode, immediate: Vec<u8>, declared_immediate_size: u8) -> Self {
        Self {
            offset,
            opcode,
            immediate,
            declared_immediate_size,
        }
    }

    /// Constructs the push instruction that pushes `bytes` onto the stack,
    /// located at offset zero.
    ///
    /// This is mostly useful for writing bytecode by hand (see
    /// [`crate::bytecode`]).
    ///
    /// # Errors
    ///
    /// If `bytes` is empty or longer than 32 bytes.
    pub fn push(bytes: impl Into<Vec<u8>>) -> Result<Self, disassembly::Error> {
        let bytes: Vec<u8> = bytes.into();
        match u8::try_from(bytes.len()) {
            Ok(size) if size > 0 && size <= PUSH_OPCODE_MAX_BYTES => Ok(Self::new(
                0,
                Opcode::new(PUSH_OPCODE_BASE_VALUE + size),
                bytes,
                size,
            )),
            _ => Err(disassembly::Error::InvalidPushSize(bytes.len())),
        }
    }

    /// Gets the offset of the instruction in the bytecode.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Gets the opcode of the instruction.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Gets the immediate data of the instruction, which is empty for anything
    /// other than a push.
    #[must_use]
    pub fn immediate(&self) -> &[u8] {
        &self.immediate
    }

    /// Gets the number of immediate bytes the opcode declares, which may be
    /// more than [`Self::immediate`] holds if the instruction was truncated.
    #[must_use]
    pub fn declared_immediate_size(&self) -> u8 {
        self.declared_immediate_size
    }

    /// Gets the number of bytes the instruction occupies in the bytecode.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.immediate.len()
    }

    /// Gets the offset directly after the instruction.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Programs are addressable with u32
    pub fn end(&self) -> u32 {
        self.offset + self.size() as u32
    }

    /// Checks if `offset` falls within the bytes of this instruction.
    #[must_use]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.offset && offset < self.end()
    }

    /// Checks if the bytecode ended before the instruction's immediate was
    /// complete.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.immediate.len() < self.declared_immediate_size as usize
    }

    /// Gets the value that this instruction pushes onto the stack, if it is a
    /// push with immediate data.
    ///
    /// The immediate is big-endian. A truncated immediate is padded on the
    /// right with zero bytes up to its declared size, which is the value the
    /// EVM would push.
    #[must_use]
    pub fn immediate_value(&self) -> Option<U256> {
        if self.declared_immediate_size == 0 {
            return None;
        }

        let mut word = [0u8; 32];
        let start = word.len() - self.declared_immediate_size as usize;
        word[start..start + self.immediate.len()].copy_from_slice(&self.immediate);

        Some(U256::from_be_bytes(word))
    }

    /// Gets the constant that this instruction places on the stack, if it is
    /// one of the pushes under `set`.
    ///
    /// This covers `PUSH1..=PUSH32` as well as `PUSH0` where it is defined.
    #[must_use]
    pub fn pushed_constant(&self, set: &InstructionSet) -> Option<U256> {
        if self.opcode.as_byte() == PUSH0 && set.is_defined(self.opcode) {
            return Some(U256::ZERO);
        }
        if set.class(self.opcode).is_push() {
            return self.immediate_value();
        }

        None
    }

    /// Gets the bytes that encode the instruction.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.push(self.opcode.as_byte());
        bytes.extend_from_slice(&self.immediate);
        bytes
    }
}

/// Writes immediate data as a `0x`-prefixed hex string.
fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

/// A decoded program.
///
/// The program owns the raw bytecode and the ordered sequence of
/// [`Instruction`]s that it decodes to. It is immutable once constructed; to
/// analyze different bytes, construct a new program.
///
/// # Derived Views
///
/// The [`JumpDestinationSet`] and [`ControlFlowGraph`] are computed from the
/// instructions the first time they are requested, and cached alongside the
/// program thereafter. The caches are thread safe, so a program can be shared
/// between threads and queried from all of them.
#[derive(Derivative)]
#[derivative(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    /// The raw bytecode.
    #[derivative(Debug = "ignore")]
    bytes: Vec<u8>,

    /// The instructions in order of increasing offset.
    instructions: Vec<Instruction>,

    /// The instruction set the bytecode was decoded with.
    #[derivative(Debug = "ignore")]
    instruction_set: InstructionSet,

    /// The configuration under which [`Self::control_flow`] is built.
    flow_config: flow::Config,

    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    jump_destinations: OnceLock<JumpDestinationSet>,

    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    control_flow: OnceLock<ControlFlowGraph>,
}

impl Program {
    /// Decodes `bytes` into a program, interpreting opcodes with
    /// `instruction_set`.
    ///
    /// # Errors
    ///
    /// If `bytes` is too large to be addressed with [`u32`] offsets.
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        instruction_set: InstructionSet,
    ) -> disassembly::Result<Self> {
        let bytes = bytes.into();
        let instructions = disassembler::disassemble(&bytes, &instruction_set)?;

        debug_assert_eq!(
            instructions.iter().map(Instruction::size).sum::<usize>(),
            bytes.len()
        );

        Ok(Self {
            bytes,
            instructions,
            instruction_set,
            flow_config: flow::Config::default(),
            jump_destinations: OnceLock::new(),
            control_flow: OnceLock::new(),
        })
    }

    /// Reads the hexadecimal string `text`, with or without a `0x` prefix, and
    /// decodes it into a program.
    ///
    /// # Errors
    ///
    /// If the input is malformed hex, or too large.
    pub fn from_hex(text: &str, instruction_set: InstructionSet) -> disassembly::Result<Self> {
        Self::read(text, instruction_set)
    }

    /// Reads `input`, which is either a hex string or raw bytes, and decodes
    /// it into a program.
    ///
    /// # Errors
    ///
    /// If the input is malformed hex, or too large.
    pub fn read<'a>(
        input: impl Into<BytecodeInput<'a>>,
        instruction_set: InstructionSet,
    ) -> disassembly::Result<Self> {
        let bytes = reader::parse(input)?;
        Self::new(bytes, instruction_set)
    }

    /// Sets the configuration used to build the cached control-flow graph,
    /// discarding the graph if it was already built.
    #[must_use]
    pub fn with_flow_config(mut self, config: flow::Config) -> Self {
        if self.flow_config != config {
            self.flow_config = config;
            self.control_flow = OnceLock::new();
        }
        self
    }

    /// Gets the configuration used to build the cached control-flow graph.
    #[must_use]
    pub fn flow_config(&self) -> &flow::Config {
        &self.flow_config
    }

    /// Gets the raw bytecode of the program.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Gets the instructions of the program in order of increasing offset.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Gets the length of the program in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Checks if the program contains no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Gets the instruction set that the program was decoded with.
    #[must_use]
    pub fn instruction_set(&self) -> &InstructionSet {
        &self.instruction_set
    }

    /// Gets the index into [`Self::instructions`] of the instruction that
    /// starts at `offset`.
    ///
    /// # Errors
    ///
    /// If `offset` is beyond the end of the program, or lands inside the
    /// immediate data of another instruction.
    pub fn index_of(&self, offset: u32) -> query::Result<usize> {
        match self.instructions.binary_search_by_key(&offset, Instruction::offset) {
            Ok(index) => Ok(index),
            Err(0) => Err(query::Error::OutOfRange {
                offset,
                length: self.len(),
            }),
            Err(next) => {
                let owner = &self.instructions[next - 1];
                if owner.contains(offset) {
                    Err(query::Error::InsideImmediate {
                        offset,
                        owner: owner.offset(),
                    })
                } else {
                    Err(query::Error::OutOfRange {
                        offset,
                        length: self.len(),
                    })
                }
            }
        }
    }

    /// Gets the set of valid jump destinations in the program, computing it on
    /// first use.
    pub fn jump_destinations(&self) -> &JumpDestinationSet {
        self.jump_destinations
            .get_or_init(|| flow::jump_index::build_jump_index(&self.instructions, &self.instruction_set))
    }

    /// Gets the control-flow graph of the program under its
    /// [`Self::flow_config`], computing it on first use.
    pub fn control_flow(&self) -> &ControlFlowGraph {
        self.control_flow.get_or_init(|| self.build_control_flow(&self.flow_config))
    }

    /// Builds the control-flow graph of the program under `config`.
    ///
    /// Unlike [`Self::control_flow`] the result is not cached.
    #[must_use]
    pub fn build_control_flow(&self, config: &flow::Config) -> ControlFlowGraph {
        flow::cfg::build_cfg_with_config(
            &self.instructions,
            self.jump_destinations(),
            &self.instruction_set,
            config,
        )
    }

    /// Gets the instructions that make up `block`, which must be a block of
    /// this program.
    #[must_use]
    pub fn block_instructions(&self, block: &BasicBlock) -> &[Instruction] {
        block.instructions(&self.instructions)
    }

    /// Gets a textual representation of `opcode` under the program's
    /// instruction set.
    #[must_use]
    pub fn mnemonic(&self, opcode: Opcode) -> std::borrow::Cow<'static, str> {
        self.instruction_set.mnemonic(opcode)
    }

    /// Renders `instruction` as a line of disassembly, such as
    /// `0x0004: PUSH1 0x34`.
    #[must_use]
    pub fn format_instruction(&self, instruction: &Instruction) -> String {
        let mut line = format!(
            "{:#06x}: {}",
            instruction.offset(),
            self.mnemonic(instruction.opcode())
        );
        if instruction.declared_immediate_size() > 0 {
            line.push_str(&format!(" 0x{}", hex::encode(instruction.immediate())));
        }
        if instruction.is_truncated() {
            line.push_str(" (truncated)");
        }
        line
    }
}

/// A [`Program`] is usually created from a byte array of bytecode, using the
/// latest instruction set.
impl<'a> TryFrom<&'a [u8]> for Program {
    type Error = disassembly::LocatedError;

    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        Self::new(value, InstructionSet::default())
    }
}

/// A [`Program`] can be created from a string as long as that string is a
/// hexadecimal encoding of the equivalent bytes, optionally prefixed by `0x`.
impl TryFrom<&str> for Program {
    type Error = disassembly::LocatedError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_hex(value, InstructionSet::default())
    }
}

/// Allows converting the [`Program`] back to the corresponding bytecode.
impl From<Program> for Vec<u8> {
    fn from(value: Program) -> Self {
        value.bytes
    }
}
