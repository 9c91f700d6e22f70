//! This module contains the construction of the control-flow graph, which
//! partitions a program's instructions into basic blocks and records the
//! edges along which execution may pass between them.

use std::ops::Range;

use ethnum::U256;
use serde::Serialize;

use crate::{
    disassembly::Instruction,
    flow::{
        jump_index::JumpDestinationSet,
        loops::{self, LoopDescriptor},
        Config,
    },
    opcode::{class::OpcodeClass, table::InstructionSet},
};

/// The way in which an edge passes control to its target.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum EdgeKind {
    /// Execution runs off the end of the block into the next one.
    Fallthrough,

    /// An unconditional jump.
    Unconditional,

    /// The branch of a conditional jump that is followed when the condition
    /// holds.
    ConditionalTaken,

    /// The branch of a conditional jump that is followed when the condition
    /// does not hold.
    ConditionalNotTaken,
}

impl EdgeKind {
    /// Checks if the edge is produced by a jump rather than by execution
    /// continuing to the next offset.
    #[must_use]
    pub fn is_jump(self) -> bool {
        matches!(self, Self::Unconditional | Self::ConditionalTaken)
    }
}

/// Where an edge leads.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum EdgeTarget {
    /// The start of the block at the contained offset.
    Block(u32),

    /// A constant jump target that is not a valid jump destination. Execution
    /// of the jump fails at runtime.
    InvalidDestination(u32),

    /// A jump target that cannot be determined without tracking the stack.
    Dynamic,

    /// The end of the program, which executes as `STOP`.
    ProgramEnd,
}

impl EdgeTarget {
    /// Gets the offset of the target block, if the edge leads to one.
    #[must_use]
    pub fn block(self) -> Option<u32> {
        match self {
            Self::Block(offset) => Some(offset),
            _ => None,
        }
    }
}

/// An edge in the control-flow graph.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct Edge {
    /// How control passes along the edge.
    pub kind: EdgeKind,

    /// The offset of the instruction that produces the edge, which is always
    /// the last instruction of its block.
    pub source: u32,

    /// Where control passes to.
    pub target: EdgeTarget,
}

/// A maximal run of instructions that execution enters only at the first and
/// leaves only after the last.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BasicBlock {
    /// The offset of the first instruction of the block.
    start: u32,

    /// The offset directly after the last instruction of the block.
    end: u32,

    /// The indices into the program's instructions that make up the block.
    instructions: Range<usize>,

    /// The edges leaving the block.
    successors: Vec<Edge>,
}

impl BasicBlock {
    /// Gets the offset of the first instruction in the block.
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Gets the offset directly after the last instruction in the block.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Gets the range of indices into the program's instructions that make up
    /// this block.
    #[must_use]
    pub fn instruction_range(&self) -> Range<usize> {
        self.instructions.clone()
    }

    /// Gets the instructions of the block out of `all`, the instructions of
    /// the program that the block was built from.
    ///
    /// # Panics
    ///
    /// If `all` is not the instruction sequence the block was built from.
    #[must_use]
    pub fn instructions<'a>(&self, all: &'a [Instruction]) -> &'a [Instruction] {
        &all[self.instructions.clone()]
    }

    /// Gets the number of instructions in the block.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Checks if the block contains no instructions, which never holds for a
    /// block in a graph.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Checks if `offset` falls within the block.
    #[must_use]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Gets the edges leaving the block.
    #[must_use]
    pub fn successors(&self) -> &[Edge] {
        &self.successors
    }
}

/// The control-flow graph of a program.
///
/// The blocks partition the program's instructions, and are stored in order
/// of increasing offset.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ControlFlowGraph {
    blocks: Vec<BasicBlock>,
}

impl ControlFlowGraph {
    /// Gets the blocks of the program in order of increasing offset.
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Gets the block that starts at `offset`, if there is one.
    #[must_use]
    pub fn block_at(&self, offset: u32) -> Option<&BasicBlock> {
        self.blocks
            .binary_search_by_key(&offset, BasicBlock::start)
            .ok()
            .map(|index| &self.blocks[index])
    }

    /// Gets the block that `offset` falls within, if any.
    #[must_use]
    pub fn block_containing(&self, offset: u32) -> Option<&BasicBlock> {
        let index = self.blocks.partition_point(|block| block.start <= offset);
        index
            .checked_sub(1)
            .map(|index| &self.blocks[index])
            .filter(|block| block.contains(offset))
    }

    /// Iterates over every edge in the graph, ordered by source.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.blocks.iter().flat_map(|block| block.successors.iter())
    }

    /// Iterates over the edges that lead to the block starting at `offset`.
    pub fn predecessors(&self, offset: u32) -> impl Iterator<Item = &Edge> {
        self.edges()
            .filter(move |edge| edge.target == EdgeTarget::Block(offset))
    }

    /// Gets the loops in the graph, ordered by the offset of the jump that
    /// closes them.
    #[must_use]
    pub fn loops(&self) -> Vec<LoopDescriptor> {
        loops::find_loops(self.edges())
    }
}

/// Builds the control-flow graph for `instructions` using the default
/// [`Config`].
#[must_use]
pub fn build_cfg(
    instructions: &[Instruction],
    jump_destinations: &JumpDestinationSet,
    set: &InstructionSet,
) -> ControlFlowGraph {
    build_cfg_with_config(instructions, jump_destinations, set, &Config::default())
}

/// Builds the control-flow graph for `instructions`, given the valid
/// `jump_destinations` among them.
///
/// # Block Boundaries
///
/// A block starts at the first instruction, at every valid jump destination,
/// and directly after every jump. When [`Config::halts_end_blocks`] is set, a
/// block also starts directly after every halting instruction.
///
/// # Edges
///
/// - A block that ends in a jump gets an edge to the jump's target, which is
///   only known if the instruction before the jump pushes it as a constant.
///   A conditional jump also gets an edge to the following block, or to the
///   end of the program if there is no following block.
/// - A block that ends in a halting instruction has no successors.
/// - Any other block falls through into the following block, if there is one.
#[must_use]
pub fn build_cfg_with_config(
    instructions: &[Instruction],
    jump_destinations: &JumpDestinationSet,
    set: &InstructionSet,
    config: &Config,
) -> ControlFlowGraph {
    let ranges = partition(instructions, jump_destinations, set, config);

    let mut blocks: Vec<BasicBlock> = Vec::with_capacity(ranges.len());
    for (i, range) in ranges.iter().enumerate() {
        let body = &instructions[range.clone()];
        let (Some(first), Some(last)) = (body.first(), body.last()) else {
            continue;
        };
        let next_start = ranges.get(i + 1).map(|next| instructions[next.start].offset());
        let after = next_start.map_or(EdgeTarget::ProgramEnd, EdgeTarget::Block);

        let successors = match set.class(last.opcode()) {
            OpcodeClass::UnconditionalJump => vec![Edge {
                kind:   EdgeKind::Unconditional,
                source: last.offset(),
                target: jump_target(body, jump_destinations, set),
            }],
            OpcodeClass::ConditionalJump => vec![
                Edge {
                    kind:   EdgeKind::ConditionalTaken,
                    source: last.offset(),
                    target: jump_target(body, jump_destinations, set),
                },
                Edge {
                    kind:   EdgeKind::ConditionalNotTaken,
                    source: last.offset(),
                    target: after,
                },
            ],
            OpcodeClass::Halt => vec![],
            _ => next_start
                .map(|next| Edge {
                    kind:   EdgeKind::Fallthrough,
                    source: last.offset(),
                    target: EdgeTarget::Block(next),
                })
                .into_iter()
                .collect(),
        };

        tracing::trace!(
            start = first.offset(),
            instructions = body.len(),
            successors = successors.len(),
            "built block"
        );

        blocks.push(BasicBlock {
            start: first.offset(),
            end: last.end(),
            instructions: range.clone(),
            successors,
        });
    }

    let graph = ControlFlowGraph { blocks };
    tracing::debug!(
        blocks = graph.blocks.len(),
        edges = graph.edges().count(),
        "built control-flow graph"
    );

    graph
}

/// Splits the indices of `instructions` into the ranges that form the basic
/// blocks.
fn partition(
    instructions: &[Instruction],
    jump_destinations: &JumpDestinationSet,
    set: &InstructionSet,
    config: &Config,
) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;

    for (index, instruction) in instructions.iter().enumerate() {
        if index > start && jump_destinations.contains(instruction.offset()) {
            ranges.push(start..index);
            start = index;
        }

        let class = set.class(instruction.opcode());
        if class.is_control_transfer() || (config.halts_end_blocks && class.is_halt()) {
            ranges.push(start..index + 1);
            start = index + 1;
        }
    }

    if start < instructions.len() {
        ranges.push(start..instructions.len());
    }

    ranges
}

/// Recovers the target of the jump that ends `body` from a constant pushed by
/// the instruction directly before it.
fn jump_target(
    body: &[Instruction],
    jump_destinations: &JumpDestinationSet,
    set: &InstructionSet,
) -> EdgeTarget {
    let [.., previous, jump] = body else {
        return EdgeTarget::Dynamic;
    };
    let Some(value) = previous.pushed_constant(set) else {
        return EdgeTarget::Dynamic;
    };
    if value > U256::from(u32::MAX) {
        tracing::warn!(source = jump.offset(), "constant jump target beyond addressable code");
        return EdgeTarget::Dynamic;
    }

    let target = value.as_u32();
    if jump_destinations.contains(target) {
        EdgeTarget::Block(target)
    } else {
        tracing::warn!(
            source = jump.offset(),
            target,
            "constant jump target is not a valid jump destination"
        );
        EdgeTarget::InvalidDestination(target)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        disassembly::Program,
        flow::{
            cfg::{EdgeKind, EdgeTarget},
            Config,
        },
    };

    #[test]
    fn straight_line_code_is_one_block() -> anyhow::Result<()> {
        // PUSH1 0x01, PUSH1 0x02, ADD, POP
        let program = Program::try_from("600160020150")?;
        let cfg = program.control_flow();

        assert_eq!(cfg.blocks().len(), 1);
        let block = &cfg.blocks()[0];
        assert_eq!(block.start(), 0);
        assert_eq!(block.end(), 6);
        assert_eq!(block.len(), 4);
        assert!(block.successors().is_empty());

        Ok(())
    }

    #[test]
    fn empty_program_has_no_blocks() -> anyhow::Result<()> {
        let program = Program::try_from("")?;
        assert!(program.control_flow().blocks().is_empty());
        assert!(program.control_flow().loops().is_empty());

        Ok(())
    }

    #[test]
    fn resolves_constant_jump_targets() -> anyhow::Result<()> {
        // 0x00: PUSH1 0x04
        // 0x02: JUMP
        // 0x03: INVALID
        // 0x04: JUMPDEST
        // 0x05: STOP
        let program = Program::try_from("600456fe5b00")?;
        let cfg = program.control_flow();

        let starts: Vec<u32> = cfg.blocks().iter().map(|b| b.start()).collect();
        assert_eq!(starts, vec![0, 3, 4]);

        let edges: Vec<_> = cfg.edges().copied().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::Unconditional);
        assert_eq!(edges[0].source, 2);
        assert_eq!(edges[0].target, EdgeTarget::Block(4));

        // INVALID halts, so its block has no successors even though the next
        // block follows it directly.
        assert!(cfg.block_at(3).map_or(false, |b| b.successors().is_empty()));
        assert_eq!(cfg.predecessors(4).count(), 1);

        Ok(())
    }

    #[test]
    fn conditional_jumps_produce_paired_edges() -> anyhow::Result<()> {
        // 0x00: PUSH1 0x06
        // 0x02: CALLDATASIZE
        // 0x03: SWAP1
        // 0x04: JUMPI  <- the value before the jump is not a push
        // 0x05: STOP
        // 0x06: JUMPDEST
        let program = Program::try_from("6006369057005b")?;
        let edges: Vec<_> = program.control_flow().edges().copied().collect();

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].kind, EdgeKind::ConditionalTaken);
        assert_eq!(edges[0].target, EdgeTarget::Dynamic);
        assert_eq!(edges[1].kind, EdgeKind::ConditionalNotTaken);
        assert_eq!(edges[1].target, EdgeTarget::Block(5));
        assert!(edges.iter().all(|e| e.source == 4));

        Ok(())
    }

    #[test]
    fn conditional_jump_at_end_falls_off_the_program() -> anyhow::Result<()> {
        // PUSH1 0x00, PUSH1 0x00, JUMPI
        let program = Program::try_from("6000600057")?;
        let edges: Vec<_> = program.control_flow().edges().copied().collect();

        assert_eq!(edges[0].target, EdgeTarget::InvalidDestination(0));
        assert_eq!(edges[1].target, EdgeTarget::ProgramEnd);

        Ok(())
    }

    #[test]
    fn blocks_fall_through_into_jump_destinations() -> anyhow::Result<()> {
        // CALLER, JUMPDEST, POP
        let program = Program::try_from("335b50")?;
        let cfg = program.control_flow();

        assert_eq!(cfg.blocks().len(), 2);
        let edges: Vec<_> = cfg.edges().copied().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::Fallthrough);
        assert_eq!(edges[0].source, 0);
        assert_eq!(edges[0].target, EdgeTarget::Block(1));

        Ok(())
    }

    #[test]
    fn halts_only_split_blocks_when_configured() -> anyhow::Result<()> {
        // STOP, CALLER, RETURN, CALLER
        let program = Program::try_from("0033f333")?;

        assert_eq!(program.control_flow().blocks().len(), 1);

        let cfg = program.build_control_flow(&Config::default().with_halts_end_blocks(true));
        let starts: Vec<u32> = cfg.blocks().iter().map(|b| b.start()).collect();
        assert_eq!(starts, vec![0, 1, 3]);
        assert_eq!(cfg.edges().count(), 0);

        Ok(())
    }

    #[test]
    fn blocks_partition_the_instructions() -> anyhow::Result<()> {
        let program = Program::try_from("6080604052348015600e575f5ffd5b50600436106026575b00")?;
        let cfg = program.control_flow();

        let mut next = 0;
        for block in cfg.blocks() {
            let range = block.instruction_range();
            assert_eq!(range.start, next);
            assert!(!block.is_empty());
            next = range.end;
        }
        assert_eq!(next, program.instructions().len());

        Ok(())
    }

    #[test]
    fn finds_containing_blocks() -> anyhow::Result<()> {
        // PUSH2 0x0005, JUMP, JUMPDEST, JUMPDEST
        let program = Program::try_from("610005565b5b")?;
        let cfg = program.control_flow();

        assert_eq!(cfg.block_containing(1).map(|b| b.start()), Some(0));
        assert_eq!(cfg.block_containing(4).map(|b| b.start()), Some(4));
        assert_eq!(cfg.block_containing(5).map(|b| b.start()), Some(5));
        assert!(cfg.block_containing(6).is_none());
        assert!(cfg.block_at(1).is_none());

        Ok(())
    }
}
