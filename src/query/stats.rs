//! This module contains the aggregate statistics that can be computed over a
//! decoded [`Program`], and the [`Report`] that bundles them together.

use std::collections::BTreeMap;

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::{
    analyzer::chain::version::EthereumVersion,
    constant::{INVALID, JUMP, JUMPDEST, JUMPI, PUSH0},
    disassembly::Program,
    flow::loops::LoopDescriptor,
    opcode::{class::OpcodeClass, Category},
    query,
};

/// Counts of the instructions involved in jumps.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct JumpCounts {
    /// The number of `JUMP` instructions.
    pub jump: usize,

    /// The number of `JUMPI` instructions.
    pub jumpi: usize,

    /// The number of `JUMPDEST` instructions.
    pub jumpdest: usize,

    /// The sum of the above.
    pub total: usize,
}

/// Counts the jump-related instructions in `program`.
#[must_use]
pub fn jump_counts(program: &Program) -> JumpCounts {
    let jump = query::count_opcode(program, JUMP);
    let jumpi = query::count_opcode(program, JUMPI);
    let jumpdest = query::count_opcode(program, JUMPDEST);

    JumpCounts {
        jump,
        jumpi,
        jumpdest,
        total: jump + jumpi + jumpdest,
    }
}

/// Summary statistics for a program.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BytecodeStats {
    /// The length of the program in bytes.
    pub length: usize,

    /// The number of instructions in the program.
    pub instruction_count: usize,

    /// The number of distinct opcodes that occur in the program.
    pub unique_opcodes: usize,

    /// The number of push instructions, `PUSH0` through `PUSH32`.
    pub push_count: usize,

    /// The number of `JUMP` and `JUMPI` instructions.
    pub jump_count: usize,

    /// The number of `JUMPDEST` instructions.
    pub jumpdest_count: usize,

    /// The number of undefined opcodes, plus the designated `INVALID` opcode.
    pub invalid_opcode_count: usize,

    /// Whether the program ends part way through a push immediate.
    pub truncated_tail: bool,
}

impl BytecodeStats {
    /// Computes the statistics for `program`.
    #[must_use]
    pub fn new(program: &Program) -> Self {
        let set = program.instruction_set();
        let instructions = program.instructions();

        let mut stats = Self {
            length: program.len(),
            instruction_count: instructions.len(),
            unique_opcodes: instructions.iter().map(|i| i.opcode()).unique().count(),
            truncated_tail: instructions.last().map_or(false, |i| i.is_truncated()),
            ..Self::default()
        };

        for instruction in instructions {
            let opcode = instruction.opcode();
            match set.class(opcode) {
                OpcodeClass::Push { .. } => stats.push_count += 1,
                OpcodeClass::UnconditionalJump | OpcodeClass::ConditionalJump => {
                    stats.jump_count += 1;
                }
                OpcodeClass::JumpMarker => stats.jumpdest_count += 1,
                OpcodeClass::Undefined => stats.invalid_opcode_count += 1,
                OpcodeClass::Plain if opcode.as_byte() == PUSH0 => stats.push_count += 1,
                OpcodeClass::Halt if opcode.as_byte() == INVALID => {
                    stats.invalid_opcode_count += 1;
                }
                _ => (),
            }
        }

        stats
    }
}

/// A summary of one basic block.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BlockSummary {
    /// The offset of the start of the block.
    pub start: u32,

    /// The number of instructions in the block.
    pub instruction_count: usize,

    /// The mnemonics of the instructions in the block, in order.
    pub mnemonics: Vec<String>,
}

/// Statistics over the lengths of the basic blocks in a program, where the
/// length of a block is its number of instructions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BlockStatistics {
    /// The number of blocks.
    pub total_blocks: usize,

    /// How many blocks there are of each length.
    pub length_distribution: BTreeMap<usize, usize>,

    /// The mean block length, or zero if there are no blocks.
    pub average_length: f64,

    /// The shortest block length, or zero if there are no blocks.
    pub min_length: usize,

    /// The longest block length, or zero if there are no blocks.
    pub max_length: usize,

    /// For the blocks that consist of a single instruction, how many there are
    /// of each mnemonic.
    pub single_instruction_blocks: BTreeMap<String, usize>,
}

/// Summarizes each basic block of `program` in order.
#[must_use]
pub fn block_summaries(program: &Program) -> Vec<BlockSummary> {
    program
        .control_flow()
        .blocks()
        .iter()
        .map(|block| BlockSummary {
            start:             block.start(),
            instruction_count: block.len(),
            mnemonics:         block
                .instructions(program.instructions())
                .iter()
                .map(|i| program.mnemonic(i.opcode()).into_owned())
                .collect(),
        })
        .collect()
}

/// Computes the statistics over the block lengths in `summaries`.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Block counts are nowhere near 2^52
pub fn block_statistics(summaries: &[BlockSummary]) -> BlockStatistics {
    let lengths = summaries.iter().map(|b| b.instruction_count);
    let (min_length, max_length) = match lengths.clone().minmax() {
        MinMaxResult::NoElements => (0, 0),
        MinMaxResult::OneElement(length) => (length, length),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    let average_length = if summaries.is_empty() {
        0.0
    } else {
        lengths.clone().sum::<usize>() as f64 / summaries.len() as f64
    };

    BlockStatistics {
        total_blocks: summaries.len(),
        length_distribution: lengths.counts().into_iter().collect(),
        average_length,
        min_length,
        max_length,
        single_instruction_blocks: summaries
            .iter()
            .filter(|b| b.instruction_count == 1)
            .flat_map(|b| b.mnemonics.iter().cloned())
            .counts()
            .into_iter()
            .collect(),
    }
}

/// How often a sequence of mnemonics occurs within the blocks of a program.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SequenceFrequency {
    /// The mnemonics in the sequence.
    pub sequence: Vec<String>,

    /// The number of times the sequence occurs.
    pub count: usize,
}

/// Finds the `top` most frequent sequences of `length` consecutive
/// instructions in `program`, which are candidates for fusing into a single
/// operation.
///
/// Sequences never span a block boundary. The result is ordered by
/// decreasing count, with ties broken by the sequence in lexicographic order.
#[must_use]
pub fn sequence_frequencies(program: &Program, length: usize, top: usize) -> Vec<SequenceFrequency> {
    if length == 0 {
        return vec![];
    }

    block_summaries(program)
        .iter()
        .flat_map(|block| block.mnemonics.windows(length).map(<[String]>::to_vec))
        .counts()
        .into_iter()
        .map(|(sequence, count)| SequenceFrequency { sequence, count })
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sequence.cmp(&b.sequence)))
        .take(top)
        .collect()
}

/// The parameters of a [`Report`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReportOptions {
    /// The length of the instruction sequences to count.
    pub sequence_length: usize,

    /// The number of most frequent sequences to keep.
    pub sequence_top: usize,
}

/// Everything there is to know about a program, in a form ready for output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// The fork whose instruction set the program was decoded with.
    pub fork: EthereumVersion,

    pub stats: BytecodeStats,

    pub jumps: JumpCounts,

    /// The valid jump destinations in ascending order.
    pub jump_destinations: Vec<u32>,

    /// How often each mnemonic occurs.
    pub histogram: BTreeMap<String, usize>,

    pub categories: BTreeMap<Category, usize>,

    pub loops: Vec<LoopDescriptor>,

    pub blocks: BlockStatistics,

    /// The most frequent instruction sequences within blocks.
    pub sequences: Vec<SequenceFrequency>,
}

impl Report {
    /// Computes the report for `program`.
    #[must_use]
    pub fn new(program: &Program, options: ReportOptions) -> Self {
        let histogram = query::opcode_histogram(program)
            .into_iter()
            .map(|(opcode, count)| (program.mnemonic(opcode).into_owned(), count))
            .collect();

        Self {
            fork: program.instruction_set().version(),
            stats: BytecodeStats::new(program),
            jumps: jump_counts(program),
            jump_destinations: program.jump_destinations().iter().collect(),
            histogram,
            categories: query::category_histogram(program),
            loops: query::loops(program),
            blocks: block_statistics(&block_summaries(program)),
            sequences: sequence_frequencies(
                program,
                options.sequence_length,
                options.sequence_top,
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        disassembly::Program,
        query::stats::{
            block_statistics,
            block_summaries,
            jump_counts,
            sequence_frequencies,
            BytecodeStats,
            JumpCounts,
        },
    };

    #[test]
    fn counts_jumps() -> anyhow::Result<()> {
        // PUSH1 0x05, JUMP, PUSH1 0x5b, JUMPDEST, PUSH1 0x00, JUMPI
        let program = Program::try_from("600556605b5b600057")?;

        assert_eq!(
            jump_counts(&program),
            JumpCounts {
                jump:     1,
                jumpi:    1,
                jumpdest: 1,
                total:    3,
            }
        );

        Ok(())
    }

    #[test]
    fn computes_bytecode_stats() -> anyhow::Result<()> {
        // PUSH0, PUSH1 0x01, 0x0c, INVALID, JUMPDEST, PUSH3 0x0102
        let program = Program::try_from("5f60010cfe5b620102")?;
        let stats = BytecodeStats::new(&program);

        assert_eq!(stats.length, 9);
        assert_eq!(stats.instruction_count, 6);
        assert_eq!(stats.unique_opcodes, 6);
        assert_eq!(stats.push_count, 3);
        assert_eq!(stats.jump_count, 0);
        assert_eq!(stats.jumpdest_count, 1);
        assert_eq!(stats.invalid_opcode_count, 2);
        assert!(stats.truncated_tail);

        Ok(())
    }

    #[test]
    fn summarizes_blocks() -> anyhow::Result<()> {
        // 0x00: PUSH1 0x04
        // 0x02: JUMP
        // 0x03: STOP
        // 0x04: JUMPDEST
        // 0x05: CALLER
        // 0x06: POP
        let program = Program::try_from("600456005b3350")?;
        let summaries = block_summaries(&program);

        let shape: Vec<(u32, usize)> =
            summaries.iter().map(|b| (b.start, b.instruction_count)).collect();
        assert_eq!(shape, vec![(0, 2), (3, 1), (4, 3)]);
        assert_eq!(summaries[2].mnemonics, vec!["JUMPDEST", "CALLER", "POP"]);

        let stats = block_statistics(&summaries);
        assert_eq!(stats.total_blocks, 3);
        assert_eq!(stats.min_length, 1);
        assert_eq!(stats.max_length, 3);
        assert!((stats.average_length - 2.0).abs() < f64::EPSILON);
        assert_eq!(stats.length_distribution.get(&2), Some(&1));
        assert_eq!(stats.single_instruction_blocks.get("STOP"), Some(&1));

        Ok(())
    }

    #[test]
    fn block_statistics_of_nothing_are_zero() {
        let stats = block_statistics(&[]);
        assert_eq!(stats.total_blocks, 0);
        assert_eq!(stats.max_length, 0);
        assert!(stats.average_length.abs() < f64::EPSILON);
    }

    #[test]
    fn ranks_sequences_by_frequency() -> anyhow::Result<()> {
        // CALLER, POP, CALLER, POP, CALLER, POP
        let program = Program::try_from("335033503350")?;
        let sequences = sequence_frequencies(&program, 2, 2);

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].sequence, vec!["CALLER", "POP"]);
        assert_eq!(sequences[0].count, 3);
        assert_eq!(sequences[1].sequence, vec!["POP", "CALLER"]);
        assert_eq!(sequences[1].count, 2);

        Ok(())
    }

    #[test]
    fn sequences_do_not_cross_blocks() -> anyhow::Result<()> {
        // CALLER, JUMPDEST, POP
        let program = Program::try_from("335b50")?;
        let sequences = sequence_frequencies(&program, 2, 10);

        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].sequence, vec!["JUMPDEST", "POP"]);
        assert!(sequence_frequencies(&program, 0, 10).is_empty());
        assert!(sequence_frequencies(&program, 4, 10).is_empty());

        Ok(())
    }
}
