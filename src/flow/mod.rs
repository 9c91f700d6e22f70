//! This module contains the analyses that are derived from the decoded
//! instructions of a [`crate::disassembly::Program`]: the set of valid jump
//! destinations, the partition of the program into basic blocks, and the
//! loops formed by backward edges between those blocks.
//!
//! # Static Targets Only
//!
//! The analyses here do not track stack contents. The destination of a jump
//! is only known when it is pushed as a constant directly before the jump in
//! the same block, which is the pattern compilers emit for the vast majority
//! of jumps. Every other jump has a dynamic target (see
//! [`cfg::EdgeTarget::Dynamic`]).

pub mod cfg;
pub mod jump_index;
pub mod loops;

use serde::Serialize;

/// The configuration for the control-flow analysis.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Config {
    /// Whether halting instructions (`STOP`, `RETURN`, `REVERT`, `INVALID` and
    /// `SELFDESTRUCT`) end the block they appear in.
    ///
    /// When `false`, blocks only end at jumps and before jump destinations.
    /// Either way, a block whose last instruction halts has no successors.
    pub halts_end_blocks: bool,
}

impl Config {
    /// Sets whether halting instructions end blocks.
    #[must_use]
    pub fn with_halts_end_blocks(mut self, value: bool) -> Self {
        self.halts_end_blocks = value;
        self
    }
}
