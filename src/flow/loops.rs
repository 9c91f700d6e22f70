//! This module contains the detection of loops as backward jumps in the
//! control-flow graph.

use itertools::Itertools;
use serde::Serialize;

use crate::flow::cfg::{Edge, EdgeKind, EdgeTarget};

/// A loop, identified by the jump that closes it.
///
/// The loop is reported whenever a jump leads to an offset at or before the
/// jump itself. That is the back-edge of the loop, running from the end of
/// the loop body to its head.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct LoopDescriptor {
    /// The offset of the jump that closes the loop.
    pub source: u32,

    /// The offset of the head of the loop, which the back-edge leads to.
    pub target: u32,

    /// The kind of jump that forms the back-edge.
    pub kind: EdgeKind,
}

impl LoopDescriptor {
    /// Checks if the loop closes with a conditional jump, as in a
    /// `do ... while` loop.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.kind == EdgeKind::ConditionalTaken
    }
}

/// Finds the back-edges among `edges` and describes the loops they form,
/// ordered by source offset.
///
/// Only jumps to a known, valid destination can form a loop.
pub fn find_loops<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Vec<LoopDescriptor> {
    edges
        .into_iter()
        .filter(|edge| edge.kind.is_jump())
        .filter_map(|edge| match edge.target {
            EdgeTarget::Block(target) if target <= edge.source => Some(LoopDescriptor {
                source: edge.source,
                target,
                kind: edge.kind,
            }),
            _ => None,
        })
        .sorted()
        .collect()
}
