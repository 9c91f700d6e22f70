//! This module contains the state tracking functionality for the analyzer.

use std::fmt::Debug;

use crate::disassembly::Program;

/// A marker trait that says that the type implementing it is an analyzer state.
pub trait State
where
    Self: Clone + Debug + Sized,
{
}

/// The initial state for the analyzer.
#[derive(Clone, Debug)]
pub struct HasContract;
impl State for HasContract {}

/// The analyzer has successfully disassembled the bytecode.
#[derive(Clone, Debug)]
pub struct Disassembled {
    /// The decoded program for the contract being analyzed.
    pub program: Program,
}
impl State for Disassembled {}

/// The analyzer has computed the jump destinations and control-flow graph of
/// the program, which are cached inside it.
#[derive(Clone, Debug)]
pub struct FlowAnalyzed {
    pub program: Program,
}
impl State for FlowAnalyzed {}
