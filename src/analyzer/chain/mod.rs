//! This module contains utility types for dealing with the specifics of which
//! chain the bytecode being analysed is running on.
//!
//! For now we only deal with Ethereum, but the fork matters as it determines
//! which opcodes are defined.

pub mod version;

use serde::Serialize;

use crate::{analyzer::chain::version::EthereumVersion, opcode::table::InstructionSet};

/// A representation of the chain on which the contract is running.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Chain {
    /// Ethereum main-net.
    Ethereum { version: EthereumVersion },
}

impl Chain {
    /// Gets the instruction set that is in effect on this chain.
    #[must_use]
    pub fn instruction_set(&self) -> InstructionSet {
        match self {
            Self::Ethereum { version } => InstructionSet::for_version(*version),
        }
    }
}

/// The default chain is the latest version of Ethereum main-net.
impl Default for Chain {
    fn default() -> Self {
        Self::Ethereum {
            version: EthereumVersion::default(),
        }
    }
}
