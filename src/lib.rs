//! This library implements decoding and control-flow analysis of
//! [EVM](https://ethereum.org/en/developers/docs/evm/) bytecode. It walks the
//! bytecode to find the true boundaries between instructions, works out which
//! offsets are legal jump destinations, partitions the instructions into basic
//! blocks, and reports the loops and aggregate statistics that follow from
//! them.
//!
//! Note that this library does not execute bytecode. The destination of a jump
//! is only known when it is pushed as a constant directly before the jump.
//!
//! # How it Works
//!
//! From a very high level, the analysis is performed as follows:
//!
//! 1. The input, either hex or raw bytes, is read into a canonical byte
//!    sequence by the [`disassembly::reader`].
//! 2. The bytes are decoded into a [`disassembly::Program`], a sequence of
//!    [`disassembly::Instruction`]s that skips over the immediate data of
//!    push instructions. The meaning of each opcode comes from the
//!    [`opcode::table::InstructionSet`] of the chosen fork.
//! 3. The [`flow::jump_index`] collects the offsets of the genuine jump
//!    markers, and the [`flow::cfg`] splits the program into basic blocks
//!    joined by edges. Backward jumps between blocks are reported as
//!    [`flow::loops::LoopDescriptor`]s.
//! 4. The [`query`] layer answers questions about the program, up to the full
//!    [`query::stats::Report`].
//!
//! # Basic Usage
//!
//! For the most basic usage of the library, it is sufficient to construct an
//! `Analyzer` and call the `.analyze` method, passing your contract.
//!
//! ```
//! use bytecode_flow_analyzer as bfa;
//! use bytecode_flow_analyzer::{
//!     analyzer::{
//!         chain::{version::EthereumVersion, Chain},
//!         config::Config,
//!     },
//!     bytecode,
//!     contract::Contract,
//!     disassembly::Instruction,
//!     opcode::Opcode,
//! };
//!
//! let bytes = bytecode![
//!     Opcode::new(0x5f),                        // PUSH0, the loop counter
//!     Opcode::new(0x5b),                        // JUMPDEST, the head of the loop
//!     Instruction::push(vec![0x0au8]).unwrap(), // The bound of the loop
//!     Opcode::new(0x81),                        // DUP2
//!     Opcode::new(0x10),                        // LT
//!     Opcode::new(0x15),                        // ISZERO
//!     Instruction::push(vec![0x10u8]).unwrap(), // The exit of the loop
//!     Opcode::new(0x57),                        // JUMPI
//!     Instruction::push(vec![0x01u8]).unwrap(), // Increment the counter
//!     Opcode::new(0x01),                        // ADD
//!     Instruction::push(vec![0x01u8]).unwrap(), // The head of the loop
//!     Opcode::new(0x56),                        // JUMP
//!     Opcode::new(0x5b),                        // JUMPDEST, the exit
//!     Opcode::new(0x00),                        // STOP
//! ];
//!
//! let contract = Contract::new(
//!     bytes,
//!     Chain::Ethereum {
//!         version: EthereumVersion::Shanghai,
//!     },
//! );
//!
//! let analyzer = bfa::new(contract, Config::default()).analyze().unwrap();
//! let loops = analyzer.report().loops;
//!
//! assert_eq!(loops.len(), 1);
//! assert_eq!(loops[0].target, 0x01);
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod analyzer;
pub mod constant;
pub mod contract;
pub mod disassembly;
pub mod error;
pub mod flow;
pub mod opcode;
pub mod query;

// Re-exports to provide the library interface.
pub use analyzer::new;
pub use disassembly::{Instruction, Program};
pub use query::stats::Report;
