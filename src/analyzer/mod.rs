//! This module contains the definition of the analyzer itself.

pub mod chain;
pub mod config;
pub mod state;

use crate::{
    analyzer::{config::Config, state::State},
    contract::Contract,
    disassembly::Program,
    error::{self, container::Locatable, disassembly},
    query::stats::Report,
};

/// Creates a new analyzer wrapping the provided `contract`, which will be
/// analyzed according to `config`.
#[must_use]
pub fn new(contract: Contract, config: Config) -> Analyzer<state::HasContract> {
    let state = state::HasContract;
    Analyzer {
        contract,
        config,
        state,
    }
}

/// The analyzer is responsible for taking a contract through decoding and
/// control-flow analysis, and reporting on the result.
///
/// # Basic Usage
///
/// For the most basic usage of the library, it is sufficient to construct an
/// `Analyzer` and call the `.analyze` method, then ask for the
/// [`Analyzer::report`].
///
/// ```
/// use bytecode_flow_analyzer::{analyzer::config::Config, contract::Contract};
///
/// let contract = Contract::from_hex("0x5b600056", Default::default()).unwrap();
/// let analyzer = bytecode_flow_analyzer::new(contract, Config::default()).analyze().unwrap();
///
/// assert_eq!(analyzer.report().loops.len(), 1);
/// ```
///
/// # Enforcing Valid State Transitions
///
/// The analyzer enforces that only correct state transitions can occur through
/// use of structs that implement the exact state required by it at any given
/// point.
///
/// There is the [`Self::state`] function that provides access to the state data
/// of whichever state it is in.
pub struct Analyzer<S: State> {
    /// The contract that is being analyzed.
    contract: Contract,

    /// The configuration for the analysis.
    config: Config,

    /// The internal state of the analyzer.
    state: S,
}

/// Safe operations available in all states.
impl<S: State> Analyzer<S> {
    /// Gets a reference to the contract being analyzed.
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Gets a reference to the configuration of the analysis.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets a reference to the current state of the analyzer.
    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Unsafe operations available in all states.
///
/// These operations are capable of **violating the state invariants** of the
/// analyzer, and must be used with the _utmost_ care.
impl<S: State> Analyzer<S> {
    /// Forces the analyzer into `new_state`, disregarding any safety with
    /// regards to state transitions.
    ///
    /// # Safety
    ///
    /// Do not force a state transition for the analyzer unless you totally
    /// understand the state that the analyzer is in, and the implications
    /// of doing so.
    pub unsafe fn set_state<NS: State>(self, new_state: NS) -> Analyzer<NS> {
        Analyzer {
            contract: self.contract,
            config:   self.config,
            state:    new_state,
        }
    }

    /// Forces the analyzer into the state `NS`, with the value of the state
    /// created by applying `transform` to the analyzer's current state and
    /// disregarding any safety with regard to state transitions.
    ///
    /// # Safety
    ///
    /// Do not force a state transition for the analyzer unless you totally
    /// understand the state that the analyzer is in, and the implications
    /// of doing so.
    pub unsafe fn transform_state<NS: State>(
        self,
        transform: impl FnOnce(S) -> error::Result<NS>,
    ) -> error::Result<Analyzer<NS>> {
        let state = transform(self.state)?;

        Ok(Analyzer {
            contract: self.contract,
            config: self.config,
            state,
        })
    }
}

/// Operations available on a newly-created analyzer.
impl Analyzer<state::HasContract> {
    /// Executes the analysis process from beginning to end, performing all the
    /// intermediate steps automatically.
    ///
    /// # Errors
    ///
    /// If the contract cannot be disassembled.
    pub fn analyze(self) -> error::Result<Analyzer<state::FlowAnalyzed>> {
        let analyzer = self.disassemble()?;
        let analyzer = analyzer.analyze_flow()?;

        Ok(analyzer)
    }

    /// Performs the disassembly process to turn the input contract code into a
    /// [`Program`], using the instruction set of the contract's chain.
    ///
    /// # Errors
    ///
    /// If the contract's code exceeds the configured maximum size, or is too
    /// large to address.
    pub fn disassemble(self) -> error::Result<Analyzer<state::Disassembled>> {
        let bytecode = self.contract.bytecode();
        if let Some(limit) = self.config.maximum_code_size {
            if bytecode.len() > limit {
                let error = disassembly::Error::CodeTooLarge {
                    size: bytecode.len(),
                    limit,
                };
                return Err(error.locate(0).into());
            }
        }

        let instruction_set = self.contract.chain().instruction_set();
        let program = Program::new(bytecode.as_slice(), instruction_set)?
            .with_flow_config(self.config.flow);
        tracing::debug!(
            fork = %program.instruction_set().version(),
            instructions = program.instructions().len(),
            "disassembled contract"
        );

        let state = state::Disassembled { program };
        Ok(unsafe { self.set_state(state) })
    }
}

/// Operations available on an analyzer that has completed the disassembly of
/// the bytecode.
impl Analyzer<state::Disassembled> {
    /// Gets the decoded program.
    pub fn program(&self) -> &Program {
        &self.state.program
    }

    /// Computes the jump destinations and control-flow graph of the program.
    ///
    /// # Errors
    ///
    /// This step cannot currently fail, but returns a result to keep the
    /// transitions of the analyzer uniform.
    pub fn analyze_flow(self) -> error::Result<Analyzer<state::FlowAnalyzed>> {
        unsafe {
            self.transform_state(|old_state| {
                let program = old_state.program;
                let cfg = program.control_flow();
                tracing::debug!(
                    destinations = program.jump_destinations().len(),
                    blocks = cfg.blocks().len(),
                    loops = cfg.loops().len(),
                    "analyzed control flow"
                );

                Ok(state::FlowAnalyzed { program })
            })
        }
    }
}

/// Operations available on an analyzer that has completed control-flow
/// analysis.
impl Analyzer<state::FlowAnalyzed> {
    /// Gets the decoded program, with its control-flow graph computed.
    pub fn program(&self) -> &Program {
        &self.state.program
    }

    /// Builds the full report on the program.
    pub fn report(&self) -> Report {
        Report::new(&self.state.program, self.config.report_options())
    }
}
