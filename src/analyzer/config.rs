//! This module contains the configuration for the analyzer.

use crate::{
    constant::{CONTRACT_MAXIMUM_SIZE_BYTES, DEFAULT_SEQUENCE_LENGTH, DEFAULT_SEQUENCE_TOP},
    flow,
    query::stats::ReportOptions,
};

/// The configuration for the analysis of a contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// The configuration for building the control-flow graph.
    pub flow: flow::Config,

    /// The largest contract, in bytes, that will be analyzed, or [`None`] for
    /// no limit beyond what offsets can address.
    ///
    /// Defaults to [`None`]. Use [`CONTRACT_MAXIMUM_SIZE_BYTES`] to only
    /// accept contracts that could be deployed.
    pub maximum_code_size: Option<usize>,

    /// The length of the instruction sequences counted in the report.
    ///
    /// Defaults to [`DEFAULT_SEQUENCE_LENGTH`].
    pub sequence_length: usize,

    /// The number of most frequent instruction sequences kept in the report.
    ///
    /// Defaults to [`DEFAULT_SEQUENCE_TOP`].
    pub sequence_top: usize,
}

impl Config {
    /// Sets the control-flow configuration to `value`.
    #[must_use]
    pub fn with_flow(mut self, value: flow::Config) -> Self {
        self.flow = value;
        self
    }

    /// Sets whether halting instructions end basic blocks.
    #[must_use]
    pub fn with_halts_end_blocks(mut self, value: bool) -> Self {
        self.flow = self.flow.with_halts_end_blocks(value);
        self
    }

    /// Sets the maximum code size to `value`.
    #[must_use]
    pub fn with_maximum_code_size(mut self, value: Option<usize>) -> Self {
        self.maximum_code_size = value;
        self
    }

    /// Limits the code size to what can be deployed on chain.
    #[must_use]
    pub fn with_deployable_code_size(self) -> Self {
        self.with_maximum_code_size(Some(CONTRACT_MAXIMUM_SIZE_BYTES))
    }

    /// Sets the length of the counted instruction sequences to `value`.
    #[must_use]
    pub fn with_sequence_length(mut self, value: usize) -> Self {
        self.sequence_length = value;
        self
    }

    /// Sets the number of reported instruction sequences to `value`.
    #[must_use]
    pub fn with_sequence_top(mut self, value: usize) -> Self {
        self.sequence_top = value;
        self
    }

    /// Gets the options for building a report.
    #[must_use]
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            sequence_length: self.sequence_length,
            sequence_top:    self.sequence_top,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flow:              flow::Config::default(),
            maximum_code_size: None,
            sequence_length:   DEFAULT_SEQUENCE_LENGTH,
            sequence_top:      DEFAULT_SEQUENCE_TOP,
        }
    }
}
