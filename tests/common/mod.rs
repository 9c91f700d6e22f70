//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]

use bytecode_flow_analyzer as bfa;
use bytecode_flow_analyzer::{
    analyzer::{
        chain::{
            version::{ChainVersion, EthereumVersion},
            Chain,
        },
        config::Config,
        state::FlowAnalyzed,
        Analyzer,
    },
    contract::Contract,
};

/// The runtime code of a contract that hashes in a loop ten thousand times,
/// as emitted by `solc` including the trailing CBOR metadata.
///
/// ```solidity
/// function Benchmark() external {
///     for (uint256 i = 0; i < 20000; i++) {
///         keccak256(abi.encodePacked(i));
///     }
/// }
/// ```
#[allow(unused)] // It is actually
pub const TEN_THOUSAND_HASHES: &str = "0x6080604052348015600e575f5ffd5b50600436106026575f3560e01c806330627b7c14602a575b5f5ffd5b60306032565b005b5f5b614e20811015605e5760408051602081018390520160408051601f19818403019052526001016034565b5056fea26469706673582212202c247f39d615d7f66942cd6ed505d8ea34fbfcbe16ac875ed08c4a9c229325f364736f6c634300081e0033";

/// The offset at which the CBOR metadata starts in [`TEN_THOUSAND_HASHES`].
#[allow(unused)] // It is actually
pub const TEN_THOUSAND_HASHES_CODE_SIZE: usize = 98;

/// Gets [`TEN_THOUSAND_HASHES`] with the metadata removed.
#[allow(unused)] // It is actually
pub fn ten_thousand_hashes_without_metadata() -> &'static str {
    &TEN_THOUSAND_HASHES[..2 + TEN_THOUSAND_HASHES_CODE_SIZE * 2]
}

/// Runs the analyzer to completion on the hex-encoded (with or without the
/// `0x` prefix) contract bytecode provided in `code`.
///
/// It uses the default configuration and the latest fork.
#[allow(unused)] // It is actually
pub fn analyze_hex(code: &str) -> anyhow::Result<Analyzer<FlowAnalyzed>> {
    analyze_hex_with(code, Config::default())
}

/// Runs the analyzer to completion on the hex-encoded contract bytecode in
/// `code` using the provided `config`.
#[allow(unused)] // It is actually
pub fn analyze_hex_with(code: &str, config: Config) -> anyhow::Result<Analyzer<FlowAnalyzed>> {
    let contract = Contract::from_hex(
        code,
        Chain::Ethereum {
            version: EthereumVersion::latest(),
        },
    )?;

    Ok(bfa::new(contract, config).analyze()?)
}
