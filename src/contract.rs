//! This module contains types useful for dealing with concrete contracts that
//! you want to analyze.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{analyzer::chain::Chain, disassembly::reader, error};

/// A representation of a contract that is passed to the library.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contract {
    bytecode: Vec<u8>,
    chain:    Chain,
}

impl Contract {
    /// Creates a new contract from the provided `bytecode` and `chain`.
    #[must_use]
    pub fn new(bytecode: Vec<u8>, chain: Chain) -> Self {
        Self { bytecode, chain }
    }

    /// Creates a new contract from the hexadecimal string `hex`, which may
    /// carry a `0x` prefix.
    ///
    /// # Errors
    ///
    /// If `hex` is not valid hexadecimal.
    pub fn from_hex(hex: &str, chain: Chain) -> error::Result<Self> {
        let bytecode = reader::parse(hex)?;
        Ok(Self { bytecode, chain })
    }

    /// Creates a new contract from the file at the provided `path`.
    ///
    /// The file is either the JSON output of compiling a Solidity contract,
    /// from which the deployed bytecode is read, or a text file holding the
    /// bytecode as hex. Whitespace around the hex is ignored.
    ///
    /// Both the `forge` layout (`deployedBytecode.object`) and the `hardhat`
    /// layout (`deployedBytecode` as a string) of compiled contracts are
    /// understood.
    ///
    /// # Errors
    ///
    /// If the file cannot be read, is not a compiled contract, or does not
    /// contain valid hex.
    pub fn new_from_file(path: impl AsRef<Path>, chain: Chain) -> error::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| error::Error::ContractFile {
            path:   path.display().to_string(),
            reason: e.to_string(),
        })?;
        let contents = contents.trim();

        if contents.starts_with('{') {
            let compiled: CompiledContract =
                serde_json::from_str(contents).map_err(|e| error::Error::ContractFile {
                    path:   path.display().to_string(),
                    reason: e.to_string(),
                })?;
            Self::from_hex(compiled.deployed_bytecode.object(), chain)
        } else {
            Self::from_hex(contents, chain)
        }
    }

    /// Gets a reference to the bytecode of the contract.
    #[must_use]
    pub fn bytecode(&self) -> &Vec<u8> {
        &self.bytecode
    }

    /// Gets a reference to the chain on which the contract is running.
    #[must_use]
    pub fn chain(&self) -> &Chain {
        &self.chain
    }
}

/// A wrapper for the parts of the JSON representation of the compiled contract
/// on disk that we care about.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledContract {
    deployed_bytecode: DeployedBytecode,
}

/// The deployed bytecode, either as an object holding the hex or as the hex
/// itself.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeployedBytecode {
    Object { object: String },
    Hex(String),
}

impl DeployedBytecode {
    /// Gets the hex encoding of the bytecode.
    #[must_use]
    pub fn object(&self) -> &str {
        match self {
            Self::Object { object } => object,
            Self::Hex(hex) => hex,
        }
    }
}

#[cfg(test)]
mod test {
    use std::{env, fs, process};

    use crate::{analyzer::chain::Chain, contract::Contract};

    fn write_temp(name: &str, contents: &str) -> anyhow::Result<std::path::PathBuf> {
        let path = env::temp_dir().join(format!("{}-{name}", process::id()));
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn reads_hex_contracts() -> anyhow::Result<()> {
        let contract = Contract::from_hex("0x6001", Chain::default())?;
        assert_eq!(contract.bytecode(), &vec![0x60, 0x01]);

        Ok(())
    }

    #[test]
    fn reads_compiled_contracts_from_file() -> anyhow::Result<()> {
        let forge = write_temp(
            "forge.json",
            r#"{"abi": [], "deployedBytecode": {"object": "0x5b00", "linkReferences": {}}}"#,
        )?;
        let hardhat = write_temp("hardhat.json", r#"{"deployedBytecode": "0x5b00"}"#)?;

        for path in [forge, hardhat] {
            let contract = Contract::new_from_file(&path, Chain::default())?;
            assert_eq!(contract.bytecode(), &vec![0x5b, 0x00]);
            fs::remove_file(path)?;
        }

        Ok(())
    }

    #[test]
    fn reads_bare_hex_from_file() -> anyhow::Result<()> {
        let path = write_temp("bare.hex", "  0x600456\n")?;
        let contract = Contract::new_from_file(&path, Chain::default())?;
        assert_eq!(contract.bytecode(), &vec![0x60, 0x04, 0x56]);
        fs::remove_file(path)?;

        Ok(())
    }

    #[test]
    fn reports_missing_files() {
        let result = Contract::new_from_file("/does/not/exist.json", Chain::default());
        assert!(result.is_err());
    }
}
