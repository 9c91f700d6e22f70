//! This module contains versioning information for the various EVM-compatible
//! blockchains.
//!
//! A version only matters to the analysis in so far as it changes the set of
//! opcodes that are defined, so only the forks that introduced opcodes are
//! represented here.

use std::{fmt::Debug, str::FromStr};

use serde::Serialize;

/// A trait for types that can represent a chain version.
pub trait ChainVersion
where
    Self: Sized + Clone + Debug + Eq + PartialEq,
{
    /// Gets the latest version of the chain.
    fn latest() -> Self;
}

/// Ethereum chain versions, in the order in which they were deployed.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum EthereumVersion {
    Frontier,
    Homestead,
    Byzantium,
    Constantinople,
    Istanbul,
    London,
    Shanghai,
    Cancun,
}

impl EthereumVersion {
    /// All of the known versions, oldest first.
    pub const ALL: [Self; 8] = [
        Self::Frontier,
        Self::Homestead,
        Self::Byzantium,
        Self::Constantinople,
        Self::Istanbul,
        Self::London,
        Self::Shanghai,
        Self::Cancun,
    ];

    /// Gets the lower-case name of the fork.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Frontier => "frontier",
            Self::Homestead => "homestead",
            Self::Byzantium => "byzantium",
            Self::Constantinople => "constantinople",
            Self::Istanbul => "istanbul",
            Self::London => "london",
            Self::Shanghai => "shanghai",
            Self::Cancun => "cancun",
        }
    }
}

impl ChainVersion for EthereumVersion {
    fn latest() -> Self {
        Self::Cancun
    }
}

impl Default for EthereumVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl std::fmt::Display for EthereumVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parses a fork name case-insensitively.
impl FromStr for EthereumVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|version| version.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown Ethereum fork {s:?}"))
    }
}

#[cfg(test)]
mod test {
    use crate::analyzer::chain::version::{ChainVersion, EthereumVersion};

    #[test]
    fn versions_are_ordered_by_deployment() {
        assert!(EthereumVersion::Frontier < EthereumVersion::Shanghai);
        assert!(EthereumVersion::Shanghai < EthereumVersion::latest());
    }

    #[test]
    fn parses_fork_names() {
        assert_eq!("Shanghai".parse(), Ok(EthereumVersion::Shanghai));
        assert_eq!("cancun".parse(), Ok(EthereumVersion::Cancun));
        assert!("paris".parse::<EthereumVersion>().is_err());
    }
}
