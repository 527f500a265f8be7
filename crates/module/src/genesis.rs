//! Genesis configuration for the registrar.
//!
//! This module defines the component owners, auction parameters and initial
//! account balances the ledger starts from.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::collections::HashSet;

use registrar_types::{to_hex, Address, Amount, ZERO_ADDRESS};

/// Genesis configuration for the registrar.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrarGenesisConfig {
    /// Owner of the registry's pause guard
    #[serde_as(as = "Hex")]
    pub registry_owner: Address,

    /// Owner of the auction house's pause guard and its proceeds
    #[serde_as(as = "Hex")]
    pub auction_owner: Address,

    /// Auction timing and economics
    #[serde(default)]
    pub params: AuctionParams,

    /// Pre-funded accounts
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
}

/// A pre-funded account.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisAccount {
    #[serde_as(as = "Hex")]
    pub address: Address,
    pub balance: Amount,
}

/// Parameters shared by every auction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionParams {
    /// Flat deposit attached to every commitment
    pub reserve_price: Amount,
    /// Length of the commit window (seconds)
    pub commit_duration: u64,
    /// Length of the reveal window (seconds)
    pub reveal_duration: u64,
    /// Advisory lifetime recorded for a won name (seconds)
    pub default_expiry: u64,
}

impl Default for AuctionParams {
    fn default() -> Self {
        Self {
            reserve_price: 1,
            commit_duration: 1000,
            reveal_duration: 1000,
            default_expiry: 31_536_000, // 365 days
        }
    }
}

impl RegistrarGenesisConfig {
    /// Genesis with a single owner for both components.
    pub fn with_owner(owner: Address) -> Self {
        Self {
            registry_owner: owner,
            auction_owner: owner,
            params: AuctionParams::default(),
            accounts: Vec::new(),
        }
    }

    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.registry_owner == ZERO_ADDRESS || self.auction_owner == ZERO_ADDRESS {
            return Err(GenesisValidationError::ZeroOwner);
        }

        if self.params.commit_duration == 0 || self.params.reveal_duration == 0 {
            return Err(GenesisValidationError::InvalidParams(
                "Commit and reveal durations must be non-zero".into(),
            ));
        }

        if self.params.reserve_price == 0 {
            return Err(GenesisValidationError::InvalidParams(
                "Reserve price must be non-zero".into(),
            ));
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.address) {
                return Err(GenesisValidationError::DuplicateAccount(to_hex(
                    &account.address,
                )));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Component owner cannot be the zero address")]
    ZeroOwner,

    #[error("Invalid auction parameters: {0}")]
    InvalidParams(String),

    #[error("Duplicate genesis account {0}")]
    DuplicateAccount(String),
}
