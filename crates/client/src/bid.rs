//! Sealed bid preparation.
//!
//! The salt is the only secret in a bid. It never reaches the ledger before
//! the reveal, so the caller must keep the [`PreparedBid`] until then.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use thiserror::Error;

use registrar_module::RegistrarCall;
use registrar_types::{
    normalize, sealed_bid_hash, Address, Amount, BidHash, CanonicalName, NameError, NameId, Salt,
    ZERO_ADDRESS,
};

/// Errors that can occur during bid preparation.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("Bid amount must be non-zero")]
    ZeroAmount,

    #[error("Bidder cannot be the zero address")]
    ZeroBidder,
}

/// A prepared bid ready for commitment.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedBid {
    /// Canonical name being bid on
    pub name: CanonicalName,
    /// Name id committed to
    #[serde_as(as = "Hex")]
    pub id: NameId,
    /// Bid amount (revealed later)
    pub amount: Amount,
    /// Secret salt (keep until reveal)
    #[serde_as(as = "Hex")]
    pub salt: Salt,
    /// Address the bid is bound to
    #[serde_as(as = "Hex")]
    pub bidder: Address,
    /// Hash submitted at commit time
    #[serde_as(as = "Hex")]
    pub sealed_hash: BidHash,
}

impl PreparedBid {
    /// Recompute the sealed hash from the stored fields.
    pub fn verify(&self) -> bool {
        self.id == self.name.id()
            && sealed_bid_hash(&self.name, self.amount, &self.salt, &self.bidder)
                == self.sealed_hash
    }

    /// The commit call for this bid. Attach the reserve price as value.
    pub fn commit_call(&self) -> RegistrarCall {
        RegistrarCall::CommitBid {
            id: self.id,
            sealed_hash: self.sealed_hash,
        }
    }

    /// The reveal call for this bid.
    pub fn reveal_call(&self) -> RegistrarCall {
        RegistrarCall::RevealBid {
            name: self.name.to_string(),
            amount: self.amount,
            salt: self.salt,
        }
    }
}

/// Prepare a sealed bid on `name` with a fresh random salt.
///
/// # Arguments
/// * `name` - Raw name; normalized the same way the registrar does
/// * `amount` - The bid amount
/// * `bidder` - Address that will commit and reveal
/// * `rng` - Cryptographically secure random number generator
pub fn prepare_bid<R: RngCore + CryptoRng>(
    name: &str,
    amount: Amount,
    bidder: Address,
    rng: &mut R,
) -> Result<PreparedBid, BidError> {
    let mut salt = [0u8; 32];
    rng.fill_bytes(&mut salt);
    seal_bid(name, amount, bidder, salt)
}

/// Seal a bid with a caller-chosen salt.
pub fn seal_bid(
    name: &str,
    amount: Amount,
    bidder: Address,
    salt: Salt,
) -> Result<PreparedBid, BidError> {
    let name = normalize(name)?;
    if amount == 0 {
        return Err(BidError::ZeroAmount);
    }
    if bidder == ZERO_ADDRESS {
        return Err(BidError::ZeroBidder);
    }

    Ok(PreparedBid {
        id: name.id(),
        sealed_hash: sealed_bid_hash(&name, amount, &salt, &bidder),
        name,
        amount,
        salt,
        bidder,
    })
}

/// Builder for creating bids with additional options.
pub struct BidBuilder {
    name: String,
    bidder: Address,
    amount: Amount,
    salt: Option<Salt>,
}

impl BidBuilder {
    /// Create a new bid builder.
    pub fn new(name: impl Into<String>, bidder: Address) -> Self {
        Self {
            name: name.into(),
            bidder,
            amount: 0,
            salt: None,
        }
    }

    /// Set the bid amount.
    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    /// Use a fixed salt instead of a random one.
    pub fn salt(mut self, salt: Salt) -> Self {
        self.salt = Some(salt);
        self
    }

    /// Build the prepared bid.
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<PreparedBid, BidError> {
        match self.salt {
            Some(salt) => seal_bid(&self.name, self.amount, self.bidder, salt),
            None => prepare_bid(&self.name, self.amount, self.bidder, rng),
        }
    }
}
