//! Ledger-resident state for the registry and the auction house.

use registrar_types::{Address, Amount, AuctionRecord, Commitment, NameId, RegistryRecord};
use std::collections::HashMap;

use crate::events::RegistrarEvent;
use crate::genesis::{AuctionParams, RegistrarGenesisConfig};
use crate::guard::PauseGuard;

/// Registry state: name ownership and resolution targets.
#[derive(Clone, Debug)]
pub struct RegistryState {
    pub guard: PauseGuard,

    /// Records by name id
    pub records: HashMap<NameId, RegistryRecord>,

    /// Name ids in registration order
    pub names: Vec<NameId>,
}

impl RegistryState {
    pub fn new(owner: Address) -> Self {
        Self {
            guard: PauseGuard::new(owner),
            records: HashMap::new(),
            names: Vec::new(),
        }
    }

    pub fn get_record(&self, id: &NameId) -> Option<&RegistryRecord> {
        self.records.get(id)
    }

    pub fn is_registered(&self, id: &NameId) -> bool {
        self.records.contains_key(id)
    }
}

/// Auction house state.
#[derive(Clone, Debug)]
pub struct AuctionHouseState {
    pub guard: PauseGuard,

    pub params: AuctionParams,

    /// Auctions by name id
    pub auctions: HashMap<NameId, AuctionRecord>,

    /// Name ids in the order their auctions were first opened
    pub auction_ids: Vec<NameId>,

    /// Current-round commitments: (name id, bidder) -> commitment
    pub commitments: HashMap<(NameId, Address), Commitment>,

    /// Bidders per auction, in commit order
    pub auction_bidders: HashMap<NameId, Vec<Address>>,

    /// Unrefunded deposits carried over from winnerless earlier rounds
    pub credits: HashMap<(NameId, Address), Amount>,

    /// Advisory expiry of won names
    pub expirations: HashMap<NameId, u64>,

    /// Deposits still owed back to bidders
    pub escrow: Amount,

    /// Winners' deposits, withdrawable by the owner
    pub proceeds: Amount,
}

impl AuctionHouseState {
    pub fn new(owner: Address, params: AuctionParams) -> Self {
        Self {
            guard: PauseGuard::new(owner),
            params,
            auctions: HashMap::new(),
            auction_ids: Vec::new(),
            commitments: HashMap::new(),
            auction_bidders: HashMap::new(),
            credits: HashMap::new(),
            expirations: HashMap::new(),
            escrow: 0,
            proceeds: 0,
        }
    }

    pub fn get_auction(&self, id: &NameId) -> Option<&AuctionRecord> {
        self.auctions.get(id)
    }

    pub fn get_auction_mut(&mut self, id: &NameId) -> Option<&mut AuctionRecord> {
        self.auctions.get_mut(id)
    }

    pub fn get_commitment(&self, id: &NameId, bidder: &Address) -> Option<&Commitment> {
        self.commitments.get(&(*id, *bidder))
    }

    /// Get carried-over credit for a bidder.
    pub fn get_credit(&self, id: &NameId, bidder: &Address) -> Amount {
        self.credits.get(&(*id, *bidder)).copied().unwrap_or(0)
    }

    /// Amount `bidder` could withdraw for `id` once the auction allows it.
    ///
    /// The winner's deposit is excluded after finalization.
    pub fn get_deposit(&self, id: &NameId, bidder: &Address) -> Amount {
        let current = match (self.get_auction(id), self.get_commitment(id, bidder)) {
            (Some(auction), Some(c)) if !c.refunded => {
                if auction.finalized && auction.highest_bidder == *bidder {
                    0
                } else {
                    c.deposit
                }
            }
            _ => 0,
        };
        current + self.get_credit(id, bidder)
    }

    /// Get all commitments for an auction's current round.
    pub fn get_auction_commitments(&self, id: &NameId) -> Vec<&Commitment> {
        self.auction_bidders
            .get(id)
            .map(|bidders| {
                bidders
                    .iter()
                    .filter_map(|bidder| self.commitments.get(&(*id, *bidder)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Full registrar state.
#[derive(Clone, Debug)]
pub struct RegistrarState {
    pub registry: RegistryState,
    pub auction_house: AuctionHouseState,

    /// Append-only event log
    pub event_log: Vec<RegistrarEvent>,
}

impl RegistrarState {
    /// Create state from a validated genesis config.
    pub fn from_genesis(config: &RegistrarGenesisConfig) -> Self {
        Self {
            registry: RegistryState::new(config.registry_owner),
            auction_house: AuctionHouseState::new(config.auction_owner, config.params.clone()),
            event_log: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: RegistrarEvent) {
        self.event_log.push(event);
    }
}
