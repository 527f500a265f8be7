//! RPC-compatible types for the mock chain.
//!
//! These types are JSON-serializable versions of the registrar types, with
//! addresses, ids and hashes as `0x`-prefixed hex strings.

use registrar_module::{AuctionInfo, AuctionParams, NameListing, Receipt, RegistrarEvent};
use registrar_types::{to_hex, Address, AuctionPhase, NameId};
use serde::{Deserialize, Serialize};

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for committing a sealed bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitBidParams {
    pub sender: String,
    /// Hex-encoded name id (32 bytes)
    pub id: String,
    /// Hex-encoded sealed bid hash (32 bytes)
    pub sealed_hash: String,
    /// Attached value; must equal the reserve price
    pub value: u64,
}

/// Parameters for revealing a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealBidParams {
    pub sender: String,
    pub name: String,
    pub amount: u64,
    /// Hex-encoded salt (32 bytes)
    pub salt: String,
}

/// Event for RPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRpc {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owner, bidder, winner, target or caller depending on `kind`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&RegistrarEvent> for EventRpc {
    fn from(e: &RegistrarEvent) -> Self {
        match e {
            RegistrarEvent::NameRegistered { id, owner, name } => Self {
                detail: Some(name.clone()),
                ..event("NameRegistered", Some(id), owner)
            },
            RegistrarEvent::ResolveSet { id, target } => event("ResolveSet", Some(id), target),
            RegistrarEvent::AuctionStarted {
                id,
                round,
                commit_end,
                reveal_end,
            } => Self {
                kind: "AuctionStarted".to_string(),
                id: Some(to_hex(id)),
                detail: Some(format!(
                    "round={round} commit_end={commit_end} reveal_end={reveal_end}"
                )),
                ..Self::default()
            },
            RegistrarEvent::BidCommitted { id, bidder } => event("BidCommitted", Some(id), bidder),
            RegistrarEvent::BidRevealed { id, bidder, amount } => Self {
                amount: Some(*amount),
                ..event("BidRevealed", Some(id), bidder)
            },
            RegistrarEvent::AuctionFinalized { id, winner, amount } => Self {
                amount: Some(*amount),
                ..event("AuctionFinalized", Some(id), winner)
            },
            RegistrarEvent::Withdrawn { id, bidder, amount } => Self {
                amount: Some(*amount),
                ..event("Withdrawn", Some(id), bidder)
            },
            RegistrarEvent::ProceedsWithdrawn { to, amount } => Self {
                amount: Some(*amount),
                ..event("ProceedsWithdrawn", None, to)
            },
            RegistrarEvent::Paused { component, by } => Self {
                detail: Some(format!("{component:?}")),
                ..event("Paused", None, by)
            },
            RegistrarEvent::Unpaused { component, by } => Self {
                detail: Some(format!("{component:?}")),
                ..event("Unpaused", None, by)
            },
        }
    }
}

fn event(kind: &str, id: Option<&NameId>, account: &Address) -> EventRpc {
    EventRpc {
        kind: kind.to_string(),
        id: id.map(|id| to_hex(id)),
        account: Some(to_hex(account)),
        ..EventRpc::default()
    }
}

/// Receipt for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptRpc {
    pub tx_index: u64,
    pub block_height: u64,
    pub timestamp: u64,
    pub sender: String,
    pub events: Vec<EventRpc>,
}

impl From<Receipt> for ReceiptRpc {
    fn from(r: Receipt) -> Self {
        Self {
            tx_index: r.tx_index,
            block_height: r.block_height,
            timestamp: r.timestamp,
            sender: to_hex(&r.sender),
            events: r.events.iter().map(EventRpc::from).collect(),
        }
    }
}

/// Registered name for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameListingRpc {
    pub id: String,
    pub name: String,
    pub owner: String,
}

impl From<NameListing> for NameListingRpc {
    fn from(n: NameListing) -> Self {
        Self {
            id: to_hex(&n.id),
            name: n.name,
            owner: to_hex(&n.owner),
        }
    }
}

/// Auction info for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionInfoRpc {
    pub id: String,
    pub name: String,
    pub round: u32,
    pub commit_end: u64,
    pub reveal_end: u64,
    pub finalized: bool,
    pub highest_bidder: String,
    pub highest_bid: u64,
    /// "uncommitted", "commit", "reveal", "closed" or "finalized"
    pub phase: String,
    pub num_commitments: usize,
}

impl From<AuctionInfo> for AuctionInfoRpc {
    fn from(a: AuctionInfo) -> Self {
        Self {
            id: to_hex(&a.id),
            name: a.name,
            round: a.round,
            commit_end: a.commit_end,
            reveal_end: a.reveal_end,
            finalized: a.finalized,
            highest_bidder: to_hex(&a.highest_bidder),
            highest_bid: a.highest_bid,
            phase: phase_name(a.phase).to_string(),
            num_commitments: a.num_commitments,
        }
    }
}

pub fn phase_name(phase: AuctionPhase) -> &'static str {
    match phase {
        AuctionPhase::Uncommitted => "uncommitted",
        AuctionPhase::Commit => "commit",
        AuctionPhase::Reveal => "reveal",
        AuctionPhase::Closed => "closed",
        AuctionPhase::Finalized => "finalized",
    }
}

/// Auction parameters for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsRpc {
    pub reserve_price: u64,
    pub commit_duration: u64,
    pub reveal_duration: u64,
    pub default_expiry: u64,
}

impl From<AuctionParams> for ParamsRpc {
    fn from(p: AuctionParams) -> Self {
        Self {
            reserve_price: p.reserve_price,
            commit_duration: p.commit_duration,
            reveal_duration: p.reveal_duration,
            default_expiry: p.default_expiry,
        }
    }
}

/// Pause status for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseStatusRpc {
    pub registry: bool,
    pub auction_house: bool,
}
