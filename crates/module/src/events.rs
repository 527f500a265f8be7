//! Events emitted by successful calls.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use registrar_types::{Address, Amount, NameId};

/// Component carrying its own pause guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum Component {
    Registry,
    AuctionHouse,
}

/// Structured event appended to the ledger log.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum RegistrarEvent {
    /// A name was claimed. `name` is empty for hash-only registration.
    NameRegistered {
        id: NameId,
        owner: Address,
        name: String,
    },

    ResolveSet {
        id: NameId,
        target: Address,
    },

    /// A fresh auction round opened its commit window.
    AuctionStarted {
        id: NameId,
        round: u32,
        commit_end: u64,
        reveal_end: u64,
    },

    BidCommitted {
        id: NameId,
        bidder: Address,
    },

    BidRevealed {
        id: NameId,
        bidder: Address,
        amount: Amount,
    },

    /// `winner` is the zero address when nobody revealed.
    AuctionFinalized {
        id: NameId,
        winner: Address,
        amount: Amount,
    },

    Withdrawn {
        id: NameId,
        bidder: Address,
        amount: Amount,
    },

    ProceedsWithdrawn {
        to: Address,
        amount: Amount,
    },

    Paused {
        component: Component,
        by: Address,
    },

    Unpaused {
        component: Component,
        by: Address,
    },
}
