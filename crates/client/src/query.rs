//! Read-side helpers for bidders.

use registrar_module::{AuctionInfo, Ledger, RegistrarQuery, RegistrarQueryResponse};
use registrar_types::{Address, Amount, AuctionPhase, NameId, ZERO_ADDRESS};

use crate::bid::PreparedBid;

/// Query interface for registrar data.
///
/// Implemented for an in-process [`Ledger`]; the CLI reads the same data
/// over JSON-RPC.
pub trait RegistrarView {
    /// Auction details at the current ledger time, if an auction was ever
    /// opened for `id`.
    fn auction_info(&self, id: &NameId) -> Option<AuctionInfo>;

    /// Owner of `id`, zero if unregistered.
    fn owner_of(&self, id: &NameId) -> Address;

    /// Refundable amount for `bidder`.
    fn deposit(&self, id: &NameId, bidder: &Address) -> Amount;
}

impl RegistrarView for Ledger {
    fn auction_info(&self, id: &NameId) -> Option<AuctionInfo> {
        match self.query(RegistrarQuery::GetAuctionInfo { id: *id }) {
            RegistrarQueryResponse::AuctionInfo(info) => info,
            _ => None,
        }
    }

    fn owner_of(&self, id: &NameId) -> Address {
        match self.query(RegistrarQuery::OwnerOf { id: *id }) {
            RegistrarQueryResponse::Owner(owner) => owner,
            _ => ZERO_ADDRESS,
        }
    }

    fn deposit(&self, id: &NameId, bidder: &Address) -> Amount {
        match self.query(RegistrarQuery::GetDeposit {
            id: *id,
            bidder: *bidder,
        }) {
            RegistrarQueryResponse::Deposit(amount) => amount,
            _ => 0,
        }
    }
}

/// What a bidder holding a saved bid should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidAction {
    /// Commit the sealed hash with the reserve attached.
    Commit,
    /// Nothing to do before `until`.
    WaitUntil { until: u64 },
    /// Reveal now, before `deadline`.
    Reveal { deadline: u64 },
    /// Reveal window over; anyone may finalize.
    Finalize,
    /// Reclaim `amount`.
    Withdraw { amount: Amount },
    /// The bidder owns the name.
    Won,
    /// No further action.
    Done,
}

/// Decide the next step for `bid`.
///
/// `committed` is whether the bidder already committed this bid in the
/// current round; the ledger does not expose sealed hashes.
pub fn next_action(view: &impl RegistrarView, bid: &PreparedBid, committed: bool) -> BidAction {
    let owner = view.owner_of(&bid.id);
    if owner == bid.bidder {
        return BidAction::Won;
    }

    let refundable = view.deposit(&bid.id, &bid.bidder);
    let Some(info) = view.auction_info(&bid.id) else {
        return BidAction::Commit;
    };

    match info.phase {
        AuctionPhase::Uncommitted | AuctionPhase::Commit if !committed => BidAction::Commit,
        AuctionPhase::Uncommitted | AuctionPhase::Commit => BidAction::WaitUntil {
            until: info.commit_end,
        },
        AuctionPhase::Reveal if committed => BidAction::Reveal {
            deadline: info.reveal_end,
        },
        AuctionPhase::Reveal => BidAction::WaitUntil {
            until: info.reveal_end,
        },
        AuctionPhase::Closed => BidAction::Finalize,
        AuctionPhase::Finalized if refundable > 0 => BidAction::Withdraw { amount: refundable },
        // A winnerless auction reopens on the next commit.
        AuctionPhase::Finalized if owner == ZERO_ADDRESS => BidAction::Commit,
        AuctionPhase::Finalized => BidAction::Done,
    }
}
