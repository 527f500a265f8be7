//! Call message types for the registrar.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::events::Component;
use registrar_types::{Address, Amount, BidHash, NameId, Salt};

/// State-changing calls accepted by the ledger.
///
/// Hash-only registration has no call; only the finalize path reaches it.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum RegistrarCall {
    // === Registry ===
    /// Claim a name directly, without an auction.
    Register { name: String, owner: Address },

    /// Point a name at a payment target (owner only).
    SetResolve { name: String, target: Address },

    // === Auction Lifecycle ===
    /// Commit a sealed bid. Must carry exactly the reserve as value.
    CommitBid { id: NameId, sealed_hash: BidHash },

    /// Open an auction for a name without bidding.
    StartAuction { name: String },

    /// Reveal a previously committed bid.
    RevealBid {
        name: String,
        amount: Amount,
        salt: Salt,
    },

    /// Settle an auction (permissionless).
    FinalizeAuction { name: String },

    /// Reclaim a losing or carried-over deposit.
    Withdraw { id: NameId },

    // === Admin ===
    /// Move accumulated proceeds out (auction owner only).
    WithdrawProceeds { to: Address },

    Pause { component: Component },

    Unpause { component: Component },
}

impl RegistrarCall {
    /// Short method name used in logs.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::SetResolve { .. } => "set_resolve",
            Self::CommitBid { .. } => "commit_bid",
            Self::StartAuction { .. } => "start_auction",
            Self::RevealBid { .. } => "reveal_bid",
            Self::FinalizeAuction { .. } => "finalize_auction",
            Self::Withdraw { .. } => "withdraw",
            Self::WithdrawProceeds { .. } => "withdraw_proceeds",
            Self::Pause { .. } => "pause",
            Self::Unpause { .. } => "unpause",
        }
    }

    /// Whether the call may carry value.
    pub fn is_payable(&self) -> bool {
        matches!(self, Self::CommitBid { .. })
    }
}
