//! Registrar error types.

use thiserror::Error;

use registrar_types::{to_hex, Amount, NameError, NameId};

/// Errors that can occur in the registry or the auction house.
///
/// Every error aborts the whole call; the ledger keeps no partial effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrarError {
    // === Authorization ===
    #[error("Caller does not own this domain")]
    NotDomainOwner,

    #[error("Caller is not the component owner")]
    UnauthorizedAccount,

    #[error("Winner cannot withdraw")]
    WinnerCannotWithdraw,

    // === Lifecycle ===
    #[error("Auction commit phase is closed")]
    AuctionClosed,

    #[error("Bid already committed for this auction")]
    AuctionAlreadyCommitted,

    #[error("Auction already finalized")]
    AuctionAlreadyFinalized,

    #[error("Auction already started")]
    AuctionAlreadyStarted,

    #[error("Reveal phase not ended")]
    AuctionNotEnded,

    #[error("Auction not finalized")]
    AuctionNotFinalized,

    #[error("Reveal phase not open")]
    RevealNotOpen,

    #[error("Reveal phase closed")]
    RevealClosed,

    #[error("Nothing to withdraw")]
    NothingToWithdraw,

    // === Input ===
    #[error("Invalid name format: {0}")]
    InvalidNameFormat(#[from] NameError),

    #[error("Invalid bid reveal")]
    InvalidBidReveal,

    #[error("Incorrect reserve: need {required}, got {got}")]
    IncorrectReserve { required: Amount, got: Amount },

    #[error("Call does not accept value, got {0}")]
    UnexpectedValue(Amount),

    #[error("Recipient cannot be the zero address")]
    ZeroOwner,

    // === Existence ===
    #[error("Domain not registered: {}", to_hex(.0))]
    DomainNotRegistered(NameId),

    #[error("Name already registered: {}", to_hex(.0))]
    NameAlreadyRegistered(NameId),

    #[error("Auction not found: {}", to_hex(.0))]
    AuctionNotFound(NameId),

    // === Availability ===
    #[error("Enforced pause")]
    EnforcedPause,

    #[error("Expected pause")]
    ExpectedPause,

    // === Funds ===
    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Transfer failed")]
    TransferFailed,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl RegistrarError {
    /// Stable kind name, surfaced verbatim to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotDomainOwner => "NotDomainOwner",
            Self::UnauthorizedAccount => "UnauthorizedAccount",
            Self::WinnerCannotWithdraw => "WinnerCannotWithdraw",
            Self::AuctionClosed => "AuctionClosed",
            Self::AuctionAlreadyCommitted => "AuctionAlreadyCommitted",
            Self::AuctionAlreadyFinalized => "AuctionAlreadyFinalized",
            Self::AuctionAlreadyStarted => "AuctionAlreadyStarted",
            Self::AuctionNotEnded => "AuctionNotEnded",
            Self::AuctionNotFinalized => "AuctionNotFinalized",
            Self::RevealNotOpen => "RevealNotOpen",
            Self::RevealClosed => "RevealClosed",
            Self::NothingToWithdraw => "NothingToWithdraw",
            Self::InvalidNameFormat(_) => "InvalidNameFormat",
            Self::InvalidBidReveal => "InvalidBidReveal",
            Self::IncorrectReserve { .. } => "IncorrectReserve",
            Self::UnexpectedValue(_) => "UnexpectedValue",
            Self::ZeroOwner => "ZeroOwner",
            Self::DomainNotRegistered(_) => "DomainNotRegistered",
            Self::NameAlreadyRegistered(_) => "NameAlreadyRegistered",
            Self::AuctionNotFound(_) => "AuctionNotFound",
            Self::EnforcedPause => "EnforcedPause",
            Self::ExpectedPause => "ExpectedPause",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::TransferFailed => "TransferFailed",
            Self::ArithmeticOverflow => "ArithmeticOverflow",
        }
    }
}
