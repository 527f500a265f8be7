//! Client SDK for bidding in sealed-bid name auctions.
//!
//! This crate provides a high-level API for:
//! - Preparing sealed bids with the same hashing the registrar uses
//! - Keeping the secret salt in a serializable bid record
//! - Deciding the next step for a saved bid from registrar reads

pub mod bid;
pub mod query;

pub use bid::{prepare_bid, seal_bid, BidBuilder, BidError, PreparedBid};
pub use query::{next_action, BidAction, RegistrarView};
