//! Sealed-bid name registrar.
//!
//! This crate implements the ledger-side logic of a commit-reveal name
//! auction and the domain registry it feeds:
//!
//! - Direct name registration and resolve targets
//! - Sealed bid commitment with a flat reserve deposit
//! - Reveal verification and highest-bid tracking
//! - Permissionless finalization into the registry
//! - Refunds, carried-over credits and proceeds
//! - Owner-held pause guards on both components
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for auction calls and dispatch
//! - `registry`: Business logic for registry calls
//! - `queries`: Read-only state access
//! - `state`: Ledger-resident state structures
//! - `ledger`: Atomic executor with balances and a clock
//! - `genesis`: Initial configuration
//! - `guard`: Pause switch
//! - `events`, `error`: Events and error types
//!
//! # Example
//!
//! ```ignore
//! use registrar_module::{Ledger, RegistrarCall, RegistrarGenesisConfig};
//!
//! let mut ledger = Ledger::from_genesis(&RegistrarGenesisConfig::with_owner(owner))?;
//! ledger.fund(alice, 10)?;
//!
//! // Commit a sealed bid with the reserve attached
//! ledger.execute(alice, 1, RegistrarCall::CommitBid { id, sealed_hash })?;
//! ```

pub mod call;
pub mod error;
pub mod events;
pub mod genesis;
pub mod guard;
pub mod handlers;
pub mod ledger;
pub mod queries;
pub mod registry;
pub mod state;

pub use call::RegistrarCall;
pub use error::RegistrarError;
pub use events::{Component, RegistrarEvent};
pub use genesis::{AuctionParams, GenesisAccount, GenesisValidationError, RegistrarGenesisConfig};
pub use handlers::{CallContext, HandlerResult, ValueTransfer};
pub use ledger::{Balances, ClockError, Ledger, Receipt, BLOCK_TIME};
pub use queries::{AuctionInfo, NameListing, RegistrarQuery, RegistrarQueryResponse};
pub use state::RegistrarState;
