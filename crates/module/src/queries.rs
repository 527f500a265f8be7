//! Query handlers for the registrar.
//!
//! These functions provide read-only access to registry and auction state.
//! Reads never consult the pause guards. Absent records read as zero values.

use crate::events::RegistrarEvent;
use crate::genesis::AuctionParams;
use crate::state::RegistrarState;
use registrar_types::{
    normalize, Address, Amount, AuctionPhase, AuctionRecord, NameId, RegistryRecord, ZERO_ADDRESS,
};
use serde::{Deserialize, Serialize};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RegistrarQuery {
    // === Registry ===
    /// Owner of a name id (zero if unregistered).
    OwnerOf { id: NameId },

    /// Resolve target of a name (zero if unregistered or unset).
    Resolve { name: String },

    /// Full registry record.
    GetRecord { id: NameId },

    /// All names in registration order.
    GetAllNames,

    /// Names owned by an address, in registration order.
    NamesOfOwner { owner: Address },

    // === Auctions ===
    /// Auction details by id.
    GetAuctionInfo { id: NameId },

    GetHighestBid { id: NameId },

    GetHighestBidder { id: NameId },

    IsFinalized { id: NameId },

    /// Ids of auctions not yet finalized.
    GetActiveAuctions,

    /// Refundable amount for a bidder.
    GetDeposit { id: NameId, bidder: Address },

    /// Advisory expiry of a won name.
    Expiration { id: NameId },

    CommitEnd { id: NameId },

    RevealEnd { id: NameId },

    /// Phase at the current time.
    Phase { id: NameId },

    /// Accumulated proceeds awaiting the owner.
    Proceeds,

    /// Reserve price, durations and default expiry.
    Params,

    // === Admin ===
    /// Pause status of both components.
    PauseStatus,

    /// Events from `from` (inclusive) onward.
    Events { from: usize },
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrarQueryResponse {
    Owner(Address),

    ResolveTarget(Address),

    Record(Option<RegistryRecord>),

    Names(Vec<NameListing>),

    AuctionInfo(Option<AuctionInfo>),

    HighestBid(Amount),

    HighestBidder(Address),

    Finalized(bool),

    ActiveAuctions(Vec<NameId>),

    Deposit(Amount),

    Expiration(u64),

    Timestamp(u64),

    Phase(AuctionPhase),

    Proceeds(Amount),

    Params(AuctionParams),

    PauseStatus { registry: bool, auction_house: bool },

    Events(Vec<RegistrarEvent>),
}

/// A registered name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameListing {
    pub id: NameId,
    /// Empty only if no reveal or start ever supplied the plaintext.
    pub name: String,
    pub owner: Address,
}

/// Auction summary as returned to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionInfo {
    pub id: NameId,
    pub name: String,
    pub round: u32,
    pub commit_end: u64,
    pub reveal_end: u64,
    pub finalized: bool,
    pub highest_bidder: Address,
    pub highest_bid: Amount,
    pub phase: AuctionPhase,
    pub num_commitments: usize,
}

impl AuctionInfo {
    /// Create info from an auction record.
    pub fn from_record(record: &AuctionRecord, now: u64, num_commitments: usize) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            round: record.round,
            commit_end: record.commit_end,
            reveal_end: record.reveal_end,
            finalized: record.finalized,
            highest_bidder: record.highest_bidder,
            highest_bid: record.highest_bid,
            phase: record.phase(now),
            num_commitments,
        }
    }
}

/// Handle a query at time `now`.
pub fn handle_query(
    state: &RegistrarState,
    now: u64,
    query: RegistrarQuery,
) -> RegistrarQueryResponse {
    let house = &state.auction_house;
    match query {
        RegistrarQuery::OwnerOf { id } => RegistrarQueryResponse::Owner(owner_of(state, &id)),

        RegistrarQuery::Resolve { name } => {
            RegistrarQueryResponse::ResolveTarget(resolve(state, &name))
        }

        RegistrarQuery::GetRecord { id } => {
            RegistrarQueryResponse::Record(state.registry.get_record(&id).cloned())
        }

        RegistrarQuery::GetAllNames => RegistrarQueryResponse::Names(names_where(state, |_| true)),

        RegistrarQuery::NamesOfOwner { owner } => {
            RegistrarQueryResponse::Names(names_where(state, |r| r.owner == owner))
        }

        RegistrarQuery::GetAuctionInfo { id } => {
            RegistrarQueryResponse::AuctionInfo(get_auction_info(state, &id, now))
        }

        RegistrarQuery::GetHighestBid { id } => RegistrarQueryResponse::HighestBid(
            house.get_auction(&id).map(|a| a.highest_bid).unwrap_or(0),
        ),

        RegistrarQuery::GetHighestBidder { id } => RegistrarQueryResponse::HighestBidder(
            house.get_auction(&id).map(|a| a.highest_bidder).unwrap_or(ZERO_ADDRESS),
        ),

        RegistrarQuery::IsFinalized { id } => RegistrarQueryResponse::Finalized(
            house.get_auction(&id).map(|a| a.finalized).unwrap_or(false),
        ),

        RegistrarQuery::GetActiveAuctions => {
            RegistrarQueryResponse::ActiveAuctions(get_active_auctions(state))
        }

        RegistrarQuery::GetDeposit { id, bidder } => {
            RegistrarQueryResponse::Deposit(house.get_deposit(&id, &bidder))
        }

        RegistrarQuery::Expiration { id } => RegistrarQueryResponse::Expiration(
            house.expirations.get(&id).copied().unwrap_or(0),
        ),

        RegistrarQuery::CommitEnd { id } => RegistrarQueryResponse::Timestamp(
            house.get_auction(&id).map(|a| a.commit_end).unwrap_or(0),
        ),

        RegistrarQuery::RevealEnd { id } => RegistrarQueryResponse::Timestamp(
            house.get_auction(&id).map(|a| a.reveal_end).unwrap_or(0),
        ),

        RegistrarQuery::Phase { id } => RegistrarQueryResponse::Phase(
            house
                .get_auction(&id)
                .map(|a| a.phase(now))
                .unwrap_or(AuctionPhase::Uncommitted),
        ),

        RegistrarQuery::Proceeds => RegistrarQueryResponse::Proceeds(house.proceeds),

        RegistrarQuery::Params => RegistrarQueryResponse::Params(house.params.clone()),

        RegistrarQuery::PauseStatus => RegistrarQueryResponse::PauseStatus {
            registry: state.registry.guard.is_paused(),
            auction_house: house.guard.is_paused(),
        },

        RegistrarQuery::Events { from } => RegistrarQueryResponse::Events(
            state.event_log.iter().skip(from).cloned().collect(),
        ),
    }
}

/// Owner of `id`, or the zero address.
pub fn owner_of(state: &RegistrarState, id: &NameId) -> Address {
    state
        .registry
        .get_record(id)
        .map(|r| r.owner)
        .unwrap_or(ZERO_ADDRESS)
}

/// Resolve target of `name`, or the zero address. Invalid names resolve to zero.
pub fn resolve(state: &RegistrarState, name: &str) -> Address {
    normalize(name)
        .ok()
        .and_then(|name| state.registry.get_record(&name.id()))
        .map(|r| r.resolve_target)
        .unwrap_or(ZERO_ADDRESS)
}

fn names_where(
    state: &RegistrarState,
    keep: impl Fn(&RegistryRecord) -> bool,
) -> Vec<NameListing> {
    state
        .registry
        .names
        .iter()
        .filter_map(|id| {
            let record = state.registry.get_record(id)?;
            keep(record).then(|| NameListing {
                id: *id,
                name: listed_name(state, id, record),
                owner: record.owner,
            })
        })
        .collect()
}

/// Auction winners are registered by id alone; their plaintext comes from the
/// auction record when a reveal or start supplied it.
fn listed_name(state: &RegistrarState, id: &NameId, record: &RegistryRecord) -> String {
    if !record.name.is_empty() {
        return record.name.clone();
    }
    state
        .auction_house
        .get_auction(id)
        .map(|auction| auction.name.clone())
        .unwrap_or_default()
}

/// Auction info for `id`, if an auction was ever opened.
pub fn get_auction_info(state: &RegistrarState, id: &NameId, now: u64) -> Option<AuctionInfo> {
    let house = &state.auction_house;
    house.get_auction(id).map(|record| {
        AuctionInfo::from_record(record, now, house.get_auction_commitments(id).len())
    })
}

/// Ids of auctions not yet finalized, in the order they were first opened.
pub fn get_active_auctions(state: &RegistrarState) -> Vec<NameId> {
    let house = &state.auction_house;
    house
        .auction_ids
        .iter()
        .filter(|id| house.get_auction(id).map(|a| !a.finalized).unwrap_or(false))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Component;
    use crate::genesis::RegistrarGenesisConfig;
    use crate::handlers::{
        handle_commit_bid, handle_finalize_auction, handle_pause, handle_reveal_bid,
        handle_start_auction, CallContext,
    };
    use crate::registry::{handle_register, handle_set_resolve};

    const OWNER: Address = [9u8; 20];
    const ALICE: Address = [1u8; 20];
    const BOB: Address = [2u8; 20];

    fn ctx(sender: Address, timestamp: u64) -> CallContext {
        CallContext {
            sender,
            block_height: 1,
            timestamp,
            value: 0,
        }
    }

    fn setup() -> RegistrarState {
        RegistrarState::from_genesis(&RegistrarGenesisConfig::with_owner(OWNER))
    }

    #[test]
    fn test_owner_and_resolve_default_to_zero() {
        let state = setup();
        assert_eq!(
            handle_query(&state, 0, RegistrarQuery::OwnerOf { id: [4u8; 32] }),
            RegistrarQueryResponse::Owner(ZERO_ADDRESS)
        );
        assert_eq!(resolve(&state, "ghost"), ZERO_ADDRESS);
        assert_eq!(resolve(&state, "NOT VALID"), ZERO_ADDRESS);
    }

    #[test]
    fn test_names_in_registration_order() {
        let mut state = setup();
        handle_register(&mut state, &ctx(ALICE, 0), "zeta", ALICE).unwrap();
        let bob_id = handle_register(&mut state, &ctx(BOB, 0), "alpha", BOB).unwrap();
        handle_register(&mut state, &ctx(ALICE, 0), "mid-name", ALICE).unwrap();

        let RegistrarQueryResponse::Names(all) = handle_query(&state, 0, RegistrarQuery::GetAllNames)
        else {
            panic!("expected names");
        };
        let names: Vec<&str> = all.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["zeta.ntu", "alpha.ntu", "mid-name.ntu"]);

        let RegistrarQueryResponse::Names(bobs) =
            handle_query(&state, 0, RegistrarQuery::NamesOfOwner { owner: BOB })
        else {
            panic!("expected names");
        };
        assert_eq!(
            bobs,
            vec![NameListing {
                id: bob_id,
                name: "alpha.ntu".to_string(),
                owner: BOB
            }]
        );
    }

    #[test]
    fn test_auction_won_name_is_listed_by_name() {
        let mut state = setup();
        let name = normalize("north").unwrap();
        let salt = [3u8; 32];
        let sealed = registrar_types::sealed_bid_hash(&name, 800, &salt, &BOB);

        let mut commit = ctx(BOB, 0);
        commit.value = 1;
        handle_commit_bid(&mut state, &commit, name.id(), sealed).unwrap();
        handle_reveal_bid(&mut state, &ctx(BOB, 1000), "north", 800, salt).unwrap();
        handle_finalize_auction(&mut state, &ctx(ALICE, 2000), "north").unwrap();

        // The registry record itself stays hash-only.
        assert_eq!(state.registry.get_record(&name.id()).unwrap().name, "");
        assert_eq!(
            handle_query(&state, 2000, RegistrarQuery::NamesOfOwner { owner: BOB }),
            RegistrarQueryResponse::Names(vec![NameListing {
                id: name.id(),
                name: "north.ntu".to_string(),
                owner: BOB,
            }])
        );
    }

    #[test]
    fn test_resolve_after_set() {
        let mut state = setup();
        handle_register(&mut state, &ctx(ALICE, 0), "alice", ALICE).unwrap();
        handle_set_resolve(&mut state, &ctx(ALICE, 0), "alice.ntu", BOB).unwrap();
        assert_eq!(resolve(&state, "alice"), BOB);
        assert_eq!(resolve(&state, " alice.ntu "), BOB);
    }

    #[test]
    fn test_auction_reads() {
        let mut state = setup();
        let record = handle_start_auction(&mut state, &ctx(ALICE, 100), "north").unwrap();
        let id = record.id;

        let info = get_auction_info(&state, &id, 1500).unwrap();
        assert_eq!(info.name, "north.ntu");
        assert_eq!(info.commit_end, 1100);
        assert_eq!(info.reveal_end, 2100);
        assert_eq!(info.phase, AuctionPhase::Reveal);
        assert_eq!(info.num_commitments, 0);

        assert_eq!(
            handle_query(&state, 2100, RegistrarQuery::Phase { id }),
            RegistrarQueryResponse::Phase(AuctionPhase::Closed)
        );
        assert_eq!(
            handle_query(&state, 0, RegistrarQuery::Phase { id: [0u8; 32] }),
            RegistrarQueryResponse::Phase(AuctionPhase::Uncommitted)
        );
        assert_eq!(
            handle_query(&state, 0, RegistrarQuery::RevealEnd { id }),
            RegistrarQueryResponse::Timestamp(2100)
        );
        assert_eq!(
            handle_query(&state, 0, RegistrarQuery::GetActiveAuctions),
            RegistrarQueryResponse::ActiveAuctions(vec![id])
        );
        assert_eq!(
            handle_query(&state, 0, RegistrarQuery::GetHighestBidder { id }),
            RegistrarQueryResponse::HighestBidder(ZERO_ADDRESS)
        );
        assert_eq!(
            handle_query(&state, 0, RegistrarQuery::IsFinalized { id }),
            RegistrarQueryResponse::Finalized(false)
        );
    }

    #[test]
    fn test_reads_ignore_pause() {
        let mut state = setup();
        handle_register(&mut state, &ctx(ALICE, 0), "alice", ALICE).unwrap();
        handle_set_resolve(&mut state, &ctx(ALICE, 0), "alice", BOB).unwrap();
        handle_pause(&mut state, &ctx(OWNER, 0), Component::Registry).unwrap();

        assert_eq!(resolve(&state, "alice"), BOB);
        assert_eq!(
            owner_of(&state, &normalize("alice").unwrap().id()),
            ALICE
        );
        assert_eq!(
            handle_query(&state, 0, RegistrarQuery::PauseStatus),
            RegistrarQueryResponse::PauseStatus {
                registry: true,
                auction_house: false
            }
        );
    }

    #[test]
    fn test_events_from_offset() {
        let mut state = setup();
        handle_register(&mut state, &ctx(ALICE, 0), "alice", ALICE).unwrap();
        handle_register(&mut state, &ctx(BOB, 0), "bobby", BOB).unwrap();

        let RegistrarQueryResponse::Events(events) =
            handle_query(&state, 0, RegistrarQuery::Events { from: 1 })
        else {
            panic!("expected events");
        };
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            RegistrarEvent::NameRegistered { owner: BOB, .. }
        ));
    }
}
