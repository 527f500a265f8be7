//! End-to-end integration tests for the name registrar.
//!
//! These tests drive the [`Ledger`] executor the way the mock chain does:
//! 1. Bid preparation with the client SDK
//! 2. Commit with the reserve attached
//! 3. Reveal once the commit window closes
//! 4. Finalization and registry ownership
//! 5. Refunds, proceeds and pause guards

#![cfg(test)]

use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use registrar_client::{prepare_bid, seal_bid, PreparedBid};
use registrar_module::{
    Component, GenesisAccount, Ledger, RegistrarCall, RegistrarError, RegistrarEvent,
    RegistrarGenesisConfig, RegistrarQuery, RegistrarQueryResponse,
};
use registrar_types::{normalize, Address, Amount, AuctionPhase, NameId, ZERO_ADDRESS};

const OWNER: Address = [0xaa; 20];
const ALICE: Address = [1u8; 20];
const BOB: Address = [2u8; 20];
const CAROL: Address = [3u8; 20];

const RESERVE: Amount = 1;
const START_BALANCE: Amount = 10;

fn new_ledger(bidders: &[Address]) -> Ledger {
    let mut config = RegistrarGenesisConfig::with_owner(OWNER);
    config.accounts = bidders
        .iter()
        .map(|&address| GenesisAccount {
            address,
            balance: START_BALANCE,
        })
        .collect();
    Ledger::from_genesis(&config).expect("valid genesis")
}

fn id_of(name: &str) -> NameId {
    normalize(name).expect("valid name").id()
}

fn commit(ledger: &mut Ledger, bid: &PreparedBid) -> Result<(), RegistrarError> {
    ledger.execute(bid.bidder, RESERVE, bid.commit_call()).map(|_| ())
}

fn reveal(ledger: &mut Ledger, bid: &PreparedBid) -> Result<(), RegistrarError> {
    ledger.execute(bid.bidder, 0, bid.reveal_call()).map(|_| ())
}

fn finalize(
    ledger: &mut Ledger,
    caller: Address,
    name: &str,
) -> Result<Vec<RegistrarEvent>, RegistrarError> {
    ledger
        .execute(
            caller,
            0,
            RegistrarCall::FinalizeAuction {
                name: name.to_string(),
            },
        )
        .map(|receipt| receipt.events)
}

fn withdraw(ledger: &mut Ledger, caller: Address, id: NameId) -> Result<(), RegistrarError> {
    ledger
        .execute(caller, 0, RegistrarCall::Withdraw { id })
        .map(|_| ())
}

fn owner_of(ledger: &Ledger, id: NameId) -> Address {
    match ledger.query(RegistrarQuery::OwnerOf { id }) {
        RegistrarQueryResponse::Owner(owner) => owner,
        other => panic!("unexpected response {other:?}"),
    }
}

fn highest(ledger: &Ledger, id: NameId) -> (Address, Amount) {
    let bidder = match ledger.query(RegistrarQuery::GetHighestBidder { id }) {
        RegistrarQueryResponse::HighestBidder(bidder) => bidder,
        other => panic!("unexpected response {other:?}"),
    };
    let bid = match ledger.query(RegistrarQuery::GetHighestBid { id }) {
        RegistrarQueryResponse::HighestBid(bid) => bid,
        other => panic!("unexpected response {other:?}"),
    };
    (bidder, bid)
}

fn phase(ledger: &Ledger, id: NameId) -> AuctionPhase {
    match ledger.query(RegistrarQuery::Phase { id }) {
        RegistrarQueryResponse::Phase(phase) => phase,
        other => panic!("unexpected response {other:?}"),
    }
}

/// Value held by the ledger must always cover escrow plus proceeds exactly.
fn assert_custody(ledger: &Ledger) {
    let house = &ledger.state().auction_house;
    assert_eq!(ledger.custody(), house.escrow + house.proceeds);
}

/// The two-bidder auction from commit to refund.
#[test]
fn test_full_auction_flow() {
    let mut rng = OsRng;
    let mut ledger = new_ledger(&[ALICE, BOB]);
    let id = id_of("north");

    // ========================================
    // Phase 1: Commit
    // ========================================

    let alice_bid = prepare_bid("north", 500, ALICE, &mut rng).expect("Failed to create bid A");
    let bob_bid = prepare_bid("north", 800, BOB, &mut rng).expect("Failed to create bid B");

    commit(&mut ledger, &alice_bid).unwrap();
    commit(&mut ledger, &bob_bid).unwrap();
    assert_eq!(phase(&ledger, id), AuctionPhase::Commit);
    assert_eq!(ledger.balance_of(&ALICE), START_BALANCE - RESERVE);
    assert_custody(&ledger);

    println!("2 sealed bids committed");

    // ========================================
    // Phase 2: Reveal
    // ========================================

    ledger.set_timestamp(1000).unwrap();
    assert_eq!(phase(&ledger, id), AuctionPhase::Reveal);

    reveal(&mut ledger, &alice_bid).unwrap();
    assert_eq!(highest(&ledger, id), (ALICE, 500));

    reveal(&mut ledger, &bob_bid).unwrap();
    assert_eq!(highest(&ledger, id), (BOB, 800));

    println!("Both bids revealed, leader: 800");

    // ========================================
    // Phase 3: Finalize
    // ========================================

    ledger.set_timestamp(2000).unwrap();
    let events = finalize(&mut ledger, CAROL, "north").unwrap();
    assert!(events.contains(&RegistrarEvent::AuctionFinalized {
        id,
        winner: BOB,
        amount: 800,
    }));
    assert_eq!(owner_of(&ledger, id), BOB);
    assert_custody(&ledger);

    // ========================================
    // Phase 4: Refunds
    // ========================================

    withdraw(&mut ledger, ALICE, id).unwrap();
    assert_eq!(ledger.balance_of(&ALICE), START_BALANCE);
    assert_eq!(
        withdraw(&mut ledger, BOB, id),
        Err(RegistrarError::WinnerCannotWithdraw)
    );
    assert_eq!(
        withdraw(&mut ledger, ALICE, id),
        Err(RegistrarError::NothingToWithdraw)
    );

    // The winner's deposit is the only value left behind.
    assert_eq!(ledger.custody(), RESERVE);
    assert_custody(&ledger);

    println!("Auction complete: north.ntu owned by Bob");
}

#[test]
fn test_wrong_salt_then_correct_reveal() {
    let mut ledger = new_ledger(&[BOB]);
    let bid = seal_bid("north", 800, BOB, [7u8; 32]).unwrap();
    commit(&mut ledger, &bid).unwrap();
    ledger.set_timestamp(1000).unwrap();

    let wrong = RegistrarCall::RevealBid {
        name: "north".to_string(),
        amount: 800,
        salt: [8u8; 32],
    };
    assert_eq!(
        ledger.execute(BOB, 0, wrong).unwrap_err(),
        RegistrarError::InvalidBidReveal
    );
    assert_eq!(highest(&ledger, bid.id), (ZERO_ADDRESS, 0));

    reveal(&mut ledger, &bid).unwrap();
    assert_eq!(highest(&ledger, bid.id), (BOB, 800));
}

#[test]
fn test_any_single_field_change_fails_reveal() {
    let mut ledger = new_ledger(&[ALICE, CAROL]);
    let bid = seal_bid("north", 500, ALICE, [1u8; 32]).unwrap();
    commit(&mut ledger, &bid).unwrap();
    ledger.set_timestamp(1000).unwrap();

    let mut other_amount = bid.clone();
    other_amount.amount = 501;
    let mut other_salt = bid.clone();
    other_salt.salt[31] ^= 1;
    let mut other_name = bid.clone();
    other_name.name = normalize("south").unwrap();

    for tampered in [other_amount, other_salt, other_name] {
        assert_eq!(
            reveal(&mut ledger, &tampered),
            Err(RegistrarError::InvalidBidReveal)
        );
    }
    assert_eq!(
        ledger.execute(CAROL, 0, bid.reveal_call()).unwrap_err(),
        RegistrarError::InvalidBidReveal
    );

    reveal(&mut ledger, &bid).unwrap();
    // Consumed commitments cannot be revealed twice.
    assert_eq!(
        reveal(&mut ledger, &bid),
        Err(RegistrarError::InvalidBidReveal)
    );
}

#[test]
fn test_register_validates_name() {
    let mut ledger = new_ledger(&[]);

    let err = ledger
        .execute(
            ALICE,
            0,
            RegistrarCall::Register {
                name: "ABC-name".to_string(),
                owner: ALICE,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidNameFormat");

    ledger
        .execute(
            ALICE,
            0,
            RegistrarCall::Register {
                name: "alice-123".to_string(),
                owner: ALICE,
            },
        )
        .unwrap();
    assert_eq!(owner_of(&ledger, id_of("alice-123.ntu")), ALICE);

    match ledger.query(RegistrarQuery::NamesOfOwner { owner: ALICE }) {
        RegistrarQueryResponse::Names(names) => {
            assert_eq!(names.len(), 1);
            assert_eq!(names[0].name, "alice-123.ntu");
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[test]
fn test_commit_after_commit_end_rejected() {
    let mut ledger = new_ledger(&[ALICE, BOB]);
    let alice = seal_bid("north", 500, ALICE, [1u8; 32]).unwrap();
    let bob = seal_bid("north", 800, BOB, [2u8; 32]).unwrap();
    commit(&mut ledger, &alice).unwrap();

    ledger.set_timestamp(1000).unwrap();
    assert_eq!(commit(&mut ledger, &bob), Err(RegistrarError::AuctionClosed));
    assert_eq!(ledger.balance_of(&BOB), START_BALANCE);
    assert_custody(&ledger);
}

#[test]
fn test_registry_pause_round_trip() {
    let mut ledger = new_ledger(&[]);
    let register = RegistrarCall::Register {
        name: "north".to_string(),
        owner: ALICE,
    };

    ledger
        .execute(
            OWNER,
            0,
            RegistrarCall::Pause {
                component: Component::Registry,
            },
        )
        .unwrap();
    assert_eq!(
        ledger.execute(ALICE, 0, register.clone()).unwrap_err(),
        RegistrarError::EnforcedPause
    );

    ledger
        .execute(
            OWNER,
            0,
            RegistrarCall::Unpause {
                component: Component::Registry,
            },
        )
        .unwrap();
    ledger.execute(ALICE, 0, register).unwrap();
    assert_eq!(owner_of(&ledger, id_of("north")), ALICE);
}

#[test]
fn test_auction_pause_blocks_writes_not_reads() {
    let mut ledger = new_ledger(&[ALICE, BOB]);
    let alice = seal_bid("north", 500, ALICE, [1u8; 32]).unwrap();
    let bob = seal_bid("north", 800, BOB, [2u8; 32]).unwrap();
    commit(&mut ledger, &alice).unwrap();

    let pause = RegistrarCall::Pause {
        component: Component::AuctionHouse,
    };
    assert_eq!(
        ledger.execute(ALICE, 0, pause.clone()).unwrap_err(),
        RegistrarError::UnauthorizedAccount
    );
    ledger.execute(OWNER, 0, pause).unwrap();

    assert_eq!(commit(&mut ledger, &bob), Err(RegistrarError::EnforcedPause));
    assert_eq!(
        ledger
            .execute(
                BOB,
                0,
                RegistrarCall::StartAuction {
                    name: "south".to_string()
                }
            )
            .unwrap_err(),
        RegistrarError::EnforcedPause
    );

    assert_eq!(phase(&ledger, alice.id), AuctionPhase::Commit);
    assert_eq!(
        ledger.query(RegistrarQuery::PauseStatus),
        RegistrarQueryResponse::PauseStatus {
            registry: false,
            auction_house: true,
        }
    );

    ledger
        .execute(
            OWNER,
            0,
            RegistrarCall::Unpause {
                component: Component::AuctionHouse,
            },
        )
        .unwrap();
    commit(&mut ledger, &bob).unwrap();
}

/// Nobody reveals, the name is auctioned again, and the first round's
/// deposits stay refundable.
#[test]
fn test_winnerless_auction_restarts() {
    let mut ledger = new_ledger(&[ALICE, BOB, CAROL]);
    let id = id_of("north");

    let alice = seal_bid("north", 500, ALICE, [1u8; 32]).unwrap();
    commit(&mut ledger, &alice).unwrap();

    ledger.set_timestamp(2000).unwrap();
    let events = finalize(&mut ledger, BOB, "north").unwrap();
    assert_eq!(
        events,
        vec![RegistrarEvent::AuctionFinalized {
            id,
            winner: ZERO_ADDRESS,
            amount: 0,
        }]
    );
    assert_eq!(owner_of(&ledger, id), ZERO_ADDRESS);

    // Round two opens on the next commit.
    let carol = seal_bid("north", 300, CAROL, [3u8; 32]).unwrap();
    commit(&mut ledger, &carol).unwrap();
    match ledger.query(RegistrarQuery::GetAuctionInfo { id }) {
        RegistrarQueryResponse::AuctionInfo(Some(info)) => {
            assert_eq!(info.round, 1);
            assert_eq!(info.commit_end, 3000);
            assert_eq!(info.num_commitments, 1);
        }
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(
        ledger.query(RegistrarQuery::GetDeposit { id, bidder: ALICE }),
        RegistrarQueryResponse::Deposit(RESERVE)
    );

    withdraw(&mut ledger, ALICE, id).unwrap();
    assert_eq!(ledger.balance_of(&ALICE), START_BALANCE);
    assert_custody(&ledger);

    ledger.set_timestamp(3000).unwrap();
    reveal(&mut ledger, &carol).unwrap();
    ledger.set_timestamp(4000).unwrap();
    finalize(&mut ledger, BOB, "north").unwrap();
    assert_eq!(owner_of(&ledger, id), CAROL);
    assert_custody(&ledger);
}

#[test]
fn test_tie_goes_to_earliest_reveal() {
    let mut ledger = new_ledger(&[ALICE, BOB]);
    let alice = seal_bid("north", 700, ALICE, [1u8; 32]).unwrap();
    let bob = seal_bid("north", 700, BOB, [2u8; 32]).unwrap();
    commit(&mut ledger, &alice).unwrap();
    commit(&mut ledger, &bob).unwrap();

    ledger.set_timestamp(1000).unwrap();
    // Bob committed second but reveals first.
    reveal(&mut ledger, &bob).unwrap();
    reveal(&mut ledger, &alice).unwrap();

    ledger.set_timestamp(2000).unwrap();
    finalize(&mut ledger, CAROL, "north").unwrap();
    assert_eq!(owner_of(&ledger, alice.id), BOB);
}

#[test]
fn test_random_reveal_order_selects_highest() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let bidders: Vec<Address> = (10u8..26).map(|i| [i; 20]).collect();
    let mut ledger = new_ledger(&bidders);

    let mut bids: Vec<PreparedBid> = bidders
        .iter()
        .map(|&bidder| {
            let mut salt = [0u8; 32];
            rng.fill(&mut salt);
            // Narrow range so ties occur.
            seal_bid("north", rng.gen_range(1..=8), bidder, salt).unwrap()
        })
        .collect();
    for bid in &bids {
        commit(&mut ledger, bid).unwrap();
    }

    ledger.set_timestamp(1000).unwrap();
    bids.shuffle(&mut rng);

    let mut expected = (ZERO_ADDRESS, 0);
    let mut previous = 0;
    for bid in &bids {
        reveal(&mut ledger, bid).unwrap();
        if bid.amount > expected.1 {
            expected = (bid.bidder, bid.amount);
        }
        let (leader, amount) = highest(&ledger, bid.id);
        assert!(amount >= previous);
        assert_eq!((leader, amount), expected);
        previous = amount;
    }

    ledger.set_timestamp(2000).unwrap();
    finalize(&mut ledger, OWNER, "north").unwrap();
    assert_eq!(owner_of(&ledger, bids[0].id), expected.0);

    for bid in &bids {
        let result = withdraw(&mut ledger, bid.bidder, bid.id);
        if bid.bidder == expected.0 {
            assert_eq!(result, Err(RegistrarError::WinnerCannotWithdraw));
        } else {
            assert!(result.is_ok());
            assert_eq!(ledger.balance_of(&bid.bidder), START_BALANCE);
        }
    }
    assert_custody(&ledger);
}

#[test]
fn test_finalize_exactly_once() {
    let mut ledger = new_ledger(&[ALICE]);
    let alice = seal_bid("north", 500, ALICE, [1u8; 32]).unwrap();
    commit(&mut ledger, &alice).unwrap();
    ledger.set_timestamp(1000).unwrap();
    reveal(&mut ledger, &alice).unwrap();

    assert_eq!(
        finalize(&mut ledger, BOB, "north"),
        Err(RegistrarError::AuctionNotEnded)
    );
    ledger.set_timestamp(2000).unwrap();
    finalize(&mut ledger, BOB, "north").unwrap();
    assert_eq!(
        finalize(&mut ledger, BOB, "north"),
        Err(RegistrarError::AuctionAlreadyFinalized)
    );

    // Ownership is settled; a new auction cannot open.
    let bob = seal_bid("north", 900, BOB, [2u8; 32]).unwrap();
    ledger.fund(BOB, RESERVE).unwrap();
    assert!(matches!(
        commit(&mut ledger, &bob),
        Err(RegistrarError::NameAlreadyRegistered(_))
    ));
    assert_eq!(owner_of(&ledger, alice.id), ALICE);
}

#[test]
fn test_proceeds_flow_to_owner() {
    let mut ledger = new_ledger(&[ALICE]);
    let bid = seal_bid("north", 500, ALICE, [1u8; 32]).unwrap();
    commit(&mut ledger, &bid).unwrap();
    ledger.set_timestamp(1000).unwrap();
    reveal(&mut ledger, &bid).unwrap();
    ledger.set_timestamp(2000).unwrap();
    finalize(&mut ledger, OWNER, "north").unwrap();

    assert_eq!(
        ledger.query(RegistrarQuery::Proceeds),
        RegistrarQueryResponse::Proceeds(RESERVE)
    );
    assert_eq!(
        ledger
            .execute(ALICE, 0, RegistrarCall::WithdrawProceeds { to: ALICE })
            .unwrap_err(),
        RegistrarError::UnauthorizedAccount
    );

    ledger
        .execute(OWNER, 0, RegistrarCall::WithdrawProceeds { to: CAROL })
        .unwrap();
    assert_eq!(ledger.balance_of(&CAROL), RESERVE);
    assert_eq!(ledger.custody(), 0);
    assert_custody(&ledger);
}
