//! Call handlers for the registrar.
//!
//! These functions implement the business logic for each call type. Every
//! handler runs all of its checks before touching state, so an `Err` leaves
//! the state as it found it.

use crate::call::RegistrarCall;
use crate::error::RegistrarError;
use crate::events::{Component, RegistrarEvent};
use crate::registry::{handle_register, handle_set_resolve, register_by_hash};
use crate::state::{AuctionHouseState, RegistrarState};
use registrar_types::{
    normalize, sealed_bid_hash, to_hex, Address, Amount, AuctionRecord, BidHash, Commitment,
    NameId, Salt, ZERO_ADDRESS,
};

/// Context provided by the runtime for each call.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
    /// Current timestamp
    pub timestamp: u64,
    /// Value attached to the call (for deposits)
    pub value: Amount,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, RegistrarError>;

/// Outbound value transfer out of the registrar's custody.
///
/// Handlers clear the debt being paid before calling `transfer`, and the
/// mutable borrow of the bank keeps the payee from observing registrar state
/// mid-call.
pub trait ValueTransfer {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), RegistrarError>;
}

// =========================
// AUCTION LIFECYCLE
// =========================

/// How a commit or start finds the auction record for an id.
#[derive(Clone, Copy)]
enum RoundSlot {
    /// No record, or a finalized record without a winner.
    Vacant { next_round: u32 },
    /// A round is in progress.
    Open,
}

fn round_slot(house: &AuctionHouseState, id: &NameId) -> RoundSlot {
    match house.get_auction(id) {
        None => RoundSlot::Vacant { next_round: 0 },
        Some(a) if a.finalized && !a.has_winner() => RoundSlot::Vacant {
            next_round: a.round + 1,
        },
        Some(_) => RoundSlot::Open,
    }
}

/// Open a round at `now`, carrying unrefunded deposits of the previous round
/// into per-bidder credits.
fn open_round(
    state: &mut RegistrarState,
    id: NameId,
    name: String,
    round: u32,
    now: u64,
) -> HandlerResult<AuctionRecord> {
    let house = &mut state.auction_house;
    let commit_end = now
        .checked_add(house.params.commit_duration)
        .ok_or(RegistrarError::ArithmeticOverflow)?;
    let reveal_end = commit_end
        .checked_add(house.params.reveal_duration)
        .ok_or(RegistrarError::ArithmeticOverflow)?;

    if let Some(bidders) = house.auction_bidders.remove(&id) {
        for bidder in bidders {
            if let Some(c) = house.commitments.remove(&(id, bidder)) {
                if !c.refunded {
                    *house.credits.entry((id, bidder)).or_default() += c.deposit;
                }
            }
        }
    }

    let name = match house.get_auction(&id) {
        Some(prev) if name.is_empty() => prev.name.clone(),
        _ => name,
    };
    let record = AuctionRecord {
        id,
        name,
        round,
        commit_end,
        reveal_end,
        finalized: false,
        highest_bid: 0,
        highest_bidder: ZERO_ADDRESS,
    };

    if round == 0 {
        house.auction_ids.push(id);
    }
    house.auctions.insert(id, record.clone());
    state.emit(RegistrarEvent::AuctionStarted {
        id,
        round,
        commit_end: record.commit_end,
        reveal_end: record.reveal_end,
    });

    Ok(record)
}

/// Handle CommitBid call.
pub fn handle_commit_bid(
    state: &mut RegistrarState,
    ctx: &CallContext,
    id: NameId,
    sealed_hash: BidHash,
) -> HandlerResult<()> {
    state.auction_house.guard.ensure_not_paused()?;

    if state.registry.is_registered(&id) {
        return Err(RegistrarError::NameAlreadyRegistered(id));
    }

    let slot = round_slot(&state.auction_house, &id);
    if let RoundSlot::Open = slot {
        let auction = state
            .auction_house
            .get_auction(&id)
            .ok_or(RegistrarError::AuctionNotFound(id))?;

        if auction.finalized || ctx.timestamp >= auction.commit_end {
            return Err(RegistrarError::AuctionClosed);
        }

        if state
            .auction_house
            .get_commitment(&id, &ctx.sender)
            .is_some()
        {
            return Err(RegistrarError::AuctionAlreadyCommitted);
        }
    }

    let required = state.auction_house.params.reserve_price;
    if ctx.value != required {
        return Err(RegistrarError::IncorrectReserve {
            required,
            got: ctx.value,
        });
    }

    if let RoundSlot::Vacant { next_round } = slot {
        open_round(state, id, String::new(), next_round, ctx.timestamp)?;
    }

    let house = &mut state.auction_house;
    house.commitments.insert(
        (id, ctx.sender),
        Commitment {
            bidder: ctx.sender,
            sealed_hash,
            deposit: ctx.value,
            revealed: false,
            refunded: false,
            committed_at: ctx.timestamp,
        },
    );
    house.auction_bidders.entry(id).or_default().push(ctx.sender);
    house.escrow += ctx.value;

    state.emit(RegistrarEvent::BidCommitted {
        id,
        bidder: ctx.sender,
    });

    Ok(())
}

/// Handle StartAuction call.
pub fn handle_start_auction(
    state: &mut RegistrarState,
    ctx: &CallContext,
    name: &str,
) -> HandlerResult<AuctionRecord> {
    state.auction_house.guard.ensure_not_paused()?;

    let name = normalize(name)?;
    let id = name.id();

    if state.registry.is_registered(&id) {
        return Err(RegistrarError::NameAlreadyRegistered(id));
    }

    match round_slot(&state.auction_house, &id) {
        RoundSlot::Open => Err(RegistrarError::AuctionAlreadyStarted),
        RoundSlot::Vacant { next_round } => {
            open_round(state, id, name.to_string(), next_round, ctx.timestamp)
        }
    }
}

/// Handle RevealBid call.
pub fn handle_reveal_bid(
    state: &mut RegistrarState,
    ctx: &CallContext,
    name: &str,
    amount: Amount,
    salt: Salt,
) -> HandlerResult<()> {
    let name = normalize(name)?;
    let id = name.id();

    let auction = state
        .auction_house
        .get_auction(&id)
        .ok_or(RegistrarError::InvalidBidReveal)?;

    if ctx.timestamp < auction.commit_end {
        return Err(RegistrarError::RevealNotOpen);
    }
    if auction.finalized || ctx.timestamp >= auction.reveal_end {
        return Err(RegistrarError::RevealClosed);
    }

    let commitment = state
        .auction_house
        .get_commitment(&id, &ctx.sender)
        .filter(|c| !c.revealed && !c.refunded)
        .ok_or(RegistrarError::InvalidBidReveal)?;

    if sealed_bid_hash(&name, amount, &salt, &ctx.sender) != commitment.sealed_hash {
        return Err(RegistrarError::InvalidBidReveal);
    }

    let house = &mut state.auction_house;
    if let Some(c) = house.commitments.get_mut(&(id, ctx.sender)) {
        c.revealed = true;
    }
    if let Some(auction) = house.get_auction_mut(&id) {
        if auction.name.is_empty() {
            auction.name = name.to_string();
        }
        // Ties keep the earlier revealer.
        if amount > auction.highest_bid {
            auction.highest_bid = amount;
            auction.highest_bidder = ctx.sender;
        }
    }

    tracing::debug!(bidder = %to_hex(&ctx.sender), amount, "bid revealed");
    state.emit(RegistrarEvent::BidRevealed {
        id,
        bidder: ctx.sender,
        amount,
    });

    Ok(())
}

/// Handle FinalizeAuction call.
///
/// Returns the winner, or the zero address when nobody revealed.
pub fn handle_finalize_auction(
    state: &mut RegistrarState,
    ctx: &CallContext,
    name: &str,
) -> HandlerResult<Address> {
    let id = normalize(name)?.id();

    let auction = state
        .auction_house
        .get_auction(&id)
        .ok_or(RegistrarError::AuctionNotFound(id))?;

    if ctx.timestamp < auction.reveal_end {
        return Err(RegistrarError::AuctionNotEnded);
    }
    if auction.finalized {
        return Err(RegistrarError::AuctionAlreadyFinalized);
    }

    // A name claimed directly while the auction ran cannot be awarded.
    let claimed = state.registry.is_registered(&id);
    let (winner, amount) = if auction.has_winner() && !claimed {
        (auction.highest_bidder, auction.highest_bid)
    } else {
        (ZERO_ADDRESS, 0)
    };

    if winner != ZERO_ADDRESS {
        register_by_hash(state, ctx, id, winner)?;
    }

    let house = &mut state.auction_house;
    if let Some(auction) = house.get_auction_mut(&id) {
        auction.finalized = true;
        auction.highest_bidder = winner;
        auction.highest_bid = amount;
    }

    if winner != ZERO_ADDRESS {
        let expiry = ctx.timestamp.saturating_add(house.params.default_expiry);
        house.expirations.insert(id, expiry);

        let forfeited = house
            .commitments
            .get_mut(&(id, winner))
            .map(|c| {
                c.refunded = true;
                c.deposit
            })
            .unwrap_or(0);
        house.escrow -= forfeited;
        house.proceeds += forfeited;
    }

    state.emit(RegistrarEvent::AuctionFinalized { id, winner, amount });

    Ok(winner)
}

/// Handle Withdraw call.
///
/// Pays out the caller's carried credit plus, once the auction is finalized,
/// the caller's current deposit unless the caller won.
pub fn handle_withdraw(
    state: &mut RegistrarState,
    ctx: &CallContext,
    id: NameId,
    bank: &mut dyn ValueTransfer,
) -> HandlerResult<Amount> {
    let house = &state.auction_house;
    let auction = house.get_auction(&id);
    let credit = house.get_credit(&id, &ctx.sender);

    let current = match (auction, house.get_commitment(&id, &ctx.sender)) {
        (Some(a), Some(c)) if a.finalized && !c.refunded && a.highest_bidder != ctx.sender => {
            c.deposit
        }
        _ => 0,
    };

    let refund = credit + current;
    if refund == 0 {
        return Err(match auction {
            Some(a) if !a.finalized && house.get_commitment(&id, &ctx.sender).is_some() => {
                RegistrarError::AuctionNotFinalized
            }
            Some(a) if a.finalized && a.highest_bidder == ctx.sender => {
                RegistrarError::WinnerCannotWithdraw
            }
            _ => RegistrarError::NothingToWithdraw,
        });
    }

    let house = &mut state.auction_house;
    house.credits.remove(&(id, ctx.sender));
    if current > 0 {
        if let Some(c) = house.commitments.get_mut(&(id, ctx.sender)) {
            c.refunded = true;
        }
    }
    house.escrow -= refund;

    state.emit(RegistrarEvent::Withdrawn {
        id,
        bidder: ctx.sender,
        amount: refund,
    });

    bank.transfer(&ctx.sender, refund)?;

    Ok(refund)
}

/// Handle WithdrawProceeds call.
pub fn handle_withdraw_proceeds(
    state: &mut RegistrarState,
    ctx: &CallContext,
    to: Address,
    bank: &mut dyn ValueTransfer,
) -> HandlerResult<Amount> {
    state.auction_house.guard.ensure_owner(&ctx.sender)?;

    if to == ZERO_ADDRESS {
        return Err(RegistrarError::ZeroOwner);
    }

    let amount = state.auction_house.proceeds;
    if amount == 0 {
        return Err(RegistrarError::NothingToWithdraw);
    }

    state.auction_house.proceeds = 0;
    state.emit(RegistrarEvent::ProceedsWithdrawn { to, amount });

    bank.transfer(&to, amount)?;

    Ok(amount)
}

// =========================
// ADMIN
// =========================

/// Handle Pause call.
pub fn handle_pause(
    state: &mut RegistrarState,
    ctx: &CallContext,
    component: Component,
) -> HandlerResult<()> {
    match component {
        Component::Registry => state.registry.guard.pause(&ctx.sender)?,
        Component::AuctionHouse => state.auction_house.guard.pause(&ctx.sender)?,
    }
    state.emit(RegistrarEvent::Paused {
        component,
        by: ctx.sender,
    });
    Ok(())
}

/// Handle Unpause call.
pub fn handle_unpause(
    state: &mut RegistrarState,
    ctx: &CallContext,
    component: Component,
) -> HandlerResult<()> {
    match component {
        Component::Registry => state.registry.guard.unpause(&ctx.sender)?,
        Component::AuctionHouse => state.auction_house.guard.unpause(&ctx.sender)?,
    }
    state.emit(RegistrarEvent::Unpaused {
        component,
        by: ctx.sender,
    });
    Ok(())
}

/// Route a call to its handler.
pub fn dispatch(
    state: &mut RegistrarState,
    ctx: &CallContext,
    call: RegistrarCall,
    bank: &mut dyn ValueTransfer,
) -> HandlerResult<()> {
    if ctx.value > 0 && !call.is_payable() {
        return Err(RegistrarError::UnexpectedValue(ctx.value));
    }

    match call {
        RegistrarCall::Register { name, owner } => {
            handle_register(state, ctx, &name, owner).map(|_| ())
        }
        RegistrarCall::SetResolve { name, target } => {
            handle_set_resolve(state, ctx, &name, target)
        }
        RegistrarCall::CommitBid { id, sealed_hash } => {
            handle_commit_bid(state, ctx, id, sealed_hash)
        }
        RegistrarCall::StartAuction { name } => {
            handle_start_auction(state, ctx, &name).map(|_| ())
        }
        RegistrarCall::RevealBid { name, amount, salt } => {
            handle_reveal_bid(state, ctx, &name, amount, salt)
        }
        RegistrarCall::FinalizeAuction { name } => {
            handle_finalize_auction(state, ctx, &name).map(|_| ())
        }
        RegistrarCall::Withdraw { id } => handle_withdraw(state, ctx, id, bank).map(|_| ()),
        RegistrarCall::WithdrawProceeds { to } => {
            handle_withdraw_proceeds(state, ctx, to, bank).map(|_| ())
        }
        RegistrarCall::Pause { component } => handle_pause(state, ctx, component),
        RegistrarCall::Unpause { component } => handle_unpause(state, ctx, component),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::RegistrarGenesisConfig;
    use registrar_types::{keccak256, AuctionPhase, CanonicalName};

    const OWNER: Address = [9u8; 20];
    const ALICE: Address = [1u8; 20];
    const BOB: Address = [2u8; 20];
    const CAROL: Address = [3u8; 20];

    /// Bank that records payouts and can be told to fail.
    #[derive(Default)]
    struct TestBank {
        paid: Vec<(Address, Amount)>,
        fail: bool,
    }

    impl ValueTransfer for TestBank {
        fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), RegistrarError> {
            if self.fail {
                return Err(RegistrarError::TransferFailed);
            }
            self.paid.push((*to, amount));
            Ok(())
        }
    }

    fn setup() -> RegistrarState {
        RegistrarState::from_genesis(&RegistrarGenesisConfig::with_owner(OWNER))
    }

    fn test_context(sender: Address, timestamp: u64) -> CallContext {
        CallContext {
            sender,
            block_height: 100,
            timestamp,
            value: 0,
        }
    }

    fn paying(sender: Address, timestamp: u64, value: Amount) -> CallContext {
        CallContext {
            value,
            ..test_context(sender, timestamp)
        }
    }

    fn name(raw: &str) -> CanonicalName {
        normalize(raw).unwrap()
    }

    fn sealed(raw: &str, amount: Amount, salt: Salt, bidder: Address) -> BidHash {
        sealed_bid_hash(&name(raw), amount, &salt, &bidder)
    }

    /// Commit alice=500 and bob=800 for "north" at t=0.
    fn two_bidders() -> (RegistrarState, NameId) {
        let mut state = setup();
        let id = name("north").id();
        handle_commit_bid(&mut state, &paying(ALICE, 0, 1), id, sealed("north", 500, [1u8; 32], ALICE))
            .unwrap();
        handle_commit_bid(&mut state, &paying(BOB, 10, 1), id, sealed("north", 800, [2u8; 32], BOB))
            .unwrap();
        (state, id)
    }

    #[test]
    fn test_commit_opens_auction() {
        let (state, id) = two_bidders();
        let auction = state.auction_house.get_auction(&id).unwrap();

        assert_eq!(auction.commit_end, 1000);
        assert_eq!(auction.reveal_end, 2000);
        assert_eq!(auction.round, 0);
        assert_eq!(auction.phase(500), AuctionPhase::Commit);
        assert_eq!(state.auction_house.escrow, 2);
        assert_eq!(state.auction_house.auction_ids, vec![id]);
        assert_eq!(
            state.event_log[0],
            RegistrarEvent::AuctionStarted {
                id,
                round: 0,
                commit_end: 1000,
                reveal_end: 2000
            }
        );
        assert_eq!(
            state.event_log.last(),
            Some(&RegistrarEvent::BidCommitted { id, bidder: BOB })
        );
    }

    #[test]
    fn test_commit_twice_rejected() {
        let (mut state, id) = two_bidders();
        let result = handle_commit_bid(&mut state, &paying(ALICE, 20, 1), id, [7u8; 32]);
        assert_eq!(result, Err(RegistrarError::AuctionAlreadyCommitted));
        assert_eq!(state.auction_house.escrow, 2);
    }

    #[test]
    fn test_commit_after_window_closed() {
        let (mut state, id) = two_bidders();
        let result = handle_commit_bid(&mut state, &paying(CAROL, 1000, 1), id, [7u8; 32]);
        assert_eq!(result, Err(RegistrarError::AuctionClosed));
    }

    #[test]
    fn test_commit_incorrect_reserve() {
        let mut state = setup();
        let id = name("north").id();
        for value in [0, 2] {
            let result = handle_commit_bid(&mut state, &paying(ALICE, 0, value), id, [7u8; 32]);
            assert_eq!(
                result,
                Err(RegistrarError::IncorrectReserve {
                    required: 1,
                    got: value
                })
            );
        }
        assert!(state.auction_house.get_auction(&id).is_none());
        assert!(state.event_log.is_empty());
    }

    #[test]
    fn test_commit_registered_name() {
        let mut state = setup();
        let id = handle_register(&mut state, &test_context(ALICE, 0), "north", ALICE).unwrap();
        let result = handle_commit_bid(&mut state, &paying(BOB, 0, 1), id, [7u8; 32]);
        assert_eq!(result, Err(RegistrarError::NameAlreadyRegistered(id)));
    }

    #[test]
    fn test_commit_paused() {
        let mut state = setup();
        handle_pause(&mut state, &test_context(OWNER, 0), Component::AuctionHouse).unwrap();
        let result = handle_commit_bid(&mut state, &paying(ALICE, 0, 1), [1u8; 32], [7u8; 32]);
        assert_eq!(result, Err(RegistrarError::EnforcedPause));

        handle_unpause(&mut state, &test_context(OWNER, 0), Component::AuctionHouse).unwrap();
        handle_commit_bid(&mut state, &paying(ALICE, 0, 1), [1u8; 32], [7u8; 32]).unwrap();
    }

    #[test]
    fn test_start_auction() {
        let mut state = setup();
        let record = handle_start_auction(&mut state, &test_context(ALICE, 50), "north").unwrap();
        assert_eq!(record.name, "north.ntu");
        assert_eq!(record.commit_end, 1050);

        assert_eq!(
            handle_start_auction(&mut state, &test_context(BOB, 60), "north"),
            Err(RegistrarError::AuctionAlreadyStarted)
        );

        // Commit joins the open round without moving the clock.
        handle_commit_bid(&mut state, &paying(BOB, 60, 1), record.id, [7u8; 32]).unwrap();
        assert_eq!(
            state.auction_house.get_auction(&record.id).unwrap().commit_end,
            1050
        );
    }

    #[test]
    fn test_reveal_timing() {
        let (mut state, _) = two_bidders();

        assert_eq!(
            handle_reveal_bid(&mut state, &test_context(ALICE, 999), "north", 500, [1u8; 32]),
            Err(RegistrarError::RevealNotOpen)
        );
        assert_eq!(
            handle_reveal_bid(&mut state, &test_context(ALICE, 2000), "north", 500, [1u8; 32]),
            Err(RegistrarError::RevealClosed)
        );
        handle_reveal_bid(&mut state, &test_context(ALICE, 1000), "north", 500, [1u8; 32]).unwrap();
    }

    #[test]
    fn test_reveal_mismatch() {
        let (mut state, id) = two_bidders();
        let ctx = test_context(ALICE, 1500);

        let wrong = [
            ("north", 501, [1u8; 32]),
            ("north", 500, [9u8; 32]),
            ("south", 500, [1u8; 32]),
        ];
        for (raw, amount, salt) in wrong {
            assert_eq!(
                handle_reveal_bid(&mut state, &ctx, raw, amount, salt),
                Err(RegistrarError::InvalidBidReveal)
            );
        }
        // Bob's hash does not open under Alice's address.
        assert_eq!(
            handle_reveal_bid(&mut state, &ctx, "north", 800, [2u8; 32]),
            Err(RegistrarError::InvalidBidReveal)
        );

        handle_reveal_bid(&mut state, &ctx, "north", 500, [1u8; 32]).unwrap();
        assert_eq!(
            handle_reveal_bid(&mut state, &ctx, "north", 500, [1u8; 32]),
            Err(RegistrarError::InvalidBidReveal)
        );
        assert_eq!(state.auction_house.get_auction(&id).unwrap().highest_bid, 500);
    }

    #[test]
    fn test_reveal_without_commitment() {
        let (mut state, _) = two_bidders();
        assert_eq!(
            handle_reveal_bid(&mut state, &test_context(CAROL, 1500), "north", 1, [0u8; 32]),
            Err(RegistrarError::InvalidBidReveal)
        );
        assert_eq!(
            handle_reveal_bid(&mut state, &test_context(CAROL, 1500), "nothing", 1, [0u8; 32]),
            Err(RegistrarError::InvalidBidReveal)
        );
    }

    #[test]
    fn test_reveal_tie_keeps_first() {
        let mut state = setup();
        let id = name("north").id();
        handle_commit_bid(&mut state, &paying(ALICE, 0, 1), id, sealed("north", 700, [1u8; 32], ALICE))
            .unwrap();
        handle_commit_bid(&mut state, &paying(BOB, 0, 1), id, sealed("north", 700, [2u8; 32], BOB))
            .unwrap();

        handle_reveal_bid(&mut state, &test_context(BOB, 1100), "north", 700, [2u8; 32]).unwrap();
        handle_reveal_bid(&mut state, &test_context(ALICE, 1200), "north", 700, [1u8; 32]).unwrap();

        let auction = state.auction_house.get_auction(&id).unwrap();
        assert_eq!(auction.highest_bidder, BOB);
        assert_eq!(auction.highest_bid, 700);
        assert_eq!(auction.name, "north.ntu");
    }

    #[test]
    fn test_finalize_registers_winner() {
        let (mut state, id) = two_bidders();
        handle_reveal_bid(&mut state, &test_context(ALICE, 1100), "north", 500, [1u8; 32]).unwrap();
        handle_reveal_bid(&mut state, &test_context(BOB, 1200), "north", 800, [2u8; 32]).unwrap();

        assert_eq!(
            handle_finalize_auction(&mut state, &test_context(CAROL, 1999), "north"),
            Err(RegistrarError::AuctionNotEnded)
        );

        let winner = handle_finalize_auction(&mut state, &test_context(CAROL, 2000), "north").unwrap();
        assert_eq!(winner, BOB);
        assert_eq!(state.registry.get_record(&id).unwrap().owner, BOB);
        assert_eq!(state.registry.get_record(&id).unwrap().name, "");
        assert_eq!(state.auction_house.expirations.get(&id), Some(&(2000 + 31_536_000)));
        assert_eq!(state.auction_house.proceeds, 1);
        assert_eq!(state.auction_house.escrow, 1);
        assert_eq!(
            state.event_log.last(),
            Some(&RegistrarEvent::AuctionFinalized {
                id,
                winner: BOB,
                amount: 800
            })
        );

        assert_eq!(
            handle_finalize_auction(&mut state, &test_context(CAROL, 3000), "north"),
            Err(RegistrarError::AuctionAlreadyFinalized)
        );
        assert_eq!(
            handle_finalize_auction(&mut state, &test_context(CAROL, 3000), "other"),
            Err(RegistrarError::AuctionNotFound(keccak256(b"other.ntu")))
        );
    }

    #[test]
    fn test_finalize_blocked_by_registry_pause() {
        let (mut state, id) = two_bidders();
        handle_reveal_bid(&mut state, &test_context(BOB, 1200), "north", 800, [2u8; 32]).unwrap();
        handle_pause(&mut state, &test_context(OWNER, 1500), Component::Registry).unwrap();

        assert_eq!(
            handle_finalize_auction(&mut state, &test_context(CAROL, 2000), "north"),
            Err(RegistrarError::EnforcedPause)
        );
        assert!(!state.auction_house.get_auction(&id).unwrap().finalized);
    }

    #[test]
    fn test_finalize_when_name_claimed_directly() {
        let (mut state, id) = two_bidders();
        handle_reveal_bid(&mut state, &test_context(BOB, 1200), "north", 800, [2u8; 32]).unwrap();
        handle_register(&mut state, &test_context(CAROL, 1300), "north", CAROL).unwrap();

        let winner = handle_finalize_auction(&mut state, &test_context(CAROL, 2000), "north").unwrap();
        assert_eq!(winner, ZERO_ADDRESS);
        assert_eq!(state.registry.get_record(&id).unwrap().owner, CAROL);

        let mut bank = TestBank::default();
        handle_withdraw(&mut state, &test_context(BOB, 2100), id, &mut bank).unwrap();
        assert_eq!(bank.paid, vec![(BOB, 1)]);
    }

    #[test]
    fn test_withdraw_flow() {
        let (mut state, id) = two_bidders();
        let mut bank = TestBank::default();

        assert_eq!(
            handle_withdraw(&mut state, &test_context(ALICE, 1500), id, &mut bank),
            Err(RegistrarError::AuctionNotFinalized)
        );

        handle_reveal_bid(&mut state, &test_context(BOB, 1200), "north", 800, [2u8; 32]).unwrap();
        handle_finalize_auction(&mut state, &test_context(CAROL, 2000), "north").unwrap();

        // Alice never revealed and still gets her deposit back.
        assert_eq!(
            handle_withdraw(&mut state, &test_context(ALICE, 2100), id, &mut bank),
            Ok(1)
        );
        assert_eq!(
            handle_withdraw(&mut state, &test_context(ALICE, 2200), id, &mut bank),
            Err(RegistrarError::NothingToWithdraw)
        );
        assert_eq!(
            handle_withdraw(&mut state, &test_context(BOB, 2200), id, &mut bank),
            Err(RegistrarError::WinnerCannotWithdraw)
        );
        assert_eq!(
            handle_withdraw(&mut state, &test_context(CAROL, 2200), id, &mut bank),
            Err(RegistrarError::NothingToWithdraw)
        );

        assert_eq!(bank.paid, vec![(ALICE, 1)]);
        assert_eq!(state.auction_house.escrow, 0);
    }

    #[test]
    fn test_withdraw_zeroes_before_transfer() {
        let (mut state, id) = two_bidders();
        handle_finalize_auction(&mut state, &test_context(CAROL, 2000), "north").unwrap();

        let mut bank = TestBank::default();
        handle_withdraw(&mut state, &test_context(ALICE, 2100), id, &mut bank).unwrap();
        assert!(state.auction_house.get_commitment(&id, &ALICE).unwrap().refunded);

        // A failing transfer surfaces its error; the ledger discards the draft.
        let mut failing = TestBank {
            fail: true,
            ..TestBank::default()
        };
        assert_eq!(
            handle_withdraw(&mut state, &test_context(BOB, 2100), id, &mut failing),
            Err(RegistrarError::TransferFailed)
        );
    }

    #[test]
    fn test_winnerless_auction_restarts() {
        let (mut state, id) = two_bidders();
        let winner = handle_finalize_auction(&mut state, &test_context(CAROL, 2000), "north").unwrap();
        assert_eq!(winner, ZERO_ADDRESS);
        assert!(state.registry.get_record(&id).is_none());
        assert_eq!(
            state.event_log.last(),
            Some(&RegistrarEvent::AuctionFinalized {
                id,
                winner: ZERO_ADDRESS,
                amount: 0
            })
        );

        // Bob refunds before the restart; Alice leaves hers in place.
        let mut bank = TestBank::default();
        handle_withdraw(&mut state, &test_context(BOB, 2100), id, &mut bank).unwrap();

        handle_commit_bid(&mut state, &paying(CAROL, 3000, 1), id, sealed("north", 5, [3u8; 32], CAROL))
            .unwrap();
        let auction = state.auction_house.get_auction(&id).unwrap();
        assert_eq!(auction.round, 1);
        assert!(!auction.finalized);
        assert_eq!(auction.commit_end, 4000);
        assert_eq!(state.auction_house.auction_ids, vec![id]);

        assert_eq!(state.auction_house.get_credit(&id, &ALICE), 1);
        assert_eq!(state.auction_house.get_credit(&id, &BOB), 0);
        assert_eq!(state.auction_house.get_deposit(&id, &ALICE), 1);

        // Carried credit is withdrawable while the new round runs.
        assert_eq!(
            handle_withdraw(&mut state, &test_context(ALICE, 3100), id, &mut bank),
            Ok(1)
        );
        assert_eq!(state.auction_house.escrow, 1);

        // Alice may bid again in the new round.
        handle_commit_bid(&mut state, &paying(ALICE, 3200, 1), id, [8u8; 32]).unwrap();
    }

    #[test]
    fn test_withdraw_proceeds() {
        let (mut state, _) = two_bidders();
        handle_reveal_bid(&mut state, &test_context(BOB, 1200), "north", 800, [2u8; 32]).unwrap();
        handle_finalize_auction(&mut state, &test_context(CAROL, 2000), "north").unwrap();

        let mut bank = TestBank::default();
        assert_eq!(
            handle_withdraw_proceeds(&mut state, &test_context(ALICE, 2100), ALICE, &mut bank),
            Err(RegistrarError::UnauthorizedAccount)
        );
        assert_eq!(
            handle_withdraw_proceeds(&mut state, &test_context(OWNER, 2100), CAROL, &mut bank),
            Ok(1)
        );
        assert_eq!(state.auction_house.proceeds, 0);
        assert_eq!(
            handle_withdraw_proceeds(&mut state, &test_context(OWNER, 2100), CAROL, &mut bank),
            Err(RegistrarError::NothingToWithdraw)
        );
        assert_eq!(bank.paid, vec![(CAROL, 1)]);
    }

    #[test]
    fn test_dispatch_rejects_value_on_non_payable() {
        let mut state = setup();
        let mut bank = TestBank::default();
        let call = RegistrarCall::Register {
            name: "alice".to_string(),
            owner: ALICE,
        };
        assert_eq!(
            dispatch(&mut state, &paying(ALICE, 0, 5), call.clone(), &mut bank),
            Err(RegistrarError::UnexpectedValue(5))
        );
        dispatch(&mut state, &test_context(ALICE, 0), call, &mut bank).unwrap();
        assert_eq!(state.registry.names.len(), 1);
    }

    #[test]
    fn test_pause_events() {
        let mut state = setup();
        handle_pause(&mut state, &test_context(OWNER, 0), Component::Registry).unwrap();
        assert_eq!(
            state.event_log.last(),
            Some(&RegistrarEvent::Paused {
                component: Component::Registry,
                by: OWNER
            })
        );
        assert_eq!(
            handle_pause(&mut state, &test_context(ALICE, 0), Component::AuctionHouse),
            Err(RegistrarError::UnauthorizedAccount)
        );
        // The auction house keeps running while the registry is paused.
        handle_start_auction(&mut state, &test_context(ALICE, 0), "north").unwrap();
    }
}
