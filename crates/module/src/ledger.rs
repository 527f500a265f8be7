//! Single-writer ledger executor.
//!
//! The ledger owns the registrar state, native balances and the clock. Every
//! call runs against a draft copy of state and balances; the draft replaces
//! the live copy only when the handler succeeds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::call::RegistrarCall;
use crate::error::RegistrarError;
use crate::events::RegistrarEvent;
use crate::genesis::{GenesisValidationError, RegistrarGenesisConfig};
use crate::handlers::{dispatch, CallContext, HandlerResult, ValueTransfer};
use crate::queries::{handle_query, RegistrarQuery, RegistrarQueryResponse};
use crate::state::RegistrarState;
use registrar_types::{to_hex, Address, Amount};

/// Seconds the clock moves per simulated block.
pub const BLOCK_TIME: u64 = 12;

/// Native balances plus the registrar's custody account.
#[derive(Clone, Debug, Default)]
pub struct Balances {
    accounts: HashMap<Address, Amount>,
    /// Value held by the registrar: escrowed deposits plus proceeds
    custody: Amount,
}

impl Balances {
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.accounts.get(address).copied().unwrap_or(0)
    }

    pub fn custody(&self) -> Amount {
        self.custody
    }

    pub fn credit(&mut self, address: Address, amount: Amount) -> HandlerResult<()> {
        let balance = self
            .balance_of(&address)
            .checked_add(amount)
            .ok_or(RegistrarError::ArithmeticOverflow)?;
        self.accounts.insert(address, balance);
        Ok(())
    }

    /// Move `amount` from `from` into custody.
    fn lock(&mut self, from: &Address, amount: Amount) -> HandlerResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(RegistrarError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or(RegistrarError::ArithmeticOverflow)?;
        self.accounts.insert(*from, available - amount);
        self.custody = custody;
        Ok(())
    }
}

impl ValueTransfer for Balances {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), RegistrarError> {
        if self.custody < amount {
            return Err(RegistrarError::TransferFailed);
        }
        self.credit(*to, amount)?;
        self.custody -= amount;
        Ok(())
    }
}

/// Outcome of a successful call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Position of the call among all successful calls
    pub tx_index: u64,
    pub block_height: u64,
    pub timestamp: u64,
    pub sender: Address,
    /// Events emitted by this call, in order
    pub events: Vec<RegistrarEvent>,
}

/// Clock errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("Timestamp {requested} is before current time {current}")]
    Backwards { requested: u64, current: u64 },

    #[error("Clock cannot advance {seconds}s past {current}")]
    Overflow { seconds: u64, current: u64 },
}

/// The ledger: state, balances and a monotonic clock.
#[derive(Clone, Debug)]
pub struct Ledger {
    state: RegistrarState,
    balances: Balances,
    block_height: u64,
    timestamp: u64,
    tx_count: u64,
}

impl Ledger {
    /// Create a ledger from a genesis config.
    pub fn from_genesis(config: &RegistrarGenesisConfig) -> Result<Self, GenesisValidationError> {
        config.validate()?;

        let mut balances = Balances::default();
        // Addresses are unique after validation.
        for account in &config.accounts {
            balances.accounts.insert(account.address, account.balance);
        }

        Ok(Self {
            state: RegistrarState::from_genesis(config),
            balances,
            block_height: 0,
            timestamp: 0,
            tx_count: 0,
        })
    }

    pub fn state(&self) -> &RegistrarState {
        &self.state
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.balance_of(address)
    }

    pub fn custody(&self) -> Amount {
        self.balances.custody()
    }

    /// Mint test funds into an account.
    pub fn fund(&mut self, address: Address, amount: Amount) -> Result<(), RegistrarError> {
        self.balances.credit(address, amount)?;
        debug!(address = %to_hex(&address), amount, "account funded");
        Ok(())
    }

    /// Advance one block.
    pub fn advance_block(&mut self) -> Result<(), ClockError> {
        self.advance_time(BLOCK_TIME)
    }

    /// Advance the clock by `seconds`, counting one block.
    pub fn advance_time(&mut self, seconds: u64) -> Result<(), ClockError> {
        let timestamp = self
            .timestamp
            .checked_add(seconds)
            .ok_or(ClockError::Overflow {
                seconds,
                current: self.timestamp,
            })?;
        self.block_height = self.block_height.saturating_add(1);
        self.timestamp = timestamp;
        Ok(())
    }

    /// Move the clock to `timestamp`. The clock never runs backwards.
    pub fn set_timestamp(&mut self, timestamp: u64) -> Result<(), ClockError> {
        if timestamp < self.timestamp {
            return Err(ClockError::Backwards {
                requested: timestamp,
                current: self.timestamp,
            });
        }
        self.timestamp = timestamp;
        Ok(())
    }

    /// Execute a call from `sender` carrying `value`.
    ///
    /// On error nothing changes: not state, not balances, not the event log.
    pub fn execute(
        &mut self,
        sender: Address,
        value: Amount,
        call: RegistrarCall,
    ) -> Result<Receipt, RegistrarError> {
        let ctx = CallContext {
            sender,
            block_height: self.block_height,
            timestamp: self.timestamp,
            value,
        };
        let method = call.method();

        let mut state = self.state.clone();
        let mut balances = self.balances.clone();
        let first_event = state.event_log.len();

        if let Err(err) = apply(&mut state, &mut balances, &ctx, call) {
            warn!(method, sender = %to_hex(&sender), error = err.kind(), "call rejected");
            return Err(err);
        }

        let events = state.event_log[first_event..].to_vec();
        self.state = state;
        self.balances = balances;

        let receipt = Receipt {
            tx_index: self.tx_count,
            block_height: self.block_height,
            timestamp: self.timestamp,
            sender,
            events,
        };
        self.tx_count += 1;

        info!(
            method,
            sender = %to_hex(&sender),
            events = receipt.events.len(),
            "call applied"
        );
        Ok(receipt)
    }

    /// Answer a read at the current time.
    pub fn query(&self, query: RegistrarQuery) -> RegistrarQueryResponse {
        handle_query(&self.state, self.timestamp, query)
    }
}

fn apply(
    state: &mut RegistrarState,
    balances: &mut Balances,
    ctx: &CallContext,
    call: RegistrarCall,
) -> HandlerResult<()> {
    balances.lock(&ctx.sender, ctx.value)?;
    dispatch(state, ctx, call, balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Component;
    use crate::genesis::GenesisAccount;
    use registrar_types::{normalize, sealed_bid_hash, NameId};

    const OWNER: Address = [9u8; 20];
    const ALICE: Address = [1u8; 20];
    const BOB: Address = [2u8; 20];

    fn setup() -> Ledger {
        let mut config = RegistrarGenesisConfig::with_owner(OWNER);
        config.accounts = vec![
            GenesisAccount {
                address: ALICE,
                balance: 10,
            },
            GenesisAccount {
                address: BOB,
                balance: 10,
            },
        ];
        Ledger::from_genesis(&config).unwrap()
    }

    fn commit(ledger: &mut Ledger, bidder: Address, amount: Amount, salt: u8) -> NameId {
        let name = normalize("north").unwrap();
        let sealed_hash = sealed_bid_hash(&name, amount, &[salt; 32], &bidder);
        ledger
            .execute(
                bidder,
                1,
                RegistrarCall::CommitBid {
                    id: name.id(),
                    sealed_hash,
                },
            )
            .unwrap();
        name.id()
    }

    fn assert_custody_matches(ledger: &Ledger) {
        let house = &ledger.state().auction_house;
        let credits: Amount = house.credits.values().sum();
        assert_eq!(ledger.custody(), house.escrow + house.proceeds);
        assert!(credits <= house.escrow);
    }

    #[test]
    fn test_genesis_funds_accounts() {
        let ledger = setup();
        assert_eq!(ledger.balance_of(&ALICE), 10);
        assert_eq!(ledger.custody(), 0);
    }

    #[test]
    fn test_invalid_genesis_rejected() {
        let config = RegistrarGenesisConfig::with_owner([0u8; 20]);
        assert!(Ledger::from_genesis(&config).is_err());
    }

    #[test]
    fn test_failed_call_rolls_back() {
        let mut ledger = setup();
        let id = commit(&mut ledger, ALICE, 5, 1);
        let log_len = ledger.state().event_log.len();

        // Second commit fails after the value was locked in the draft.
        let result = ledger.execute(
            ALICE,
            1,
            RegistrarCall::CommitBid {
                id,
                sealed_hash: [0u8; 32],
            },
        );
        assert_eq!(result, Err(RegistrarError::AuctionAlreadyCommitted));
        assert_eq!(ledger.balance_of(&ALICE), 9);
        assert_eq!(ledger.state().event_log.len(), log_len);
        assert_custody_matches(&ledger);
    }

    #[test]
    fn test_insufficient_balance() {
        let mut ledger = setup();
        let result = ledger.execute(
            [7u8; 20],
            1,
            RegistrarCall::CommitBid {
                id: [1u8; 32],
                sealed_hash: [0u8; 32],
            },
        );
        assert_eq!(
            result,
            Err(RegistrarError::InsufficientBalance {
                required: 1,
                available: 0
            })
        );
        assert!(ledger.state().auction_house.auctions.is_empty());
    }

    #[test]
    fn test_full_auction_moves_value() {
        let mut ledger = setup();
        let id = commit(&mut ledger, ALICE, 500, 1);
        commit(&mut ledger, BOB, 800, 2);
        assert_eq!(ledger.custody(), 2);

        ledger.set_timestamp(1000).unwrap();
        let receipt = ledger
            .execute(
                BOB,
                0,
                RegistrarCall::RevealBid {
                    name: "north".to_string(),
                    amount: 800,
                    salt: [2u8; 32],
                },
            )
            .unwrap();
        assert_eq!(receipt.events.len(), 1);

        ledger.set_timestamp(2000).unwrap();
        ledger
            .execute(
                ALICE,
                0,
                RegistrarCall::FinalizeAuction {
                    name: "north".to_string(),
                },
            )
            .unwrap();
        assert_custody_matches(&ledger);

        ledger.execute(ALICE, 0, RegistrarCall::Withdraw { id }).unwrap();
        assert_eq!(ledger.balance_of(&ALICE), 10);
        assert_eq!(ledger.balance_of(&BOB), 9);

        ledger
            .execute(OWNER, 0, RegistrarCall::WithdrawProceeds { to: OWNER })
            .unwrap();
        assert_eq!(ledger.balance_of(&OWNER), 1);
        assert_eq!(ledger.custody(), 0);
        assert_custody_matches(&ledger);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut ledger = setup();
        ledger.set_timestamp(100).unwrap();
        assert_eq!(
            ledger.set_timestamp(99),
            Err(ClockError::Backwards {
                requested: 99,
                current: 100
            })
        );
        ledger.advance_block().unwrap();
        assert_eq!(ledger.timestamp(), 100 + BLOCK_TIME);
        assert_eq!(ledger.block_height(), 1);
    }

    #[test]
    fn test_receipts_count_successes_only() {
        let mut ledger = setup();
        let first = ledger
            .execute(OWNER, 0, RegistrarCall::Pause {
                component: Component::Registry,
            })
            .unwrap();
        assert!(ledger
            .execute(OWNER, 0, RegistrarCall::Pause {
                component: Component::Registry,
            })
            .is_err());
        let second = ledger
            .execute(OWNER, 0, RegistrarCall::Unpause {
                component: Component::Registry,
            })
            .unwrap();
        assert_eq!(first.tx_index, 0);
        assert_eq!(second.tx_index, 1);
    }

    #[test]
    fn test_query_uses_ledger_clock() {
        let mut ledger = setup();
        let id = commit(&mut ledger, ALICE, 5, 1);
        ledger.advance_time(1000).unwrap();
        assert_eq!(
            ledger.query(RegistrarQuery::Phase { id }),
            RegistrarQueryResponse::Phase(registrar_types::AuctionPhase::Reveal)
        );
    }

    #[test]
    fn test_commit_near_end_of_time_fails_cleanly() {
        let mut ledger = setup();
        ledger.set_timestamp(u64::MAX - 10).unwrap();

        let name = normalize("north").unwrap();
        let call = RegistrarCall::CommitBid {
            id: name.id(),
            sealed_hash: sealed_bid_hash(&name, 5, &[1u8; 32], &ALICE),
        };
        assert_eq!(
            ledger.execute(ALICE, 1, call),
            Err(RegistrarError::ArithmeticOverflow)
        );
        assert_eq!(
            ledger.execute(
                ALICE,
                0,
                RegistrarCall::StartAuction {
                    name: "north".to_string()
                }
            ),
            Err(RegistrarError::ArithmeticOverflow)
        );
        assert_eq!(ledger.balance_of(&ALICE), 10);
        assert!(ledger.state().auction_house.auctions.is_empty());
    }

    #[test]
    fn test_clock_and_funding_overflow() {
        let mut ledger = setup();
        ledger.set_timestamp(u64::MAX - 5).unwrap();
        assert_eq!(
            ledger.advance_block(),
            Err(ClockError::Overflow {
                seconds: BLOCK_TIME,
                current: u64::MAX - 5
            })
        );
        assert_eq!(ledger.timestamp(), u64::MAX - 5);
        assert_eq!(ledger.block_height(), 0);
        ledger.advance_time(5).unwrap();
        assert_eq!(ledger.timestamp(), u64::MAX);

        assert_eq!(
            ledger.fund(ALICE, u64::MAX),
            Err(RegistrarError::ArithmeticOverflow)
        );
        assert_eq!(ledger.balance_of(&ALICE), 10);
        ledger.fund([7u8; 20], u64::MAX).unwrap();
        assert_eq!(ledger.balance_of(&[7u8; 20]), u64::MAX);
    }
}
