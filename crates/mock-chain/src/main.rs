//! Mock chain server for local testing of the name registrar.
//!
//! This provides a JSON-RPC server that hosts a single registrar ledger with
//! a controllable clock, so clients can run full auctions without a real
//! blockchain.

use anyhow::{Context, Result};
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use registrar_module::{
    ClockError, Component, Ledger, RegistrarCall, RegistrarError, RegistrarGenesisConfig,
    RegistrarQuery, RegistrarQueryResponse,
};
use registrar_types::{
    parse_address, parse_hex_array, parse_name_id, to_hex, Address, Amount, ParseHexError,
};

mod types;
use types::*;

/// Error code for rejected calls.
const CALL_REJECTED: i32 = -32000;
/// Error code for malformed parameters.
const INVALID_PARAMS: i32 = -32602;

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "Local JSON-RPC ledger hosting the name registrar")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Genesis config (JSON); a development genesis is used when omitted
    #[arg(long)]
    genesis: Option<PathBuf>,

    /// Owner of both components in the development genesis (hex)
    #[arg(long, default_value = "0x0000000000000000000000000000000000000001")]
    owner: String,
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Advance the clock by a number of seconds.
    #[method(name = "admin_advanceTime")]
    async fn admin_advance_time(&self, seconds: u64) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp. The clock never moves backwards.
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    /// Mint test funds into an account. Returns the new balance.
    #[method(name = "admin_fund")]
    async fn admin_fund(&self, address: String, amount: u64) -> Result<u64, ErrorObjectOwned>;

    // ============ Registry Methods ============

    /// Register a name directly.
    #[method(name = "registry_register")]
    async fn registry_register(
        &self,
        sender: String,
        name: String,
        owner: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned>;

    /// Set the resolve target of an owned name.
    #[method(name = "registry_setResolve")]
    async fn registry_set_resolve(
        &self,
        sender: String,
        name: String,
        target: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned>;

    #[method(name = "registry_pause")]
    async fn registry_pause(&self, sender: String) -> Result<ReceiptRpc, ErrorObjectOwned>;

    #[method(name = "registry_unpause")]
    async fn registry_unpause(&self, sender: String) -> Result<ReceiptRpc, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Commit a sealed bid.
    #[method(name = "auction_commitBid")]
    async fn auction_commit_bid(
        &self,
        params: CommitBidParams,
    ) -> Result<ReceiptRpc, ErrorObjectOwned>;

    /// Open an auction for a name without bidding.
    #[method(name = "auction_start")]
    async fn auction_start(
        &self,
        sender: String,
        name: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned>;

    /// Reveal a committed bid.
    #[method(name = "auction_revealBid")]
    async fn auction_reveal_bid(
        &self,
        params: RevealBidParams,
    ) -> Result<ReceiptRpc, ErrorObjectOwned>;

    /// Finalize an auction after its reveal window.
    #[method(name = "auction_finalize")]
    async fn auction_finalize(
        &self,
        sender: String,
        name: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned>;

    /// Withdraw a refundable deposit.
    #[method(name = "auction_withdraw")]
    async fn auction_withdraw(
        &self,
        sender: String,
        id: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned>;

    /// Withdraw accumulated proceeds (auction owner).
    #[method(name = "auction_withdrawProceeds")]
    async fn auction_withdraw_proceeds(
        &self,
        sender: String,
        to: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned>;

    #[method(name = "auction_pause")]
    async fn auction_pause(&self, sender: String) -> Result<ReceiptRpc, ErrorObjectOwned>;

    #[method(name = "auction_unpause")]
    async fn auction_unpause(&self, sender: String) -> Result<ReceiptRpc, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get an account's native balance.
    #[method(name = "chain_getBalance")]
    async fn chain_get_balance(&self, address: String) -> Result<u64, ErrorObjectOwned>;

    #[method(name = "query_ownerOf")]
    async fn query_owner_of(&self, id: String) -> Result<String, ErrorObjectOwned>;

    #[method(name = "query_resolve")]
    async fn query_resolve(&self, name: String) -> Result<String, ErrorObjectOwned>;

    #[method(name = "query_getAllNames")]
    async fn query_get_all_names(&self) -> Result<Vec<NameListingRpc>, ErrorObjectOwned>;

    #[method(name = "query_namesOfOwner")]
    async fn query_names_of_owner(
        &self,
        owner: String,
    ) -> Result<Vec<NameListingRpc>, ErrorObjectOwned>;

    #[method(name = "query_getAuctionInfo")]
    async fn query_get_auction_info(
        &self,
        id: String,
    ) -> Result<Option<AuctionInfoRpc>, ErrorObjectOwned>;

    /// Ids of auctions not yet finalized.
    #[method(name = "query_getActiveAuctions")]
    async fn query_get_active_auctions(&self) -> Result<Vec<String>, ErrorObjectOwned>;

    #[method(name = "query_getDeposit")]
    async fn query_get_deposit(&self, id: String, bidder: String)
        -> Result<u64, ErrorObjectOwned>;

    #[method(name = "query_expiration")]
    async fn query_expiration(&self, id: String) -> Result<u64, ErrorObjectOwned>;

    #[method(name = "query_proceeds")]
    async fn query_proceeds(&self) -> Result<u64, ErrorObjectOwned>;

    #[method(name = "query_params")]
    async fn query_params(&self) -> Result<ParamsRpc, ErrorObjectOwned>;

    #[method(name = "query_pauseStatus")]
    async fn query_pause_status(&self) -> Result<PauseStatusRpc, ErrorObjectOwned>;

    /// Events from an index onward.
    #[method(name = "query_events")]
    async fn query_events(&self, from: usize) -> Result<Vec<EventRpc>, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    ledger: Arc<RwLock<Ledger>>,
}

impl MockChainServer {
    fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
        }
    }

    fn rpc_error(err: RegistrarError) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(CALL_REJECTED, err.kind(), Some(err.to_string()))
    }

    fn clock_error(err: ClockError) -> ErrorObjectOwned {
        let kind = match err {
            ClockError::Backwards { .. } => "ClockBackwards",
            ClockError::Overflow { .. } => "ClockOverflow",
        };
        ErrorObjectOwned::owned(CALL_REJECTED, kind, Some(err.to_string()))
    }

    fn invalid_params(what: &str, err: ParseHexError) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(INVALID_PARAMS, format!("Invalid {what}: {err}"), None::<()>)
    }

    fn address(what: &str, s: &str) -> Result<Address, ErrorObjectOwned> {
        parse_address(s).map_err(|e| Self::invalid_params(what, e))
    }

    fn execute(
        &self,
        sender: &str,
        value: Amount,
        call: RegistrarCall,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        let sender = Self::address("sender", sender)?;
        let mut ledger = self.ledger.write();
        ledger
            .execute(sender, value, call)
            .map(ReceiptRpc::from)
            .map_err(Self::rpc_error)
    }

    fn query(&self, query: RegistrarQuery) -> RegistrarQueryResponse {
        self.ledger.read().query(query)
    }

    fn block_info(ledger: &Ledger) -> BlockInfo {
        BlockInfo {
            height: ledger.block_height(),
            timestamp: ledger.timestamp(),
        }
    }

    fn unexpected(response: RegistrarQueryResponse) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(
            jsonrpsee::types::error::INTERNAL_ERROR_CODE,
            format!("Unexpected query response: {response:?}"),
            None::<()>,
        )
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut ledger = self.ledger.write();
        ledger.advance_block().map_err(Self::clock_error)?;
        Ok(Self::block_info(&ledger))
    }

    async fn admin_advance_time(&self, seconds: u64) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut ledger = self.ledger.write();
        ledger.advance_time(seconds).map_err(Self::clock_error)?;
        info!("Clock advanced by {}s to {}", seconds, ledger.timestamp());
        Ok(Self::block_info(&ledger))
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        let mut ledger = self.ledger.write();
        ledger.set_timestamp(timestamp).map_err(Self::clock_error)?;
        info!("Timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn admin_fund(&self, address: String, amount: u64) -> Result<u64, ErrorObjectOwned> {
        let address = Self::address("address", &address)?;
        let mut ledger = self.ledger.write();
        ledger.fund(address, amount).map_err(Self::rpc_error)?;
        Ok(ledger.balance_of(&address))
    }

    async fn registry_register(
        &self,
        sender: String,
        name: String,
        owner: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        let owner = Self::address("owner", &owner)?;
        let call = RegistrarCall::Register {
            name: name.clone(),
            owner,
        };
        let receipt = self.execute(&sender, 0, call)?;
        info!("Registered {} to {}", name, to_hex(&owner));
        Ok(receipt)
    }

    async fn registry_set_resolve(
        &self,
        sender: String,
        name: String,
        target: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        let target = Self::address("target", &target)?;
        self.execute(&sender, 0, RegistrarCall::SetResolve { name, target })
    }

    async fn registry_pause(&self, sender: String) -> Result<ReceiptRpc, ErrorObjectOwned> {
        self.execute(
            &sender,
            0,
            RegistrarCall::Pause {
                component: Component::Registry,
            },
        )
    }

    async fn registry_unpause(&self, sender: String) -> Result<ReceiptRpc, ErrorObjectOwned> {
        self.execute(
            &sender,
            0,
            RegistrarCall::Unpause {
                component: Component::Registry,
            },
        )
    }

    async fn auction_commit_bid(
        &self,
        params: CommitBidParams,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        let id = parse_name_id(&params.id).map_err(|e| Self::invalid_params("id", e))?;
        let sealed_hash = parse_hex_array::<32>(&params.sealed_hash)
            .map_err(|e| Self::invalid_params("sealed_hash", e))?;

        let receipt = self.execute(
            &params.sender,
            params.value,
            RegistrarCall::CommitBid { id, sealed_hash },
        )?;
        info!("Bid committed for {} by {}", params.id, params.sender);
        Ok(receipt)
    }

    async fn auction_start(
        &self,
        sender: String,
        name: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        self.execute(&sender, 0, RegistrarCall::StartAuction { name })
    }

    async fn auction_reveal_bid(
        &self,
        params: RevealBidParams,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        let salt =
            parse_hex_array::<32>(&params.salt).map_err(|e| Self::invalid_params("salt", e))?;

        self.execute(
            &params.sender,
            0,
            RegistrarCall::RevealBid {
                name: params.name,
                amount: params.amount,
                salt,
            },
        )
    }

    async fn auction_finalize(
        &self,
        sender: String,
        name: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        let call = RegistrarCall::FinalizeAuction { name: name.clone() };
        let receipt = self.execute(&sender, 0, call)?;
        info!("Auction for {} finalized", name);
        Ok(receipt)
    }

    async fn auction_withdraw(
        &self,
        sender: String,
        id: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        let id = parse_name_id(&id).map_err(|e| Self::invalid_params("id", e))?;
        self.execute(&sender, 0, RegistrarCall::Withdraw { id })
    }

    async fn auction_withdraw_proceeds(
        &self,
        sender: String,
        to: String,
    ) -> Result<ReceiptRpc, ErrorObjectOwned> {
        let to = Self::address("to", &to)?;
        self.execute(&sender, 0, RegistrarCall::WithdrawProceeds { to })
    }

    async fn auction_pause(&self, sender: String) -> Result<ReceiptRpc, ErrorObjectOwned> {
        self.execute(
            &sender,
            0,
            RegistrarCall::Pause {
                component: Component::AuctionHouse,
            },
        )
    }

    async fn auction_unpause(&self, sender: String) -> Result<ReceiptRpc, ErrorObjectOwned> {
        self.execute(
            &sender,
            0,
            RegistrarCall::Unpause {
                component: Component::AuctionHouse,
            },
        )
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        Ok(Self::block_info(&self.ledger.read()))
    }

    async fn chain_get_balance(&self, address: String) -> Result<u64, ErrorObjectOwned> {
        let address = Self::address("address", &address)?;
        Ok(self.ledger.read().balance_of(&address))
    }

    async fn query_owner_of(&self, id: String) -> Result<String, ErrorObjectOwned> {
        let id = parse_name_id(&id).map_err(|e| Self::invalid_params("id", e))?;
        match self.query(RegistrarQuery::OwnerOf { id }) {
            RegistrarQueryResponse::Owner(owner) => Ok(to_hex(&owner)),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_resolve(&self, name: String) -> Result<String, ErrorObjectOwned> {
        match self.query(RegistrarQuery::Resolve { name }) {
            RegistrarQueryResponse::ResolveTarget(target) => Ok(to_hex(&target)),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_get_all_names(&self) -> Result<Vec<NameListingRpc>, ErrorObjectOwned> {
        match self.query(RegistrarQuery::GetAllNames) {
            RegistrarQueryResponse::Names(names) => {
                Ok(names.into_iter().map(NameListingRpc::from).collect())
            }
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_names_of_owner(
        &self,
        owner: String,
    ) -> Result<Vec<NameListingRpc>, ErrorObjectOwned> {
        let owner = Self::address("owner", &owner)?;
        match self.query(RegistrarQuery::NamesOfOwner { owner }) {
            RegistrarQueryResponse::Names(names) => {
                Ok(names.into_iter().map(NameListingRpc::from).collect())
            }
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_get_auction_info(
        &self,
        id: String,
    ) -> Result<Option<AuctionInfoRpc>, ErrorObjectOwned> {
        let id = parse_name_id(&id).map_err(|e| Self::invalid_params("id", e))?;
        match self.query(RegistrarQuery::GetAuctionInfo { id }) {
            RegistrarQueryResponse::AuctionInfo(info) => Ok(info.map(AuctionInfoRpc::from)),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_get_active_auctions(&self) -> Result<Vec<String>, ErrorObjectOwned> {
        match self.query(RegistrarQuery::GetActiveAuctions) {
            RegistrarQueryResponse::ActiveAuctions(ids) => {
                Ok(ids.iter().map(|id| to_hex(id)).collect())
            }
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_get_deposit(
        &self,
        id: String,
        bidder: String,
    ) -> Result<u64, ErrorObjectOwned> {
        let id = parse_name_id(&id).map_err(|e| Self::invalid_params("id", e))?;
        let bidder = Self::address("bidder", &bidder)?;
        match self.query(RegistrarQuery::GetDeposit { id, bidder }) {
            RegistrarQueryResponse::Deposit(amount) => Ok(amount),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_expiration(&self, id: String) -> Result<u64, ErrorObjectOwned> {
        let id = parse_name_id(&id).map_err(|e| Self::invalid_params("id", e))?;
        match self.query(RegistrarQuery::Expiration { id }) {
            RegistrarQueryResponse::Expiration(at) => Ok(at),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_proceeds(&self) -> Result<u64, ErrorObjectOwned> {
        match self.query(RegistrarQuery::Proceeds) {
            RegistrarQueryResponse::Proceeds(amount) => Ok(amount),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_params(&self) -> Result<ParamsRpc, ErrorObjectOwned> {
        match self.query(RegistrarQuery::Params) {
            RegistrarQueryResponse::Params(params) => Ok(ParamsRpc::from(params)),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_pause_status(&self) -> Result<PauseStatusRpc, ErrorObjectOwned> {
        match self.query(RegistrarQuery::PauseStatus) {
            RegistrarQueryResponse::PauseStatus {
                registry,
                auction_house,
            } => Ok(PauseStatusRpc {
                registry,
                auction_house,
            }),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_events(&self, from: usize) -> Result<Vec<EventRpc>, ErrorObjectOwned> {
        match self.query(RegistrarQuery::Events { from }) {
            RegistrarQueryResponse::Events(events) => {
                Ok(events.iter().map(EventRpc::from).collect())
            }
            other => Err(Self::unexpected(other)),
        }
    }
}

fn load_genesis(args: &Args) -> Result<RegistrarGenesisConfig> {
    match &args.genesis {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading genesis {}", path.display()))?;
            serde_json::from_str(&raw).context("parsing genesis")
        }
        None => {
            let owner = parse_address(&args.owner).context("parsing --owner")?;
            Ok(RegistrarGenesisConfig::with_owner(owner))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("registrar_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let args = Args::parse();
    let genesis = load_genesis(&args)?;
    let ledger = Ledger::from_genesis(&genesis)?;

    info!(
        "Genesis loaded: registry owner {}, auction owner {}, reserve {}",
        to_hex(&genesis.registry_owner),
        to_hex(&genesis.auction_owner),
        genesis.params.reserve_price
    );
    info!("Starting mock chain server on {}", args.listen);

    let server = Server::builder().build(args.listen).await?;
    let handle = server.start(MockChainServer::new(ledger).into_rpc());

    info!("Mock chain server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_call_carries_error_kind() {
        let err = MockChainServer::rpc_error(RegistrarError::EnforcedPause);
        assert_eq!(err.code(), -32000);
        assert_eq!(err.message(), "EnforcedPause");
        assert_eq!(err.data().map(|d| d.get()), Some("\"Enforced pause\""));

        let err = MockChainServer::rpc_error(RegistrarError::NotDomainOwner);
        assert_eq!(err.code(), CALL_REJECTED);
        assert_eq!(err.message(), RegistrarError::NotDomainOwner.kind());
    }

    #[test]
    fn test_clock_errors_are_rejections() {
        let err = MockChainServer::clock_error(ClockError::Backwards {
            requested: 1,
            current: 2,
        });
        assert_eq!(err.code(), CALL_REJECTED);
        assert_eq!(err.message(), "ClockBackwards");
    }
}
