//! CLI for interacting with the sealed-bid name registrar.
//!
//! This binary provides commands for:
//! - Registering names and setting resolve targets
//! - Committing, revealing and finalizing sealed bids
//! - Withdrawing deposits and proceeds
//! - Querying registry and auction state
//! - Driving the mock chain clock

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use registrar_client::{prepare_bid, seal_bid, PreparedBid};
use registrar_types::{normalize, parse_address, parse_hex_array, to_hex};

#[derive(Parser)]
#[command(name = "registrar-cli")]
#[command(about = "CLI for the sealed-bid name registrar")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ComponentArg {
    Registry,
    Auction,
}

impl ComponentArg {
    fn prefix(self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::Auction => "auction",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Register a name directly
    Register {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        #[arg(long)]
        name: String,

        /// Owner address (hex); defaults to the sender
        #[arg(long)]
        owner: Option<String>,
    },

    /// Set the resolve target of an owned name
    SetResolve {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        name: String,

        /// Target address (hex)
        #[arg(long)]
        target: String,
    },

    /// Open an auction without bidding
    StartAuction {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        name: String,
    },

    /// Commit a sealed bid; prints the bid record to keep until reveal
    Commit {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        name: String,

        /// Bid amount (sealed until reveal)
        #[arg(long)]
        amount: u64,

        /// Write the bid record to this file
        #[arg(long)]
        save: Option<std::path::PathBuf>,
    },

    /// Reveal a committed bid
    Reveal {
        #[arg(long)]
        sender: String,

        /// Saved bid record from `commit`
        #[arg(long, conflicts_with_all = ["name", "amount", "salt"])]
        bid: Option<std::path::PathBuf>,

        #[arg(long, requires_all = ["amount", "salt"])]
        name: Option<String>,

        #[arg(long)]
        amount: Option<u64>,

        /// Salt (hex, 32 bytes)
        #[arg(long)]
        salt: Option<String>,
    },

    /// Finalize an auction after its reveal window
    Finalize {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        name: String,
    },

    /// Withdraw a refundable deposit
    Withdraw {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        name: String,
    },

    /// Withdraw accumulated proceeds (auction owner)
    WithdrawProceeds {
        #[arg(long)]
        sender: String,

        /// Recipient address (hex)
        #[arg(long)]
        to: String,
    },

    /// Pause a component (component owner)
    Pause {
        #[arg(long)]
        sender: String,

        #[arg(long, value_enum)]
        component: ComponentArg,
    },

    /// Unpause a component (component owner)
    Unpause {
        #[arg(long)]
        sender: String,

        #[arg(long, value_enum)]
        component: ComponentArg,
    },

    /// Get auction details for a name
    Info {
        #[arg(long)]
        name: String,
    },

    /// Get the owner of a name
    OwnerOf {
        #[arg(long)]
        name: String,
    },

    /// Get the resolve target of a name
    Resolve {
        #[arg(long)]
        name: String,
    },

    /// List registered names
    Names {
        /// Only names owned by this address (hex)
        #[arg(long)]
        owner: Option<String>,
    },

    /// List auctions not yet finalized
    Active,

    /// Get a bidder's refundable amount
    Deposit {
        #[arg(long)]
        name: String,

        #[arg(long)]
        bidder: String,
    },

    /// Advance chain by one block (for testing)
    AdvanceBlock,

    /// Advance chain time by a number of seconds (for testing)
    AdvanceTime {
        #[arg(long)]
        seconds: u64,
    },

    /// Set chain timestamp (for testing)
    SetTimestamp {
        /// Unix timestamp to set
        #[arg(long)]
        timestamp: u64,
    },

    /// Mint test funds (for testing)
    Fund {
        #[arg(long)]
        address: String,

        #[arg(long)]
        amount: u64,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockInfo {
    height: u64,
    timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventRpc {
    kind: String,
    id: Option<String>,
    account: Option<String>,
    amount: Option<u64>,
    detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReceiptRpc {
    tx_index: u64,
    block_height: u64,
    timestamp: u64,
    sender: String,
    events: Vec<EventRpc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuctionInfoRpc {
    id: String,
    name: String,
    round: u32,
    commit_end: u64,
    reveal_end: u64,
    finalized: bool,
    highest_bidder: String,
    highest_bid: u64,
    phase: String,
    num_commitments: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct NameListingRpc {
    id: String,
    name: String,
    owner: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParamsRpc {
    reserve_price: u64,
    commit_duration: u64,
    reveal_duration: u64,
    default_expiry: u64,
}

fn print_receipt(receipt: &ReceiptRpc) {
    println!(
        "Included as tx {} at height {} (t={})",
        receipt.tx_index, receipt.block_height, receipt.timestamp
    );
    for event in &receipt.events {
        let mut line = format!("  {}", event.kind);
        if let Some(account) = &event.account {
            line.push_str(&format!(" account={account}"));
        }
        if let Some(amount) = event.amount {
            line.push_str(&format!(" amount={amount}"));
        }
        if let Some(detail) = event.detail.as_deref().filter(|d| !d.is_empty()) {
            line.push_str(&format!(" {detail}"));
        }
        println!("{line}");
    }
}

fn name_id_hex(name: &str) -> Result<String> {
    Ok(to_hex(&normalize(name)?.id()))
}

async fn commit_cmd(
    client: &HttpClient,
    sender: &str,
    name: &str,
    amount: u64,
    save: Option<&std::path::Path>,
) -> Result<()> {
    let bidder = parse_address(sender)?;
    let mut rng = OsRng;
    let bid = prepare_bid(name, amount, bidder, &mut rng)?;

    let params: ParamsRpc = client.request("query_params", rpc_params![]).await?;

    let record = serde_json::to_string_pretty(&bid)?;
    if let Some(path) = save {
        std::fs::write(path, &record)
            .with_context(|| format!("writing bid record to {}", path.display()))?;
    }

    let commit = serde_json::json!({
        "sender": sender,
        "id": to_hex(&bid.id),
        "sealed_hash": to_hex(&bid.sealed_hash),
        "value": params.reserve_price,
    });
    let receipt: ReceiptRpc = client.request("auction_commitBid", rpc_params![commit]).await?;

    info!("Bid committed for {}", bid.name);
    print_receipt(&receipt);
    println!("Deposit: {}", params.reserve_price);
    println!("Keep this record secret until you reveal:");
    println!("{record}");

    Ok(())
}

async fn reveal_cmd(client: &HttpClient, sender: &str, bid: PreparedBid) -> Result<()> {
    if bid.bidder != parse_address(sender)? {
        return Err(anyhow!("Bid record belongs to {}", to_hex(&bid.bidder)));
    }
    if !bid.verify() {
        return Err(anyhow!("Bid record is corrupted: sealed hash does not match"));
    }

    let params = serde_json::json!({
        "sender": sender,
        "name": bid.name.as_str(),
        "amount": bid.amount,
        "salt": to_hex(&bid.salt),
    });
    let receipt: ReceiptRpc = client.request("auction_revealBid", rpc_params![params]).await?;

    print_receipt(&receipt);
    Ok(())
}

async fn info_cmd(client: &HttpClient, name: &str) -> Result<()> {
    let info: Option<AuctionInfoRpc> = client
        .request("query_getAuctionInfo", rpc_params![name_id_hex(name)?])
        .await?;

    match info {
        Some(a) => {
            println!("Auction {}:", a.id);
            if !a.name.is_empty() {
                println!("  Name: {}", a.name);
            }
            println!("  Round: {}", a.round);
            println!("  Phase: {}", a.phase);
            println!("  Commit ends: {}", a.commit_end);
            println!("  Reveal ends: {}", a.reveal_end);
            println!("  Commitments: {}", a.num_commitments);
            println!("  Highest bid: {} by {}", a.highest_bid, a.highest_bidder);
            println!("  Finalized: {}", a.finalized);
        }
        None => {
            println!("No auction for {}", name);
        }
    }

    Ok(())
}

async fn names_cmd(client: &HttpClient, owner: Option<&str>) -> Result<()> {
    let names: Vec<NameListingRpc> = match owner {
        Some(owner) => {
            client
                .request("query_namesOfOwner", rpc_params![owner])
                .await?
        }
        None => client.request("query_getAllNames", rpc_params![]).await?,
    };

    if names.is_empty() {
        println!("No names registered");
    } else {
        for n in names {
            let label = if n.name.is_empty() { "<auctioned>" } else { &n.name };
            println!("  {} {} ({})", n.id, label, n.owner);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("registrar_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = HttpClientBuilder::default().build(&cli.rpc)?;

    match cli.command {
        Commands::Register {
            sender,
            name,
            owner,
        } => {
            let owner = owner.unwrap_or_else(|| sender.clone());
            let receipt: ReceiptRpc = client
                .request("registry_register", rpc_params![sender, name, owner])
                .await?;
            print_receipt(&receipt);
        }

        Commands::SetResolve {
            sender,
            name,
            target,
        } => {
            let receipt: ReceiptRpc = client
                .request("registry_setResolve", rpc_params![sender, name, target])
                .await?;
            print_receipt(&receipt);
        }

        Commands::StartAuction { sender, name } => {
            let receipt: ReceiptRpc = client
                .request("auction_start", rpc_params![sender, name])
                .await?;
            print_receipt(&receipt);
        }

        Commands::Commit {
            sender,
            name,
            amount,
            save,
        } => {
            commit_cmd(&client, &sender, &name, amount, save.as_deref()).await?;
        }

        Commands::Reveal {
            sender,
            bid,
            name,
            amount,
            salt,
        } => {
            let bid = match (bid, name, amount, salt) {
                (Some(path), _, _, _) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading bid record {}", path.display()))?;
                    serde_json::from_str(&raw)?
                }
                (None, Some(name), Some(amount), Some(salt)) => {
                    seal_bid(&name, amount, parse_address(&sender)?, parse_hex_array(&salt)?)?
                }
                _ => return Err(anyhow!("Pass --bid or all of --name, --amount, --salt")),
            };
            reveal_cmd(&client, &sender, bid).await?;
        }

        Commands::Finalize { sender, name } => {
            let receipt: ReceiptRpc = client
                .request("auction_finalize", rpc_params![sender, name])
                .await?;
            print_receipt(&receipt);
        }

        Commands::Withdraw { sender, name } => {
            let receipt: ReceiptRpc = client
                .request("auction_withdraw", rpc_params![sender, name_id_hex(&name)?])
                .await?;
            print_receipt(&receipt);
        }

        Commands::WithdrawProceeds { sender, to } => {
            let receipt: ReceiptRpc = client
                .request("auction_withdrawProceeds", rpc_params![sender, to])
                .await?;
            print_receipt(&receipt);
        }

        Commands::Pause { sender, component } => {
            let method = format!("{}_pause", component.prefix());
            let receipt: ReceiptRpc = client.request(&method, rpc_params![sender]).await?;
            print_receipt(&receipt);
        }

        Commands::Unpause { sender, component } => {
            let method = format!("{}_unpause", component.prefix());
            let receipt: ReceiptRpc = client.request(&method, rpc_params![sender]).await?;
            print_receipt(&receipt);
        }

        Commands::Info { name } => {
            info_cmd(&client, &name).await?;
        }

        Commands::OwnerOf { name } => {
            let owner: String = client
                .request("query_ownerOf", rpc_params![name_id_hex(&name)?])
                .await?;
            println!("{owner}");
        }

        Commands::Resolve { name } => {
            let target: String = client.request("query_resolve", rpc_params![name]).await?;
            println!("{target}");
        }

        Commands::Names { owner } => {
            names_cmd(&client, owner.as_deref()).await?;
        }

        Commands::Active => {
            let ids: Vec<String> = client
                .request("query_getActiveAuctions", rpc_params![])
                .await?;
            if ids.is_empty() {
                println!("No active auctions");
            }
            for id in ids {
                println!("  {id}");
            }
        }

        Commands::Deposit { name, bidder } => {
            let amount: u64 = client
                .request("query_getDeposit", rpc_params![name_id_hex(&name)?, bidder])
                .await?;
            println!("{amount}");
        }

        Commands::AdvanceBlock => {
            let info: BlockInfo = client.request("admin_advanceBlock", rpc_params![]).await?;
            println!("Block advanced: height={}, timestamp={}", info.height, info.timestamp);
        }

        Commands::AdvanceTime { seconds } => {
            let info: BlockInfo = client
                .request("admin_advanceTime", rpc_params![seconds])
                .await?;
            println!("Time advanced: height={}, timestamp={}", info.height, info.timestamp);
        }

        Commands::SetTimestamp { timestamp } => {
            let _: bool = client
                .request("admin_setTimestamp", rpc_params![timestamp])
                .await?;
            println!("Timestamp set to {}", timestamp);
        }

        Commands::Fund { address, amount } => {
            let balance: u64 = client
                .request("admin_fund", rpc_params![address, amount])
                .await?;
            println!("Balance: {}", balance);
        }
    }

    Ok(())
}
