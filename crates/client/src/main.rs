//! CLI for interacting with sealed-bid auctions.
//!
//! This binary provides commands for:
//! - Creating auctions
//! - Committing sealed bids and revealing them later
//! - Finalizing and claiming
//! - Querying auction status and balances

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use auction_client::wire::{decode_hex32, encode_hex};
use auction_client::BidBuilder;

#[derive(Parser)]
#[command(name = "auction-cli")]
#[command(about = "CLI for sealed-bid uniform-price auctions")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new auction
    CreateAuction {
        /// Organizer address (hex)
        #[arg(long)]
        sender: String,

        /// Units for sale
        #[arg(long)]
        total_supply: u64,

        /// Lowest acceptable price
        #[arg(long, default_value = "1")]
        min_price: u64,

        /// Highest acceptable price
        #[arg(long)]
        max_price: u64,

        /// Commit window length in seconds
        #[arg(long)]
        commit_duration: Option<u64>,

        /// Reveal window length in seconds
        #[arg(long)]
        reveal_duration: Option<u64>,

        /// Claim window length in seconds
        #[arg(long)]
        claim_duration: Option<u64>,

        /// Fixed-point scale of the quantity unit
        #[arg(long)]
        quantity_scale: Option<u64>,
    },

    /// Commit a sealed bid (prints the salt needed to reveal)
    Commit {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Price per unit (kept secret until reveal)
        #[arg(long)]
        price: u64,

        /// Quantity (kept secret until reveal)
        #[arg(long)]
        quantity: u64,

        /// Encrypted bid payload (hex), passed through unchanged
        #[arg(long)]
        payload: String,
    },

    /// Reveal a committed bid
    Reveal {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Committed price
        #[arg(long)]
        price: u64,

        /// Committed quantity
        #[arg(long)]
        quantity: u64,

        /// Salt printed by `commit` (hex)
        #[arg(long)]
        salt: String,
    },

    /// Finalize an auction after the reveal window
    Finalize {
        /// Caller address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Claim an allocation
    Claim {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Get auction details
    GetAuction {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Get a bidder's record
    GetBid {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Bidder address (hex)
        #[arg(long)]
        bidder: String,
    },

    /// Print an auction's event log
    Events {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// First event index to print
        #[arg(long, default_value = "0")]
        from: usize,
    },

    /// List all auctions
    ListAuctions,

    /// Get ledger balances
    Balance {
        /// Account address (hex)
        #[arg(long)]
        address: String,
    },

    /// Credit payment asset to an account (for testing)
    Mint {
        /// Account address (hex)
        #[arg(long)]
        address: String,

        /// Amount to credit
        #[arg(long)]
        amount: u64,
    },

    /// Advance chain time (for testing)
    AdvanceBlock,

    /// Set chain timestamp (for testing)
    SetTimestamp {
        /// Unix timestamp to set
        #[arg(long)]
        timestamp: u64,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct AuctionInfoRpc {
    auction_id: u64,
    organizer: String,
    phase: String,
    window: String,
    total_supply: u64,
    min_price: u64,
    max_price: u64,
    quantity_scale: u64,
    created_at: u64,
    commit_deadline: u64,
    reveal_deadline: u64,
    claim_deadline: u64,
    num_bids: usize,
    clearing_price: Option<u64>,
    total_allocated_quantity: Option<u64>,
    reserve: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BidRpc {
    bidder: String,
    commitment: String,
    encrypted_payload: String,
    commit_index: u64,
    committed_at: u64,
    revealed: bool,
    price: Option<u64>,
    quantity: Option<u64>,
    allocation: u64,
    claimed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockInfo {
    height: u64,
    timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct FinalizeRpc {
    clearing_price: u64,
    total_allocated_quantity: u64,
    oversubscribed: bool,
    winners: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaimReceiptRpc {
    allocation: u64,
    payment: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BalanceRpc {
    address: String,
    payment: u64,
    asset: u64,
}

async fn get_auction(client: &HttpClient, auction_id: u64) -> Result<AuctionInfoRpc> {
    let auction: Option<AuctionInfoRpc> = client
        .request("query_getAuction", vec![auction_id])
        .await?;
    auction.ok_or_else(|| anyhow!("Auction {} not found", auction_id))
}

async fn commit_cmd(
    client: &HttpClient,
    sender: &str,
    auction_id: u64,
    price: u64,
    quantity: u64,
    payload: &str,
) -> Result<()> {
    let bidder = decode_hex32(sender)?;
    let payload = hex::decode(payload.trim_start_matches("0x"))?;

    // Check bounds locally before anything goes on chain
    let auction = get_auction(client, auction_id).await?;
    let sealed = BidBuilder::new(bidder)
        .price(price)
        .quantity(quantity)
        .price_bounds(auction.min_price, auction.max_price)
        .total_supply(auction.total_supply)
        .payload(payload)
        .build(&mut OsRng)?;

    let params = serde_json::json!({
        "sender": sender,
        "auction_id": auction_id,
        "commitment": encode_hex(&sealed.commitment.0),
        "encrypted_payload": hex::encode(&sealed.encrypted_payload),
    });

    let _: bool = client
        .request("auction_commitBid", vec![params])
        .await?;

    info!(auction_id, "Bid committed");
    println!("Bid committed");
    println!("  Auction ID: {}", auction_id);
    println!("  Commitment: {}", encode_hex(&sealed.commitment.0));
    println!("  Salt: {}", encode_hex(&sealed.salt));
    println!("Keep the salt, price and quantity secret; they are needed to reveal.");

    Ok(())
}

async fn reveal_cmd(
    client: &HttpClient,
    sender: &str,
    auction_id: u64,
    price: u64,
    quantity: u64,
    salt: &str,
) -> Result<()> {
    // Reject a malformed salt before it reaches the chain
    decode_hex32(salt)?;

    let params = serde_json::json!({
        "sender": sender,
        "auction_id": auction_id,
        "price": price,
        "quantity": quantity,
        "salt": salt,
    });

    let _: bool = client
        .request("auction_revealBid", vec![params])
        .await?;

    println!("Bid revealed: {} units at {}", quantity, price);
    Ok(())
}

async fn get_auction_cmd(client: &HttpClient, auction_id: u64) -> Result<()> {
    let auction: Option<AuctionInfoRpc> = client
        .request("query_getAuction", vec![auction_id])
        .await?;

    match auction {
        Some(a) => {
            println!("Auction {}:", a.auction_id);
            println!("  Phase: {} (window: {})", a.phase, a.window);
            println!("  Organizer: {}", a.organizer);
            println!("  Supply: {} (reserve {})", a.total_supply, a.reserve);
            println!("  Price Range: [{}, {}]", a.min_price, a.max_price);
            println!("  Quantity Scale: {}", a.quantity_scale);
            println!("  Commit Deadline: {}", a.commit_deadline);
            println!("  Reveal Deadline: {}", a.reveal_deadline);
            println!("  Claim Deadline: {}", a.claim_deadline);
            println!("  Bids: {}", a.num_bids);
            if let (Some(price), Some(allocated)) = (a.clearing_price, a.total_allocated_quantity)
            {
                println!("  Clearing Price: {}", price);
                println!("  Allocated: {}", allocated);
            }
        }
        None => {
            println!("Auction {} not found", auction_id);
        }
    }

    Ok(())
}

async fn get_bid_cmd(client: &HttpClient, auction_id: u64, bidder: &str) -> Result<()> {
    let bid: Option<BidRpc> = client
        .request("query_getBid", (auction_id, bidder))
        .await?;

    match bid {
        Some(b) => {
            println!("Bid #{} by {}:", b.commit_index, b.bidder);
            println!("  Commitment: {}", b.commitment);
            println!("  Committed At: {}", b.committed_at);
            match (b.price, b.quantity) {
                (Some(price), Some(quantity)) => {
                    println!("  Revealed: {} units at {}", quantity, price)
                }
                _ => println!("  Revealed: no"),
            }
            println!("  Allocation: {}", b.allocation);
            println!("  Claimed: {}", b.claimed);
            if !b.encrypted_payload.is_empty() {
                println!("  Payload: {} bytes", b.encrypted_payload.len() / 2);
            }
        }
        None => {
            println!("No bid from {} in auction {}", bidder, auction_id);
        }
    }

    Ok(())
}

async fn events_cmd(client: &HttpClient, auction_id: u64, from: usize) -> Result<()> {
    let events: Vec<serde_json::Value> = client
        .request("query_getEvents", (auction_id, from))
        .await?;

    if events.is_empty() {
        println!("No events for auction {} from {}", auction_id, from);
    } else {
        for (i, event) in events.iter().enumerate() {
            println!("[{}] {}", from + i, event);
        }
    }

    Ok(())
}

async fn list_auctions_cmd(client: &HttpClient) -> Result<()> {
    let auctions: Vec<AuctionInfoRpc> = client
        .request("query_listAuctions", Vec::<()>::new())
        .await?;

    if auctions.is_empty() {
        println!("No auctions found");
    } else {
        println!("Auctions:");
        for a in auctions {
            println!(
                "  [{}] {} ({}) - {} bids, organizer {}",
                a.auction_id, a.phase, a.window, a.num_bids, a.organizer
            );
        }
    }

    Ok(())
}

fn print_balance(b: &BalanceRpc) {
    println!("Balance of {}:", b.address);
    println!("  Payment: {}", b.payment);
    println!("  Asset: {}", b.asset);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auction_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = HttpClientBuilder::default().build(&cli.rpc)?;

    match cli.command {
        Commands::CreateAuction {
            sender,
            total_supply,
            min_price,
            max_price,
            commit_duration,
            reveal_duration,
            claim_duration,
            quantity_scale,
        } => {
            let params = serde_json::json!({
                "sender": sender,
                "total_supply": total_supply,
                "min_price": min_price,
                "max_price": max_price,
                "commit_duration_secs": commit_duration,
                "reveal_duration_secs": reveal_duration,
                "claim_duration_secs": claim_duration,
                "quantity_scale": quantity_scale,
            });
            let auction_id: u64 = client
                .request("auction_create", vec![params])
                .await?;
            info!(auction_id, "Created auction");
            println!("Auction ID: {}", auction_id);
        }

        Commands::Commit {
            sender,
            auction_id,
            price,
            quantity,
            payload,
        } => {
            commit_cmd(&client, &sender, auction_id, price, quantity, &payload).await?;
        }

        Commands::Reveal {
            sender,
            auction_id,
            price,
            quantity,
            salt,
        } => {
            reveal_cmd(&client, &sender, auction_id, price, quantity, &salt).await?;
        }

        Commands::Finalize { sender, auction_id } => {
            let result: FinalizeRpc = client
                .request("auction_finalize", (sender, auction_id))
                .await?;
            println!("Auction {} finalized:", auction_id);
            println!("  Clearing Price: {}", result.clearing_price);
            println!("  Allocated: {}", result.total_allocated_quantity);
            println!("  Winners: {}", result.winners);
            if result.oversubscribed {
                println!("  Oversubscribed: marginal bids filled pro rata");
            }
        }

        Commands::Claim { sender, auction_id } => {
            let receipt: ClaimReceiptRpc = client
                .request("auction_claimTokens", (sender, auction_id))
                .await?;
            println!(
                "Claimed {} units for a payment of {}",
                receipt.allocation, receipt.payment
            );
        }

        Commands::GetAuction { auction_id } => {
            get_auction_cmd(&client, auction_id).await?;
        }

        Commands::GetBid { auction_id, bidder } => {
            get_bid_cmd(&client, auction_id, &bidder).await?;
        }

        Commands::Events { auction_id, from } => {
            events_cmd(&client, auction_id, from).await?;
        }

        Commands::ListAuctions => {
            list_auctions_cmd(&client).await?;
        }

        Commands::Balance { address } => {
            let balance: BalanceRpc = client
                .request("query_getBalance", vec![address])
                .await?;
            print_balance(&balance);
        }

        Commands::Mint { address, amount } => {
            let balance: BalanceRpc = client
                .request("admin_mint", (address, amount))
                .await?;
            print_balance(&balance);
        }

        Commands::AdvanceBlock => {
            let info: BlockInfo = client
                .request("admin_advanceBlock", Vec::<()>::new())
                .await?;
            println!("Block advanced: height={}, timestamp={}", info.height, info.timestamp);
        }

        Commands::SetTimestamp { timestamp } => {
            let _: bool = client
                .request("admin_setTimestamp", vec![timestamp])
                .await?;
            println!("Timestamp set to {}", timestamp);
        }
    }

    Ok(())
}
