//! Mock chain server for local testing of sealed-bid auctions.
//!
//! This provides a JSON-RPC server that hosts the auction engine with a
//! simulated clock and an in-memory settlement ledger, without requiring a
//! real blockchain.

use anyhow::Result;
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use auction_module::{
    AuctionError, AuctionParams, AuctionQuery, AuctionQueryResponse, AuctionRegistry, CallContext,
    InMemoryLedger, NoopJournal,
};
use auction_types::{Address, AuctionEvent, CommitmentHash};

mod types;
use types::*;

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "Local JSON-RPC host for sealed-bid auctions")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Starting chain timestamp
    #[arg(long, default_value = "0")]
    initial_timestamp: u64,

    /// Seconds added to the clock per advanced block
    #[arg(long, default_value = "12")]
    block_time: u64,
}

/// Simulated chain clock.
struct ChainState {
    /// Current block height (simulated)
    block_height: u64,
    /// Current timestamp (simulated, can be advanced)
    timestamp: u64,
    /// Seconds per block
    block_time: u64,
}

impl ChainState {
    fn new(timestamp: u64, block_time: u64) -> Self {
        Self {
            block_height: 0,
            timestamp,
            block_time,
        }
    }

    fn advance_block(&mut self) {
        self.block_height += 1;
        self.timestamp = self.timestamp.saturating_add(self.block_time);
    }

    fn set_timestamp(&mut self, ts: u64) {
        self.timestamp = ts;
    }

    fn block_info(&self) -> BlockInfo {
        BlockInfo {
            height: self.block_height,
            timestamp: self.timestamp,
        }
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    /// Credit payment asset to an account.
    #[method(name = "admin_mint")]
    async fn admin_mint(&self, address: String, amount: u64)
        -> Result<BalanceRpc, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Create a new auction and fund its reserve with the full supply.
    #[method(name = "auction_create")]
    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned>;

    /// Commit a sealed bid.
    #[method(name = "auction_commitBid")]
    async fn auction_commit_bid(&self, params: CommitBidParams) -> Result<bool, ErrorObjectOwned>;

    /// Reveal a committed bid.
    #[method(name = "auction_revealBid")]
    async fn auction_reveal_bid(&self, params: RevealBidParams) -> Result<bool, ErrorObjectOwned>;

    /// Compute the clearing price and allocations.
    #[method(name = "auction_finalize")]
    async fn auction_finalize(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<FinalizeRpc, ErrorObjectOwned>;

    /// Settle the caller's allocation.
    #[method(name = "auction_claimTokens")]
    async fn auction_claim_tokens(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<ClaimReceiptRpc, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get auction by ID.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionInfoRpc>, ErrorObjectOwned>;

    /// Get one bidder's record.
    #[method(name = "query_getBid")]
    async fn query_get_bid(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<Option<BidRpc>, ErrorObjectOwned>;

    /// Get an auction's events from a cursor onward.
    #[method(name = "query_getEvents")]
    async fn query_get_events(
        &self,
        auction_id: u64,
        from: usize,
    ) -> Result<Vec<EventRpc>, ErrorObjectOwned>;

    /// List all auctions.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(&self) -> Result<Vec<AuctionInfoRpc>, ErrorObjectOwned>;

    /// Get an account's ledger balances.
    #[method(name = "query_getBalance")]
    async fn query_get_balance(&self, address: String) -> Result<BalanceRpc, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    chain: Arc<RwLock<ChainState>>,
    registry: Arc<AuctionRegistry>,
    ledger: Arc<InMemoryLedger>,
}

impl MockChainServer {
    fn new(initial_timestamp: u64, block_time: u64) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let registry = AuctionRegistry::new(ledger.clone(), Arc::new(NoopJournal));
        Self {
            chain: Arc::new(RwLock::new(ChainState::new(initial_timestamp, block_time))),
            registry: Arc::new(registry),
            ledger,
        }
    }

    fn make_context(&self, sender: &str) -> Result<CallContext, ErrorObjectOwned> {
        Ok(CallContext {
            sender: parse_hex32(sender, "sender")?,
            timestamp: self.chain.read().timestamp,
        })
    }

    fn balance(&self, address: &Address) -> BalanceRpc {
        BalanceRpc {
            address: hex::encode(address),
            payment: self.ledger.payment_balance(address),
            asset: self.ledger.asset_balance(address),
        }
    }

    fn auction_info(&self, auction_id: u64) -> Option<AuctionInfoRpc> {
        let now = self.chain.read().timestamp;
        let reserve = self.ledger.reserve(auction_id);
        self.registry
            .get(auction_id)
            .ok()
            .map(|a| a.with_state(|s| AuctionInfoRpc::from_state(s, now, reserve)))
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }

    fn auction_error(action: &str, e: AuctionError) -> ErrorObjectOwned {
        Self::rpc_error(&format!("Failed to {}: {}", action, e))
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut chain = self.chain.write();
        chain.advance_block();
        Ok(chain.block_info())
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        self.chain.write().set_timestamp(timestamp);
        info!(timestamp, "Timestamp set");
        Ok(true)
    }

    async fn admin_mint(
        &self,
        address: String,
        amount: u64,
    ) -> Result<BalanceRpc, ErrorObjectOwned> {
        let account = parse_hex32(&address, "address")?;
        self.ledger.mint_payment(account, amount);
        info!(address = %address, amount, "Payment asset minted");
        Ok(self.balance(&account))
    }

    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned> {
        let ctx = self.make_context(&params.sender)?;

        let defaults = AuctionParams::default();
        let organizer_key_ref = match params.organizer_key_ref {
            Some(key) => hex::decode(key.trim_start_matches("0x"))
                .map_err(|e| Self::rpc_error(&format!("Invalid organizer_key_ref: {}", e)))?,
            None => Vec::new(),
        };
        let auction_params = AuctionParams {
            total_supply: params.total_supply,
            min_price: params.min_price,
            max_price: params.max_price,
            commit_duration_secs: params
                .commit_duration_secs
                .unwrap_or(defaults.commit_duration_secs),
            reveal_duration_secs: params
                .reveal_duration_secs
                .unwrap_or(defaults.reveal_duration_secs),
            claim_duration_secs: params
                .claim_duration_secs
                .unwrap_or(defaults.claim_duration_secs),
            quantity_scale: params.quantity_scale.unwrap_or(defaults.quantity_scale),
            organizer_key_ref,
        };

        let auction_id = self
            .registry
            .create_auction(&ctx, auction_params)
            .map_err(|e| Self::auction_error("create auction", e))?;

        // The organizer deposits the full supply up front.
        self.ledger.fund_reserve(auction_id, params.total_supply);

        Ok(auction_id)
    }

    async fn auction_commit_bid(&self, params: CommitBidParams) -> Result<bool, ErrorObjectOwned> {
        let ctx = self.make_context(&params.sender)?;
        let commitment = CommitmentHash(parse_hex32(&params.commitment, "commitment")?);
        let encrypted_payload = hex::decode(params.encrypted_payload.trim_start_matches("0x"))
            .map_err(|e| Self::rpc_error(&format!("Invalid encrypted_payload: {}", e)))?;

        self.registry
            .get(params.auction_id)
            .and_then(|a| a.commit_bid(&ctx, commitment, encrypted_payload))
            .map_err(|e| Self::auction_error("commit bid", e))?;

        Ok(true)
    }

    async fn auction_reveal_bid(&self, params: RevealBidParams) -> Result<bool, ErrorObjectOwned> {
        let ctx = self.make_context(&params.sender)?;
        let salt = parse_hex32(&params.salt, "salt")?;

        self.registry
            .get(params.auction_id)
            .and_then(|a| a.reveal_bid(&ctx, params.price, params.quantity, salt))
            .map_err(|e| Self::auction_error("reveal bid", e))?;

        Ok(true)
    }

    async fn auction_finalize(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<FinalizeRpc, ErrorObjectOwned> {
        let ctx = self.make_context(&sender)?;

        let event = self
            .registry
            .get(auction_id)
            .and_then(|a| a.finalize(&ctx))
            .map_err(|e| Self::auction_error("finalize", e))?;

        match event {
            AuctionEvent::AuctionFinalized {
                clearing_price,
                total_allocated_quantity,
                oversubscribed,
                allocations,
                ..
            } => Ok(FinalizeRpc {
                clearing_price,
                total_allocated_quantity,
                oversubscribed,
                winners: allocations.len(),
            }),
            other => Err(Self::rpc_error(&format!(
                "Unexpected event from finalize: {}",
                other.name()
            ))),
        }
    }

    async fn auction_claim_tokens(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<ClaimReceiptRpc, ErrorObjectOwned> {
        let ctx = self.make_context(&sender)?;

        let auction = self
            .registry
            .get(auction_id)
            .map_err(|e| Self::auction_error("claim tokens", e))?;

        // The engine leaves the claim deadline to the host.
        let expired = auction.with_state(|s| {
            let clock = s.clock();
            clock.check_claim().is_ok() && !clock.is_claim_window_open(ctx.timestamp)
        });
        if expired {
            return Err(Self::rpc_error("Failed to claim tokens: claim window closed"));
        }

        let event = auction
            .claim_tokens(&ctx)
            .map_err(|e| Self::auction_error("claim tokens", e))?;

        match event {
            AuctionEvent::TokensClaimed {
                allocation,
                payment,
                ..
            } => Ok(ClaimReceiptRpc {
                allocation,
                payment,
            }),
            other => Err(Self::rpc_error(&format!(
                "Unexpected event from claim: {}",
                other.name()
            ))),
        }
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        Ok(self.chain.read().block_info())
    }

    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionInfoRpc>, ErrorObjectOwned> {
        Ok(self.auction_info(auction_id))
    }

    async fn query_get_bid(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<Option<BidRpc>, ErrorObjectOwned> {
        let bidder = parse_hex32(&bidder, "bidder")?;
        let auction = self
            .registry
            .get(auction_id)
            .map_err(|e| Self::auction_error("get bid", e))?;
        Ok(auction.bid(&bidder).as_ref().map(BidRpc::from))
    }

    async fn query_get_events(
        &self,
        auction_id: u64,
        from: usize,
    ) -> Result<Vec<EventRpc>, ErrorObjectOwned> {
        let auction = self
            .registry
            .get(auction_id)
            .map_err(|e| Self::auction_error("get events", e))?;

        match auction.query(AuctionQuery::Events { from }) {
            AuctionQueryResponse::Events(events) => Ok(events.iter().map(EventRpc::from).collect()),
            _ => Err(Self::rpc_error("Unexpected query response")),
        }
    }

    async fn query_list_auctions(&self) -> Result<Vec<AuctionInfoRpc>, ErrorObjectOwned> {
        let now = self.chain.read().timestamp;
        Ok(self
            .registry
            .list()
            .iter()
            .map(|a| {
                let reserve = self.ledger.reserve(a.id());
                a.with_state(|s| AuctionInfoRpc::from_state(s, now, reserve))
            })
            .collect())
    }

    async fn query_get_balance(&self, address: String) -> Result<BalanceRpc, ErrorObjectOwned> {
        let account = parse_hex32(&address, "address")?;
        Ok(self.balance(&account))
    }
}

fn parse_hex32(s: &str, field: &str) -> Result<[u8; 32], ErrorObjectOwned> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| MockChainServer::rpc_error(&format!("Invalid {} hex: {}", field, e)))?
        .try_into()
        .map_err(|_| MockChainServer::rpc_error(&format!("{} must be 32 bytes", field)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("auction_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("Starting mock chain server on {}", args.listen);

    let server = Server::builder().build(args.listen).await?;
    let handle = server.start(MockChainServer::new(args.initial_timestamp, args.block_time).into_rpc());

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
    use auction_types::compute_bid_commitment;

    fn server() -> MockChainServer {
        MockChainServer::new(1_000, 12)
    }

    fn addr(byte: u8) -> String {
        hex::encode([byte; 32])
    }

    fn create_params(sender: &str) -> CreateAuctionParams {
        CreateAuctionParams {
            sender: sender.to_string(),
            total_supply: 100,
            min_price: 1,
            max_price: 1_000,
            commit_duration_secs: Some(100),
            reveal_duration_secs: Some(100),
            claim_duration_secs: Some(100),
            quantity_scale: None,
            organizer_key_ref: None,
        }
    }

    #[tokio::test]
    async fn test_full_round_over_rpc_methods() {
        let server = server();
        let organizer = addr(9);
        let bidder = addr(1);
        let salt = [4u8; 32];

        let id = server.auction_create(create_params(&organizer)).await.unwrap();
        assert_eq!(server.ledger.reserve(id), 100);

        let commitment = compute_bid_commitment(&[1u8; 32], 50, 40, &salt);
        server
            .auction_commit_bid(CommitBidParams {
                sender: bidder.clone(),
                auction_id: id,
                commitment: hex::encode(commitment.0),
                encrypted_payload: "0xdead".to_string(),
            })
            .await
            .unwrap();

        server.admin_set_timestamp(1_150).await.unwrap();
        server
            .auction_reveal_bid(RevealBidParams {
                sender: bidder.clone(),
                auction_id: id,
                price: 50,
                quantity: 40,
                salt: hex::encode(salt),
            })
            .await
            .unwrap();

        server.admin_set_timestamp(1_200).await.unwrap();
        let finalized = server.auction_finalize(organizer.clone(), id).await.unwrap();
        assert_eq!(finalized.clearing_price, 50);
        assert_eq!(finalized.total_allocated_quantity, 40);
        assert!(!finalized.oversubscribed);

        server.admin_mint(bidder.clone(), 5_000).await.unwrap();
        let receipt = server.auction_claim_tokens(bidder.clone(), id).await.unwrap();
        assert_eq!(receipt.allocation, 40);
        assert_eq!(receipt.payment, 2_000);

        let balance = server.query_get_balance(bidder.clone()).await.unwrap();
        assert_eq!(balance.payment, 3_000);
        assert_eq!(balance.asset, 40);

        let events = server.query_get_events(id, 0).await.unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[3], EventRpc::TokensClaimed { payment: 2_000, .. }));

        let info = server.query_get_auction(id).await.unwrap().unwrap();
        assert_eq!(info.phase, "finalized");
        assert_eq!(info.reserve, 60);
    }

    #[tokio::test]
    async fn test_bid_hidden_until_revealed() {
        let server = server();
        let id = server.auction_create(create_params(&addr(9))).await.unwrap();

        server
            .auction_commit_bid(CommitBidParams {
                sender: addr(1),
                auction_id: id,
                commitment: hex::encode([7u8; 32]),
                encrypted_payload: "01".to_string(),
            })
            .await
            .unwrap();

        let bid = server.query_get_bid(id, addr(1)).await.unwrap().unwrap();
        assert!(!bid.revealed);
        assert_eq!(bid.price, None);
        assert_eq!(bid.quantity, None);
    }

    #[tokio::test]
    async fn test_engine_errors_become_rpc_errors() {
        let server = server();
        assert!(server.auction_finalize(addr(9), 7).await.is_err());
        assert!(server.query_get_events(7, 0).await.is_err());
        assert!(server.query_get_auction(7).await.unwrap().is_none());
        assert!(server.admin_mint("xyz".to_string(), 1).await.is_err());
    }

    #[tokio::test]
    async fn test_advance_block() {
        let server = server();
        let info = server.admin_advance_block().await.unwrap();
        assert_eq!(info.height, 1);
        assert_eq!(info.timestamp, 1_012);
    }

    #[tokio::test]
    async fn test_advance_block_at_max_timestamp() {
        let server = server();
        server.admin_set_timestamp(u64::MAX).await.unwrap();
        let info = server.admin_advance_block().await.unwrap();
        assert_eq!(info.height, 1);
        assert_eq!(info.timestamp, u64::MAX);
    }

    #[tokio::test]
    async fn test_claim_rejected_after_claim_deadline() {
        let server = server();
        let organizer = addr(9);
        let bidder = addr(1);
        let salt = [5u8; 32];

        let id = server.auction_create(create_params(&organizer)).await.unwrap();
        let commitment = compute_bid_commitment(&[1u8; 32], 20, 10, &salt);
        server
            .auction_commit_bid(CommitBidParams {
                sender: bidder.clone(),
                auction_id: id,
                commitment: hex::encode(commitment.0),
                encrypted_payload: "aa".to_string(),
            })
            .await
            .unwrap();

        server.admin_set_timestamp(1_150).await.unwrap();
        server
            .auction_reveal_bid(RevealBidParams {
                sender: bidder.clone(),
                auction_id: id,
                price: 20,
                quantity: 10,
                salt: hex::encode(salt),
            })
            .await
            .unwrap();

        server.admin_set_timestamp(1_200).await.unwrap();
        server.auction_finalize(organizer, id).await.unwrap();
        server.admin_mint(bidder.clone(), 1_000).await.unwrap();

        // Claim window is [1200, 1300)
        server.admin_set_timestamp(1_300).await.unwrap();
        assert!(server.auction_claim_tokens(bidder.clone(), id).await.is_err());

        let balance = server.query_get_balance(bidder.clone()).await.unwrap();
        assert_eq!(balance.payment, 1_000);
        assert_eq!(balance.asset, 0);
        assert_eq!(server.ledger.reserve(id), 100);

        let bid = server.query_get_bid(id, bidder).await.unwrap().unwrap();
        assert!(!bid.claimed);
    }
}
