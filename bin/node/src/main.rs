//! Optimistic rollup node
//!
//! A minimal node that:
//! - Keeps the state ledger, challenge protocol and deposit ledger in memory
//! - Applies every request through one lock, in arrival order
//! - Serves JSON-RPC on `POST /` and a health check on `GET /health`

mod rpc;

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rollup_core::{short_hex, AccountId, Amount, InMemoryVault, Rollup, RollupConfig, SystemClock};

/// Treasury address (0x0000...0001)
const TREASURY_ADDRESS: AccountId = {
    let mut addr = [0u8; 32];
    addr[31] = 1;
    addr
};

/// Treasury external funds: 1,000 ETH in wei
const DEFAULT_TREASURY_BALANCE: Amount = 1_000_000_000_000_000_000_000;

/// Node configuration
#[derive(Clone, Debug)]
struct NodeConfig {
    rpc_addr: String,
    treasury_balance: Amount,
    rollup: RollupConfig,
}

impl NodeConfig {
    /// Load from environment variables
    fn from_env() -> Self {
        Self {
            rpc_addr: env::var("RPC_ADDR").unwrap_or_else(|_| "0.0.0.0:8547".to_string()),
            treasury_balance: env::var("TREASURY_BALANCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TREASURY_BALANCE),
            rollup: RollupConfig::from_env(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting optimistic rollup node...");

    let config = NodeConfig::from_env();
    info!("  Challenge window: {}s", config.rollup.challenge_window_secs);
    match config.rollup.resolver {
        Some(resolver) => info!("  Resolver: 0x{}", hex::encode(resolver)),
        None => info!("  Resolver: open"),
    }

    let mut vault = InMemoryVault::new();
    vault.fund(TREASURY_ADDRESS, config.treasury_balance);
    info!(
        "Funded treasury 0x{} with {} wei",
        short_hex(&TREASURY_ADDRESS),
        config.treasury_balance
    );

    let rollup = Rollup::with_parts(config.rollup.clone(), SystemClock, vault);
    let app = rpc::router(Arc::new(Mutex::new(rollup)));

    let listener = tokio::net::TcpListener::bind(&config.rpc_addr)
        .await
        .with_context(|| format!("binding {}", config.rpc_addr))?;
    info!("RPC server listening on {}", config.rpc_addr);

    axum::serve(listener, app).await.context("rpc server")?;
    Ok(())
}
