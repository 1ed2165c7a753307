//! Social Node Binary
//!
//! Loads a genesis and a block file, replays every block through the ABCI
//! application and logs the app hash after each commit.

use anyhow::Context;
use consensus::replay::load_blocks;
use consensus::{replay_blocks, Application, Config, Genesis, SocialApp};
use ledger_core::crypto::to_hex;
use ledger_core::TxEngine;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    info!("Starting Social Node");

    // Load configuration
    let config = if let Ok(config_path) = std::env::var("CONSENSUS_CONFIG") {
        info!("Loading config from: {}", config_path);
        Config::from_file(&config_path)
            .with_context(|| format!("loading config {}", config_path))?
    } else {
        info!("Loading config from environment variables");
        Config::from_env()?
    };

    info!(node_id = %config.node_id, chain_id = %config.chain_id, "configuration loaded");

    let engine = TxEngine::new(config.ledger_config()?);
    let app = SocialApp::new(engine);

    let genesis = Genesis::from_file(&config.genesis_file)
        .with_context(|| format!("reading genesis {}", config.genesis_file.display()))?;
    let init = app.try_init_chain(&genesis.to_request()?)?;
    info!(app_hash = %to_hex(&init.app_hash), "genesis applied");

    let blocks = load_blocks(&config.blocks_file)
        .with_context(|| format!("reading blocks {}", config.blocks_file.display()))?;
    info!(blocks = blocks.len(), "Replaying blocks");

    let summaries = replay_blocks(&app, &blocks)?;
    let rejected: usize = summaries.iter().map(|s| s.rejected).sum();

    let info = app.info();
    info!(
        height = info.last_block_height,
        rejected,
        app_hash = %to_hex(&info.last_block_app_hash),
        "Replay finished"
    );
    println!("{}", to_hex(&info.last_block_app_hash));

    Ok(())
}
