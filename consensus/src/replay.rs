//! Genesis and block files, and replaying them through the application
//!
//! Both files are JSON. Transactions in a block file are the same enum the
//! wire codec carries, so amounts appear as decimal strings and signatures
//! as byte arrays.

use crate::abci::{
    Application, BeginBlockRequest, CheckTxRequest, DeliverTxRequest, InitChainRequest,
    SocialApp,
};
use crate::Result;
use chrono::{DateTime, Utc};
use ledger_core::crypto::to_hex;
use ledger_core::{GenesisAccount, Tx, CODE_OK};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Genesis document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genesis {
    /// Chain ID
    pub chain_id: String,
    /// Time of block 0
    pub genesis_time: DateTime<Utc>,
    /// Initial accounts
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
}

impl Genesis {
    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// InitChain request carrying this genesis
    pub fn to_request(&self) -> Result<InitChainRequest> {
        Ok(InitChainRequest {
            time: self.genesis_time,
            chain_id: self.chain_id.clone(),
            app_state_bytes: serde_json::to_vec(&self.accounts)?,
        })
    }
}

/// A block to replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Height
    pub height: u64,
    /// Block time
    pub time: DateTime<Utc>,
    /// Transactions in delivery order
    #[serde(default)]
    pub txs: Vec<Tx>,
}

/// Load a JSON array of blocks
pub fn load_blocks(path: impl AsRef<Path>) -> Result<Vec<Block>> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

/// Per-block outcome of a replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    /// Height
    pub height: u64,
    /// Transactions applied (including refunded AppTx)
    pub accepted: usize,
    /// Transactions rejected
    pub rejected: usize,
    /// App hash after Commit
    pub app_hash: Vec<u8>,
}

/// Run every block through CheckTx, DeliverTx and Commit
///
/// Transactions failing CheckTx are still delivered; a real mempool would
/// have dropped them, but DeliverTx must reject them on its own.
pub fn replay_blocks(app: &SocialApp, blocks: &[Block]) -> Result<Vec<BlockSummary>> {
    let mut summaries = Vec::with_capacity(blocks.len());

    for block in blocks {
        app.begin_block(BeginBlockRequest {
            height: block.height,
            time: block.time,
        });

        let mut accepted = 0;
        let mut rejected = 0;
        for tx in &block.txs {
            let bytes = tx.to_bytes()?;

            let check = app.check_tx(CheckTxRequest { tx: bytes.clone() });
            if check.code != CODE_OK {
                warn!(height = block.height, kind = tx.kind(), log = %check.log, "CheckTx failed");
            }

            let response = app.deliver_tx(DeliverTxRequest { tx: bytes });
            if response.code == CODE_OK || !response.data.is_empty() {
                accepted += 1;
            } else {
                rejected += 1;
                warn!(
                    height = block.height,
                    kind = tx.kind(),
                    account = %tx.signer(),
                    code = response.code,
                    log = %response.log,
                    "DeliverTx rejected"
                );
            }
        }

        let commit = app.commit();
        info!(
            height = block.height,
            accepted,
            rejected,
            app_hash = %to_hex(&commit.data),
            "block replayed"
        );
        summaries.push(BlockSummary {
            height: block.height,
            accepted,
            rejected,
            app_hash: commit.data,
        });
    }

    Ok(summaries)
}
