//! ABCI Application implementation
//!
//! Drives the ledger engine through the block lifecycle a BFT consensus
//! engine imposes: InitChain once, then per block BeginBlock, any number of
//! DeliverTx, and Commit. CheckTx and Query may interleave at any time and
//! only ever see committed state.

use crate::state::ConsensusState;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use ledger_core::crypto::to_hex;
use ledger_core::types::{AccountName, BlockContext, Permlink};
use ledger_core::{
    ledger, post, CacheLayer, ExecMode, GenesisAccount, MemStore, State, TxEngine, WriteBuffer,
    CODE_OK,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// InitChain request
#[derive(Debug, Clone)]
pub struct InitChainRequest {
    /// Genesis time
    pub time: DateTime<Utc>,
    /// Chain ID
    pub chain_id: String,
    /// JSON array of genesis accounts
    pub app_state_bytes: Vec<u8>,
}

/// InitChain response
#[derive(Debug, Clone, Default)]
pub struct InitChainResponse {
    /// App hash of the genesis state
    pub app_hash: Vec<u8>,
}

/// Info response
#[derive(Debug, Clone, Default)]
pub struct InfoResponse {
    /// Application name
    pub data: String,
    /// Application version
    pub version: String,
    /// Last committed height
    pub last_block_height: u64,
    /// Last committed app hash
    pub last_block_app_hash: Vec<u8>,
}

/// CheckTx request
#[derive(Debug, Clone, Default)]
pub struct CheckTxRequest {
    /// Wire-encoded transaction
    pub tx: Vec<u8>,
}

/// CheckTx response
#[derive(Debug, Clone, Default)]
pub struct CheckTxResponse {
    /// Result code, 0 on success
    pub code: u32,
    /// Transaction id on success
    pub data: Vec<u8>,
    /// Error or refund message
    pub log: String,
}

/// BeginBlock request
#[derive(Debug, Clone)]
pub struct BeginBlockRequest {
    /// Height of the block being opened
    pub height: u64,
    /// Block time
    pub time: DateTime<Utc>,
}

/// DeliverTx request
#[derive(Debug, Clone, Default)]
pub struct DeliverTxRequest {
    /// Wire-encoded transaction
    pub tx: Vec<u8>,
}

/// DeliverTx response
#[derive(Debug, Clone, Default)]
pub struct DeliverTxResponse {
    /// Result code, 0 on success
    pub code: u32,
    /// Transaction id on success
    pub data: Vec<u8>,
    /// Error or refund message
    pub log: String,
}

/// Commit response
#[derive(Debug, Clone, Default)]
pub struct CommitResponse {
    /// App hash after the block
    pub data: Vec<u8>,
    /// Posts paid by the reward sweep
    pub rewards_issued: u64,
}

/// Query request
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    /// `/account/<name>`, `/post/<permlink>`, `/like/<liker>/<permlink>`
    /// or `/donations/<donator>/<permlink>`
    pub path: String,
}

/// Query response
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    /// Result code, 0 on success
    pub code: u32,
    /// Error message
    pub log: String,
    /// JSON document
    pub value: Vec<u8>,
    /// Height the answer was read at
    pub height: u64,
}

/// Block lifecycle callbacks, in the order a consensus engine issues them
pub trait Application {
    /// Report the last committed position
    fn info(&self) -> InfoResponse;

    /// Create the genesis state
    fn init_chain(&self, request: InitChainRequest) -> InitChainResponse;

    /// Mempool admission
    fn check_tx(&self, request: CheckTxRequest) -> CheckTxResponse;

    /// Open a block
    fn begin_block(&self, request: BeginBlockRequest);

    /// Execute a transaction in the open block
    fn deliver_tx(&self, request: DeliverTxRequest) -> DeliverTxResponse;

    /// Close the open block
    fn commit(&self) -> CommitResponse;

    /// Read committed state
    fn query(&self, request: QueryRequest) -> QueryResponse;
}

/// Committed store plus the open block's writes
#[derive(Debug, Default)]
struct Stores {
    committed: MemStore,
    pending: WriteBuffer,
    last_block_time: Option<DateTime<Utc>>,
}

/// Social ledger ABCI application
#[derive(Debug)]
pub struct SocialApp {
    /// Transaction engine
    engine: TxEngine,

    /// Consensus state
    state: Arc<ConsensusState>,

    stores: Mutex<Stores>,
}

impl SocialApp {
    /// Create new ABCI application
    pub fn new(engine: TxEngine) -> Self {
        Self {
            engine,
            state: Arc::new(ConsensusState::new()),
            stores: Mutex::new(Stores::default()),
        }
    }

    /// Get consensus state
    pub fn state(&self) -> Arc<ConsensusState> {
        self.state.clone()
    }

    /// Transaction engine
    pub fn engine(&self) -> &TxEngine {
        &self.engine
    }

    /// InitChain that reports failure instead of aborting
    pub fn try_init_chain(&self, request: &InitChainRequest) -> Result<InitChainResponse> {
        if request.chain_id != self.engine.config().chain_id {
            return Err(Error::Abci(format!(
                "genesis chain id {} does not match configured {}",
                request.chain_id,
                self.engine.config().chain_id
            )));
        }
        let accounts: Vec<GenesisAccount> = serde_json::from_slice(&request.app_state_bytes)?;

        let mut stores = self.stores.lock();
        if !stores.committed.is_empty() {
            return Err(Error::Abci("chain already initialized".to_string()));
        }

        let ctx = BlockContext::new(0, request.time);
        self.engine
            .init_chain(&mut stores.committed, &request.chain_id, &ctx, &accounts)?;
        stores.last_block_time = Some(request.time);

        let app_hash = stores.committed.app_hash().to_vec();
        self.state.set_app_hash(app_hash.clone());

        info!(
            chain_id = %request.chain_id,
            accounts = accounts.len(),
            app_hash = %to_hex(&app_hash),
            "InitChain"
        );
        Ok(InitChainResponse { app_hash })
    }

    fn query_inner(&self, path: &str) -> Result<Vec<u8>> {
        let mut stores = self.stores.lock();
        let state = State::new(&mut stores.committed);

        let segments: Vec<&str> = path.trim_start_matches('/').splitn(3, '/').collect();
        match segments.as_slice() {
            ["account", name] => {
                let name = AccountName::new(*name);
                let account = ledger::must_get_account(&state, &name)?;
                to_json(&account)
            }
            ["post", permlink] => {
                let post = post::must_get_post(&state, &Permlink::parse(*permlink))?;
                to_json(&post)
            }
            ["like", liker, permlink] => {
                let permlink = Permlink::parse(*permlink);
                let like = post::get_like(&state, &AccountName::new(*liker), &permlink)?
                    .ok_or_else(|| {
                        ledger_core::Error::InvalidInput(format!(
                            "{} has not liked {}",
                            liker, permlink
                        ))
                    })?;
                to_json(&like)
            }
            ["donations", donator, permlink] => {
                let permlink = Permlink::parse(*permlink);
                post::must_get_post(&state, &permlink)?;
                let donator = AccountName::new(*donator);
                to_json(&post::get_donations(&state, &donator, &permlink)?)
            }
            _ => Err(Error::Abci(format!("unknown query path: {}", path))),
        }
    }

    fn check_context(&self, stores: &Stores) -> BlockContext {
        match self.state.block() {
            Some(ctx) => ctx,
            None => BlockContext::new(
                self.state.height() + 1,
                stores.last_block_time.unwrap_or_default(),
            ),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Abort the node; replicas cannot continue past corrupted state
fn halt(stage: &str, e: &dyn std::fmt::Display) -> ! {
    error!(stage, error = %e, "fatal state machine error, halting");
    panic!("fatal error during {}: {}", stage, e);
}

impl Application for SocialApp {
    /// Info - Return information about application state
    fn info(&self) -> InfoResponse {
        let height = self.state.height();
        let app_hash = self.state.app_hash();

        debug!(height, app_hash = %to_hex(&app_hash), "Info request");

        InfoResponse {
            data: "Social Ledger".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            last_block_height: height,
            last_block_app_hash: app_hash,
        }
    }

    /// InitChain - Initialize blockchain on genesis
    fn init_chain(&self, request: InitChainRequest) -> InitChainResponse {
        match self.try_init_chain(&request) {
            Ok(response) => response,
            Err(e) => halt("init_chain", &e),
        }
    }

    /// CheckTx - Validate transaction against committed state only
    fn check_tx(&self, request: CheckTxRequest) -> CheckTxResponse {
        let mut stores = self.stores.lock();
        let ctx = self.check_context(&stores);

        match self
            .engine
            .exec_tx_bytes(&mut stores.committed, &request.tx, ExecMode::Check, &ctx)
        {
            Ok(receipt) => CheckTxResponse {
                code: receipt.code(),
                data: receipt.tx_id.to_vec(),
                log: receipt.log(),
            },
            Err(e) if e.is_fatal() => halt("check_tx", &e),
            Err(e) => CheckTxResponse {
                code: e.code(),
                data: Vec::new(),
                log: e.to_string(),
            },
        }
    }

    /// BeginBlock - Fix the block context for every DeliverTx
    fn begin_block(&self, request: BeginBlockRequest) {
        let expected = self.state.height() + 1;
        if request.height != expected {
            warn!(
                height = request.height,
                expected, "BeginBlock height out of order"
            );
        }
        self.state
            .begin_block(BlockContext::new(request.height, request.time));
        debug!(height = request.height, "BeginBlock");
    }

    /// DeliverTx - Execute transaction over the open block's writes
    fn deliver_tx(&self, request: DeliverTxRequest) -> DeliverTxResponse {
        let ctx = match self.state.block() {
            Some(ctx) => ctx,
            None => {
                let e = Error::Abci("DeliverTx outside of a block".to_string());
                warn!(error = %e, "DeliverTx rejected");
                return DeliverTxResponse {
                    code: e.code(),
                    log: e.to_string(),
                    ..Default::default()
                };
            }
        };

        let mut stores = self.stores.lock();
        let Stores {
            committed, pending, ..
        } = &mut *stores;

        let mut overlay = CacheLayer::with_buffer(committed, std::mem::take(pending));
        let result = self
            .engine
            .exec_tx_bytes(&mut overlay, &request.tx, ExecMode::Deliver, &ctx);
        *pending = overlay.into_buffer();
        self.state.record_delivered();

        match result {
            Ok(receipt) => DeliverTxResponse {
                code: receipt.code(),
                data: receipt.tx_id.to_vec(),
                log: receipt.log(),
            },
            Err(e) if e.is_fatal() => halt("deliver_tx", &e),
            Err(e) => DeliverTxResponse {
                code: e.code(),
                data: Vec::new(),
                log: e.to_string(),
            },
        }
    }

    /// Commit - Sweep rewards, flush the block and compute the app hash
    fn commit(&self) -> CommitResponse {
        let ctx = match self.state.block() {
            Some(ctx) => ctx,
            None => halt("commit", &"Commit without BeginBlock"),
        };

        let mut stores = self.stores.lock();
        let Stores {
            committed,
            pending,
            last_block_time,
        } = &mut *stores;

        let mut overlay = CacheLayer::with_buffer(committed, std::mem::take(pending));
        let rewards_issued = match self.engine.issue_matured_rewards(&mut overlay, ctx.height) {
            Ok(paid) => paid,
            Err(e) => halt("commit", &e),
        };
        let writes = overlay.sync();
        *last_block_time = Some(ctx.time);

        let app_hash = committed.app_hash().to_vec();
        let txs = self.state.delivered();
        self.state.commit(ctx.height, app_hash.clone());
        self.engine.metrics().record_block_committed();

        info!(
            height = ctx.height,
            txs,
            writes,
            rewards_issued,
            app_hash = %to_hex(&app_hash),
            "Commit"
        );

        CommitResponse {
            data: app_hash,
            rewards_issued,
        }
    }

    /// Query - Read committed state as JSON
    fn query(&self, request: QueryRequest) -> QueryResponse {
        let height = self.state.height();
        match self.query_inner(&request.path) {
            Ok(value) => QueryResponse {
                code: CODE_OK,
                log: String::new(),
                value,
                height,
            },
            Err(e) => {
                debug!(path = %request.path, error = %e, "Query failed");
                QueryResponse {
                    code: e.code(),
                    log: e.to_string(),
                    value: Vec::new(),
                    height,
                }
            }
        }
    }
}
