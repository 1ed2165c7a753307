//! Consensus state management

use ledger_core::types::BlockContext;
use parking_lot::RwLock;

/// Chain position as seen by the application
///
/// `height` and `app_hash` describe the last committed block. `block` is
/// set between BeginBlock and Commit.
#[derive(Debug)]
pub struct ConsensusState {
    /// Last committed height
    height: RwLock<u64>,

    /// Last committed app hash
    app_hash: RwLock<Vec<u8>>,

    /// Block currently being executed
    block: RwLock<Option<BlockContext>>,

    /// Transactions delivered in the current block
    delivered: RwLock<u64>,
}

impl ConsensusState {
    /// Create new consensus state
    pub fn new() -> Self {
        Self {
            height: RwLock::new(0),
            app_hash: RwLock::new(vec![0u8; 32]),
            block: RwLock::new(None),
            delivered: RwLock::new(0),
        }
    }

    /// Last committed height
    pub fn height(&self) -> u64 {
        *self.height.read()
    }

    /// Last committed app hash
    pub fn app_hash(&self) -> Vec<u8> {
        self.app_hash.read().clone()
    }

    /// Block currently open, if any
    pub fn block(&self) -> Option<BlockContext> {
        *self.block.read()
    }

    /// Open a block
    pub fn begin_block(&self, ctx: BlockContext) {
        *self.block.write() = Some(ctx);
        *self.delivered.write() = 0;
    }

    /// Count a delivered transaction
    pub fn record_delivered(&self) {
        *self.delivered.write() += 1;
    }

    /// Transactions delivered since BeginBlock
    pub fn delivered(&self) -> u64 {
        *self.delivered.read()
    }

    /// Close the open block at `height` with `app_hash`
    pub fn commit(&self, height: u64, app_hash: Vec<u8>) {
        *self.height.write() = height;
        *self.app_hash.write() = app_hash;
        *self.block.write() = None;
    }

    /// Record the genesis app hash
    pub fn set_app_hash(&self, app_hash: Vec<u8>) {
        *self.app_hash.write() = app_hash;
    }
}

impl Default for ConsensusState {
    fn default() -> Self {
        Self::new()
    }
}
