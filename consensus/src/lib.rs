//! Social Ledger Consensus Application
//!
//! Wraps the ledger engine in the block lifecycle of a BFT consensus engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │          Consensus engine / block replay            │
//! └────────────────────┬────────────────────────────────┘
//!                      │ BeginBlock, DeliverTx*, Commit
//!                      ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              ABCI Application                       │
//! │  committed MemStore + pending block WriteBuffer     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//!                      ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              Ledger Core                            │
//! │  TxEngine over layered caches, Merkle app hash      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # ABCI Methods
//!
//! - **InitChain**: Store the chain id and genesis accounts
//! - **BeginBlock**: Fix height and time for the block
//! - **CheckTx**: Validate against committed state; never persists
//! - **DeliverTx**: Execute over the block's pending writes
//! - **Commit**: Pay matured rewards, flush, compute the app hash
//! - **Query**: Read-only JSON views of committed state
//!
//! Fatal state machine errors halt the process; replicas must not diverge.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod abci;
pub mod config;
pub mod error;
pub mod replay;
pub mod state;

// Re-exports
pub use abci::{Application, SocialApp};
pub use config::Config;
pub use error::{Error, Result};
pub use replay::{replay_blocks, Block, Genesis};
