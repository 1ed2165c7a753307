//! Social Ledger Core
//!
//! Deterministic application state machine of a social-ledger chain: account
//! balances, a content graph of posts, comments and reposts, likes and views,
//! a follow graph, and a donation-funded reward economy with deferred payout.
//!
//! # Architecture
//!
//! - **Layered cache**: every transaction runs in a [`cache::CacheLayer`] that is
//!   synced on success and dropped on failure
//! - **Single pipeline**: CheckTx and DeliverTx share validation in [`engine::TxEngine`]
//! - **Stateless managers**: [`ledger`], [`post`], [`reward`] and [`social`]
//!   operate on a typed [`state::State`] view and hold nothing between calls
//! - **Merkle app hash**: [`store::MemStore::app_hash`] commits to every entry
//!
//! # Invariants
//!
//! - Value conservation: Σ balances + Σ pending post rewards + fee pool is
//!   unchanged by every transaction and every reward sweep
//! - Deterministic replay: same genesis and transactions give the same app hash
//! - Sequences only move by exactly 1 per accepted transaction
//! - The post graph is append-only and acyclic

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod cache;
pub mod codec;
pub mod coins;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod metrics;
pub mod plugin;
pub mod post;
pub mod reward;
pub mod social;
pub mod state;
pub mod store;
pub mod tx;
pub mod types;

// Re-exports
pub use cache::{CacheLayer, WriteBuffer};
pub use coins::{Coin, Coins};
pub use config::Config;
pub use engine::{ExecMode, GenesisAccount, TxEngine, TxOutcome, TxReceipt};
pub use error::{Error, Result, CODE_OK};
pub use state::State;
pub use store::{KvStore, MemStore};
pub use tx::Tx;
pub use types::{
    Account, AccountName, BlockContext, Donation, Like, Permlink, Post, PubKey, Signature, View,
};
