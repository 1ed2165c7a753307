//! Transaction engine
//!
//! One pipeline serves both CheckTx and DeliverTx:
//!
//! 1. basic validation (pure)
//! 2. load the acting accounts
//! 3. sequence, then signature, then type-specific preconditions
//! 4. Check mode stops here; Deliver mode applies the effect
//!
//! Everything runs inside a [`CacheLayer`] over the caller's store. Check
//! mode always discards it; Deliver mode syncs it on success and discards it
//! on error, so a rejected transaction leaves no trace.
//!
//! AppTx is the one path with a partial effect: the full input is debited,
//! the plugin runs in a nested cache, and if it fails its writes are dropped
//! and the principal is refunded. The fee is kept.

use crate::cache::CacheLayer;
use crate::coins::Coins;
use crate::config::Config;
use crate::crypto::{to_hex, tx_id};
use crate::ledger;
use crate::metrics::Metrics;
use crate::plugin::{Plugin, PluginContext, Plugins};
use crate::post::{self, NewPost};
use crate::reward;
use crate::social;
use crate::state::State;
use crate::store::KvStore;
use crate::tx::{validate_username, AppTx, Tx};
use crate::types::{Account, AccountName, BlockContext, Permlink, PubKey, Signature};
use crate::{Error, Result, CODE_OK};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Speculative or final execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Mempool admission; never persists anything
    Check,
    /// Block execution
    Deliver,
}

impl ExecMode {
    /// Metrics label
    pub fn label(&self) -> &'static str {
        match self {
            ExecMode::Check => "check",
            ExecMode::Deliver => "deliver",
        }
    }

    fn is_check(&self) -> bool {
        matches!(self, ExecMode::Check)
    }
}

/// How an accepted transaction ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// Fully applied
    Applied,
    /// Plugin failed; principal refunded, fee kept
    Refunded {
        /// Result code of the plugin error
        code: u32,
        /// Plugin error message
        log: String,
    },
}

/// Result of an accepted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// SHA-256 of the sign-bytes
    pub tx_id: [u8; 32],
    /// Transaction type
    pub kind: &'static str,
    /// Outcome
    pub outcome: TxOutcome,
}

impl TxReceipt {
    /// Result code handed back to the client
    pub fn code(&self) -> u32 {
        match &self.outcome {
            TxOutcome::Applied => CODE_OK,
            TxOutcome::Refunded { code, .. } => *code,
        }
    }

    /// Human-readable log line
    pub fn log(&self) -> String {
        match &self.outcome {
            TxOutcome::Applied => String::new(),
            TxOutcome::Refunded { log, .. } => format!("refunded: {}", log),
        }
    }

    fn result_label(&self) -> &'static str {
        match self.outcome {
            TxOutcome::Applied => "ok",
            TxOutcome::Refunded { .. } => "refunded",
        }
    }
}

/// Account created at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Username
    pub username: AccountName,
    /// Public key
    pub pub_key: PubKey,
    /// Initial balance
    #[serde(default)]
    pub coins: Coins,
}

#[derive(Debug, Clone, Copy)]
enum SequenceKind {
    Tx,
    Post,
}

/// Debits that already passed a balance check cannot fail
fn guarded<T>(result: Result<T>) -> Result<T> {
    result.map_err(|e| Error::InvariantViolation(format!("guarded operation failed: {}", e)))
}

/// Load the signer and check its sequence and signature.
///
/// The single advanced-validation step shared by both modes.
fn authenticate(
    state: &State<'_>,
    name: &AccountName,
    kind: SequenceKind,
    sequence: u64,
    signature: &Signature,
    sign_bytes: &[u8],
) -> Result<Account> {
    let mut account = ledger::must_get_account(state, name)?;
    match kind {
        SequenceKind::Tx => {
            ledger::verify_and_bump_sequence(&mut account, sequence, signature, sign_bytes)?
        }
        SequenceKind::Post => {
            ledger::verify_and_bump_post_sequence(&mut account, sequence, signature, sign_bytes)?
        }
    }
    Ok(account)
}

fn require_balance(account: &Account, coins: &Coins) -> Result<()> {
    if account.balance.is_gte(coins) {
        Ok(())
    } else {
        Err(Error::InsufficientFunds(format!(
            "{} holds {}, needs {}",
            account.username, account.balance, coins
        )))
    }
}

/// Validates and applies transactions against a store
pub struct TxEngine {
    config: Config,
    plugins: Plugins,
    metrics: Metrics,
}

impl TxEngine {
    /// Engine with the built-in plugins
    pub fn new(config: Config) -> Self {
        Self::with_plugins(config, Plugins::with_builtins())
    }

    /// Engine with a custom plugin registry
    pub fn with_plugins(config: Config, plugins: Plugins) -> Self {
        Self {
            config,
            plugins,
            metrics: Metrics::default(),
        }
    }

    /// Add a plugin
    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Store the chain id and create the genesis accounts
    pub fn init_chain(
        &self,
        store: &mut dyn KvStore,
        chain_id: &str,
        ctx: &BlockContext,
        accounts: &[GenesisAccount],
    ) -> Result<()> {
        if chain_id.is_empty() {
            return Err(Error::InvalidInput("chain id must not be empty".to_string()));
        }

        let mut cache = CacheLayer::new(store);
        {
            let mut state = State::new(&mut cache);
            state.set_chain_id(chain_id);
            for genesis in accounts {
                validate_username(&genesis.username, &self.config)?;
                if !genesis.coins.is_valid() {
                    return Err(Error::InvalidInput(format!(
                        "genesis balance of {} is malformed",
                        genesis.username
                    )));
                }
                let mut account =
                    ledger::create_account(&mut state, ctx, &genesis.username, genesis.pub_key)?;
                ledger::add_coin(&mut account, &genesis.coins);
                state.set_account(&account)?;
            }
        }
        cache.sync();

        info!(chain_id, accounts = accounts.len(), "chain initialized");
        Ok(())
    }

    /// Decode and execute wire bytes
    pub fn exec_tx_bytes(
        &self,
        store: &mut dyn KvStore,
        bytes: &[u8],
        mode: ExecMode,
        ctx: &BlockContext,
    ) -> Result<TxReceipt> {
        let tx = match Tx::from_bytes(bytes) {
            Ok(tx) => tx,
            Err(e) => {
                self.metrics.record_tx(mode.label(), e.category());
                warn!(mode = mode.label(), error = %e, "undecodable transaction");
                return Err(e);
            }
        };
        self.exec_tx(store, &tx, mode, ctx)
    }

    /// Execute one transaction
    pub fn exec_tx(
        &self,
        store: &mut dyn KvStore,
        tx: &Tx,
        mode: ExecMode,
        ctx: &BlockContext,
    ) -> Result<TxReceipt> {
        let result = self.exec_scoped(store, tx, mode, ctx);

        match &result {
            Ok(receipt) => {
                self.metrics.record_tx(mode.label(), receipt.result_label());
                if mode == ExecMode::Deliver {
                    info!(
                        tx_id = %to_hex(&receipt.tx_id),
                        kind = receipt.kind,
                        account = %tx.signer(),
                        height = ctx.height,
                        code = receipt.code(),
                        "tx delivered"
                    );
                }
            }
            Err(e) => {
                self.metrics.record_tx(mode.label(), e.category());
                if e.is_fatal() {
                    error!(kind = tx.kind(), height = ctx.height, error = %e, "invariant violated");
                } else {
                    warn!(
                        mode = mode.label(),
                        kind = tx.kind(),
                        account = %tx.signer(),
                        code = e.code(),
                        error = %e,
                        "tx rejected"
                    );
                }
            }
        }
        result
    }

    fn exec_scoped(
        &self,
        store: &mut dyn KvStore,
        tx: &Tx,
        mode: ExecMode,
        ctx: &BlockContext,
    ) -> Result<TxReceipt> {
        tx.validate_basic(&self.config)?;

        let chain_id = State::new(&mut *store).chain_id()?;
        let sign_bytes = tx.sign_bytes(&chain_id)?;
        let id = tx_id(&sign_bytes);

        let mut cache = CacheLayer::new(store);
        let result = match tx {
            Tx::App(app) => self.run_app(&mut cache, app, &sign_bytes, mode, ctx),
            other => {
                let mut state = State::new(&mut cache);
                self.run(&mut state, other, &sign_bytes, mode, ctx)
                    .map(|()| TxOutcome::Applied)
            }
        };

        match (mode, result) {
            (ExecMode::Deliver, Ok(outcome)) => {
                let writes = cache.sync();
                debug!(tx_id = %to_hex(&id), writes, "tx cache synced");
                Ok(TxReceipt {
                    tx_id: id,
                    kind: tx.kind(),
                    outcome,
                })
            }
            (_, result) => {
                cache.discard();
                result.map(|outcome| TxReceipt {
                    tx_id: id,
                    kind: tx.kind(),
                    outcome,
                })
            }
        }
    }

    fn run(
        &self,
        state: &mut State<'_>,
        tx: &Tx,
        sign_bytes: &[u8],
        mode: ExecMode,
        ctx: &BlockContext,
    ) -> Result<()> {
        match tx {
            Tx::Register(tx) => {
                if state.has_account(&tx.username) {
                    return Err(Error::AccountAlreadyExists(tx.username.to_string()));
                }
                ledger::verify_registration(&tx.pub_key, &tx.signature, sign_bytes)?;
                if mode.is_check() {
                    return Ok(());
                }
                ledger::create_account(state, ctx, &tx.username, tx.pub_key)?;
            }

            Tx::Send(tx) => {
                let mut receiver = ledger::must_get_account(state, &tx.output.username)?;
                let mut sender = authenticate(
                    state,
                    &tx.input.username,
                    SequenceKind::Tx,
                    tx.input.sequence,
                    &tx.input.signature,
                    sign_bytes,
                )?;
                require_balance(&sender, &tx.input.coins)?;
                state.set_account(&sender)?;
                if mode.is_check() {
                    return Ok(());
                }

                guarded(ledger::minus_coin(&mut sender, &tx.input.coins))?;
                ledger::touch(&mut sender, ctx);
                ledger::add_coin(&mut receiver, &tx.output.coins);
                state.set_account(&sender)?;
                state.set_account(&receiver)?;
                state.add_to_fee_pool(&tx.fee)?;
            }

            Tx::Post(tx) => {
                let mut author = authenticate(
                    state,
                    &tx.author,
                    SequenceKind::Post,
                    tx.sequence,
                    &tx.signature,
                    sign_bytes,
                )?;
                let new = NewPost {
                    author: tx.author.clone(),
                    post_id: tx.post_id.clone(),
                    sequence: author.post_sequence,
                    title: tx.title.clone(),
                    content: tx.content.clone(),
                    parent: tx.parent.clone(),
                    source: tx.source.clone(),
                    split_rate: tx.split_rate,
                };
                post::check_create(state, &new)?;
                ledger::touch(&mut author, ctx);
                state.set_account(&author)?;
                if mode.is_check() {
                    return Ok(());
                }

                post::create_post(state, ctx, self.config.reward.maturity_interval, new)?;
            }

            Tx::Like(tx) => {
                let mut liker = authenticate(
                    state,
                    &tx.liker,
                    SequenceKind::Tx,
                    tx.sequence,
                    &tx.signature,
                    sign_bytes,
                )?;
                post::must_get_post(state, &tx.permlink)?;
                ledger::touch(&mut liker, ctx);
                state.set_account(&liker)?;
                if mode.is_check() {
                    return Ok(());
                }

                post::like_or_update(state, ctx, &tx.permlink, &tx.liker, tx.weight)?;
            }

            Tx::View(tx) => {
                let mut viewer = authenticate(
                    state,
                    &tx.viewer,
                    SequenceKind::Tx,
                    tx.sequence,
                    &tx.signature,
                    sign_bytes,
                )?;
                post::must_get_post(state, &tx.permlink)?;
                ledger::touch(&mut viewer, ctx);
                state.set_account(&viewer)?;
                if mode.is_check() {
                    return Ok(());
                }

                post::view(state, ctx, &tx.permlink, &tx.viewer)?;
            }

            Tx::Donate(tx) => {
                let donator = authenticate(
                    state,
                    &tx.input.username,
                    SequenceKind::Tx,
                    tx.input.sequence,
                    &tx.input.signature,
                    sign_bytes,
                )?;
                state.set_account(&donator)?;
                reward::check_donate(state, &tx.input.username, &tx.permlink, &tx.input.coins, &tx.fee)?;
                if mode.is_check() {
                    return Ok(());
                }

                reward::donate(state, ctx, &tx.input.username, &tx.permlink, &tx.input.coins, &tx.fee)?;
            }

            Tx::Follow(tx) => {
                ledger::must_get_account(state, &tx.followee)?;
                let follower = authenticate(
                    state,
                    &tx.follower,
                    SequenceKind::Tx,
                    tx.sequence,
                    &tx.signature,
                    sign_bytes,
                )?;
                state.set_account(&follower)?;
                if mode.is_check() {
                    return Ok(());
                }

                if tx.is_follow {
                    social::follow(state, ctx, &tx.follower, &tx.followee)?;
                } else {
                    social::unfollow(state, ctx, &tx.follower, &tx.followee)?;
                }
            }

            Tx::App(_) => {
                return Err(Error::InvariantViolation(
                    "app transactions need a nested scope".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn run_app(
        &self,
        cache: &mut CacheLayer<'_>,
        tx: &AppTx,
        sign_bytes: &[u8],
        mode: ExecMode,
        ctx: &BlockContext,
    ) -> Result<TxOutcome> {
        let principal = tx.input.coins.checked_minus(&tx.fee).ok_or_else(|| {
            Error::InvalidInput(format!("fee {} exceeds input {}", tx.fee, tx.input.coins))
        })?;

        let refund = {
            let mut state = State::new(&mut *cache);
            let mut caller = authenticate(
                &state,
                &tx.input.username,
                SequenceKind::Tx,
                tx.input.sequence,
                &tx.input.signature,
                sign_bytes,
            )?;
            require_balance(&caller, &tx.input.coins)?;
            self.plugins.must_get(&tx.plugin)?;
            if mode.is_check() {
                state.set_account(&caller)?;
                return Ok(TxOutcome::Applied);
            }

            ledger::touch(&mut caller, ctx);
            let mut refund = caller.clone();
            guarded(ledger::minus_coin(&mut refund, &tx.fee))?;
            guarded(ledger::minus_coin(&mut caller, &tx.input.coins))?;
            state.set_account(&caller)?;
            state.add_to_fee_pool(&tx.fee)?;
            refund
        };

        let plugin = self.plugins.must_get(&tx.plugin)?;
        let plugin_ctx = PluginContext {
            caller: tx.input.username.clone(),
            principal,
            block: *ctx,
        };

        let result = {
            let mut nested = cache.cache_wrap();
            let result = plugin.run_tx(&mut State::new(&mut nested), &plugin_ctx, &tx.data);
            match result {
                Ok(()) => {
                    nested.sync();
                    Ok(())
                }
                Err(e) => {
                    nested.discard();
                    Err(e)
                }
            }
        };

        match result {
            Ok(()) => Ok(TxOutcome::Applied),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                State::new(&mut *cache).set_account(&refund)?;
                warn!(
                    account = %tx.input.username,
                    plugin = %tx.plugin,
                    code = e.code(),
                    error = %e,
                    "plugin failed, principal refunded"
                );
                Ok(TxOutcome::Refunded {
                    code: e.code(),
                    log: e.to_string(),
                })
            }
        }
    }

    /// Pay every post maturing at `height`
    pub fn issue_matured_rewards(&self, store: &mut dyn KvStore, height: u64) -> Result<u64> {
        let mut cache = CacheLayer::new(store);
        let paid = reward::issue_matured_rewards(&mut State::new(&mut cache), height)?;
        cache.sync();
        self.metrics.record_rewards_issued(paid);
        Ok(paid)
    }

    /// Governance hook: logically delete a post
    pub fn delete_post(
        &self,
        store: &mut dyn KvStore,
        ctx: &BlockContext,
        permlink: &Permlink,
    ) -> Result<()> {
        let mut cache = CacheLayer::new(store);
        post::delete_post(&mut State::new(&mut cache), ctx, permlink)?;
        cache.sync();
        Ok(())
    }
}

impl std::fmt::Debug for TxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxEngine")
            .field("chain_id", &self.config.chain_id)
            .field("plugins", &self.plugins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::Coin;
    use crate::crypto::KeyPair;
    use crate::store::MemStore;
    use crate::tx::{DonateTx, FollowTx, LikeTx, PostTx, RegisterTx, SendTx, TxInput, TxOutput};
    use chrono::DateTime;
    use rust_decimal::Decimal;

    const CHAIN: &str = "test-chain";

    fn ctx(height: u64) -> BlockContext {
        BlockContext::new(height, DateTime::from_timestamp(1_700_000_000 + height as i64, 0).unwrap())
    }

    fn coins(amount: i64) -> Coins {
        Coins::from(Coin::new("mycoin", amount))
    }

    fn key(name: &str) -> KeyPair {
        let mut seed = [0u8; 32];
        seed[..name.len()].copy_from_slice(name.as_bytes());
        KeyPair::from_seed(&seed)
    }

    struct FailingPlugin;

    impl Plugin for FailingPlugin {
        fn name(&self) -> &str {
            "failing"
        }

        fn run_tx(&self, state: &mut State<'_>, ctx: &PluginContext, _data: &[u8]) -> Result<()> {
            // Writes before failing must not survive
            let mut account = ledger::must_get_account(state, &ctx.caller)?;
            account.metadata = Some("dirty".to_string());
            state.set_account(&account)?;
            Err(Error::InvalidInput("plugin refused".to_string()))
        }
    }

    fn setup() -> (TxEngine, MemStore) {
        let mut engine = TxEngine::new(Config {
            chain_id: CHAIN.to_string(),
            ..Config::default()
        });
        engine.register_plugin(Box::new(FailingPlugin));

        let mut store = MemStore::new();
        let accounts: Vec<GenesisAccount> = [("alice", 7), ("bobby", 0), ("carol", 100)]
            .iter()
            .map(|(name, amount)| GenesisAccount {
                username: AccountName::new(*name),
                pub_key: key(name).public_key(),
                coins: coins(*amount),
            })
            .collect();
        engine.init_chain(&mut store, CHAIN, &ctx(0), &accounts).unwrap();
        (engine, store)
    }

    fn input(name: &str, amount: i64, sequence: u64) -> TxInput {
        TxInput {
            username: AccountName::new(name),
            coins: coins(amount),
            sequence,
            signature: Signature::empty(),
        }
    }

    fn signed(mut tx: Tx, signer: &str) -> Tx {
        tx.sign(CHAIN, &key(signer)).unwrap();
        tx
    }

    fn send(from: &str, to: &str, amount: i64, fee: i64, sequence: u64) -> Tx {
        signed(
            Tx::Send(SendTx {
                input: input(from, amount + fee, sequence),
                output: TxOutput {
                    username: AccountName::new(to),
                    coins: coins(amount),
                },
                fee: if fee == 0 { Coins::empty() } else { coins(fee) },
            }),
            from,
        )
    }

    fn balance(store: &mut MemStore, name: &str) -> Decimal {
        let state = State::new(store);
        ledger::must_get_account(&state, &AccountName::new(name))
            .unwrap()
            .balance
            .amount_of("mycoin")
    }

    fn app(plugin: &str, amount: i64, fee: i64, data: &[u8]) -> Tx {
        signed(
            Tx::App(AppTx {
                input: input("carol", amount, 1),
                fee: coins(fee),
                plugin: plugin.to_string(),
                data: data.to_vec(),
            }),
            "carol",
        )
    }

    #[test]
    fn test_send_conserves_balance() {
        let (engine, mut store) = setup();
        let tx = send("alice", "bobby", 4, 1, 1);
        let receipt = engine.exec_tx(&mut store, &tx, ExecMode::Deliver, &ctx(1)).unwrap();
        assert_eq!(receipt.code(), CODE_OK);

        assert_eq!(balance(&mut store, "alice"), Decimal::from(2));
        assert_eq!(balance(&mut store, "bobby"), Decimal::from(4));
        assert_eq!(State::new(&mut store).fee_pool().unwrap(), coins(1));
    }

    #[test]
    fn test_check_is_side_effect_free() {
        let (engine, mut store) = setup();
        let before = store.clone();
        let tx = send("alice", "bobby", 4, 1, 1);

        for _ in 0..3 {
            engine.exec_tx(&mut store, &tx, ExecMode::Check, &ctx(1)).unwrap();
        }
        assert_eq!(store, before);
        assert_eq!(
            engine.metrics().txs_total.with_label_values(&["check", "ok"]).get(),
            3
        );
    }

    #[test]
    fn test_replay_rejected() {
        let (engine, mut store) = setup();
        let tx = send("alice", "bobby", 1, 0, 1);
        engine.exec_tx(&mut store, &tx, ExecMode::Deliver, &ctx(1)).unwrap();

        let after_first = store.clone();
        let err = engine.exec_tx(&mut store, &tx, ExecMode::Deliver, &ctx(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidSequence { expected: 2, got: 1 }));
        assert_eq!(store, after_first);
    }

    #[test]
    fn test_bad_signature_rejected_without_mutation() {
        let (engine, mut store) = setup();
        let before = store.clone();
        // signed by the wrong key
        let tx = signed(
            Tx::Send(SendTx {
                input: input("alice", 1, 1),
                output: TxOutput {
                    username: AccountName::new("bobby"),
                    coins: coins(1),
                },
                fee: Coins::empty(),
            }),
            "carol",
        );
        let err = engine.exec_tx(&mut store, &tx, ExecMode::Deliver, &ctx(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidSignature(_)));
        assert_eq!(store, before);
    }

    #[test]
    fn test_send_insufficient_funds() {
        let (engine, mut store) = setup();
        let tx = send("alice", "bobby", 7, 1, 1);
        let err = engine.exec_tx(&mut store, &tx, ExecMode::Deliver, &ctx(1)).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_)));
    }

    #[test]
    fn test_register_self_signed() {
        let (engine, mut store) = setup();
        let keypair = key("dave1");
        let tx = signed(
            Tx::Register(RegisterTx {
                username: AccountName::new("dave1"),
                pub_key: keypair.public_key(),
                signature: Signature::empty(),
            }),
            "dave1",
        );
        engine.exec_tx(&mut store, &tx, ExecMode::Deliver, &ctx(1)).unwrap();
        assert_eq!(balance(&mut store, "dave1"), Decimal::ZERO);

        let err = engine.exec_tx(&mut store, &tx, ExecMode::Deliver, &ctx(2)).unwrap_err();
        assert!(matches!(err, Error::AccountAlreadyExists(_)));
    }

    #[test]
    fn test_post_donate_and_mature() {
        let (engine, mut store) = setup();
        let interval = engine.config().reward.maturity_interval;

        let post = signed(
            Tx::Post(PostTx {
                author: AccountName::new("alice"),
                post_id: "p1".to_string(),
                title: "hello".to_string(),
                content: "world".to_string(),
                parent: None,
                source: None,
                split_rate: Decimal::ZERO,
                sequence: 1,
                signature: Signature::empty(),
            }),
            "alice",
        );
        engine.exec_tx(&mut store, &post, ExecMode::Deliver, &ctx(10)).unwrap();

        let permlink = Permlink::parse("alice#p1");
        let donate = signed(
            Tx::Donate(DonateTx {
                input: input("carol", 100, 1),
                permlink: permlink.clone(),
                fee: coins(1),
            }),
            "carol",
        );
        engine.exec_tx(&mut store, &donate, ExecMode::Deliver, &ctx(11)).unwrap();
        assert_eq!(balance(&mut store, "carol"), Decimal::ZERO);
        assert_eq!(balance(&mut store, "alice"), Decimal::from(7));

        assert_eq!(engine.issue_matured_rewards(&mut store, 10 + interval - 1).unwrap(), 0);
        assert_eq!(engine.issue_matured_rewards(&mut store, 10 + interval).unwrap(), 1);
        assert_eq!(balance(&mut store, "alice"), Decimal::from(106));
        assert_eq!(engine.issue_matured_rewards(&mut store, 10 + interval).unwrap(), 0);
        assert_eq!(balance(&mut store, "alice"), Decimal::from(106));
        assert_eq!(engine.metrics().rewards_issued.get(), 1);
    }

    #[test]
    fn test_like_on_missing_post() {
        let (engine, mut store) = setup();
        let before = store.clone();
        let tx = signed(
            Tx::Like(LikeTx {
                liker: AccountName::new("bobby"),
                permlink: Permlink::parse("alice#none"),
                weight: 5,
                sequence: 1,
                signature: Signature::empty(),
            }),
            "bobby",
        );
        let err = engine.exec_tx(&mut store, &tx, ExecMode::Deliver, &ctx(1)).unwrap_err();
        assert!(matches!(err, Error::UnknownPost(_)));
        assert_eq!(store, before);
    }

    #[test]
    fn test_follow_unknown_followee() {
        let (engine, mut store) = setup();
        let tx = signed(
            Tx::Follow(FollowTx {
                follower: AccountName::new("alice"),
                followee: AccountName::new("ghost"),
                is_follow: true,
                sequence: 1,
                signature: Signature::empty(),
            }),
            "alice",
        );
        let err = engine.exec_tx(&mut store, &tx, ExecMode::Check, &ctx(1)).unwrap_err();
        assert!(matches!(err, Error::UnknownAccount(_)));
    }

    #[test]
    fn test_app_failure_refunds_principal_keeps_fee() {
        let (engine, mut store) = setup();
        let receipt = engine
            .exec_tx(&mut store, &app("failing", 10, 2, b""), ExecMode::Deliver, &ctx(1))
            .unwrap();

        assert!(matches!(receipt.outcome, TxOutcome::Refunded { code: 5, .. }));
        assert_eq!(balance(&mut store, "carol"), Decimal::from(98));
        assert_eq!(State::new(&mut store).fee_pool().unwrap(), coins(2));

        let state = State::new(&mut store);
        let carol = ledger::must_get_account(&state, &AccountName::new("carol")).unwrap();
        assert_eq!(carol.sequence, 1);
        assert_eq!(carol.metadata, None);
    }

    #[test]
    fn test_app_profile_success() {
        let (engine, mut store) = setup();
        let receipt = engine
            .exec_tx(
                &mut store,
                &app("profile", 10, 2, br#"{"name":"Carol"}"#),
                ExecMode::Deliver,
                &ctx(1),
            )
            .unwrap();
        assert_eq!(receipt.outcome, TxOutcome::Applied);
        assert_eq!(balance(&mut store, "carol"), Decimal::from(98));

        let state = State::new(&mut store);
        let carol = ledger::must_get_account(&state, &AccountName::new("carol")).unwrap();
        assert_eq!(carol.metadata.as_deref(), Some(r#"{"name":"Carol"}"#));
    }

    #[test]
    fn test_app_unknown_plugin_rejected() {
        let (engine, mut store) = setup();
        let before = store.clone();
        let err = engine
            .exec_tx(&mut store, &app("missing", 10, 2, b""), ExecMode::Deliver, &ctx(1))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownPlugin(_)));
        assert_eq!(store, before);
    }

    #[test]
    fn test_undecodable_bytes() {
        let (engine, mut store) = setup();
        let err = engine
            .exec_tx_bytes(&mut store, &[0xde, 0xad], ExecMode::Check, &ctx(1))
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_delete_post_hook() {
        let (engine, mut store) = setup();
        let err = engine
            .delete_post(&mut store, &ctx(1), &Permlink::parse("alice#none"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownPost(_)));
    }
}
