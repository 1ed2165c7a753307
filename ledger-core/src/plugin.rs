//! AppTx sub-handlers
//!
//! A plugin runs inside its own nested cache. The caller's full input has
//! already been debited when it starts; the plugin receives the principal
//! (input minus fee) in its [`PluginContext`] and is responsible for every
//! coin of it. If it returns an error its writes are dropped and the engine
//! refunds the principal.

use crate::coins::Coins;
use crate::ledger;
use crate::state::State;
use crate::types::{AccountName, BlockContext};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// What a plugin knows about its caller
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Calling account
    pub caller: AccountName,
    /// Principal already debited from the caller
    pub principal: Coins,
    /// Executing block
    pub block: BlockContext,
}

/// A named sub-handler
pub trait Plugin: Send + Sync {
    /// Registry key, matched against `AppTx::plugin`
    fn name(&self) -> &str;

    /// Apply the payload
    fn run_tx(&self, state: &mut State<'_>, ctx: &PluginContext, data: &[u8]) -> Result<()>;
}

/// Plugins keyed by name
#[derive(Default)]
pub struct Plugins {
    plugins: BTreeMap<String, Box<dyn Plugin>>,
}

impl Plugins {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in plugin
    pub fn with_builtins() -> Self {
        let mut plugins = Self::new();
        plugins.register(Box::new(ProfilePlugin));
        plugins
    }

    /// Add or replace a plugin
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    /// Look up by name
    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins.get(name).map(|p| p.as_ref())
    }

    /// Look up by name, or `UnknownPlugin`
    pub fn must_get(&self, name: &str) -> Result<&dyn Plugin> {
        self.get(name)
            .ok_or_else(|| Error::UnknownPlugin(name.to_string()))
    }

    /// Registered names in order
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Plugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugins").field("names", &self.names()).finish()
    }
}

/// Largest accepted profile document
pub const MAX_PROFILE_BYTES: usize = 1024;

/// Stores a JSON object as the caller's profile metadata
///
/// Spends nothing: the principal goes straight back to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfilePlugin;

impl Plugin for ProfilePlugin {
    fn name(&self) -> &str {
        "profile"
    }

    fn run_tx(&self, state: &mut State<'_>, ctx: &PluginContext, data: &[u8]) -> Result<()> {
        if data.len() > MAX_PROFILE_BYTES {
            return Err(Error::InvalidInput(format!(
                "profile is {} bytes, limit {}",
                data.len(),
                MAX_PROFILE_BYTES
            )));
        }
        let value: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| Error::InvalidInput(format!("profile is not JSON: {}", e)))?;
        if !value.is_object() {
            return Err(Error::InvalidInput("profile must be a JSON object".to_string()));
        }

        let mut account = ledger::must_get_account(state, &ctx.caller)?;
        account.metadata = Some(value.to_string());
        ledger::add_coin(&mut account, &ctx.principal);
        ledger::touch(&mut account, &ctx.block);
        state.set_account(&account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use crate::types::{Account, PubKey};
    use chrono::Utc;

    fn context() -> PluginContext {
        PluginContext {
            caller: AccountName::new("alice"),
            principal: Coins::empty(),
            block: BlockContext::new(1, Utc::now()),
        }
    }

    #[test]
    fn test_registry_lookup() {
        let plugins = Plugins::with_builtins();
        assert_eq!(plugins.names(), vec!["profile"]);
        assert!(plugins.get("profile").is_some());
        assert!(matches!(plugins.must_get("nope"), Err(Error::UnknownPlugin(_))));
    }

    #[test]
    fn test_profile_stores_metadata() {
        let mut store = MemStore::new();
        let mut state = State::new(&mut store);
        let ctx = context();
        let account = Account::new(ctx.caller.clone(), PubKey::from_bytes([0; 32]), &ctx.block);
        state.set_account(&account).unwrap();

        ProfilePlugin
            .run_tx(&mut state, &ctx, br#"{"bio": "hello"}"#)
            .unwrap();
        let stored = ledger::must_get_account(&state, &ctx.caller).unwrap();
        assert_eq!(stored.metadata.as_deref(), Some(r#"{"bio":"hello"}"#));
    }

    #[test]
    fn test_profile_rejects_bad_payloads() {
        let mut store = MemStore::new();
        let mut state = State::new(&mut store);
        let ctx = context();

        assert!(ProfilePlugin.run_tx(&mut state, &ctx, b"not json").is_err());
        assert!(ProfilePlugin.run_tx(&mut state, &ctx, b"[1, 2]").is_err());
        let big = format!("{{\"bio\": \"{}\"}}", "x".repeat(MAX_PROFILE_BYTES));
        assert!(ProfilePlugin.run_tx(&mut state, &ctx, big.as_bytes()).is_err());
    }
}
