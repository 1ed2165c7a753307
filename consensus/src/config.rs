//! Configuration for the social node

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node ID, used only in logs
    pub node_id: String,

    /// Chain ID; overrides `ledger.chain_id`
    pub chain_id: String,

    /// Genesis document (JSON)
    pub genesis_file: PathBuf,

    /// Blocks to replay (JSON)
    pub blocks_file: PathBuf,

    /// Ledger parameters
    pub ledger: ledger_core::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: "node-1".to_string(),
            chain_id: ledger_core::Config::default().chain_id,
            genesis_file: PathBuf::from("./data/genesis.json"),
            blocks_file: PathBuf::from("./data/blocks.json"),
            ledger: ledger_core::Config::default(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.ledger_config()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(node_id) = std::env::var("CONSENSUS_NODE_ID") {
            config.node_id = node_id;
        }

        if let Ok(chain_id) = std::env::var("CONSENSUS_CHAIN_ID") {
            config.chain_id = chain_id;
        }

        if let Ok(genesis) = std::env::var("CONSENSUS_GENESIS") {
            config.genesis_file = PathBuf::from(genesis);
        }

        if let Ok(blocks) = std::env::var("CONSENSUS_BLOCKS") {
            config.blocks_file = PathBuf::from(blocks);
        }

        config.ledger_config()?;
        Ok(config)
    }

    /// Ledger parameters with the node's chain id applied
    pub fn ledger_config(&self) -> Result<ledger_core::Config> {
        let mut ledger = self.ledger.clone();
        ledger.chain_id = self.chain_id.clone();
        ledger
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        let ledger = config.ledger_config().unwrap();
        assert_eq!(ledger.chain_id, config.chain_id);
    }

    #[test]
    fn test_from_file_applies_chain_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
node_id = "replica-7"
chain_id = "testnet-2"
genesis_file = "/tmp/genesis.json"

[ledger.reward]
maturity_interval = 10
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.node_id, "replica-7");
        assert_eq!(config.genesis_file, PathBuf::from("/tmp/genesis.json"));
        assert_eq!(config.blocks_file, Config::default().blocks_file);

        let ledger = config.ledger_config().unwrap();
        assert_eq!(ledger.chain_id, "testnet-2");
        assert_eq!(ledger.reward.maturity_interval, 10);
    }

    #[test]
    fn test_empty_chain_id_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"chain_id = """#).unwrap();
        assert!(matches!(Config::from_file(file.path()), Err(Error::Config(_))));
    }
}
