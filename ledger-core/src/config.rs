//! Configuration for the ledger state machine

use serde::{Deserialize, Serialize};

/// Ledger configuration
///
/// Every replica must run with identical values; they change consensus output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chain identifier mixed into every sign-bytes
    pub chain_id: String,

    /// Reward economy configuration
    pub reward: RewardConfig,

    /// Post limits
    pub post: PostConfig,

    /// Registration limits
    pub register: RegisterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_id: "social-ledger".to_string(),
            reward: RewardConfig::default(),
            post: PostConfig::default(),
            register: RegisterConfig::default(),
        }
    }
}

/// Reward economy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Blocks between post creation and reward payout
    pub maturity_interval: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            maturity_interval: 288_000, // ~10 days at 3s blocks
        }
    }
}

/// Post limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    /// Maximum title length (chars)
    pub max_title_len: usize,

    /// Maximum content length (chars)
    pub max_content_len: usize,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            max_title_len: 50,
            max_content_len: 1000,
        }
    }
}

/// Registration limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    /// Minimum username length
    pub min_username_len: usize,

    /// Maximum username length
    pub max_username_len: usize,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            min_username_len: 4,
            max_username_len: 20,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(chain_id) = std::env::var("LEDGER_CHAIN_ID") {
            config.chain_id = chain_id;
        }

        if let Ok(interval) = std::env::var("LEDGER_MATURITY_INTERVAL") {
            config.reward.maturity_interval = interval.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid LEDGER_MATURITY_INTERVAL: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no replica could run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.chain_id.is_empty() {
            return Err(crate::Error::Config("chain_id must not be empty".to_string()));
        }
        if self.reward.maturity_interval == 0 {
            return Err(crate::Error::Config(
                "reward.maturity_interval must be positive".to_string(),
            ));
        }
        if self.register.min_username_len == 0
            || self.register.min_username_len > self.register.max_username_len
        {
            return Err(crate::Error::Config(
                "register username bounds are inconsistent".to_string(),
            ));
        }
        Ok(())
    }
}
