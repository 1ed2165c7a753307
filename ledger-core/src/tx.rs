//! Transactions
//!
//! Sign-bytes are `bincode(chain_id) || bincode(tx)` with the signature
//! cleared, so a signature binds both the payload and the chain it was made
//! for. Basic validation here is a pure function of the transaction.

use crate::codec::{decode, encode};
use crate::coins::Coins;
use crate::config::Config;
use crate::crypto::{tx_id, KeyPair};
use crate::post::MAX_LIKE_WEIGHT;
use crate::types::{AccountName, Permlink, PubKey, Signature};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Funds-carrying input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Sender
    pub username: AccountName,
    /// Total debited (principal plus fee)
    pub coins: Coins,
    /// Transaction sequence
    pub sequence: u64,
    /// Signature over the sign-bytes
    pub signature: Signature,
}

/// Funds-receiving output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Receiver
    pub username: AccountName,
    /// Amount credited
    pub coins: Coins,
}

/// Register a username; signed by the key being registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTx {
    /// Username
    pub username: AccountName,
    /// Key of the new account
    pub pub_key: PubKey,
    /// Signature by `pub_key`
    pub signature: Signature,
}

/// Transfer coins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTx {
    /// Sender side
    pub input: TxInput,
    /// Receiver side
    pub output: TxOutput,
    /// Platform fee
    pub fee: Coins,
}

/// Create a post, comment or repost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTx {
    /// Author
    pub author: AccountName,
    /// Human-chosen id
    pub post_id: String,
    /// Title
    pub title: String,
    /// Content
    pub content: String,
    /// Commented post
    pub parent: Option<Permlink>,
    /// Reposted post
    pub source: Option<Permlink>,
    /// Fraction of donations a repost keeps
    pub split_rate: Decimal,
    /// Post sequence
    pub sequence: u64,
    /// Signature
    pub signature: Signature,
}

/// Like, dislike or revote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeTx {
    /// Liker
    pub liker: AccountName,
    /// Target post
    pub permlink: Permlink,
    /// Weight in [-10000, 10000]
    pub weight: i64,
    /// Transaction sequence
    pub sequence: u64,
    /// Signature
    pub signature: Signature,
}

/// Record a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewTx {
    /// Viewer
    pub viewer: AccountName,
    /// Target post
    pub permlink: Permlink,
    /// Transaction sequence
    pub sequence: u64,
    /// Signature
    pub signature: Signature,
}

/// Donate to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonateTx {
    /// Donator and gross amount
    pub input: TxInput,
    /// Target post
    pub permlink: Permlink,
    /// Platform fee taken out of the amount
    pub fee: Coins,
}

/// Follow or unfollow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowTx {
    /// Acting account
    pub follower: AccountName,
    /// Target account
    pub followee: AccountName,
    /// `true` to follow, `false` to unfollow
    pub is_follow: bool,
    /// Transaction sequence
    pub sequence: u64,
    /// Signature
    pub signature: Signature,
}

/// Run a registered plugin in an isolated scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTx {
    /// Caller and total debited (principal plus fee)
    pub input: TxInput,
    /// Fee retained even if the plugin fails
    pub fee: Coins,
    /// Plugin name
    pub plugin: String,
    /// Opaque plugin payload
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

/// Any transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tx {
    /// Register
    Register(RegisterTx),
    /// Send
    Send(SendTx),
    /// Post
    Post(PostTx),
    /// Like
    Like(LikeTx),
    /// View
    View(ViewTx),
    /// Donate
    Donate(DonateTx),
    /// Follow / unfollow
    Follow(FollowTx),
    /// Plugin call
    App(AppTx),
}

impl Tx {
    /// Short type name for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Tx::Register(_) => "register",
            Tx::Send(_) => "send",
            Tx::Post(_) => "post",
            Tx::Like(_) => "like",
            Tx::View(_) => "view",
            Tx::Donate(_) => "donate",
            Tx::Follow(_) => "follow",
            Tx::App(_) => "app",
        }
    }

    /// Account that signs the transaction
    pub fn signer(&self) -> &AccountName {
        match self {
            Tx::Register(tx) => &tx.username,
            Tx::Send(tx) => &tx.input.username,
            Tx::Post(tx) => &tx.author,
            Tx::Like(tx) => &tx.liker,
            Tx::View(tx) => &tx.viewer,
            Tx::Donate(tx) => &tx.input.username,
            Tx::Follow(tx) => &tx.follower,
            Tx::App(tx) => &tx.input.username,
        }
    }

    /// Sequence carried, `None` for Register
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Tx::Register(_) => None,
            Tx::Send(tx) => Some(tx.input.sequence),
            Tx::Post(tx) => Some(tx.sequence),
            Tx::Like(tx) => Some(tx.sequence),
            Tx::View(tx) => Some(tx.sequence),
            Tx::Donate(tx) => Some(tx.input.sequence),
            Tx::Follow(tx) => Some(tx.sequence),
            Tx::App(tx) => Some(tx.input.sequence),
        }
    }

    /// Attached signature
    pub fn signature(&self) -> &Signature {
        match self {
            Tx::Register(tx) => &tx.signature,
            Tx::Send(tx) => &tx.input.signature,
            Tx::Post(tx) => &tx.signature,
            Tx::Like(tx) => &tx.signature,
            Tx::View(tx) => &tx.signature,
            Tx::Donate(tx) => &tx.input.signature,
            Tx::Follow(tx) => &tx.signature,
            Tx::App(tx) => &tx.input.signature,
        }
    }

    fn signature_mut(&mut self) -> &mut Signature {
        match self {
            Tx::Register(tx) => &mut tx.signature,
            Tx::Send(tx) => &mut tx.input.signature,
            Tx::Post(tx) => &mut tx.signature,
            Tx::Like(tx) => &mut tx.signature,
            Tx::View(tx) => &mut tx.signature,
            Tx::Donate(tx) => &mut tx.input.signature,
            Tx::Follow(tx) => &mut tx.signature,
            Tx::App(tx) => &mut tx.input.signature,
        }
    }

    /// Replace the signature
    pub fn set_signature(&mut self, signature: Signature) {
        *self.signature_mut() = signature;
    }

    /// Canonical signature payload for `chain_id`
    pub fn sign_bytes(&self, chain_id: &str) -> Result<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.set_signature(Signature::empty());

        let mut bytes = encode(chain_id)?;
        bytes.extend(encode(&unsigned)?);
        Ok(bytes)
    }

    /// Sign in place
    pub fn sign(&mut self, chain_id: &str, keypair: &KeyPair) -> Result<()> {
        let sign_bytes = self.sign_bytes(chain_id)?;
        self.set_signature(keypair.sign(&sign_bytes));
        Ok(())
    }

    /// SHA-256 of the sign-bytes
    pub fn id(&self, chain_id: &str) -> Result<[u8; 32]> {
        Ok(tx_id(&self.sign_bytes(chain_id)?))
    }

    /// Wire encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Decode from wire bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }

    /// Structural checks that need no store access
    pub fn validate_basic(&self, config: &Config) -> Result<()> {
        if let Some(sequence) = self.sequence() {
            if sequence == 0 {
                return Err(invalid("sequence must be positive"));
            }
        }

        match self {
            Tx::Register(tx) => validate_username(&tx.username, config),
            Tx::Send(tx) => {
                validate_input(&tx.input)?;
                require_name(&tx.output.username)?;
                if tx.input.username == tx.output.username {
                    return Err(invalid("sender and receiver must differ"));
                }
                require_positive(&tx.input.coins, "send amount")?;
                require_positive(&tx.output.coins, "send output")?;
                require_fee(&tx.fee)?;
                if tx.input.coins != tx.output.coins.plus(&tx.fee) {
                    return Err(invalid("input must equal output plus fee"));
                }
                Ok(())
            }
            Tx::Post(tx) => {
                require_name(&tx.author)?;
                if tx.post_id.is_empty() {
                    return Err(invalid("post id must not be empty"));
                }
                if tx.content.is_empty() {
                    return Err(invalid("content must not be empty"));
                }
                if tx.title.chars().count() > config.post.max_title_len {
                    return Err(invalid("title too long"));
                }
                if tx.content.chars().count() > config.post.max_content_len {
                    return Err(invalid("content too long"));
                }
                if tx.parent.is_some() && tx.source.is_some() {
                    return Err(invalid("a post cannot be both comment and repost"));
                }
                if tx.split_rate < Decimal::ZERO || tx.split_rate > Decimal::ONE {
                    return Err(invalid("split rate must be within [0, 1]"));
                }
                Ok(())
            }
            Tx::Like(tx) => {
                require_name(&tx.liker)?;
                if !(-MAX_LIKE_WEIGHT..=MAX_LIKE_WEIGHT).contains(&tx.weight) {
                    return Err(invalid("like weight must be within [-10000, 10000]"));
                }
                Ok(())
            }
            Tx::View(tx) => require_name(&tx.viewer),
            Tx::Donate(tx) => {
                validate_input(&tx.input)?;
                require_positive(&tx.input.coins, "donation")?;
                require_fee(&tx.fee)?;
                if !tx.input.coins.is_gte(&tx.fee) {
                    return Err(invalid("fee exceeds donation"));
                }
                Ok(())
            }
            Tx::Follow(tx) => {
                require_name(&tx.follower)?;
                require_name(&tx.followee)?;
                if tx.follower == tx.followee {
                    return Err(invalid("cannot follow oneself"));
                }
                Ok(())
            }
            Tx::App(tx) => {
                validate_input(&tx.input)?;
                if !tx.input.coins.is_valid() {
                    return Err(invalid("app input coins are malformed"));
                }
                require_fee(&tx.fee)?;
                if !tx.input.coins.is_gte(&tx.fee) {
                    return Err(invalid("fee exceeds input"));
                }
                if tx.plugin.is_empty() {
                    return Err(invalid("plugin name must not be empty"));
                }
                Ok(())
            }
        }
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidInput(msg.to_string())
}

fn require_name(name: &AccountName) -> Result<()> {
    if name.is_empty() {
        return Err(invalid("account name must not be empty"));
    }
    Ok(())
}

fn validate_input(input: &TxInput) -> Result<()> {
    require_name(&input.username)
}

fn require_positive(coins: &Coins, what: &str) -> Result<()> {
    if coins.is_zero() || !coins.is_valid() {
        return Err(Error::InvalidInput(format!("{} must be positive", what)));
    }
    Ok(())
}

fn require_fee(fee: &Coins) -> Result<()> {
    if !fee.is_valid() {
        return Err(invalid("fee is malformed"));
    }
    Ok(())
}

/// Length bounds and `[a-z0-9._-]`
pub fn validate_username(name: &AccountName, config: &Config) -> Result<()> {
    let len = name.as_str().len();
    if len < config.register.min_username_len || len > config.register.max_username_len {
        return Err(Error::InvalidInput(format!(
            "username length {} outside [{}, {}]",
            len, config.register.min_username_len, config.register.max_username_len
        )));
    }
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-');
    if !name.as_str().chars().all(allowed) {
        return Err(Error::InvalidInput(format!(
            "username {} has characters outside [a-z0-9._-]",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::Coin;

    fn coins(amount: i64) -> Coins {
        Coins::from(Coin::new("mycoin", amount))
    }

    fn send(input: i64, output: i64, fee: i64) -> Tx {
        Tx::Send(SendTx {
            input: TxInput {
                username: AccountName::new("alice"),
                coins: coins(input),
                sequence: 1,
                signature: Signature::empty(),
            },
            output: TxOutput {
                username: AccountName::new("bob"),
                coins: coins(output),
            },
            fee: coins(fee),
        })
    }

    fn like(weight: i64) -> Tx {
        Tx::Like(LikeTx {
            liker: AccountName::new("bob"),
            permlink: Permlink::parse("alice#p1"),
            weight,
            sequence: 1,
            signature: Signature::empty(),
        })
    }

    #[test]
    fn test_sign_bytes_ignore_signature() {
        let keypair = KeyPair::from_seed(&[9; 32]);
        let mut tx = send(5, 4, 1);
        let before = tx.sign_bytes("chain").unwrap();
        tx.sign("chain", &keypair).unwrap();

        assert!(!tx.signature().is_empty());
        assert_eq!(tx.sign_bytes("chain").unwrap(), before);
        assert!(tx.signature().verify(&before, &keypair.public_key()));
    }

    #[test]
    fn test_sign_bytes_bind_chain_id() {
        let tx = send(5, 4, 1);
        assert_ne!(tx.sign_bytes("a").unwrap(), tx.sign_bytes("b").unwrap());
        assert_ne!(tx.id("a").unwrap(), tx.id("b").unwrap());
    }

    #[test]
    fn test_send_must_balance() {
        let config = Config::default();
        assert!(send(5, 4, 1).validate_basic(&config).is_ok());
        assert!(send(5, 4, 0).validate_basic(&config).is_err());
        assert!(send(5, 5, 1).validate_basic(&config).is_err());
    }

    #[test]
    fn test_like_weight_bounds() {
        let config = Config::default();
        assert!(like(10_000).validate_basic(&config).is_ok());
        assert!(like(-10_000).validate_basic(&config).is_ok());
        assert!(like(10_001).validate_basic(&config).is_err());
        assert!(like(-10_001).validate_basic(&config).is_err());
    }

    #[test]
    fn test_zero_sequence_rejected() {
        let mut tx = like(1);
        if let Tx::Like(inner) = &mut tx {
            inner.sequence = 0;
        }
        let err = tx.validate_basic(&Config::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_username_rules() {
        let config = Config::default();
        assert!(validate_username(&AccountName::new("user_01.x-y"), &config).is_ok());
        assert!(validate_username(&AccountName::new("abc"), &config).is_err());
        assert!(validate_username(&AccountName::new("Alice"), &config).is_err());
        assert!(validate_username(&AccountName::new("a".repeat(21)), &config).is_err());
    }

    #[test]
    fn test_post_cannot_be_comment_and_repost() {
        let tx = Tx::Post(PostTx {
            author: AccountName::new("alice"),
            post_id: "p2".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            parent: Some(Permlink::parse("bob#p1")),
            source: Some(Permlink::parse("bob#p1")),
            split_rate: Decimal::ZERO,
            sequence: 1,
            signature: Signature::empty(),
        });
        assert!(tx.validate_basic(&Config::default()).is_err());
    }

    #[test]
    fn test_wire_round_trip() {
        let tx = like(-3);
        assert_eq!(Tx::from_bytes(&tx.to_bytes().unwrap()).unwrap(), tx);
    }
}
