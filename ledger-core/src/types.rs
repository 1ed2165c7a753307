//! Core types for the social ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Value equality on opaque identifiers
//! - Exact arithmetic (Decimal for coins and split rates)

use crate::coins::Coins;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Account identifier (username)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountName(String);

impl AccountName {
    /// Create new account name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes used in store keys
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Empty name
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Permanent post identifier, `<author>#<post_id>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permlink(String);

impl Permlink {
    /// Separator between author and post id
    pub const SEPARATOR: char = '#';

    /// Derive from author and human-chosen post id
    pub fn new(author: &AccountName, post_id: &str) -> Self {
        Self(format!("{}{}{}", author, Self::SEPARATOR, post_id))
    }

    /// Wrap an already formatted permlink
    pub fn parse(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes used in store keys
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Author part, if the permlink is well formed
    pub fn author(&self) -> Option<AccountName> {
        self.0
            .split_once(Self::SEPARATOR)
            .map(|(author, _)| AccountName::new(author))
    }
}

impl fmt::Display for Permlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ed25519 public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PubKey([u8; 32]);

impl PubKey {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Digital signature (Ed25519)
///
/// Empty while a transaction is being turned into sign-bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signature bytes (64 bytes when set)
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
}

impl Signature {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Cleared signature
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// No signature attached
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Verify signature
    pub fn verify(&self, message: &[u8], public_key: &PubKey) -> bool {
        use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};

        let bytes: [u8; 64] = match self.bytes.as_slice().try_into() {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let signature = DalekSignature::from_bytes(&bytes);

        let verifying_key = match VerifyingKey::from_bytes(public_key.as_bytes()) {
            Ok(key) => key,
            Err(_) => return false,
        };

        verifying_key.verify(message, &signature).is_ok()
    }
}

/// Height and time fixed by the block being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block height
    pub height: u64,

    /// Block time (from the consensus header, never the local clock)
    pub time: DateTime<Utc>,
}

impl BlockContext {
    /// Create new block context
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }
}

/// Account record stored under `account/<username>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Username
    pub username: AccountName,

    /// Public key
    pub pub_key: PubKey,

    /// Balance
    pub balance: Coins,

    /// Last accepted transaction sequence
    pub sequence: u64,

    /// Last accepted post sequence
    pub post_sequence: u64,

    /// Accounts following this one
    pub followers: BTreeSet<AccountName>,

    /// Accounts this one follows
    pub following: BTreeSet<AccountName>,

    /// JSON profile metadata (set by the profile plugin)
    #[serde(default)]
    pub metadata: Option<String>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Creation height
    pub created_height: u64,

    /// Last activity time
    pub last_activity: DateTime<Utc>,
}

impl Account {
    /// New account with empty balance and zeroed sequences
    pub fn new(username: AccountName, pub_key: PubKey, ctx: &BlockContext) -> Self {
        Self {
            username,
            pub_key,
            balance: Coins::empty(),
            sequence: 0,
            post_sequence: 0,
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            metadata: None,
            created_at: ctx.time,
            created_height: ctx.height,
            last_activity: ctx.time,
        }
    }
}

/// Post record stored under `post/<permlink>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Permanent identifier
    pub permlink: Permlink,

    /// Author
    pub author: AccountName,

    /// Human-chosen id, unique per author
    pub post_id: String,

    /// Author's post sequence at creation
    pub sequence: u64,

    /// Title
    pub title: String,

    /// Content
    pub content: String,

    /// Parent post (set iff comment)
    pub parent: Option<Permlink>,

    /// Root source post (set iff repost)
    pub source: Option<Permlink>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub last_update: DateTime<Utc>,

    /// Last activity time (comments, donations)
    pub last_activity: DateTime<Utc>,

    /// Creation height
    pub created_height: u64,

    /// Whether comments are accepted
    pub allow_replies: bool,

    /// Logically deleted by governance
    pub is_deleted: bool,

    /// Accrued reward awaiting payout
    pub reward: Coins,

    /// Every share ever accrued
    pub total_reward: Coins,

    /// Height at which the reward was paid out
    pub reward_issued_height: Option<u64>,

    /// Comments in creation order
    pub comments: Vec<Permlink>,

    /// Sum of currently positive like weights
    pub total_like_weight: i64,

    /// Negative sum of currently negative like weights
    pub total_dislike_weight: i64,

    /// Distinct likers
    pub like_count: u64,

    /// Donations received
    pub donate_count: u64,

    /// Views (repeat views count)
    pub view_count: u64,

    /// Fraction of donations kept by a repost, in [0, 1]
    pub split_rate: Decimal,
}

impl Post {
    /// Comment on another post
    pub fn is_comment(&self) -> bool {
        self.parent.is_some()
    }

    /// Repost of another post
    pub fn is_repost(&self) -> bool {
        self.source.is_some()
    }
}

/// Like record stored under `like/<liker>/<permlink>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    /// Liker
    pub liker: AccountName,

    /// Liked post
    pub permlink: Permlink,

    /// Weight in [-10000, 10000]
    pub weight: i64,

    /// First like time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Per-viewer record stored under `view/<viewer>/<permlink>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// Viewer
    pub viewer: AccountName,

    /// Viewed post
    pub permlink: Permlink,

    /// Number of views by this viewer
    pub times: u64,

    /// Last view time
    pub last_view_at: DateTime<Utc>,
}

/// Append-only donation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    /// Donator
    pub donator: AccountName,

    /// Gross amount debited
    pub amount: Coins,

    /// Platform fee retained
    pub fee: Coins,

    /// Donation time
    pub created_at: DateTime<Utc>,

    /// Donation height
    pub height: u64,
}
