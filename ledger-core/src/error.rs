//! Error types for the state machine
//!
//! Every user-facing failure maps onto a stable result code so the consensus
//! layer can hand `(code, log)` pairs back to clients. Only
//! [`Error::InvariantViolation`] is fatal.

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Account is not in the store
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// Post is not in the store
    #[error("Unknown post: {0}")]
    UnknownPost(String),

    /// Sequence is not last + 1
    #[error("Invalid sequence: got {got}, expected {expected}")]
    InvalidSequence {
        /// Sequence the account would accept
        expected: u64,
        /// Sequence carried by the transaction
        got: u64,
    },

    /// Signature does not verify against the account key
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Balance too low
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Malformed amount, weight, name or missing field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// (author, post id) already taken
    #[error("Post already exists: {0}")]
    PostAlreadyExists(String),

    /// Username already registered
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    /// AppTx names a plugin nobody registered
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    /// Codec failure
    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// Store or bookkeeping corruption; never a user error
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result code for a successful transaction
pub const CODE_OK: u32 = 0;

impl Error {
    /// Stable integer code handed back to clients.
    ///
    /// Callers should branch on this (or [`Error::category`]) only; the
    /// display string is a log line.
    pub fn code(&self) -> u32 {
        match self {
            Error::Encoding(_) => 1,
            Error::InvariantViolation(_) => 2,
            Error::InvalidSequence { .. } => 3,
            Error::InsufficientFunds(_) => 4,
            Error::InvalidInput(_) => 5,
            Error::InvalidSignature(_) => 6,
            Error::UnknownAccount(_) => 7,
            Error::AccountAlreadyExists(_) => 8,
            Error::UnknownPost(_) => 9,
            Error::PostAlreadyExists(_) => 10,
            Error::UnknownPlugin(_) => 11,
            Error::Config(_) | Error::Io(_) | Error::Other(_) => 99,
        }
    }

    /// Stable category name, paired with [`Error::code`]
    pub fn category(&self) -> &'static str {
        match self {
            Error::UnknownAccount(_) => "unknown_account",
            Error::UnknownPost(_) => "unknown_post",
            Error::InvalidSequence { .. } => "invalid_sequence",
            Error::InvalidSignature(_) => "invalid_signature",
            Error::InsufficientFunds(_) => "insufficient_funds",
            Error::InvalidInput(_) => "invalid_input",
            Error::PostAlreadyExists(_) => "post_already_exists",
            Error::AccountAlreadyExists(_) => "account_already_exists",
            Error::UnknownPlugin(_) => "unknown_plugin",
            Error::Encoding(_) => "encoding_error",
            Error::InvariantViolation(_) => "internal_invariant_violation",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Other(_) => "internal",
        }
    }

    /// Whether the process must stop rather than keep running on this state
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
