//! Error types for the consensus application

use thiserror::Error;

/// Result type for consensus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Consensus errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    /// Request arrived out of protocol order
    #[error("ABCI error: {0}")]
    Abci(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Genesis or block file could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Result code handed back to the consensus engine
    pub fn code(&self) -> u32 {
        match self {
            Error::Ledger(e) => e.code(),
            Error::Abci(_) => 20,
            Error::Config(_) | Error::Serialization(_) | Error::Io(_) => 99,
        }
    }
}
