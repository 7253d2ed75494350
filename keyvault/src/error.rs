//! Error types for the keyvault library

use thiserror::Error;

use crate::crypto::keys::ChainKind;

/// Custom error type for keyvault operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Index {index} out of range for {chain} ({len} key pairs derived)")]
    IndexOutOfRange {
        chain: ChainKind,
        index: usize,
        len: usize,
    },

    #[error("Derivation failure: {0}")]
    DerivationFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for keyvault operations
pub type Result<T> = std::result::Result<T, Error>;
