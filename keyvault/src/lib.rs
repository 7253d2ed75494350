//! KeyVault - deterministic multi-chain keys from one seed phrase
//!
//! This library generates BIP-39 phrases and derives Ethereum (BIP-32,
//! secp256k1) and Solana (SLIP-10, Ed25519) key pairs from them. Derived keys
//! live in a caller-owned [`WalletSession`]; private keys stay hidden until
//! explicitly revealed, and balances are fetched over JSON-RPC keyed by the
//! account they belong to.
//!
//! ```no_run
//! use keyvault::{ChainKind, KeyVault, WalletSession};
//!
//! # fn main() -> keyvault::Result<()> {
//! let vault = KeyVault::default();
//! let mut session = WalletSession::new(vault.create_mnemonic()?);
//!
//! let address = vault
//!     .derive_next_key_pair(&mut session, ChainKind::Solana)?
//!     .address()
//!     .to_string();
//! println!("{}", address);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod config;
pub mod crypto;
pub mod account;
pub mod balance;

// Re-export commonly used types for convenience
pub use account::{AccountId, KeyVault, WalletSession};
pub use balance::{Balance, BalanceProvider, BalanceStatus, BalanceUpdate, JsonRpcBalanceProvider};
pub use config::{ProviderConfig, VaultConfig};
pub use crypto::keys::{ChainKind, DerivationPath, KeyPair};
pub use crypto::mnemonic::{MnemonicPhrase, MnemonicStrength};
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
