//! Key derivation and management
//!
//! Hierarchical deterministic derivation for each supported chain family:
//! BIP-32 over secp256k1 for Ethereum and SLIP-10 over Ed25519 for Solana.

pub mod ethereum;
pub mod solana;
mod derivation;

pub use derivation::*;
