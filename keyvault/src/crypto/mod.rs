//! Cryptographic primitives and operations
//!
//! This module provides functionality for mnemonic generation, seed expansion
//! and key derivation.

pub mod mnemonic;
pub mod keys;

pub use mnemonic::*;
pub use keys::*;
