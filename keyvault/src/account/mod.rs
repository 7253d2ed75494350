//! Account management functionality
//!
//! This module provides the caller-owned wallet session, the key vault that
//! derives and reveals accounts within it, and per-chain address validation.

pub mod address;
mod session;
mod vault;

pub use session::*;
pub use vault::*;
