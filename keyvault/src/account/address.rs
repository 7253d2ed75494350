//! Address validation

use crate::crypto::keys::{ethereum, ChainKind};

/// Validate an address for a specific chain
pub fn validate_address(address: &str, chain: ChainKind) -> bool {
    match chain {
        ChainKind::Ethereum => validate_ethereum_address(address),
        ChainKind::Solana => validate_solana_address(address),
    }
}

/// `0x` plus 40 hex digits; mixed case must carry a valid EIP-55 checksum
fn validate_ethereum_address(address: &str) -> bool {
    let Some(digits) = address.strip_prefix("0x") else {
        return false;
    };

    let bytes = match hex::decode(digits) {
        Ok(bytes) if bytes.len() == 20 => bytes,
        _ => return false,
    };

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return ethereum::to_checksum_address(&bytes) == address;
    }

    true
}

/// Base58 text decoding to a 32-byte public key
fn validate_solana_address(address: &str) -> bool {
    matches!(bs58::decode(address).into_vec(), Ok(bytes) if bytes.len() == 32)
}
