//! Ethereum key derivation

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use secp256k1::{PublicKey as Secp256k1PublicKey, Secp256k1, SecretKey};
use sha2::Sha512;
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use super::derivation::{ChainKind, ChildIndex, DerivationPath, KeyPair, PrivateKey, PublicKey};
use crate::error::{Error, Result};

type ExtendedKey = (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>);

/// Derive an Ethereum key pair from a seed and derivation path (BIP-32)
pub fn derive_ethereum_key_pair(seed: &[u8], path: &DerivationPath) -> Result<KeyPair> {
    let secp = Secp256k1::new();

    let (mut secret_key, mut chain_code) = derive_master_key(seed)?;
    for component in path.components() {
        (secret_key, chain_code) = derive_child_key(&secp, &secret_key, &chain_code, *component)?;
    }

    let secret_key = SecretKey::from_slice(&secret_key[..])
        .map_err(|e| Error::DerivationFailure(format!("Invalid secret key: {}", e)))?;
    let public_key = Secp256k1PublicKey::from_secret_key(&secp, &secret_key);

    let private_key = PrivateKey::new(secret_key.secret_bytes().to_vec(), ChainKind::Ethereum);
    let public_key = PublicKey::new(public_key.serialize_uncompressed().to_vec(), ChainKind::Ethereum);
    let address = public_key_to_address(&public_key)?;

    KeyPair::new(private_key, public_key, address, path.clone())
}

/// Derive the master key from a seed
fn derive_master_key(seed: &[u8]) -> Result<ExtendedKey> {
    let mut hmac = <Hmac<Sha512> as KeyInit>::new_from_slice(b"Bitcoin seed")
        .map_err(|_| Error::DerivationFailure("HMAC error".to_string()))?;

    hmac.update(seed);
    let mut result = Zeroizing::new([0u8; 64]);
    result.copy_from_slice(&hmac.finalize().into_bytes());

    let master = SecretKey::from_slice(&result[0..32])
        .map_err(|e| Error::DerivationFailure(format!("Invalid master key: {}", e)))?;

    let mut chain_code = Zeroizing::new([0u8; 32]);
    chain_code.copy_from_slice(&result[32..64]);

    Ok((Zeroizing::new(master.secret_bytes()), chain_code))
}

/// Derive a child key from a parent key
fn derive_child_key(
    secp: &Secp256k1<secp256k1::All>,
    parent_key: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: ChildIndex,
) -> Result<ExtendedKey> {
    let child_number = index.checked_u32()?;
    let parent_secret_key = SecretKey::from_slice(parent_key)
        .map_err(|e| Error::DerivationFailure(format!("Invalid parent key: {}", e)))?;

    let mut data = Zeroizing::new(Vec::<u8>::with_capacity(37));
    if index.is_hardened() {
        data.push(0);
        data.extend_from_slice(parent_key);
    } else {
        let parent_public_key = Secp256k1PublicKey::from_secret_key(secp, &parent_secret_key);
        data.extend_from_slice(&parent_public_key.serialize());
    }
    data.extend_from_slice(&child_number.to_be_bytes());

    let mut hmac = <Hmac<Sha512> as KeyInit>::new_from_slice(parent_chain_code)
        .map_err(|_| Error::DerivationFailure("HMAC error".to_string()))?;

    hmac.update(&data);
    let mut result = Zeroizing::new([0u8; 64]);
    result.copy_from_slice(&hmac.finalize().into_bytes());

    // IL >= n or a zero sum is an error, never a silent skip to the next index
    let tweak = SecretKey::from_slice(&result[0..32])
        .map_err(|e| Error::DerivationFailure(format!("Invalid child key at {}: {}", index, e)))?;
    let child_secret_key = tweak
        .add_tweak(&parent_secret_key.into())
        .map_err(|e| Error::DerivationFailure(format!("Key addition error at {}: {}", index, e)))?;

    let mut child_chain_code = Zeroizing::new([0u8; 32]);
    child_chain_code.copy_from_slice(&result[32..64]);

    Ok((Zeroizing::new(child_secret_key.secret_bytes()), child_chain_code))
}

/// Get the EIP-55 checksummed Ethereum address from a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Result<String> {
    if public_key.chain() != ChainKind::Ethereum {
        return Err(Error::InvalidInput("Not an Ethereum public key".to_string()));
    }

    let public_key = public_key.as_bytes();

    // The public key should be in uncompressed format (65 bytes)
    if public_key.len() != 65 {
        return Err(Error::InvalidInput("Invalid Ethereum public key length".to_string()));
    }

    // Skip the 0x04 prefix; the address is the last 20 bytes of the hash
    let key_hash = keccak256(&public_key[1..]);
    Ok(to_checksum_address(&key_hash[12..]))
}

/// Format 20 address bytes with EIP-55 mixed-case checksum
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut checksummed = String::with_capacity(2 + lower.len());
    checksummed.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }
    checksummed
}

/// `0x`-prefixed lowercase hex, the format wallets import
pub fn encode_private_key(private_key: &PrivateKey) -> Result<Zeroizing<String>> {
    if private_key.chain() != ChainKind::Ethereum {
        return Err(Error::InvalidInput("Not an Ethereum private key".to_string()));
    }
    let encoded = Zeroizing::new(hex::encode(private_key.as_bytes()));
    Ok(Zeroizing::new(format!("0x{}", encoded.as_str())))
}

/// Calculate the Keccak-256 hash of data
fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
