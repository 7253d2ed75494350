//! Solana key derivation

use ed25519_dalek::{SigningKey, VerifyingKey};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use super::derivation::{ChainKind, ChildIndex, DerivationPath, KeyPair, PrivateKey, PublicKey};
use crate::error::{Error, Result};

type ExtendedKey = (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>);

/// Derive a Solana key pair from a seed and derivation path (SLIP-10)
pub fn derive_solana_key_pair(seed: &[u8], path: &DerivationPath) -> Result<KeyPair> {
    let (mut secret_key, mut chain_code) = derive_master_key(seed)?;
    for component in path.components() {
        (secret_key, chain_code) = derive_child_key(&secret_key, &chain_code, *component)?;
    }

    let signing_key = SigningKey::from_bytes(&secret_key);
    let verifying_key: VerifyingKey = signing_key.verifying_key();

    let private_key = PrivateKey::new(signing_key.to_bytes().to_vec(), ChainKind::Solana);
    let public_key = PublicKey::new(verifying_key.to_bytes().to_vec(), ChainKind::Solana);
    let address = public_key_to_address(&public_key)?;

    KeyPair::new(private_key, public_key, address, path.clone())
}

/// Derive the master key from a seed
fn derive_master_key(seed: &[u8]) -> Result<ExtendedKey> {
    hmac_sha512(b"ed25519 seed", &[seed])
}

/// Derive a hardened child key; SLIP-10 defines no normal derivation for Ed25519
fn derive_child_key(
    parent_key: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: ChildIndex,
) -> Result<ExtendedKey> {
    if !index.is_hardened() {
        return Err(Error::DerivationFailure(format!(
            "Ed25519 derivation requires hardened indices, got {}",
            index
        )));
    }

    let index_bytes = index.checked_u32()?.to_be_bytes();
    hmac_sha512(parent_chain_code, &[&[0u8][..], &parent_key[..], &index_bytes[..]])
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<ExtendedKey> {
    let mut hmac = <Hmac<Sha512> as KeyInit>::new_from_slice(key)
        .map_err(|_| Error::DerivationFailure("HMAC error".to_string()))?;

    for part in parts {
        hmac.update(part);
    }

    let mut result = Zeroizing::new([0u8; 64]);
    result.copy_from_slice(&hmac.finalize().into_bytes());

    let mut secret_key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    secret_key.copy_from_slice(&result[0..32]);
    chain_code.copy_from_slice(&result[32..64]);

    Ok((secret_key, chain_code))
}

/// Get the Solana address from a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Result<String> {
    if public_key.chain() != ChainKind::Solana {
        return Err(Error::InvalidInput("Not a Solana public key".to_string()));
    }

    let public_key = public_key.as_bytes();

    // The public key should be 32 bytes
    if public_key.len() != 32 {
        return Err(Error::InvalidInput("Invalid Solana public key length".to_string()));
    }

    Ok(bs58::encode(public_key).into_string())
}

/// Base58 of the 64-byte `secret || public` key, the format Solana wallets import
pub fn encode_private_key(private_key: &PrivateKey) -> Result<Zeroizing<String>> {
    if private_key.chain() != ChainKind::Solana {
        return Err(Error::InvalidInput("Not a Solana private key".to_string()));
    }

    let secret: [u8; 32] = private_key
        .as_bytes()
        .try_into()
        .map_err(|_| Error::InvalidInput("Invalid Solana private key length".to_string()))?;
    let secret = Zeroizing::new(secret);
    let signing_key = SigningKey::from_bytes(&secret);
    let keypair_bytes = Zeroizing::new(signing_key.to_keypair_bytes());

    Ok(Zeroizing::new(bs58::encode(keypair_bytes.as_slice()).into_string()))
}
