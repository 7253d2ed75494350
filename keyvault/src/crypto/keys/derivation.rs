//! Common key derivation functionality

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// First hardened child index
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// BIP-44 purpose constant
pub const BIP44_PURPOSE: u32 = 44;

/// Shown in place of a private key that has not been revealed
pub const CONCEALED_MASK: &str = "* * * * * * * *";

/// Supported chain families
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    /// Ethereum and EVM compatible chains (secp256k1, BIP-32)
    Ethereum,
    /// Solana (Ed25519, SLIP-10)
    Solana,
}

impl ChainKind {
    /// Every supported chain
    pub const ALL: [ChainKind; 2] = [ChainKind::Ethereum, ChainKind::Solana];

    /// SLIP-44 coin type
    pub fn coin_type(&self) -> u32 {
        match self {
            Self::Ethereum => 60,
            Self::Solana => 501,
        }
    }

    /// Look up a chain by its SLIP-44 coin type
    pub fn from_coin_type(coin_type: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.coin_type() == coin_type)
            .ok_or_else(|| Error::UnsupportedChain(format!("coin type {}", coin_type)))
    }

    /// Ticker of the native asset
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Ethereum => "ETH",
            Self::Solana => "SOL",
        }
    }

    /// Decimal places between the smallest unit (wei, lamport) and one whole coin
    pub fn decimals(&self) -> u32 {
        match self {
            Self::Ethereum => 18,
            Self::Solana => 9,
        }
    }

    /// Lowercase identifier, also accepted by `FromStr`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Solana => "solana",
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Self::Ethereum),
            "solana" | "sol" => Ok(Self::Solana),
            other => Err(Error::UnsupportedChain(other.to_string())),
        }
    }
}

/// One step of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildIndex {
    /// Hardened child, written `n'`
    Hardened(u32),
    /// Normal child, written `n`
    Normal(u32),
}

impl ChildIndex {
    /// Build a hardened index, rejecting values outside `0..2^31`
    pub fn hardened(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::DerivationFailure(format!(
                "Child index {} exceeds the hardened range",
                index
            )));
        }
        Ok(Self::Hardened(index))
    }

    /// Build a normal index, rejecting values outside `0..2^31`
    pub fn normal(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::DerivationFailure(format!(
                "Child index {} exceeds the normal range",
                index
            )));
        }
        Ok(Self::Normal(index))
    }

    /// Whether this is a hardened step
    pub fn is_hardened(&self) -> bool {
        matches!(self, Self::Hardened(_))
    }

    /// Index without the hardened bit
    pub fn index(&self) -> u32 {
        match self {
            Self::Hardened(i) | Self::Normal(i) => *i,
        }
    }

    /// Serialized child number, failing for indices that overflow into the
    /// hardened bit (only reachable by building the variants directly)
    pub fn checked_u32(&self) -> Result<u32> {
        if self.index() >= HARDENED_OFFSET {
            return Err(Error::DerivationFailure(format!(
                "Child index {} exceeds 2^31 - 1",
                self.index()
            )));
        }
        Ok(self.to_u32())
    }

    /// Serialized 32-bit child number as used in the HMAC input
    pub fn to_u32(&self) -> u32 {
        match self {
            Self::Hardened(i) => HARDENED_OFFSET | i,
            Self::Normal(i) => *i,
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardened(i) => write!(f, "{}'", i),
            Self::Normal(i) => write!(f, "{}", i),
        }
    }
}

/// A path through the HD key tree, e.g. `m/44'/60'/0'/0'`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    components: Vec<ChildIndex>,
}

impl DerivationPath {
    /// Build a path from its components
    pub fn new(components: Vec<ChildIndex>) -> Self {
        Self { components }
    }

    /// `m/44'/coin_type'/account'/0'` for the given chain.
    ///
    /// Every level is hardened, so the same shape works for both BIP-32 and
    /// SLIP-10 Ed25519 derivation.
    pub fn for_account(chain: ChainKind, account: u32) -> Result<Self> {
        Ok(Self::new(vec![
            ChildIndex::hardened(BIP44_PURPOSE)?,
            ChildIndex::hardened(chain.coin_type())?,
            ChildIndex::hardened(account)?,
            ChildIndex::hardened(0)?,
        ]))
    }

    /// Path components after `m`
    pub fn components(&self) -> &[ChildIndex] {
        &self.components
    }

    /// Purpose level (first component), if present
    pub fn purpose(&self) -> Option<ChildIndex> {
        self.components.first().copied()
    }

    /// Coin type level (second component), if present
    pub fn coin_type(&self) -> Option<ChildIndex> {
        self.components.get(1).copied()
    }

    /// Account level (third component), if present
    pub fn account(&self) -> Option<ChildIndex> {
        self.components.get(2).copied()
    }

    /// Change level (fourth component), if present
    pub fn change(&self) -> Option<ChildIndex> {
        self.components.get(3).copied()
    }

    /// Whether every component is hardened
    pub fn is_fully_hardened(&self) -> bool {
        self.components.iter().all(ChildIndex::is_hardened)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    /// Parse a BIP-32 derivation path
    fn from_str(path: &str) -> Result<Self> {
        let rest = match path {
            "m" => "",
            _ => path
                .strip_prefix("m/")
                .ok_or_else(|| Error::InvalidInput(format!("Invalid derivation path: {}", path)))?,
        };

        let mut components = Vec::new();
        for component in rest.split('/').filter(|c| !c.is_empty()) {
            let (digits, hardened) = match component
                .strip_suffix('\'')
                .or_else(|| component.strip_suffix('h'))
            {
                Some(digits) => (digits, true),
                None => (component, false),
            };

            let index = digits.parse::<u32>().map_err(|_| {
                Error::InvalidInput(format!("Invalid derivation path component: {}", component))
            })?;

            let child = if hardened {
                ChildIndex::hardened(index)
            } else {
                ChildIndex::normal(index)
            }
            .map_err(|_| {
                Error::InvalidInput(format!("Derivation path component out of range: {}", component))
            })?;

            components.push(child);
        }

        Ok(Self::new(components))
    }
}

/// Raw private key bytes, wiped on drop
#[derive(Clone)]
pub struct PrivateKey {
    /// The raw private key bytes
    bytes: Zeroizing<Vec<u8>>,
    /// The chain the key belongs to
    chain: ChainKind,
}

impl PrivateKey {
    /// Create a new private key from bytes
    pub fn new(bytes: Vec<u8>, chain: ChainKind) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
            chain,
        }
    }

    /// Get the raw private key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the chain
    pub fn chain(&self) -> ChainKind {
        self.chain
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("chain", &self.chain)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

/// A public key for a specific chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    /// The raw public key bytes
    bytes: Vec<u8>,
    /// The chain the key belongs to
    chain: ChainKind,
}

impl PublicKey {
    /// Create a new public key from bytes
    pub fn new(bytes: Vec<u8>, chain: ChainKind) -> Self {
        Self { bytes, chain }
    }

    /// Get the raw public key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the chain
    pub fn chain(&self) -> ChainKind {
        self.chain
    }
}

/// Key material derived for one path, plus its display state.
///
/// The private key is computed once at derivation time and afterwards only
/// shown or hidden. Not `Clone`: a key pair belongs to
/// the session that derived it.
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
    address: String,
    path: DerivationPath,
    revealed: bool,
}

impl KeyPair {
    /// Assemble a key pair; both halves must be for the same chain
    pub fn new(
        private_key: PrivateKey,
        public_key: PublicKey,
        address: String,
        path: DerivationPath,
    ) -> Result<Self> {
        if private_key.chain() != public_key.chain() {
            return Err(Error::DerivationFailure("Key chain mismatch".to_string()));
        }
        Ok(Self {
            private_key,
            public_key,
            address,
            path,
            revealed: false,
        })
    }

    /// Get the chain
    pub fn chain(&self) -> ChainKind {
        self.private_key.chain()
    }

    /// Get the private key
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Chain-native address (EIP-55 hex or base58)
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Path the key was derived at
    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    /// Account level of the derivation path
    pub fn account_index(&self) -> Option<u32> {
        self.path.account().map(|c| c.index())
    }

    /// Whether the private key is currently shown
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub(crate) fn set_revealed(&mut self, revealed: bool) {
        self.revealed = revealed;
    }

    /// Private key in the chain's usual export format, regardless of the
    /// reveal flag. Callers that render keys should prefer
    /// [`KeyPair::display_private_key`].
    pub fn encoded_private_key(&self) -> Result<Zeroizing<String>> {
        match self.chain() {
            ChainKind::Ethereum => super::ethereum::encode_private_key(&self.private_key),
            ChainKind::Solana => super::solana::encode_private_key(&self.private_key),
        }
    }

    /// The encoded private key when revealed, the mask otherwise
    pub fn display_private_key(&self) -> Result<Zeroizing<String>> {
        if self.revealed {
            self.encoded_private_key()
        } else {
            Ok(Zeroizing::new(CONCEALED_MASK.to_string()))
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("chain", &self.chain())
            .field("path", &self.path.to_string())
            .field("address", &self.address)
            .field("revealed", &self.revealed)
            .finish_non_exhaustive()
    }
}

/// Derive a key pair from a seed for a specific chain
pub fn derive_key_pair(seed: &[u8], chain: ChainKind, path: &DerivationPath) -> Result<KeyPair> {
    match chain {
        ChainKind::Ethereum => super::ethereum::derive_ethereum_key_pair(seed, path),
        ChainKind::Solana => super::solana::derive_solana_key_pair(seed, path),
    }
}
