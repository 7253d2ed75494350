//! Mnemonic phrase generation and handling

use std::fmt;
use std::str::FromStr;

use bip39::Mnemonic;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Supported mnemonic strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MnemonicStrength {
    /// 12 words (128 bits)
    #[default]
    Words12,
    /// 15 words (160 bits)
    Words15,
    /// 18 words (192 bits)
    Words18,
    /// 21 words (224 bits)
    Words21,
    /// 24 words (256 bits)
    Words24,
}

impl MnemonicStrength {
    /// Get entropy length in bytes
    pub fn entropy_bytes(&self) -> usize {
        match self {
            Self::Words12 => 16,
            Self::Words15 => 20,
            Self::Words18 => 24,
            Self::Words21 => 28,
            Self::Words24 => 32,
        }
    }

    /// Number of words in a phrase of this strength
    pub fn word_count(&self) -> usize {
        // 3 words per 32 bits of entropy
        self.entropy_bytes() * 3 / 4
    }

    /// Look up the strength for a word count
    pub fn from_word_count(words: usize) -> Result<Self> {
        match words {
            12 => Ok(Self::Words12),
            15 => Ok(Self::Words15),
            18 => Ok(Self::Words18),
            21 => Ok(Self::Words21),
            24 => Ok(Self::Words24),
            other => Err(Error::Config(format!(
                "Unsupported mnemonic word count: {}",
                other
            ))),
        }
    }
}

/// A checksummed BIP-39 phrase.
///
/// Only obtainable through [`MnemonicPhrase::generate`] or a successful
/// [`MnemonicPhrase::parse`], so every value held by the crate has passed
/// word-list and checksum validation. The words live in memory that is
/// wiped on drop and never show up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct MnemonicPhrase {
    phrase: Zeroizing<String>,
}

impl MnemonicPhrase {
    /// Generate a new random phrase from OS entropy
    pub fn generate(strength: MnemonicStrength) -> Result<Self> {
        let mut entropy = Zeroizing::new(vec![0u8; strength.entropy_bytes()]);
        OsRng.fill_bytes(&mut entropy);

        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

        Ok(Self {
            phrase: Zeroizing::new(mnemonic.to_string()),
        })
    }

    /// Parse and validate a user supplied phrase.
    ///
    /// Whitespace between words is normalized. Unknown words, a bad word
    /// count or a checksum mismatch all fail with `InvalidMnemonic`.
    pub fn parse(phrase: &str) -> Result<Self> {
        let normalized = Zeroizing::new(phrase.split_whitespace().collect::<Vec<_>>().join(" "));
        let mnemonic = Mnemonic::parse_normalized(&normalized)
            .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

        Ok(Self {
            phrase: Zeroizing::new(mnemonic.to_string()),
        })
    }

    /// The full phrase, single-space separated
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// The words in order
    pub fn words(&self) -> Vec<&str> {
        self.phrase.split(' ').collect()
    }

    /// Number of words in the phrase
    pub fn word_count(&self) -> usize {
        self.phrase.split(' ').count()
    }

    /// Expand the phrase into the 64-byte BIP-39 seed.
    ///
    /// Deterministic: the same phrase and passphrase always give the same seed.
    pub fn to_seed(&self, passphrase: Option<&str>) -> Result<Zeroizing<[u8; 64]>> {
        let mnemonic = Mnemonic::parse_normalized(&self.phrase)
            .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

        Ok(Zeroizing::new(mnemonic.to_seed(passphrase.unwrap_or(""))))
    }
}

impl FromStr for MnemonicPhrase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnemonicPhrase")
            .field("words", &self.word_count())
            .finish_non_exhaustive()
    }
}

/// Generate a new random mnemonic phrase with the specified strength
pub fn generate_mnemonic(strength: MnemonicStrength) -> Result<MnemonicPhrase> {
    MnemonicPhrase::generate(strength)
}

/// Validate a mnemonic phrase. Any malformed phrase is rejected.
pub fn validate_mnemonic(phrase: &str) -> bool {
    MnemonicPhrase::parse(phrase).is_ok()
}

/// Generate a seed from a mnemonic phrase and optional passphrase
pub fn mnemonic_to_seed(phrase: &str, passphrase: Option<&str>) -> Result<Zeroizing<[u8; 64]>> {
    MnemonicPhrase::parse(phrase)?.to_seed(passphrase)
}
