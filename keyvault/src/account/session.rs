//! Wallet session state

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::balance::{Balance, BalanceRequest, BalanceStatus, BalanceUpdate};
use crate::crypto::keys::{ChainKind, KeyPair};
use crate::crypto::mnemonic::MnemonicPhrase;
use crate::error::{Error, Result};

/// Stable identity of one derived account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId {
    /// Chain the account lives on
    pub chain: ChainKind,
    /// Position in the chain's derived sequence
    pub index: usize,
}

impl AccountId {
    /// Create an account id
    pub fn new(chain: ChainKind, index: usize) -> Self {
        Self { chain, index }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.chain, self.index)
    }
}

/// A seed phrase and every key pair derived from it so far.
///
/// The session is a plain value owned by the caller. Per chain, the derived
/// sequence only grows; its length is the next account index. Nothing here is
/// persisted, and dropping the session wipes the phrase, passphrase and keys.
pub struct WalletSession {
    mnemonic: MnemonicPhrase,
    passphrase: Option<Zeroizing<String>>,
    key_pairs: BTreeMap<ChainKind, Vec<KeyPair>>,
    balances: BTreeMap<AccountId, BalanceStatus>,
}

impl WalletSession {
    /// Start a session for a validated phrase
    pub fn new(mnemonic: MnemonicPhrase) -> Self {
        Self {
            mnemonic,
            passphrase: None,
            key_pairs: BTreeMap::new(),
            balances: BTreeMap::new(),
        }
    }

    /// Start a session from user input; fails closed on any invalid phrase
    pub fn import(phrase: &str) -> Result<Self> {
        Ok(Self::new(MnemonicPhrase::parse(phrase)?))
    }

    /// Use a BIP-39 passphrase when expanding the seed.
    ///
    /// Only allowed before anything has been derived, otherwise earlier keys
    /// would belong to a different seed than later ones.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Result<Self> {
        if self.total_key_pairs() > 0 {
            return Err(Error::InvalidInput(
                "Passphrase must be set before deriving key pairs".to_string(),
            ));
        }
        self.passphrase = Some(Zeroizing::new(passphrase.into()));
        Ok(self)
    }

    /// The session's phrase
    pub fn mnemonic(&self) -> &MnemonicPhrase {
        &self.mnemonic
    }

    /// Whether a BIP-39 passphrase is in use
    pub fn has_passphrase(&self) -> bool {
        self.passphrase.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub(crate) fn seed(&self) -> Result<Zeroizing<[u8; 64]>> {
        self.mnemonic.to_seed(self.passphrase.as_deref().map(String::as_str))
    }

    /// Next account index for `chain`; equals the number derived so far
    pub fn next_index(&self, chain: ChainKind) -> usize {
        self.key_pairs(chain).len()
    }

    /// Key pairs derived for `chain`, in derivation order
    pub fn key_pairs(&self, chain: ChainKind) -> &[KeyPair] {
        self.key_pairs.get(&chain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One derived key pair
    pub fn key_pair(&self, chain: ChainKind, index: usize) -> Result<&KeyPair> {
        let key_pairs = self.key_pairs(chain);
        key_pairs.get(index).ok_or(Error::IndexOutOfRange {
            chain,
            index,
            len: key_pairs.len(),
        })
    }

    pub(crate) fn key_pair_mut(&mut self, chain: ChainKind, index: usize) -> Result<&mut KeyPair> {
        match self.key_pairs.get_mut(&chain) {
            Some(key_pairs) => {
                let len = key_pairs.len();
                key_pairs
                    .get_mut(index)
                    .ok_or(Error::IndexOutOfRange { chain, index, len })
            }
            None => Err(Error::IndexOutOfRange { chain, index, len: 0 }),
        }
    }

    /// Total key pairs across all chains
    pub fn total_key_pairs(&self) -> usize {
        self.key_pairs.values().map(Vec::len).sum()
    }

    pub(crate) fn push_key_pair(&mut self, chain: ChainKind, key_pair: KeyPair) -> usize {
        let key_pairs = self.key_pairs.entry(chain).or_default();
        key_pairs.push(key_pair);
        key_pairs.len() - 1
    }

    /// Swap in a new phrase and forget everything derived from the old one.
    ///
    /// Indices restart at zero for every chain and balances are cleared, so
    /// account `n` of the old phrase can never be confused with account `n`
    /// of the new one. The passphrase is cleared as well.
    pub fn replace_mnemonic(&mut self, mnemonic: MnemonicPhrase) {
        self.mnemonic = mnemonic;
        self.passphrase = None;
        self.key_pairs.clear();
        self.balances.clear();
    }

    /// Balance status of an account; unchecked if never looked up
    pub fn balance(&self, chain: ChainKind, index: usize) -> Result<BalanceStatus> {
        self.key_pair(chain, index)?;
        Ok(self
            .balances
            .get(&AccountId::new(chain, index))
            .cloned()
            .unwrap_or_default())
    }

    /// Snapshot what a balance lookup for this account should ask for
    pub fn balance_request(&self, chain: ChainKind, index: usize) -> Result<BalanceRequest> {
        let key_pair = self.key_pair(chain, index)?;
        Ok(BalanceRequest {
            account: AccountId::new(chain, index),
            address: key_pair.address().to_string(),
        })
    }

    /// Apply the outcome of a lookup issued with [`WalletSession::balance_request`].
    ///
    /// The result lands only if the account still exists and still has the
    /// address the request was made for; otherwise it is dropped as stale.
    /// Applying the same outcome twice leaves the same state.
    pub fn apply_balance(&mut self, request: &BalanceRequest, outcome: &Result<Balance>) -> BalanceUpdate {
        let current = self
            .key_pair(request.account.chain, request.account.index)
            .map(|key_pair| key_pair.address() == request.address)
            .unwrap_or(false);

        if !current {
            debug!(account = %request.account, "Dropping stale balance result");
            return BalanceUpdate::Stale;
        }

        self.balances.entry(request.account).or_default().record(outcome)
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("mnemonic", &self.mnemonic)
            .field("has_passphrase", &self.has_passphrase())
            .field("key_pairs", &self.key_pairs)
            .field("balances", &self.balances)
            .finish()
    }
}
