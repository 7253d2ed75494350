//! Key vault operations

use tracing::{debug, info};

use super::session::WalletSession;
use crate::balance::{BalanceProvider, BalanceUpdate};
use crate::config::VaultConfig;
use crate::crypto::keys::{derive_key_pair, ChainKind, DerivationPath, KeyPair};
use crate::crypto::mnemonic::{self, MnemonicPhrase, MnemonicStrength};
use crate::error::{Error, Result};

/// Generates phrases and derives, reveals and conceals key pairs held in a
/// caller-owned [`WalletSession`]. The vault itself keeps no session state.
#[derive(Debug, Clone, Default)]
pub struct KeyVault {
    config: VaultConfig,
}

impl KeyVault {
    /// Create a vault
    pub fn new(config: VaultConfig) -> Self {
        Self { config }
    }

    /// Create a vault from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(VaultConfig::from_env()?))
    }

    /// The vault's configuration
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Fresh phrase at the configured strength
    pub fn create_mnemonic(&self) -> Result<MnemonicPhrase> {
        self.create_mnemonic_with(self.config.mnemonic_strength)
    }

    /// Fresh phrase at an explicit strength
    pub fn create_mnemonic_with(&self, strength: MnemonicStrength) -> Result<MnemonicPhrase> {
        let phrase = MnemonicPhrase::generate(strength)?;
        debug!(words = phrase.word_count(), "Generated mnemonic");
        Ok(phrase)
    }

    /// Check word list membership, word count and checksum
    pub fn validate_mnemonic(&self, phrase: &str) -> bool {
        mnemonic::validate_mnemonic(phrase)
    }

    /// Derive the next account for `chain` and append it to the session.
    ///
    /// On any error the session is left exactly as it was.
    pub fn derive_next_key_pair<'s>(
        &self,
        session: &'s mut WalletSession,
        chain: ChainKind,
    ) -> Result<&'s KeyPair> {
        if !self.config.is_enabled(chain) {
            return Err(Error::UnsupportedChain(format!("{} is not enabled", chain)));
        }

        let index = session.next_index(chain);
        let account = u32::try_from(index)
            .map_err(|_| Error::DerivationFailure(format!("Account index {} is too large", index)))?;
        let path = DerivationPath::for_account(chain, account)?;

        let seed = session.seed()?;
        let key_pair = derive_key_pair(&seed[..], chain, &path)?;

        info!(%chain, index, %path, address = key_pair.address(), "Derived key pair");

        let index = session.push_key_pair(chain, key_pair);
        session.key_pair(chain, index)
    }

    /// Mark a key pair's private key as shown
    pub fn reveal_key_pair<'s>(
        &self,
        session: &'s mut WalletSession,
        chain: ChainKind,
        index: usize,
    ) -> Result<&'s KeyPair> {
        session.key_pair_mut(chain, index)?.set_revealed(true);
        debug!(%chain, index, "Revealed private key");
        session.key_pair(chain, index)
    }

    /// Mark a key pair's private key as hidden
    pub fn conceal_key_pair(&self, session: &mut WalletSession, chain: ChainKind, index: usize) -> Result<()> {
        session.key_pair_mut(chain, index)?.set_revealed(false);
        debug!(%chain, index, "Concealed private key");
        Ok(())
    }

    /// Flip visibility and return the new state
    pub fn toggle_key_pair(&self, session: &mut WalletSession, chain: ChainKind, index: usize) -> Result<bool> {
        let key_pair = session.key_pair_mut(chain, index)?;
        let revealed = !key_pair.is_revealed();
        key_pair.set_revealed(revealed);
        debug!(%chain, index, revealed, "Toggled private key visibility");
        Ok(revealed)
    }

    /// Replace the session's phrase; all derived accounts are discarded
    pub fn replace_mnemonic(&self, session: &mut WalletSession, phrase: MnemonicPhrase) {
        let discarded = session.total_key_pairs();
        session.replace_mnemonic(phrase);
        info!(discarded, "Replaced mnemonic");
    }

    /// Look up one account's balance and record the outcome in the session.
    ///
    /// The session stays mutably borrowed until the provider answers, so
    /// lookups made through this helper run one at a time. To keep the
    /// session free during the request, or to run several lookups at once,
    /// take a [`WalletSession::balance_request`], await the provider, then
    /// hand the outcome to [`WalletSession::apply_balance`].
    pub async fn check_balance<P>(
        &self,
        session: &mut WalletSession,
        provider: &P,
        chain: ChainKind,
        index: usize,
    ) -> Result<BalanceUpdate>
    where
        P: BalanceProvider + ?Sized,
    {
        let request = session.balance_request(chain, index)?;
        let outcome = provider.fetch_balance(chain, &request.address).await;
        Ok(session.apply_balance(&request, &outcome))
    }
}
