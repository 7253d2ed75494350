//! Vault and RPC provider configuration

use serde::{Deserialize, Serialize};

use crate::crypto::keys::ChainKind;
use crate::crypto::mnemonic::MnemonicStrength;
use crate::error::{Error, Result};

/// Default Ethereum JSON-RPC endpoint
pub const DEFAULT_ETHEREUM_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";

/// Default Solana JSON-RPC endpoint
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// JSON-RPC provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider URL
    pub url: String,
    /// API key sent as a bearer token (if required)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Timeout in seconds
    pub timeout: Option<u64>,
}

impl ProviderConfig {
    /// Create a configuration for an endpoint with the default timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: Some(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Attach an API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Configuration for a [`KeyVault`](crate::account::KeyVault)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Strength used by `create_mnemonic`
    pub mnemonic_strength: MnemonicStrength,
    /// Chains the vault will derive keys for
    pub enabled_chains: Vec<ChainKind>,
    /// Ethereum balance endpoint
    pub ethereum: ProviderConfig,
    /// Solana balance endpoint
    pub solana: ProviderConfig,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            mnemonic_strength: MnemonicStrength::default(),
            enabled_chains: ChainKind::ALL.to_vec(),
            ethereum: ProviderConfig::new(DEFAULT_ETHEREUM_RPC_URL),
            solana: ProviderConfig::new(DEFAULT_SOLANA_RPC_URL),
        }
    }
}

impl VaultConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup; unset keys keep
    /// their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(words) = lookup("KEYVAULT_MNEMONIC_WORDS") {
            let words = words
                .trim()
                .parse::<usize>()
                .map_err(|_| Error::Config(format!("KEYVAULT_MNEMONIC_WORDS is not a number: {}", words)))?;
            config.mnemonic_strength = MnemonicStrength::from_word_count(words)?;
        }

        if let Some(chains) = lookup("KEYVAULT_CHAINS") {
            let mut enabled = Vec::new();
            for id in chains.split(',').map(str::trim).filter(|id| !id.is_empty()) {
                let chain: ChainKind = id.parse()?;
                if !enabled.contains(&chain) {
                    enabled.push(chain);
                }
            }
            if enabled.is_empty() {
                return Err(Error::Config("KEYVAULT_CHAINS names no chains".to_string()));
            }
            config.enabled_chains = enabled;
        }

        if let Some(url) = lookup("KEYVAULT_ETH_RPC_URL") {
            config.ethereum.url = url;
        }
        if let Some(url) = lookup("KEYVAULT_SOL_RPC_URL") {
            config.solana.url = url;
        }

        if let Some(api_key) = lookup("KEYVAULT_RPC_API_KEY") {
            config.ethereum.api_key = Some(api_key.clone());
            config.solana.api_key = Some(api_key);
        }

        if let Some(timeout) = lookup("KEYVAULT_RPC_TIMEOUT_SECS") {
            let timeout = timeout
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("KEYVAULT_RPC_TIMEOUT_SECS is not a number: {}", timeout)))?;
            config.ethereum.timeout = Some(timeout);
            config.solana.timeout = Some(timeout);
        }

        Ok(config)
    }

    /// Provider configuration for a chain
    pub fn provider(&self, chain: ChainKind) -> &ProviderConfig {
        match chain {
            ChainKind::Ethereum => &self.ethereum,
            ChainKind::Solana => &self.solana,
        }
    }

    /// Whether the vault derives keys for `chain`
    pub fn is_enabled(&self, chain: ChainKind) -> bool {
        self.enabled_chains.contains(&chain)
    }
}
