//! Balance providers

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, warn};

use super::{balance_request_body, Balance};
use crate::account::address::validate_address;
use crate::config::{ProviderConfig, VaultConfig};
use crate::crypto::keys::ChainKind;
use crate::error::{Error, Result};

/// Source of native balances
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// Fetch the balance of `address` on `chain`
    async fn fetch_balance(&self, chain: ChainKind, address: &str) -> Result<Balance>;
}

/// One JSON-RPC endpoint
#[derive(Debug, Clone)]
struct RpcEndpoint {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl RpcEndpoint {
    fn new(config: ProviderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Send a JSON-RPC request and return its `result` member
    async fn send_request(&self, request: &Value) -> Result<Value> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| Error::Config("API key is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let response = self
            .client
            .post(&self.config.url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let response_json: Value = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse response ({}): {}", status, e)))?;

        extract_result(response_json)
    }
}

/// Pull `result` out of a JSON-RPC response, surfacing `error` members
pub fn extract_result(mut response: Value) -> Result<Value> {
    if let Some(error) = response.get("error") {
        return Err(Error::Provider(format!("JSON-RPC error: {}", error)));
    }

    response
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| Error::Provider("No result in response".to_string()))
}

/// Balance provider speaking JSON-RPC over HTTP to one endpoint per chain
#[derive(Debug, Clone)]
pub struct JsonRpcBalanceProvider {
    ethereum: RpcEndpoint,
    solana: RpcEndpoint,
}

impl JsonRpcBalanceProvider {
    /// Create a provider with explicit endpoint configuration
    pub fn new(ethereum: ProviderConfig, solana: ProviderConfig) -> Result<Self> {
        Ok(Self {
            ethereum: RpcEndpoint::new(ethereum)?,
            solana: RpcEndpoint::new(solana)?,
        })
    }

    /// Create a provider from vault configuration
    pub fn from_config(config: &VaultConfig) -> Result<Self> {
        Self::new(config.ethereum.clone(), config.solana.clone())
    }

    fn endpoint(&self, chain: ChainKind) -> &RpcEndpoint {
        match chain {
            ChainKind::Ethereum => &self.ethereum,
            ChainKind::Solana => &self.solana,
        }
    }
}

#[async_trait]
impl BalanceProvider for JsonRpcBalanceProvider {
    async fn fetch_balance(&self, chain: ChainKind, address: &str) -> Result<Balance> {
        if !validate_address(address, chain) {
            return Err(Error::InvalidInput(format!("Invalid {} address: {}", chain, address)));
        }

        let endpoint = self.endpoint(chain);
        debug!(%chain, address, url = %endpoint.config.url, "Requesting balance");

        let result = endpoint
            .send_request(&balance_request_body(chain, address))
            .await
            .and_then(|result| Balance::from_rpc_result(chain, &result));

        if let Err(e) = &result {
            warn!(%chain, address, error = %e, "Balance lookup failed");
        }
        result
    }
}
