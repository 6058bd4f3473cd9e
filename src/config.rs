//! Chain and Delegator Configuration
//!
//! Plain data passed into the components that need it. Nothing in the
//! signing or inspection core reads configuration implicitly.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::codec::{format_address, Address};
use crate::error::{Eip7702Error, Eip7702Result};
use crate::serde_bytes::hex20;

/// One EVM chain and the endpoints used to read from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    /// In priority order
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

/// A known delegation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatorContract {
    pub name: String,
    #[serde(with = "hex20")]
    pub address: Address,
    /// Chains the contract is deployed on; empty means all configured chains
    #[serde(default)]
    pub chain_ids: Vec<u64>,
}

impl DelegatorContract {
    pub fn deployed_on(&self, chain_id: u64) -> bool {
        self.chain_ids.is_empty() || self.chain_ids.contains(&chain_id)
    }
}

/// Code-fetch tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub cache_ttl_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_attempts: 3,
            backoff_ms: 250,
            cache_ttl_secs: 30,
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationConfig {
    pub chains: Vec<ChainConfig>,
    #[serde(default)]
    pub delegators: Vec<DelegatorContract>,
    #[serde(default)]
    pub fetch: FetchSettings,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            chains: vec![
                ChainConfig {
                    chain_id: 1,
                    name: "Ethereum".to_string(),
                    rpc_urls: vec![
                        "https://eth.llamarpc.com".to_string(),
                        "https://ethereum.publicnode.com".to_string(),
                    ],
                    explorer_url: Some("https://etherscan.io".to_string()),
                },
                ChainConfig {
                    chain_id: 11155111,
                    name: "Sepolia".to_string(),
                    rpc_urls: vec![
                        "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
                        "https://sepolia.drpc.org".to_string(),
                    ],
                    explorer_url: Some("https://sepolia.etherscan.io".to_string()),
                },
            ],
            delegators: Vec::new(),
            fetch: FetchSettings::default(),
        }
    }
}

impl DelegationConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Eip7702Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Eip7702Error::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Eip7702Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Eip7702Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    /// Check endpoint URLs and uniqueness
    pub fn validate(&self) -> Eip7702Result<()> {
        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.chain_id) {
                return Err(Eip7702Error::Config(format!("Duplicate chain id {}", chain.chain_id)));
            }
            if chain.rpc_urls.is_empty() {
                return Err(Eip7702Error::Config(format!("Chain {} has no RPC endpoints", chain.chain_id)));
            }
            for url in &chain.rpc_urls {
                validate_endpoint_url(url)?;
            }
            if let Some(explorer) = &chain.explorer_url {
                validate_endpoint_url(explorer)?;
            }
        }

        let mut seen_delegators = HashSet::new();
        for delegator in &self.delegators {
            if !seen_delegators.insert(delegator.address) {
                return Err(Eip7702Error::Config(format!(
                    "Delegator {} listed twice",
                    format_address(&delegator.address)
                )));
            }
        }

        if self.fetch.max_attempts == 0 {
            return Err(Eip7702Error::Config("fetch.maxAttempts must be at least 1".to_string()));
        }

        Ok(())
    }

    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// RPC endpoints for a chain, or a config error if the chain is unknown
    pub fn rpc_urls(&self, chain_id: u64) -> Eip7702Result<&[String]> {
        self.chain(chain_id)
            .map(|c| c.rpc_urls.as_slice())
            .ok_or_else(|| Eip7702Error::Config(format!("Unknown chain id {}", chain_id)))
    }

    pub fn delegator_by_address(&self, address: &Address) -> Option<&DelegatorContract> {
        self.delegators.iter().find(|d| &d.address == address)
    }

    /// Explorer link for a transaction hash, if the chain has an explorer
    pub fn explorer_tx_url(&self, chain_id: u64, tx_hash: &[u8; 32]) -> Option<String> {
        let explorer = self.chain(chain_id)?.explorer_url.as_ref()?;
        Some(format!("{}/tx/0x{}", explorer.trim_end_matches('/'), hex::encode(tx_hash)))
    }
}

/// Endpoints must be https, except for local development nodes
pub fn validate_endpoint_url(url: &str) -> Eip7702Result<()> {
    let parsed = Url::parse(url).map_err(|e| Eip7702Error::Config(format!("Invalid URL {}: {}", url, e)))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| Eip7702Error::Config(format!("URL has no host: {}", url)))?;
    let is_local = matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1");

    match parsed.scheme() {
        "https" => Ok(()),
        "http" if is_local => Ok(()),
        scheme => Err(Eip7702Error::Config(format!(
            "Endpoint {} must use https (got {})",
            url, scheme
        ))),
    }
}
