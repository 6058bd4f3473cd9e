//! Code Fetchers
//!
//! - [`RpcCodeFetcher`]: `eth_getCode(address, "latest")` over blocking HTTP
//! - [`RetryingFetcher`]: retries transient failures with exponential backoff
//! - [`CachingFetcher`]: TTL cache in front of any fetcher

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use rand::Rng;
use reqwest::blocking::Client;

use super::CodeFetcher;
use crate::codec::{format_address, Address};
use crate::config::FetchSettings;
use crate::error::FetchError;
use crate::utils::Cache;
use crate::{log_debug, log_warn};

/// JSON-RPC code reader bound to one endpoint
#[derive(Debug, Clone)]
pub struct RpcCodeFetcher {
    client: Client,
    rpc_url: String,
}

impl RpcCodeFetcher {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent("hawala-delegation/0.1")
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
        })
    }

    pub fn with_settings(rpc_url: impl Into<String>, settings: &FetchSettings) -> Result<Self, FetchError> {
        Self::new(rpc_url, Duration::from_secs(settings.timeout_secs))
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

impl CodeFetcher for RpcCodeFetcher {
    fn get_code(&self, address: &Address) -> Result<Vec<u8>, FetchError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_getCode",
            "params": [format!("0x{}", hex::encode(address)), "latest"],
            "id": 1
        });

        log_debug!("delegation", "eth_getCode", address = format_address(address), endpoint = self.rpc_url);

        let response: serde_json::Value = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()?
            .error_for_status()?
            .json()?;

        parse_get_code_response(&response)
    }
}

/// Extract code bytes from an `eth_getCode` JSON-RPC response
pub fn parse_get_code_response(response: &serde_json::Value) -> Result<Vec<u8>, FetchError> {
    if let Some(error) = response.get("error") {
        return Err(FetchError::Rpc {
            code: error["code"].as_i64().unwrap_or(0),
            message: error["message"].as_str().unwrap_or("unknown error").to_string(),
        });
    }

    let hex_code = response["result"]
        .as_str()
        .ok_or_else(|| FetchError::InvalidResponse("Missing result".to_string()))?;

    let digits = hex_code
        .strip_prefix("0x")
        .ok_or_else(|| FetchError::InvalidResponse(format!("result is not 0x-prefixed: {}", hex_code)))?;

    hex::decode(digits).map_err(|e| FetchError::InvalidResponse(format!("Invalid hex code: {}", e)))
}

/// Retries transient fetch failures
///
/// Delay before attempt `n` (1-based, n > 1) is `backoff * 2^(n-2)` plus up
/// to 50% random jitter. Non-transient errors return immediately.
#[derive(Debug)]
pub struct RetryingFetcher<F> {
    inner: F,
    max_attempts: u32,
    backoff: Duration,
}

impl<F: CodeFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn with_settings(inner: F, settings: &FetchSettings) -> Self {
        Self::new(inner, settings.max_attempts, Duration::from_millis(settings.backoff_ms))
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    fn delay_for(&self, retry: u32) -> Duration {
        let base = self.backoff.saturating_mul(1u32 << retry.min(16));
        let base_ms = base.as_millis() as u64;
        if base_ms == 0 {
            return Duration::ZERO;
        }
        let jitter = rand::thread_rng().gen_range(0..=base_ms / 2);
        Duration::from_millis(base_ms + jitter)
    }
}

impl<F: CodeFetcher> CodeFetcher for RetryingFetcher<F> {
    fn get_code(&self, address: &Address) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 1;
        loop {
            match self.inner.get_code(address) {
                Ok(code) => return Ok(code),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt - 1);
                    log_warn!(
                        "delegation",
                        "Code fetch failed, retrying",
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = e,
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Caches successful fetches for a fixed TTL
///
/// Errors are never cached.
#[derive(Debug)]
pub struct CachingFetcher<F> {
    inner: F,
    cache: Mutex<Cache<Vec<u8>>>,
}

impl<F: CodeFetcher> CachingFetcher<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Mutex::new(Cache::new(ttl)),
        }
    }

    pub fn with_settings(inner: F, settings: &FetchSettings) -> Self {
        Self::new(inner, Duration::from_secs(settings.cache_ttl_secs))
    }

    /// Drop the cached code for one address
    pub fn invalidate(&self, address: &Address) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.invalidate(&cache_key(address));
        }
    }
}

fn cache_key(address: &Address) -> String {
    hex::encode(address)
}

impl<F: CodeFetcher> CodeFetcher for CachingFetcher<F> {
    fn get_code(&self, address: &Address) -> Result<Vec<u8>, FetchError> {
        let key = cache_key(address);

        if let Ok(cache) = self.cache.lock() {
            if let Some(code) = cache.get(&key) {
                return Ok(code);
            }
        }

        let code = self.inner.get_code(address)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.cleanup();
            cache.set(key, code.clone());
        }

        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct Flaky {
        failures: Cell<u32>,
        calls: Cell<u32>,
        error: FetchError,
    }

    impl CodeFetcher for Flaky {
        fn get_code(&self, _address: &Address) -> Result<Vec<u8>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(self.error.clone());
            }
            Ok(vec![0x60, 0x00])
        }
    }

    fn flaky(failures: u32, error: FetchError) -> Flaky {
        Flaky { failures: Cell::new(failures), calls: Cell::new(0), error }
    }

    #[test]
    fn test_parse_response_result() {
        let response = serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": "0xef0100bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"});
        let code = parse_get_code_response(&response).unwrap();
        assert_eq!(code.len(), 23);

        let empty = serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": "0x"});
        assert!(parse_get_code_response(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_parse_response_errors() {
        let rpc_error = serde_json::json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "invalid argument"}});
        assert_eq!(
            parse_get_code_response(&rpc_error).unwrap_err(),
            FetchError::Rpc { code: -32602, message: "invalid argument".to_string() }
        );

        let missing = serde_json::json!({"jsonrpc": "2.0", "id": 1});
        assert!(matches!(parse_get_code_response(&missing), Err(FetchError::InvalidResponse(_))));

        let bad_hex = serde_json::json!({"result": "0xzz"});
        assert!(matches!(parse_get_code_response(&bad_hex), Err(FetchError::InvalidResponse(_))));
    }

    #[test]
    fn test_retry_recovers_from_transient_errors() {
        let fetcher = RetryingFetcher::new(flaky(2, FetchError::Timeout), 3, Duration::ZERO);
        assert_eq!(fetcher.get_code(&[0u8; 20]).unwrap(), vec![0x60, 0x00]);
        assert_eq!(fetcher.inner().calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let fetcher = RetryingFetcher::new(flaky(5, FetchError::Transport("reset".into())), 3, Duration::ZERO);
        assert!(matches!(fetcher.get_code(&[0u8; 20]), Err(FetchError::Transport(_))));
        assert_eq!(fetcher.inner().calls.get(), 3);
    }

    #[test]
    fn test_retry_skips_permanent_errors() {
        let error = FetchError::Rpc { code: -32000, message: "bad".into() };
        let fetcher = RetryingFetcher::new(flaky(1, error.clone()), 5, Duration::ZERO);
        assert_eq!(fetcher.get_code(&[0u8; 20]).unwrap_err(), error);
        assert_eq!(fetcher.inner().calls.get(), 1);
    }

    #[test]
    fn test_cache_serves_repeat_reads() {
        let fetcher = CachingFetcher::new(flaky(0, FetchError::Timeout), Duration::from_secs(60));
        let address = [0x11u8; 20];

        fetcher.get_code(&address).unwrap();
        fetcher.get_code(&address).unwrap();
        assert_eq!(fetcher.inner.calls.get(), 1);

        fetcher.invalidate(&address);
        fetcher.get_code(&address).unwrap();
        assert_eq!(fetcher.inner.calls.get(), 2);
    }

    #[test]
    fn test_cache_does_not_store_errors() {
        let fetcher = CachingFetcher::new(flaky(1, FetchError::Timeout), Duration::from_secs(60));
        let address = [0x22u8; 20];

        assert!(fetcher.get_code(&address).is_err());
        assert!(fetcher.get_code(&address).is_ok());
        assert_eq!(fetcher.inner.calls.get(), 2);
    }
}
