//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MADMA_RPC_URL` - Cluster RPC endpoint (may embed a provider API key)
//!
//! ## Optional
//! - `MADMA_PROGRAM_ID` - Store program id (default: the deployed program)
//! - `MADMA_COMMITMENT` - `processed`, `confirmed` or `finalized` (default: confirmed)
//! - `MADMA_CACHE_TTL_SECS` - Staleness window for cached listings (default: 30)
//! - `MADMA_CONFIRM_POLL_MS` - Signature status poll interval (default: 500)
//! - `MADMA_KEYPAIR` - Path to a keypair file used as the wallet
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use madma_core::{PROGRAM_ID, Pubkey};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::chain::ChainSettings;
use crate::rpc::Commitment;

const DEFAULT_CACHE_TTL_SECS: &str = "30";
const DEFAULT_CONFIRM_POLL_MS: &str = "500";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Cluster access
    pub rpc: RpcConfig,
    /// Keypair file used to sign transactions
    pub keypair_path: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. devnet, mainnet)
    pub sentry_environment: Option<String>,
}

/// Cluster access configuration.
///
/// Implements `Debug` manually to redact the endpoint, which often carries
/// an API key in its path or query string.
#[derive(Clone)]
pub struct RpcConfig {
    /// JSON-RPC endpoint
    pub url: SecretString,
    /// Store program id
    pub program_id: Pubkey,
    /// Commitment used for reads and confirmation
    pub commitment: Commitment,
    /// How long cached listings stay fresh
    pub cache_ttl: Duration,
    /// Delay between signature status polls
    pub confirm_poll_interval: Duration,
}

impl std::fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConfig")
            .field("url", &"[REDACTED]")
            .field("program_id", &self.program_id)
            .field("commitment", &self.commitment)
            .field("cache_ttl", &self.cache_ttl)
            .field("confirm_poll_interval", &self.confirm_poll_interval)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            rpc: RpcConfig::from_env()?,
            keypair_path: get_optional_env("MADMA_KEYPAIR").map(PathBuf::from),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl RpcConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = get_rpc_url("MADMA_RPC_URL")?;

        let program_id = get_optional_env("MADMA_PROGRAM_ID")
            .map(|value| parse_env::<Pubkey>("MADMA_PROGRAM_ID", &value))
            .transpose()?
            .unwrap_or(PROGRAM_ID);

        let commitment = get_optional_env("MADMA_COMMITMENT")
            .map(|value| {
                Commitment::from_str(&value)
                    .map_err(|e| ConfigError::InvalidEnvVar("MADMA_COMMITMENT".to_string(), e))
            })
            .transpose()?
            .unwrap_or_default();

        let cache_ttl = Duration::from_secs(parse_env(
            "MADMA_CACHE_TTL_SECS",
            &get_env_or_default("MADMA_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        )?);
        let confirm_poll_interval = Duration::from_millis(parse_env(
            "MADMA_CONFIRM_POLL_MS",
            &get_env_or_default("MADMA_CONFIRM_POLL_MS", DEFAULT_CONFIRM_POLL_MS),
        )?);

        Ok(Self {
            url,
            program_id,
            commitment,
            cache_ttl,
            confirm_poll_interval,
        })
    }

    /// Chain client settings derived from this configuration.
    #[must_use]
    pub const fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            program_id: self.program_id,
            commitment: self.commitment,
            confirm_poll_interval: self.confirm_poll_interval,
            store_cache_ttl: self.cache_ttl,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get the RPC endpoint, checking that it is an http(s) URL.
fn get_rpc_url(key: &str) -> Result<SecretString, ConfigError> {
    let value = SecretString::from(get_required_env(key)?);
    validate_rpc_url(&value, key)?;
    Ok(value)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject endpoints that are not http(s) URLs. The error never echoes the
/// value itself.
fn validate_rpc_url(url: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url.expose_secret()).map_err(|e| {
        ConfigError::InvalidEnvVar(var_name.to_string(), format!("not a valid URL ({e})"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{scheme}', expected http or https"),
        )),
    }
}
