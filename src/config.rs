//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::wallet::transfer::sol_to_lamports;

/// Environment variable holding the funder keypair file path
pub const FUNDER_KEYPAIR_ENV: &str = "FUNDER_KEYPAIR_PATH";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON snapshot file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Lamports left in every sender for the network fee
    #[serde(default = "default_fee_reserve_lamports")]
    pub fee_reserve_lamports: u64,

    /// Default amount per transfer/trade
    #[serde(default = "default_amount_sol")]
    pub default_amount_sol: f64,

    /// Default amount the funder sends to each wallet
    #[serde(default = "default_distribution_sol")]
    pub default_distribution_sol: f64,

    /// Volume cap applied to a fresh session (None = unlimited)
    #[serde(default)]
    pub volume_cap_sol: Option<f64>,

    /// Token mint trades are attributed to
    #[serde(default = "default_token_mint")]
    pub token_mint: String,
}

impl PlannerConfig {
    pub fn default_amount_lamports(&self) -> u64 {
        sol_to_lamports(self.default_amount_sol)
    }

    pub fn default_distribution_lamports(&self) -> u64 {
        sol_to_lamports(self.default_distribution_sol)
    }

    pub fn volume_cap_lamports(&self) -> Option<u64> {
        self.volume_cap_sol.map(sol_to_lamports)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            fee_reserve_lamports: default_fee_reserve_lamports(),
            default_amount_sol: default_amount_sol(),
            default_distribution_sol: default_distribution_sol(),
            volume_cap_sol: None,
            token_mint: default_token_mint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyConfig {
    /// Prompt before executing plans moving more than this (SOL)
    #[serde(default = "default_confirm_above_sol")]
    pub confirm_above_sol: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            confirm_above_sol: default_confirm_above_sol(),
        }
    }
}

// Default value functions
fn default_rpc_endpoint() -> String {
    "https://api.devnet.solana.com".to_string()
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/bundler-store.json")
}

fn default_fee_reserve_lamports() -> u64 {
    crate::planner::DEFAULT_FEE_RESERVE_LAMPORTS
}

fn default_amount_sol() -> f64 {
    0.001
}

fn default_distribution_sol() -> f64 {
    0.01
}

fn default_token_mint() -> String {
    "So11111111111111111111111111111111111111112".to_string()
}

fn default_confirm_above_sol() -> f64 {
    0.0
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            .set_default("rpc.max_retries", default_max_retries() as i64)?
            .set_default("store.path", default_store_path().to_string_lossy().to_string())?
            .set_default("planner.fee_reserve_lamports", default_fee_reserve_lamports() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix BUNDLER_)
            .add_source(
                config::Environment::with_prefix("BUNDLER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.rpc.endpoint.trim().is_empty() {
            anyhow::bail!("rpc.endpoint must be set");
        }

        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("rpc.timeout_ms must be positive");
        }

        // Amounts
        if !(self.planner.default_amount_sol > 0.0) {
            anyhow::bail!("default_amount_sol must be positive");
        }

        if !(self.planner.default_distribution_sol > 0.0) {
            anyhow::bail!("default_distribution_sol must be positive");
        }

        if let Some(cap) = self.planner.volume_cap_sol {
            if !(cap > 0.0) {
                anyhow::bail!("volume_cap_sol must be positive when set");
            }
        }

        if self.safety.confirm_above_sol < 0.0 {
            anyhow::bail!("confirm_above_sol cannot be negative");
        }

        Pubkey::from_str(&self.planner.token_mint)
            .with_context(|| format!("Invalid token_mint: {}", self.planner.token_mint))?;

        if self.planner.fee_reserve_lamports == 0 {
            tracing::warn!("fee_reserve_lamports is 0 - senders may be left unable to pay fees");
        }

        Ok(())
    }

    /// Funder keypair path from the environment, if set
    pub fn funder_keypair_path() -> Option<PathBuf> {
        std::env::var(FUNDER_KEYPAIR_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    timeout: {}ms
    max_retries: {}
  Store:
    path: {}
  Planner:
    fee_reserve: {} lamports
    default_amount: {} SOL
    default_distribution: {} SOL
    volume_cap: {}
    token_mint: {}
  Safety:
    confirm_above: {} SOL
  Funder keypair: {}
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.timeout_ms,
            self.rpc.max_retries,
            self.store.path.display(),
            self.planner.fee_reserve_lamports,
            self.planner.default_amount_sol,
            self.planner.default_distribution_sol,
            self.planner
                .volume_cap_sol
                .map(|c| format!("{} SOL", c))
                .unwrap_or_else(|| "(unlimited)".to_string()),
            self.planner.token_mint,
            self.safety.confirm_above_sol,
            if Self::funder_keypair_path().is_some() {
                "(set)"
            } else {
                "(not set)"
            },
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            store: StoreConfig::default(),
            planner: PlannerConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.planner.fee_reserve_lamports, 5000);
        assert_eq!(config.planner.default_amount_lamports(), 1_000_000);
        assert_eq!(config.planner.default_distribution_lamports(), 10_000_000);
        assert_eq!(config.planner.volume_cap_lamports(), None);
        assert_eq!(config.store.path, PathBuf::from("data/bundler-store.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.planner.default_amount_sol = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.planner.volume_cap_sol = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.planner.token_mint = "not-a-mint".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundler.toml");
        std::fs::write(
            &path,
            r#"
[rpc]
endpoint = "http://localhost:8899"

[planner]
default_amount_sol = 0.5
volume_cap_sol = 10.0
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rpc.endpoint, "http://localhost:8899");
        assert_eq!(config.planner.default_amount_lamports(), 500_000_000);
        assert_eq!(config.planner.volume_cap_lamports(), Some(10_000_000_000));
        assert_eq!(config.planner.fee_reserve_lamports, 5000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.rpc.endpoint, default_rpc_endpoint());
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://api.example.com?key=secret"),
            "https://api.example.com?***"
        );
        assert_eq!(
            mask_url("https://api.example.com"),
            "https://api.example.com"
        );
    }
}
