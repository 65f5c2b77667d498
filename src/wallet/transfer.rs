//! SOL transfer submission
//!
//! Handles the actual on-chain transfer of SOL between wallets.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    system_instruction,
    transaction::Transaction,
};
use tracing::{debug, info, warn};

use crate::config::RpcConfig;
use crate::error::{Error, Result};

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Network side of plan execution
#[async_trait]
pub trait TransferSubmitter: Send + Sync {
    /// Balance of an address in lamports
    async fn balance(&self, address: &Pubkey) -> Result<u64>;

    /// Sign, send and confirm a SOL transfer
    async fn submit(&self, from: &Keypair, to: &Pubkey, lamports: u64) -> Result<Signature>;
}

/// Transfer submitter backed by a Solana RPC node
pub struct RpcSubmitter {
    rpc_client: RpcClient,
    retry_base_delay: Duration,
    max_retries: u32,
}

impl RpcSubmitter {
    /// Create a new submitter from RPC settings
    pub fn new(config: &RpcConfig) -> Self {
        let rpc_client = RpcClient::new_with_timeout_and_commitment(
            config.endpoint.clone(),
            Duration::from_millis(config.timeout_ms),
            CommitmentConfig::confirmed(),
        );
        Self {
            rpc_client,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_retries: config.max_retries,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        let max_elapsed = self.retry_base_delay * (self.max_retries.max(1) * 4);
        ExponentialBackoff {
            initial_interval: self.retry_base_delay,
            max_interval: self.retry_base_delay * 4,
            max_elapsed_time: Some(max_elapsed),
            ..Default::default()
        }
    }

    async fn latest_blockhash(&self) -> Result<solana_sdk::hash::Hash> {
        retry(self.backoff(), || async {
            self.rpc_client
                .get_latest_blockhash()
                .await
                .map_err(|e| classify(Error::from(e), "blockhash"))
        })
        .await
        .map_err(|e| Error::TransactionBuild(format!("Failed to get blockhash: {}", e)))
    }
}

/// Retry transient RPC failures, give up on anything else
fn classify(err: Error, what: &str) -> backoff::Error<Error> {
    if err.is_retryable() {
        warn!("Retryable RPC error fetching {}: {}", what, err);
        backoff::Error::transient(err)
    } else {
        backoff::Error::permanent(err)
    }
}

#[async_trait]
impl TransferSubmitter for RpcSubmitter {
    async fn balance(&self, address: &Pubkey) -> Result<u64> {
        retry(self.backoff(), || async {
            self.rpc_client
                .get_balance(address)
                .await
                .map_err(|e| classify(Error::from(e), "balance"))
        })
        .await
    }

    async fn submit(&self, from: &Keypair, to: &Pubkey, lamports: u64) -> Result<Signature> {
        debug!(
            "Executing transfer: {} lamports from {} to {}",
            lamports,
            from.pubkey(),
            to
        );

        let instruction = system_instruction::transfer(&from.pubkey(), to, lamports);
        let blockhash = self.latest_blockhash().await?;

        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&from.pubkey()),
            &[from],
            blockhash,
        );

        // Not retried: a resend after a timeout could land twice
        let signature = self
            .rpc_client
            .send_and_confirm_transaction(&transaction)
            .await
            .map_err(|e| Error::TransactionSend(format!("Transfer failed: {}", e)))?;

        info!(
            "Transfer complete: {} lamports to {} (sig: {})",
            lamports, to, signature
        );

        Ok(signature)
    }
}

/// Convert SOL to lamports
pub fn sol_to_lamports(sol: f64) -> u64 {
    if !sol.is_finite() || sol <= 0.0 {
        return 0;
    }
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Convert lamports to SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sol_lamports_conversion() {
        assert_eq!(sol_to_lamports(1.0), 1_000_000_000);
        assert_eq!(sol_to_lamports(0.5), 500_000_000);
        assert_eq!(sol_to_lamports(0.001), 1_000_000);
        assert_eq!(sol_to_lamports(0.1), 100_000_000);

        assert_eq!(lamports_to_sol(1_000_000_000), 1.0);
        assert_eq!(lamports_to_sol(500_000_000), 0.5);
        assert_eq!(lamports_to_sol(1_000_000), 0.001);
    }

    #[test]
    fn test_invalid_sol_amounts_are_zero() {
        assert_eq!(sol_to_lamports(-1.0), 0);
        assert_eq!(sol_to_lamports(f64::NAN), 0);
        assert_eq!(sol_to_lamports(0.0), 0);
    }
}
