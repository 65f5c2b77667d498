//! Sequential plan execution
//!
//! Submits planned transfers one at a time, in plan order, awaiting each
//! confirmation before the next so balance checks see settled state.
//! Failures are recorded per item and never abort the rest of the plan.
//! Each finished item is handed to a sink before the next one starts, so
//! callers can persist confirmations as they land.

use solana_sdk::signature::Signature;
use solana_sdk::signer::Signer;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::planner::{compute_sendable_amount, PlanPurpose, PlannedTransfer, TransferPlan};

use super::credentials::{parse_address, CredentialBook};
use super::transfer::TransferSubmitter;

/// Result of one planned transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Landed on-chain
    Confirmed { signature: Signature, lamports: u64 },

    /// Not submitted (nothing sendable above the fee reserve)
    Skipped { reason: String },

    /// Submission or signing failed
    Failed { error: String },
}

/// A planned transfer with its outcome
#[derive(Debug, Clone)]
pub struct ExecutedTransfer {
    pub planned: PlannedTransfer,
    pub outcome: TransferOutcome,
}

/// Per-item outcomes of one plan execution
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub purpose: PlanPurpose,
    pub items: Vec<ExecutedTransfer>,
    /// Set when the item sink failed and the remaining transfers were not attempted
    pub halted: Option<String>,
}

impl ExecutionReport {
    pub fn confirmed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, TransferOutcome::Confirmed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, TransferOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, TransferOutcome::Failed { .. }))
            .count()
    }

    /// Lamports moved by confirmed items
    pub fn confirmed_lamports(&self) -> u64 {
        self.items
            .iter()
            .filter_map(|i| match i.outcome {
                TransferOutcome::Confirmed { lamports, .. } => Some(lamports),
                _ => None,
            })
            .fold(0u64, |acc, l| acc.saturating_add(l))
    }
}

/// Executes plans through a `TransferSubmitter`
pub struct PlanExecutor<'a, S: TransferSubmitter + ?Sized> {
    submitter: &'a S,
    fee_reserve: u64,
}

impl<'a, S: TransferSubmitter + ?Sized> PlanExecutor<'a, S> {
    pub fn new(submitter: &'a S, fee_reserve: u64) -> Self {
        Self {
            submitter,
            fee_reserve,
        }
    }

    /// Execute every planned transfer in order
    pub async fn execute(&self, plan: &TransferPlan, keys: &CredentialBook<'_>) -> ExecutionReport {
        self.execute_with(plan, keys, |_| Ok(())).await
    }

    /// Execute every planned transfer in order, passing each finished item
    /// to `on_item` before starting the next.
    ///
    /// An `on_item` error halts the plan: the item it rejected stays in the
    /// report and nothing after it is submitted.
    pub async fn execute_with<F>(
        &self,
        plan: &TransferPlan,
        keys: &CredentialBook<'_>,
        mut on_item: F,
    ) -> ExecutionReport
    where
        F: FnMut(&ExecutedTransfer) -> Result<()>,
    {
        info!("Executing {} ({} transfers)", plan.purpose, plan.len());

        let mut items = Vec::with_capacity(plan.len());
        let mut halted = None;
        for (index, planned) in plan.transfers.iter().enumerate() {
            let outcome = match self.execute_one(planned, keys).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        "Transfer {}/{} {} -> {} failed: {}",
                        index + 1,
                        plan.len(),
                        planned.sender,
                        planned.receiver,
                        e
                    );
                    TransferOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            let item = ExecutedTransfer {
                planned: planned.clone(),
                outcome,
            };

            let sunk = on_item(&item);
            items.push(item);
            if let Err(e) = sunk {
                error!(
                    "Halting {} after transfer {}/{}: {}",
                    plan.purpose,
                    index + 1,
                    plan.len(),
                    e
                );
                halted = Some(e.to_string());
                break;
            }
        }

        let report = ExecutionReport {
            purpose: plan.purpose,
            items,
            halted,
        };
        info!(
            "{}: {}/{} confirmed, {} skipped, {} failed",
            plan.purpose,
            report.confirmed_count(),
            plan.len(),
            report.skipped_count(),
            report.failed_count()
        );
        report
    }

    async fn execute_one(
        &self,
        planned: &PlannedTransfer,
        keys: &CredentialBook<'_>,
    ) -> Result<TransferOutcome> {
        let keypair = keys.keypair_for(&planned.sender)?;
        let to = parse_address(planned.receiver.address())?;

        let balance = self.submitter.balance(&keypair.pubkey()).await?;
        let lamports = compute_sendable_amount(balance, planned.amount.desired(), self.fee_reserve);

        if lamports == 0 {
            debug!(
                "Insufficient balance, skipping {} ({} lamports)",
                planned.sender, balance
            );
            return Ok(TransferOutcome::Skipped {
                reason: format!(
                    "balance {} lamports does not cover the {} lamport fee reserve",
                    balance, self.fee_reserve
                ),
            });
        }

        let signature = self.submitter.submit(&keypair, &to, lamports).await?;
        Ok(TransferOutcome::Confirmed {
            signature,
            lamports,
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::{Keypair, Signature};
    use solana_sdk::signer::Signer;

    use crate::error::{Error, Result};
    use crate::wallet::transfer::TransferSubmitter;

    /// In-memory ledger; each transfer burns `fee` lamports from the payer
    #[derive(Default)]
    pub struct FakeSubmitter {
        pub balances: Mutex<HashMap<Pubkey, u64>>,
        pub failing: HashSet<Pubkey>,
        pub submitted: Mutex<Vec<(Pubkey, Pubkey, u64)>>,
        pub fee: u64,
    }

    impl FakeSubmitter {
        pub fn fund(&self, address: Pubkey, lamports: u64) {
            self.balances.lock().unwrap().insert(address, lamports);
        }

        pub fn balance_of(&self, address: &Pubkey) -> u64 {
            self.balances.lock().unwrap().get(address).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl TransferSubmitter for FakeSubmitter {
        async fn balance(&self, address: &Pubkey) -> Result<u64> {
            Ok(self.balance_of(address))
        }

        async fn submit(&self, from: &Keypair, to: &Pubkey, lamports: u64) -> Result<Signature> {
            let payer = from.pubkey();
            if self.failing.contains(&payer) {
                return Err(Error::TransactionSend("simulated rejection".to_string()));
            }
            let mut balances = self.balances.lock().unwrap();
            let available = balances.get(&payer).copied().unwrap_or(0);
            let required = lamports + self.fee;
            if available < required {
                return Err(Error::InsufficientBalance {
                    available,
                    required,
                });
            }
            balances.insert(payer, available - required);
            *balances.entry(*to).or_insert(0) += lamports;
            self.submitted.lock().unwrap().push((payer, *to, lamports));
            Ok(Signature::new_unique())
        }
    }
}
