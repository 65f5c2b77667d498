//! Funding and sweeping plans
//!
//! One leg per selected wallet, to or from an address outside the store.
//! These plans are not volume and ignore the volume cap.

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::grouping::FolderGroups;
use super::types::{
    Party, PlanError, PlanPurpose, PlanStatus, PlannedTransfer, TransferAmount, TransferKind,
    TransferPlan,
};

fn validate_address(address: &str) -> Result<(), PlanError> {
    Pubkey::from_str(address)
        .map(|_| ())
        .map_err(|_| PlanError::InvalidTarget(address.to_string()))
}

fn finish(purpose: PlanPurpose, transfers: Vec<PlannedTransfer>) -> TransferPlan {
    if transfers.is_empty() {
        return TransferPlan::insufficient(purpose, 1, 0);
    }
    TransferPlan {
        purpose,
        transfers,
        status: PlanStatus::Complete,
    }
}

/// Fund every selected wallet with `amount` from `funder`
pub fn plan_distribution(
    funder: &str,
    groups: &FolderGroups,
    amount: u64,
) -> Result<TransferPlan, PlanError> {
    if amount == 0 {
        return Err(PlanError::InvalidAmount);
    }
    validate_address(funder)?;

    let transfers = groups
        .wallets()
        .filter(|w| w.address != funder)
        .map(|w| PlannedTransfer {
            sender: Party::External {
                address: funder.to_string(),
            },
            receiver: Party::Wallet(w.clone()),
            amount: TransferAmount::Exact(amount),
            kind: TransferKind::Transfer,
        })
        .collect();

    Ok(finish(PlanPurpose::Distribution, transfers))
}

/// Sweep every selected wallet into `target`, leaving the fee reserve
pub fn plan_collection(groups: &FolderGroups, target: &str) -> Result<TransferPlan, PlanError> {
    validate_address(target)?;
    let transfers = to_target(groups, target, TransferAmount::Sweep);
    Ok(finish(PlanPurpose::Collection, transfers))
}

/// Send up to `amount` from every selected wallet to `target`
pub fn plan_send_to_address(
    groups: &FolderGroups,
    target: &str,
    amount: u64,
) -> Result<TransferPlan, PlanError> {
    if amount == 0 {
        return Err(PlanError::InvalidAmount);
    }
    validate_address(target)?;
    let transfers = to_target(groups, target, TransferAmount::Exact(amount));
    Ok(finish(PlanPurpose::SendToAddress, transfers))
}

fn to_target(groups: &FolderGroups, target: &str, amount: TransferAmount) -> Vec<PlannedTransfer> {
    groups
        .wallets()
        .filter(|w| {
            let is_target = w.address == target;
            if is_target {
                debug!("Skipping {}: wallet is the target", w.id);
            }
            !is_target
        })
        .map(|w| PlannedTransfer {
            sender: Party::Wallet(w.clone()),
            receiver: Party::External {
                address: target.to_string(),
            },
            amount,
            kind: TransferKind::Transfer,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::grouping::group_eligible;
    use crate::planner::grouping::test_support::{folders, wallet};

    const TARGET: &str = "11111111111111111111111111111111";

    #[test]
    fn test_distribution_reaches_every_wallet() {
        let (wallets, ids) = folders(&[2, 3]);
        let groups = group_eligible(&wallets, &ids);
        let plan = plan_distribution(TARGET, &groups, 10_000_000).unwrap();

        assert_eq!(plan.len(), 5);
        assert_eq!(plan.purpose, PlanPurpose::Distribution);
        assert!(plan.transfers.iter().all(|t| t.sender.wallet().is_none()));
        assert_eq!(plan.total_exact_lamports(), 50_000_000);
    }

    #[test]
    fn test_distribution_skips_funder_wallet() {
        let mut funder_wallet = wallet("t", "F");
        funder_wallet.address = TARGET.to_string();
        let wallets = vec![wallet("a", "F"), funder_wallet, wallet("b", "F")];
        let groups = group_eligible(&wallets, &["F".to_string()]);

        let plan = plan_distribution(TARGET, &groups, 1_000).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.transfers.iter().all(|t| t.receiver.address() != TARGET));
        assert_eq!(plan.total_exact_lamports(), 2_000);
    }

    #[test]
    fn test_collection_sweeps_and_skips_target() {
        let mut target_wallet = wallet("t", "F");
        target_wallet.address = TARGET.to_string();
        let wallets = vec![wallet("a", "F"), target_wallet, wallet("b", "F")];
        let groups = group_eligible(&wallets, &["F".to_string()]);

        let plan = plan_collection(&groups, TARGET).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan
            .transfers
            .iter()
            .all(|t| t.amount == TransferAmount::Sweep && t.receiver.address() == TARGET));
    }

    #[test]
    fn test_send_to_address_validation() {
        let (wallets, ids) = folders(&[1]);
        let groups = group_eligible(&wallets, &ids);

        assert_eq!(
            plan_send_to_address(&groups, "not-a-key", 5),
            Err(PlanError::InvalidTarget("not-a-key".to_string()))
        );
        assert_eq!(
            plan_send_to_address(&groups, TARGET, 0),
            Err(PlanError::InvalidAmount)
        );
        let plan = plan_send_to_address(&groups, TARGET, 5).unwrap();
        assert_eq!(plan.transfers[0].amount, TransferAmount::Exact(5));
    }

    #[test]
    fn test_empty_selection_is_insufficient() {
        let groups = FolderGroups::default();
        let plan = plan_collection(&groups, TARGET).unwrap();
        assert!(matches!(plan.status, PlanStatus::InsufficientSelection { .. }));
    }
}
