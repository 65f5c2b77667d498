//! Intra-folder buy/sell relay pairing
//!
//! Each wallet trades with its right-hand neighbour in the folder, which
//! mirrors the opposite side back. Both legs count toward the volume cap.

use tracing::debug;

use super::grouping::FolderGroups;
use super::types::{
    PlanError, PlanPurpose, PlanStatus, PlannedTransfer, TradeSide, TransferKind, TransferPlan,
};
use super::volume::VolumeAccumulator;

/// Eligible wallets a folder needs to host relay trades
pub const MIN_FOLDER_WALLETS: usize = 2;

/// Legs emitted per initiator/relay pair
pub const LEGS_PER_TRADE: u64 = 2;

/// Plan mirrored trades inside every folder with at least two wallets
///
/// Wallet `i` trades `side` against wallet `(i + 1) % n`, which answers with
/// the opposite side. Before each pair the cap check uses both legs
/// (`2 * amount_per_trade`); on overflow planning stops.
pub fn plan_relay_trades(
    groups: &FolderGroups,
    side: TradeSide,
    amount_per_trade: u64,
    volume_cap: Option<u64>,
    volume_already_used: u64,
) -> Result<TransferPlan, PlanError> {
    if amount_per_trade == 0 {
        return Err(PlanError::InvalidAmount);
    }
    let pair_volume = amount_per_trade.saturating_mul(LEGS_PER_TRADE);

    let qualifying: Vec<_> = groups
        .groups
        .iter()
        .filter(|g| g.len() >= MIN_FOLDER_WALLETS)
        .collect();

    if qualifying.is_empty() {
        return Ok(TransferPlan::insufficient(
            PlanPurpose::Relay,
            MIN_FOLDER_WALLETS,
            groups.groups.iter().map(|g| g.len()).max().unwrap_or(0),
        ));
    }

    let mut budget = VolumeAccumulator::new(volume_cap, volume_already_used);
    let mut transfers = Vec::new();

    for group in qualifying {
        let n = group.len();
        for i in 0..n {
            if !budget.try_add(pair_volume) {
                debug!(
                    "Volume cap reached after {} trade legs ({} used)",
                    transfers.len(),
                    budget.used()
                );
                return Ok(TransferPlan {
                    purpose: PlanPurpose::Relay,
                    transfers,
                    status: PlanStatus::VolumeCapReached {
                        cap: volume_cap.unwrap_or_default(),
                        used: budget.used(),
                    },
                });
            }

            let initiator = &group.wallets[i];
            let relay = &group.wallets[(i + 1) % n];
            transfers.push(PlannedTransfer::between(
                initiator,
                relay,
                amount_per_trade,
                TransferKind::from(side),
            ));
            transfers.push(PlannedTransfer::between(
                relay,
                initiator,
                amount_per_trade,
                TransferKind::from(side.opposite()),
            ));
        }
    }

    Ok(TransferPlan {
        purpose: PlanPurpose::Relay,
        transfers,
        status: PlanStatus::Complete,
    })
}
