//! Volume statistics over recorded history
//!
//! Read-only projections of the store used by `bundler stats`.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeZone, Utc};

use crate::wallet::types::{FolderId, TradeTx, TransferTx};
use crate::wallet::WalletStore;

/// Anything with an amount and a timestamp
pub trait VolumeRecord {
    fn lamports(&self) -> u64;
    fn timestamp(&self) -> DateTime<Utc>;
}

impl VolumeRecord for TransferTx {
    fn lamports(&self) -> u64 {
        self.lamports
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl VolumeRecord for TradeTx {
    fn lamports(&self) -> u64 {
        self.lamports
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// One per-second bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumePoint {
    pub second: DateTime<Utc>,
    pub lamports: u64,
}

/// Sum amounts per whole second, oldest first
pub fn volume_series<R: VolumeRecord>(records: &[R]) -> Vec<VolumePoint> {
    let mut buckets: BTreeMap<i64, u64> = BTreeMap::new();
    for record in records {
        let bucket = buckets.entry(record.timestamp().timestamp()).or_insert(0);
        *bucket = bucket.saturating_add(record.lamports());
    }

    buckets
        .into_iter()
        .filter_map(|(secs, lamports)| {
            Utc.timestamp_opt(secs, 0)
                .single()
                .map(|second| VolumePoint { second, lamports })
        })
        .collect()
}

/// Net lamports moved into (positive) or out of (negative) a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderFlow {
    pub folder_id: FolderId,
    pub name: String,
    pub net_lamports: i128,
}

/// Net flow per folder across recorded wallet-to-wallet transfers.
///
/// Wallets no longer in the store contribute nothing. Folders appear in
/// store order; folders without any flow are omitted.
pub fn folder_net_flow(store: &WalletStore) -> Vec<FolderFlow> {
    let folder_of: HashMap<&str, &str> = store
        .wallets()
        .iter()
        .map(|w| (w.id.as_str(), w.folder_id.as_str()))
        .collect();

    let mut totals: HashMap<&str, i128> = HashMap::new();
    for transfer in store.transfers() {
        let amount = i128::from(transfer.lamports);
        if let Some(folder) = folder_of.get(transfer.from_wallet_id.as_str()) {
            *totals.entry(folder).or_insert(0) -= amount;
        }
        if let Some(folder) = folder_of.get(transfer.to_wallet_id.as_str()) {
            *totals.entry(folder).or_insert(0) += amount;
        }
    }

    store
        .folders()
        .iter()
        .filter_map(|f| {
            totals.get(f.id.as_str()).map(|net| FolderFlow {
                folder_id: f.id.clone(),
                name: f.name.clone(),
                net_lamports: *net,
            })
        })
        .collect()
}

/// History totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeSummary {
    pub transfer_lamports: u64,
    pub trade_lamports: u64,
    pub transaction_count: usize,
}

impl VolumeSummary {
    pub fn from_store(store: &WalletStore) -> Self {
        let sum = |it: &mut dyn Iterator<Item = u64>| it.fold(0u64, |acc, l| acc.saturating_add(l));
        Self {
            transfer_lamports: sum(&mut store.transfers().iter().map(|t| t.lamports)),
            trade_lamports: sum(&mut store.trades().iter().map(|t| t.lamports)),
            transaction_count: store.transfers().len() + store.trades().len(),
        }
    }

    pub fn total_lamports(&self) -> u64 {
        self.transfer_lamports.saturating_add(self.trade_lamports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{PlanPurpose, PlannedTransfer, WalletRef};
    use crate::planner::types::TransferKind;
    use crate::wallet::{ExecutedTransfer, ExecutionReport, TransferOutcome};
    use solana_sdk::signature::Signature;
    use tempfile::tempdir;

    fn transfer_at(millis: i64, lamports: u64) -> TransferTx {
        TransferTx {
            from_wallet_id: "wlt_a".to_string(),
            to_wallet_id: "wlt_b".to_string(),
            lamports,
            signature: "sig".to_string(),
            timestamp: Utc.timestamp_millis_opt(millis).unwrap(),
        }
    }

    #[test]
    fn test_series_buckets_by_second() {
        let records = vec![
            transfer_at(2_000, 5),
            transfer_at(1_100, 1),
            transfer_at(1_900, 2),
        ];

        let series = volume_series(&records);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].second.timestamp(), 1);
        assert_eq!(series[0].lamports, 3);
        assert_eq!(series[1].lamports, 5);
    }

    #[test]
    fn test_empty_history() {
        let dir = tempdir().unwrap();
        let store = WalletStore::open(&dir.path().join("store.json")).unwrap();
        assert!(volume_series::<TradeTx>(store.trades()).is_empty());
        assert!(folder_net_flow(&store).is_empty());
        assert_eq!(VolumeSummary::from_store(&store), VolumeSummary::default());
    }

    #[test]
    fn test_folder_net_flow_and_summary() {
        let dir = tempdir().unwrap();
        let mut store = WalletStore::open(&dir.path().join("store.json")).unwrap();
        let a = store.create_folder("Alpha");
        let b = store.create_folder("Beta");
        let wa = store.add_wallet("Wallet 1", "addr-1", &a.id, "c2VjcmV0").unwrap();
        let wb = store.add_wallet("Wallet 2", "addr-2", &b.id, "c2VjcmV0").unwrap();

        let planned = PlannedTransfer::between(
            &WalletRef::from(&wa),
            &WalletRef::from(&wb),
            700,
            TransferKind::Transfer,
        );
        let report = ExecutionReport {
            purpose: PlanPurpose::InterFolder,
            halted: None,
            items: vec![ExecutedTransfer {
                planned,
                outcome: TransferOutcome::Confirmed {
                    signature: Signature::new_unique(),
                    lamports: 700,
                },
            }],
        };
        store.record_execution(report, "mint");

        let flow = folder_net_flow(&store);
        assert_eq!(flow.len(), 2);
        assert_eq!(flow[0].net_lamports, -700);
        assert_eq!(flow[1].net_lamports, 700);

        let summary = VolumeSummary::from_store(&store);
        assert_eq!(summary.transfer_lamports, 700);
        assert_eq!(summary.total_lamports(), 700);
        assert_eq!(summary.transaction_count, 1);
    }
}
