//! Planner value types
//!
//! Planned transfers are unexecuted instructions. They carry wallet
//! references only; signing credentials stay in the store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wallet::types::{FolderId, Wallet, WalletId};

/// Lightweight reference to a managed wallet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletRef {
    pub id: WalletId,
    pub address: String,
    pub folder_id: FolderId,
}

impl From<&Wallet> for WalletRef {
    fn from(wallet: &Wallet) -> Self {
        Self {
            id: wallet.id.clone(),
            address: wallet.address.clone(),
            folder_id: wallet.folder_id.clone(),
        }
    }
}

/// One end of a planned transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Party {
    /// Wallet managed by the store
    Wallet(WalletRef),

    /// Address outside the store (funder, collection target)
    External { address: String },
}

impl Party {
    pub fn address(&self) -> &str {
        match self {
            Party::Wallet(w) => &w.address,
            Party::External { address } => address,
        }
    }

    pub fn wallet(&self) -> Option<&WalletRef> {
        match self {
            Party::Wallet(w) => Some(w),
            Party::External { .. } => None,
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Party::Wallet(w) => write!(f, "{}", w.address),
            Party::External { address } => write!(f, "{} (external)", address),
        }
    }
}

/// Side of a relay trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn opposite(self) -> Self {
        match self {
            TradeSide::Buy => TradeSide::Sell,
            TradeSide::Sell => TradeSide::Buy,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

impl std::str::FromStr for TradeSide {
    type Err = PlanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(TradeSide::Buy),
            "sell" => Ok(TradeSide::Sell),
            other => Err(PlanError::InvalidSide(other.to_string())),
        }
    }
}

/// Kind of a planned transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferKind {
    Transfer,
    Buy,
    Sell,
}

impl From<TradeSide> for TransferKind {
    fn from(side: TradeSide) -> Self {
        match side {
            TradeSide::Buy => TransferKind::Buy,
            TradeSide::Sell => TransferKind::Sell,
        }
    }
}

impl TransferKind {
    /// Trade side for buy/sell legs
    pub fn side(self) -> Option<TradeSide> {
        match self {
            TransferKind::Transfer => None,
            TransferKind::Buy => Some(TradeSide::Buy),
            TransferKind::Sell => Some(TradeSide::Sell),
        }
    }
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::Transfer => write!(f, "transfer"),
            TransferKind::Buy => write!(f, "buy"),
            TransferKind::Sell => write!(f, "sell"),
        }
    }
}

/// Amount of a planned transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAmount {
    /// Fixed lamports amount (capped at execution by the fee reserve)
    Exact(u64),

    /// Whole balance minus the fee reserve
    Sweep,
}

impl TransferAmount {
    /// Upper bound handed to `compute_sendable_amount`
    pub fn desired(self) -> u64 {
        match self {
            TransferAmount::Exact(lamports) => lamports,
            TransferAmount::Sweep => u64::MAX,
        }
    }
}

impl std::fmt::Display for TransferAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferAmount::Exact(lamports) => {
                write!(f, "{:.9} SOL", crate::wallet::transfer::lamports_to_sol(*lamports))
            }
            TransferAmount::Sweep => write!(f, "all"),
        }
    }
}

/// An unexecuted transfer instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTransfer {
    pub sender: Party,
    pub receiver: Party,
    pub amount: TransferAmount,
    pub kind: TransferKind,
}

impl PlannedTransfer {
    /// Wallet-to-wallet transfer with a fixed amount
    pub fn between(sender: &WalletRef, receiver: &WalletRef, lamports: u64, kind: TransferKind) -> Self {
        Self {
            sender: Party::Wallet(sender.clone()),
            receiver: Party::Wallet(receiver.clone()),
            amount: TransferAmount::Exact(lamports),
            kind,
        }
    }
}

/// What a plan was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPurpose {
    InterFolder,
    Relay,
    Distribution,
    Collection,
    SendToAddress,
}

impl PlanPurpose {
    /// Whether confirmed legs count against the volume session
    pub fn counts_toward_volume(self) -> bool {
        matches!(self, PlanPurpose::InterFolder | PlanPurpose::Relay)
    }
}

impl std::fmt::Display for PlanPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanPurpose::InterFolder => write!(f, "inter-folder transfers"),
            PlanPurpose::Relay => write!(f, "relay trades"),
            PlanPurpose::Distribution => write!(f, "distribution"),
            PlanPurpose::Collection => write!(f, "collection"),
            PlanPurpose::SendToAddress => write!(f, "send to address"),
        }
    }
}

/// How planning ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStatus {
    /// Every candidate transfer was planned
    Complete,

    /// The next transfer would exceed the cap; the plan is partial
    VolumeCapReached {
        /// Cap in lamports
        cap: u64,
        /// Volume used including the partial plan
        used: u64,
    },

    /// Not enough folders or wallets; the plan is empty
    InsufficientSelection {
        /// Groups (or wallets) the strategy needs
        required: usize,
        /// Groups (or wallets) that qualified
        available: usize,
    },
}

/// Ordered plan plus how planning ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub purpose: PlanPurpose,
    pub transfers: Vec<PlannedTransfer>,
    pub status: PlanStatus,
}

impl TransferPlan {
    pub(crate) fn insufficient(purpose: PlanPurpose, required: usize, available: usize) -> Self {
        Self {
            purpose,
            transfers: Vec::new(),
            status: PlanStatus::InsufficientSelection { required, available },
        }
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.status == PlanStatus::Complete
    }

    /// Sum of fixed amounts (sweeps excluded)
    pub fn total_exact_lamports(&self) -> u64 {
        self.transfers
            .iter()
            .filter_map(|t| match t.amount {
                TransferAmount::Exact(lamports) => Some(lamports),
                TransferAmount::Sweep => None,
            })
            .fold(0u64, |acc, l| acc.saturating_add(l))
    }
}

/// Malformed planner input, rejected before planning
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Transfer amount must be positive")]
    InvalidAmount,

    #[error("Invalid trade side: {0} (use buy or sell)")]
    InvalidSide(String),

    #[error("Invalid target address: {0}")]
    InvalidTarget(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_side_parsing() {
        assert_eq!("buy".parse::<TradeSide>().unwrap(), TradeSide::Buy);
        assert_eq!("SELL".parse::<TradeSide>().unwrap(), TradeSide::Sell);
        assert!(matches!(
            "hold".parse::<TradeSide>(),
            Err(PlanError::InvalidSide(_))
        ));
        assert_eq!(TradeSide::Buy.opposite(), TradeSide::Sell);
    }

    #[test]
    fn test_transfer_kind_side() {
        assert_eq!(TransferKind::Transfer.side(), None);
        assert_eq!(TransferKind::from(TradeSide::Sell), TransferKind::Sell);
        assert_eq!(TransferKind::Buy.side(), Some(TradeSide::Buy));
    }

    #[test]
    fn test_plan_total_skips_sweeps() {
        let a = WalletRef {
            id: "wlt_a".to_string(),
            address: "A".to_string(),
            folder_id: "fld_1".to_string(),
        };
        let plan = TransferPlan {
            purpose: PlanPurpose::Collection,
            transfers: vec![
                PlannedTransfer::between(&a, &a, 10, TransferKind::Transfer),
                PlannedTransfer {
                    sender: Party::Wallet(a.clone()),
                    receiver: Party::External {
                        address: "T".to_string(),
                    },
                    amount: TransferAmount::Sweep,
                    kind: TransferKind::Transfer,
                },
            ],
            status: PlanStatus::Complete,
        };
        assert_eq!(plan.total_exact_lamports(), 10);
        assert!(plan.is_complete());
    }
}
