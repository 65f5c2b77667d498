//! Batch transfer planner
//!
//! Pure, synchronous planning of fund movements over managed wallets.
//! Nothing here touches the network or the store file; the executor
//! consumes the resulting plans in order.
//!
//! # Strategies
//!
//! ```text
//! group_eligible ──► plan_inter_folder_transfers   (folder i → folder j, +1 rotation)
//!                ├─► plan_relay_trades             (wallet i ⇄ wallet i+1, buy/sell)
//!                └─► plan_distribution / plan_collection / plan_send_to_address
//! ```
//!
//! Expected outcomes (cap reached, too few folders) are reported through
//! `PlanStatus`; `PlanError` is reserved for malformed input.

pub mod fees;
pub mod grouping;
pub mod inter_folder;
pub mod payout;
pub mod relay;
pub mod types;
pub mod volume;

pub use fees::{compute_sendable_amount, DEFAULT_FEE_RESERVE_LAMPORTS};
pub use grouping::{group_eligible, FolderGroup, FolderGroups};
pub use inter_folder::plan_inter_folder_transfers;
pub use payout::{plan_collection, plan_distribution, plan_send_to_address};
pub use relay::plan_relay_trades;
pub use types::{
    Party, PlanError, PlanPurpose, PlanStatus, PlannedTransfer, TradeSide, TransferAmount,
    TransferKind, TransferPlan, WalletRef,
};
pub use volume::VolumeAccumulator;
