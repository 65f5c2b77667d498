//! Wallet management module
//!
//! Provides the folder/wallet store and plan execution:
//! - Persistent store (folders, wallets, selection, history, volume session)
//! - Signing credentials (secret decoding, funder keypair)
//! - Transfer submission over RPC
//! - Sequential plan execution with per-item outcomes
//!
//! # Architecture
//!
//! ```text
//! WalletStore ──► planner ──► PlanExecutor ──► TransferSubmitter (RPC)
//!      ▲                           │
//!      └───── record_outcome ◄─────┘ per confirmed item
//! ```
//!
//! # Security
//!
//! Plans carry wallet references only. Keypairs are decoded from the store
//! by `CredentialBook` at signing time and never leave the executor.

pub mod credentials;
pub mod executor;
pub mod id;
pub mod store;
pub mod transfer;
pub mod types;

pub use credentials::CredentialBook;
pub use executor::{ExecutedTransfer, ExecutionReport, PlanExecutor, TransferOutcome};
pub use store::WalletStore;
pub use transfer::{lamports_to_sol, sol_to_lamports, RpcSubmitter, TransferSubmitter, LAMPORTS_PER_SOL};
pub use types::{Folder, FolderId, StoreSnapshot, TradeTx, TransferTx, Wallet, WalletId, WalletStatus};
