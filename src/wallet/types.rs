//! Core types for wallet management
//!
//! Defines managed wallets, folders, history records and the persisted
//! store snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::planner::{TradeSide, VolumeAccumulator};

/// Wallet identifier: "wlt_..."
pub type WalletId = String;

/// Folder identifier: "fld_..."
pub type FolderId = String;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: &str = "1.0";

/// A managed keypair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique identifier
    pub id: WalletId,

    /// Display name: "Wallet 3"
    pub name: String,

    /// Base58 public key
    pub address: String,

    /// Folder this wallet belongs to
    pub folder_id: FolderId,

    /// Base64-encoded 64-byte secret key.
    /// Empty for legacy entries imported without a credential.
    #[serde(default)]
    pub secret: String,
}

impl Wallet {
    /// Check if this wallet can sign transfers
    pub fn has_secret(&self) -> bool {
        !self.secret.trim().is_empty()
    }
}

/// A named grouping of wallets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique identifier
    pub id: FolderId,

    /// Display name (not unique)
    pub name: String,

    /// Short form of the id for display
    pub short_uid: String,
}

/// Confirmed wallet-to-wallet transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTx {
    pub from_wallet_id: WalletId,
    pub to_wallet_id: WalletId,
    pub lamports: u64,
    pub signature: String,
    pub timestamp: DateTime<Utc>,
}

/// Confirmed leg of a relay trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTx {
    pub folder_id: FolderId,
    pub initiator_wallet_id: WalletId,
    /// Wallet mirroring the opposite side
    pub relay_wallet_id: WalletId,
    /// Token mint the trade is attributed to
    pub token: String,
    pub lamports: u64,
    pub side: TradeSide,
    pub signature: String,
    pub timestamp: DateTime<Utc>,
}

/// Persisted store state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Snapshot format version
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub folders: Vec<Folder>,

    #[serde(default)]
    pub wallets: Vec<Wallet>,

    #[serde(default)]
    pub transfers: Vec<TransferTx>,

    #[serde(default)]
    pub trades: Vec<TradeTx>,

    /// Selected folder ids, in selection order
    #[serde(default)]
    pub selection: Vec<FolderId>,

    /// Running volume session
    #[serde(default)]
    pub session: VolumeAccumulator,
}

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            version: default_version(),
            folders: Vec::new(),
            wallets: Vec::new(),
            transfers: Vec::new(),
            trades: Vec::new(),
            selection: Vec::new(),
            session: VolumeAccumulator::default(),
        }
    }
}

/// Wallet balance snapshot for display
#[derive(Debug, Clone)]
pub struct WalletStatus {
    /// Wallet name
    pub name: String,

    /// Folder name
    pub folder: String,

    /// Wallet address
    pub address: String,

    /// Current balance in lamports (None if unable to fetch)
    pub balance_lamports: Option<u64>,

    /// Any warnings or errors
    pub warnings: Vec<String>,
}
