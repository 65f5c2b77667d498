//! Persistent wallet store
//!
//! Owns folders, wallets, folder selection, transaction history and the
//! running volume session. Everything lives in a single JSON snapshot file
//! that is rewritten atomically on `save()`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::planner::{Party, PlanPurpose, VolumeAccumulator};

use super::executor::{ExecutedTransfer, TransferOutcome};
use super::id::{generate_uid, to_short_uid};
use super::types::{Folder, FolderId, StoreSnapshot, TradeTx, TransferTx, Wallet, WalletId, SNAPSHOT_VERSION};

/// Characters kept on each side of a folder's short uid
const SHORT_UID_SIZE: usize = 4;

/// Wallet and history store backed by a JSON file
pub struct WalletStore {
    path: PathBuf,
    state: StoreSnapshot,
}

impl WalletStore {
    /// Open the store at `path`; a missing file yields an empty store
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::StorePersistence(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str::<StoreSnapshot>(&content).map_err(|e| {
                Error::StorePersistence(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            warn!("Store {} not found, starting empty", path.display());
            StoreSnapshot::default()
        };

        info!(
            "Loaded {} folders, {} wallets",
            state.folders.len(),
            state.wallets.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot to a temp file, then rename over the store file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StorePersistence(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| Error::StorePersistence(format!("Failed to serialize store: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| {
            Error::StorePersistence(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            Error::StorePersistence(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Saved store to {}", self.path.display());
        Ok(())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.clone()
    }

    /// Replace the whole state with `snapshot`
    pub fn load(&mut self, mut snapshot: StoreSnapshot) {
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                "Loading snapshot version {} (current {})",
                snapshot.version, SNAPSHOT_VERSION
            );
            snapshot.version = SNAPSHOT_VERSION.to_string();
        }
        self.state = snapshot;
    }

    // ---- Folders ----

    pub fn folders(&self) -> &[Folder] {
        &self.state.folders
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.state.folders.iter().find(|f| f.id == id)
    }

    pub fn create_folder(&mut self, name: &str) -> Folder {
        let id = generate_uid("fld");
        let folder = Folder {
            short_uid: to_short_uid(&id, SHORT_UID_SIZE),
            id,
            name: name.trim().to_string(),
        };
        info!("Created folder {} ({})", folder.name, folder.id);
        self.state.folders.push(folder.clone());
        folder
    }

    pub fn rename_folder(&mut self, id: &str, name: &str) -> Result<()> {
        let folder = self
            .state
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| Error::FolderNotFound(id.to_string()))?;
        folder.name = name.trim().to_string();
        Ok(())
    }

    /// Delete a folder with its wallets; returns how many wallets went with it
    pub fn delete_folder(&mut self, id: &str) -> Result<usize> {
        let before = self.state.folders.len();
        self.state.folders.retain(|f| f.id != id);
        if self.state.folders.len() == before {
            return Err(Error::FolderNotFound(id.to_string()));
        }

        let wallets_before = self.state.wallets.len();
        self.state.wallets.retain(|w| w.folder_id != id);
        self.state.selection.retain(|f| f != id);
        let removed = wallets_before - self.state.wallets.len();

        info!("Deleted folder {} and {} wallets", id, removed);
        Ok(removed)
    }

    // ---- Selection ----

    pub fn selection(&self) -> &[FolderId] {
        &self.state.selection
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.state.selection.iter().any(|f| f == id)
    }

    /// Toggle a folder in or out of the selection; returns the new state
    pub fn toggle_folder_selection(&mut self, id: &str) -> Result<bool> {
        if self.folder(id).is_none() {
            return Err(Error::FolderNotFound(id.to_string()));
        }
        if self.is_selected(id) {
            self.state.selection.retain(|f| f != id);
            Ok(false)
        } else {
            self.state.selection.push(id.to_string());
            Ok(true)
        }
    }

    pub fn select_all(&mut self) {
        self.state.selection = self.state.folders.iter().map(|f| f.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.state.selection.clear();
    }

    // ---- Wallets ----

    pub fn wallets(&self) -> &[Wallet] {
        &self.state.wallets
    }

    pub fn wallet(&self, id: &str) -> Option<&Wallet> {
        self.state.wallets.iter().find(|w| w.id == id)
    }

    /// Display name for the next wallet: "Wallet N"
    pub fn next_wallet_name(&self) -> String {
        format!("Wallet {}", self.state.wallets.len() + 1)
    }

    pub fn add_wallet(
        &mut self,
        name: &str,
        address: &str,
        folder_id: &str,
        secret: &str,
    ) -> Result<Wallet> {
        if self.folder(folder_id).is_none() {
            return Err(Error::FolderNotFound(folder_id.to_string()));
        }
        if self.find_wallet_by_address(address).is_some() {
            return Err(Error::DuplicateAddress(address.to_string()));
        }

        let wallet = Wallet {
            id: generate_uid("wlt"),
            name: name.to_string(),
            address: address.to_string(),
            folder_id: folder_id.to_string(),
            secret: secret.to_string(),
        };
        debug!("Added wallet {} ({}) to {}", wallet.name, wallet.address, folder_id);
        self.state.wallets.push(wallet.clone());
        Ok(wallet)
    }

    pub fn move_wallet(&mut self, id: &str, folder_id: &str) -> Result<()> {
        if self.folder(folder_id).is_none() {
            return Err(Error::FolderNotFound(folder_id.to_string()));
        }
        let wallet = self
            .state
            .wallets
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::WalletNotFound(id.to_string()))?;
        wallet.folder_id = folder_id.to_string();
        Ok(())
    }

    pub fn remove_wallet(&mut self, id: &str) -> Result<Wallet> {
        let index = self
            .state
            .wallets
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| Error::WalletNotFound(id.to_string()))?;
        Ok(self.state.wallets.remove(index))
    }

    /// Drop legacy wallets that cannot sign; returns the removed wallets
    pub fn prune_wallets_without_secret(&mut self) -> Vec<Wallet> {
        let (keep, pruned): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.wallets)
            .into_iter()
            .partition(Wallet::has_secret);
        self.state.wallets = keep;
        if !pruned.is_empty() {
            info!("Pruned {} wallets without a signing credential", pruned.len());
        }
        pruned
    }

    pub fn wallets_in_folder(&self, folder_id: &str) -> Vec<&Wallet> {
        self.state
            .wallets
            .iter()
            .filter(|w| w.folder_id == folder_id)
            .collect()
    }

    pub fn find_wallet_by_address(&self, address: &str) -> Option<&Wallet> {
        self.state.wallets.iter().find(|w| w.address == address)
    }

    // ---- History ----

    pub fn transfers(&self) -> &[TransferTx] {
        &self.state.transfers
    }

    pub fn trades(&self) -> &[TradeTx] {
        &self.state.trades
    }

    /// Record the confirmed items of a finished report. Returns the number
    /// of history records appended.
    #[cfg(test)]
    pub(crate) fn record_execution(&mut self, report: super::executor::ExecutionReport, token: &str) -> usize {
        let mut recorded = 0;
        for item in &report.items {
            if self.record_outcome(report.purpose, item, token) {
                recorded += 1;
            }
        }
        recorded
    }

    /// Record one executed transfer as it finishes.
    ///
    /// Confirmed wallet-to-wallet transfers and relay legs go into history;
    /// payouts to or from external addresses are not history. Volume is added
    /// to the session only for plans that count toward it. Returns whether a
    /// history record was appended.
    pub fn record_outcome(&mut self, purpose: PlanPurpose, item: &ExecutedTransfer, token: &str) -> bool {
        let TransferOutcome::Confirmed { signature, lamports } = &item.outcome else {
            return false;
        };
        let lamports = *lamports;

        if purpose.counts_toward_volume() {
            self.state.session.record(lamports);
        }

        let (Party::Wallet(from), Party::Wallet(to)) = (&item.planned.sender, &item.planned.receiver) else {
            return false;
        };

        let timestamp = Utc::now();
        match item.planned.kind.side() {
            None => self.state.transfers.push(TransferTx {
                from_wallet_id: from.id.clone(),
                to_wallet_id: to.id.clone(),
                lamports,
                signature: signature.to_string(),
                timestamp,
            }),
            Some(side) => self.state.trades.push(TradeTx {
                folder_id: from.folder_id.clone(),
                initiator_wallet_id: from.id.clone(),
                relay_wallet_id: to.id.clone(),
                token: token.to_string(),
                lamports,
                side,
                signature: signature.to_string(),
                timestamp,
            }),
        }
        true
    }

    // ---- Volume session ----

    pub fn session(&self) -> &VolumeAccumulator {
        &self.state.session
    }

    pub fn session_mut(&mut self) -> &mut VolumeAccumulator {
        &mut self.state.session
    }

    /// Name for a wallet id, falling back to the id itself
    pub fn wallet_label(&self, id: &WalletId) -> String {
        self.wallet(id).map(|w| w.name.clone()).unwrap_or_else(|| id.clone())
    }
}
