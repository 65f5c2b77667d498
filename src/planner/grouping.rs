//! Eligibility filter and per-folder grouping
//!
//! Every strategy plans over `FolderGroups`. Wallets that cannot sign are
//! dropped here, once, and reported in `skipped`.

use std::collections::HashMap;

use super::types::WalletRef;
use crate::wallet::types::{FolderId, Wallet, WalletId};

/// Eligible wallets of one selected folder, in registry order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderGroup {
    pub folder_id: FolderId,
    pub wallets: Vec<WalletRef>,
}

impl FolderGroup {
    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

/// Wallets grouped by selected folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderGroups {
    /// Non-empty groups in selection order
    pub groups: Vec<FolderGroup>,

    /// Selected wallets excluded for lacking a signing credential
    pub skipped: Vec<WalletId>,
}

impl FolderGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total eligible wallets across groups
    pub fn wallet_count(&self) -> usize {
        self.groups.iter().map(FolderGroup::len).sum()
    }

    /// All eligible wallets, group by group
    pub fn wallets(&self) -> impl Iterator<Item = &WalletRef> {
        self.groups.iter().flat_map(|g| g.wallets.iter())
    }
}

/// Group the wallets of the selected folders, excluding those without a secret
///
/// Group order follows `selected`; duplicate selections are ignored.
/// Selected folders left with no eligible wallet are omitted.
pub fn group_eligible(wallets: &[Wallet], selected: &[FolderId]) -> FolderGroups {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<FolderGroup> = Vec::new();

    for folder_id in selected {
        if index.contains_key(folder_id.as_str()) {
            continue;
        }
        index.insert(folder_id.as_str(), groups.len());
        groups.push(FolderGroup {
            folder_id: folder_id.clone(),
            wallets: Vec::new(),
        });
    }

    let mut skipped = Vec::new();
    for wallet in wallets {
        let Some(&slot) = index.get(wallet.folder_id.as_str()) else {
            continue;
        };
        if !wallet.has_secret() {
            skipped.push(wallet.id.clone());
            continue;
        }
        groups[slot].wallets.push(WalletRef::from(wallet));
    }

    groups.retain(|g| !g.is_empty());

    FolderGroups { groups, skipped }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::wallet::types::Wallet;

    /// Wallet with a secret; address is derived from the id
    pub fn wallet(id: &str, folder: &str) -> Wallet {
        Wallet {
            id: id.to_string(),
            name: id.to_uppercase(),
            address: format!("addr-{}", id),
            folder_id: folder.to_string(),
            secret: "c2VjcmV0".to_string(),
        }
    }

    /// `counts[i]` wallets in folder `f{i}`, ids `f{i}w{k}`
    pub fn folders(counts: &[usize]) -> (Vec<Wallet>, Vec<String>) {
        let mut wallets = Vec::new();
        let mut ids = Vec::new();
        for (i, count) in counts.iter().enumerate() {
            let folder = format!("f{}", i);
            for k in 0..*count {
                wallets.push(wallet(&format!("f{}w{}", i, k), &folder));
            }
            ids.push(folder);
        }
        (wallets, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_groups_follow_selection_order() {
        let wallets = vec![
            wallet("a1", "A"),
            wallet("b1", "B"),
            wallet("a2", "A"),
            wallet("c1", "C"),
        ];
        let groups = group_eligible(&wallets, &["B".to_string(), "A".to_string()]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.groups[0].folder_id, "B");
        assert_eq!(groups.groups[1].folder_id, "A");
        let a_ids: Vec<_> = groups.groups[1].wallets.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(a_ids, vec!["a1", "a2"]);
        assert_eq!(groups.wallet_count(), 3);
    }

    #[test]
    fn test_wallets_without_secret_are_reported() {
        let mut orphan = wallet("a2", "A");
        orphan.secret.clear();
        let mut unselected = wallet("c1", "C");
        unselected.secret.clear();

        let wallets = vec![wallet("a1", "A"), orphan, unselected];
        let groups = group_eligible(&wallets, &["A".to_string()]);

        assert_eq!(groups.wallet_count(), 1);
        assert_eq!(groups.skipped, vec!["a2".to_string()]);
    }

    #[test]
    fn test_empty_selected_folder_is_omitted() {
        let mut only = wallet("b1", "B");
        only.secret.clear();
        let wallets = vec![wallet("a1", "A"), only];
        let groups = group_eligible(&wallets, &["A".to_string(), "B".to_string(), "A".to_string()]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.groups[0].folder_id, "A");
    }
}
