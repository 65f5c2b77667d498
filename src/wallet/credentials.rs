//! Signing credential handling
//!
//! Secrets are stored as base64 of the 64-byte keypair. Imports also
//! accept base58 (wallet export format) and a JSON byte array (CLI
//! keypair file format).

use std::collections::HashMap;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tracing::debug;

use crate::error::{Error, Result};
use crate::planner::Party;

use super::types::Wallet;

/// Encode a keypair for storage
pub fn encode_secret(keypair: &Keypair) -> String {
    STANDARD.encode(keypair.to_bytes())
}

/// Decode a secret in any accepted format
pub fn decode_secret(secret: &str) -> Result<Keypair> {
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(Error::InvalidKeypair("empty secret".to_string()));
    }

    let bytes = if secret.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(secret)
            .map_err(|e| Error::InvalidKeypair(format!("Failed to parse keypair JSON: {}", e)))?
    } else {
        match bs58::decode(secret).into_vec() {
            Ok(bytes) if bytes.len() == 64 => bytes,
            _ => STANDARD
                .decode(secret)
                .map_err(|e| Error::InvalidKeypair(format!("Secret is neither base58 nor base64: {}", e)))?,
        }
    };

    Keypair::from_bytes(&bytes)
        .map_err(|e| Error::InvalidKeypair(format!("Invalid keypair bytes: {}", e)))
}

/// Generate a fresh keypair, returning (address, stored secret)
pub fn generate_keypair() -> (String, String) {
    let keypair = Keypair::new();
    (keypair.pubkey().to_string(), encode_secret(&keypair))
}

/// Decode a wallet's keypair and check it matches the stored address
pub fn wallet_keypair(wallet: &Wallet) -> Result<Keypair> {
    if !wallet.has_secret() {
        return Err(Error::MissingCredential(wallet.id.clone()));
    }
    let keypair = decode_secret(&wallet.secret)
        .map_err(|e| Error::InvalidKeypair(format!("{}: {}", wallet.id, e)))?;

    if keypair.pubkey().to_string() != wallet.address {
        return Err(Error::InvalidKeypair(format!(
            "{}: secret does not match address {}",
            wallet.id, wallet.address
        )));
    }
    Ok(keypair)
}

/// Parse a base58 address
pub fn parse_address(address: &str) -> Result<Pubkey> {
    address
        .parse()
        .map_err(|e| Error::InvalidAddress(format!("{}: {}", address, e)))
}

/// Load a keypair file (JSON byte array), refusing world-readable files
pub fn load_keypair_file(path: &Path) -> Result<Keypair> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            let mode = metadata.permissions().mode();
            if mode & 0o077 != 0 {
                return Err(Error::InsecureKeypair(format!(
                    "Keypair {} has insecure permissions {:o}. Run 'chmod 600 {}'",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }
    }

    debug!("Loading keypair from: {:?}", path);

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::InvalidKeypair(format!("Failed to read keypair {}: {}", path.display(), e))
    })?;
    decode_secret(&content)
}

/// Write `contents` to a new file readable only by the owner.
/// Refuses to overwrite an existing file.
pub fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

/// Write a keypair file (JSON byte array) that `load_keypair_file` accepts
pub fn write_keypair_file(keypair: &Keypair, path: &Path) -> Result<()> {
    let json = serde_json::to_string(&keypair.to_bytes().to_vec())?;
    write_private_file(path, json.as_bytes())?;
    debug!("Wrote keypair {} to {:?}", keypair.pubkey(), path);
    Ok(())
}

/// Resolves signing keypairs for plan senders
pub struct CredentialBook<'a> {
    wallets: HashMap<&'a str, &'a Wallet>,
    funder: Option<Keypair>,
}

impl<'a> CredentialBook<'a> {
    pub fn new(wallets: &'a [Wallet]) -> Self {
        Self {
            wallets: wallets.iter().map(|w| (w.id.as_str(), w)).collect(),
            funder: None,
        }
    }

    /// Register the external funder that signs distribution legs
    pub fn with_funder(mut self, funder: Keypair) -> Self {
        self.funder = Some(funder);
        self
    }

    /// Keypair able to sign for `party`
    pub fn keypair_for(&self, party: &Party) -> Result<Keypair> {
        match party {
            Party::Wallet(w) => {
                let wallet = self
                    .wallets
                    .get(w.id.as_str())
                    .ok_or_else(|| Error::WalletNotFound(w.id.clone()))?;
                wallet_keypair(wallet)
            }
            Party::External { address } => match &self.funder {
                Some(funder) if funder.pubkey().to_string() == *address => {
                    Keypair::from_bytes(&funder.to_bytes())
                        .map_err(|e| Error::InvalidKeypair(e.to_string()))
                }
                _ => Err(Error::InvalidKeypair(format!(
                    "No signing key for external address {}",
                    address
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::WalletRef;

    fn managed(keypair: &Keypair) -> Wallet {
        Wallet {
            id: "wlt_1".to_string(),
            name: "Wallet 1".to_string(),
            address: keypair.pubkey().to_string(),
            folder_id: "fld_1".to_string(),
            secret: encode_secret(keypair),
        }
    }

    #[test]
    fn test_secret_formats_decode_to_same_key() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();

        let from_b64 = decode_secret(&encode_secret(&keypair)).unwrap();
        let from_b58 = decode_secret(&bs58::encode(bytes).into_string()).unwrap();
        let from_json = decode_secret(&serde_json::to_string(&bytes.to_vec()).unwrap()).unwrap();

        assert_eq!(from_b64.pubkey(), keypair.pubkey());
        assert_eq!(from_b58.pubkey(), keypair.pubkey());
        assert_eq!(from_json.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_invalid_secret_rejected() {
        assert!(decode_secret("").is_err());
        assert!(decode_secret("not a key").is_err());
    }

    #[test]
    fn test_wallet_keypair_checks_address() {
        let keypair = Keypair::new();
        let mut wallet = managed(&keypair);
        assert!(wallet_keypair(&wallet).is_ok());

        wallet.address = Keypair::new().pubkey().to_string();
        assert!(matches!(wallet_keypair(&wallet), Err(Error::InvalidKeypair(_))));

        wallet.secret.clear();
        assert!(matches!(wallet_keypair(&wallet), Err(Error::MissingCredential(_))));
    }

    #[test]
    fn test_book_resolves_wallets_and_funder() {
        let keypair = Keypair::new();
        let wallets = vec![managed(&keypair)];
        let funder = Keypair::new();
        let funder_address = funder.pubkey().to_string();
        let book = CredentialBook::new(&wallets).with_funder(funder);

        let party = Party::Wallet(WalletRef::from(&wallets[0]));
        assert_eq!(book.keypair_for(&party).unwrap().pubkey(), keypair.pubkey());

        let external = Party::External {
            address: funder_address.clone(),
        };
        assert_eq!(book.keypair_for(&external).unwrap().pubkey().to_string(), funder_address);

        let stranger = Party::External {
            address: Keypair::new().pubkey().to_string(),
        };
        assert!(book.keypair_for(&stranger).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_keypair_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("funder.json");
        let keypair = Keypair::new();
        std::fs::write(&path, serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()).unwrap();

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(load_keypair_file(&path), Err(Error::InsecureKeypair(_))));

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(load_keypair_file(&path).unwrap().pubkey(), keypair.pubkey());
    }

    #[cfg(unix)]
    #[test]
    fn test_exported_keypair_loads_back() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup").join("wallet.json");
        let keypair = Keypair::new();

        write_keypair_file(&keypair, &path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(load_keypair_file(&path).unwrap().pubkey(), keypair.pubkey());

        // An existing backup is never overwritten
        assert!(matches!(
            write_keypair_file(&Keypair::new(), &path),
            Err(Error::Io(_))
        ));
        assert_eq!(load_keypair_file(&path).unwrap().pubkey(), keypair.pubkey());
    }
}
