//! Error types for the bundler

use solana_client::client_error::{ClientError, ClientErrorKind};
use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bundler
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("Insecure keypair permissions: {0}")]
    InsecureKeypair(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC timeout: {0}")]
    RpcTimeout(String),

    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    // Transfer errors
    #[error("Transaction build failed: {0}")]
    TransactionBuild(String),

    #[error("Transaction send failed: {0}")]
    TransactionSend(String),

    #[error("Insufficient balance: {available} lamports available, {required} lamports required")]
    InsufficientBalance { available: u64, required: u64 },

    // Store errors
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Wallet address already managed: {0}")]
    DuplicateAddress(String),

    #[error("Wallet {0} has no signing credential")]
    MissingCredential(String),

    #[error("Store persistence failed: {0}")]
    StorePersistence(String),

    // Planning errors
    #[error(transparent)]
    Plan(#[from] crate::planner::PlanError),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RpcTimeout(_) | Error::RpcConnection(_))
    }

    /// Check if this error concerns the managed wallet set rather than the network
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Error::FolderNotFound(_)
                | Error::WalletNotFound(_)
                | Error::DuplicateAddress(_)
                | Error::MissingCredential(_)
                | Error::StorePersistence(_)
        )
    }
}

// Conversion from solana_client errors: transport failures are transient,
// node and transaction rejections are not
impl From<ClientError> for Error {
    fn from(e: ClientError) -> Self {
        match e.kind() {
            ClientErrorKind::Io(_) => Error::RpcConnection(e.to_string()),
            ClientErrorKind::Reqwest(err) if err.is_timeout() => Error::RpcTimeout(e.to_string()),
            ClientErrorKind::Reqwest(err) if err.is_connect() => Error::RpcConnection(e.to_string()),
            _ => Error::Rpc(e.to_string()),
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::transaction::TransactionError;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::RpcTimeout("slow".to_string()).is_retryable());
        assert!(Error::RpcConnection("refused".to_string()).is_retryable());
        assert!(!Error::Rpc("node behind".to_string()).is_retryable());
        assert!(!Error::TransactionSend("rejected".to_string()).is_retryable());
        assert!(!Error::WalletNotFound("wlt_x".to_string()).is_retryable());
    }

    #[test]
    fn test_client_error_kinds() {
        let io = ClientError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let err = Error::from(io);
        assert!(matches!(err, Error::RpcConnection(_)));
        assert!(err.is_retryable());

        let rejected = ClientError::from(TransactionError::AccountNotFound);
        let err = Error::from(rejected);
        assert!(matches!(err, Error::Rpc(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_store_error_classification() {
        assert!(Error::DuplicateAddress("abc".to_string()).is_store_error());
        assert!(Error::FolderNotFound("fld_x".to_string()).is_store_error());
        assert!(!Error::Rpc("boom".to_string()).is_store_error());
    }
}
