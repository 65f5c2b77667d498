//! Solana Multi-Wallet Bundler Library
//!
//! Folder-grouped wallet management with batch fund-movement planning
//! (inter-folder transfers, relay trades, distribution and collection).

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod planner;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
