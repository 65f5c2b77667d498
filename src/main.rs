//! Solana Multi-Wallet Bundler - batch fund movement across wallet folders
//!
//! # WARNING
//! - Transfers move real funds and cannot be undone.
//! - Wallet secrets are stored in the store file. Keep it private.
//! - Use `--dry-run` to inspect a plan before executing it.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use solana_bundler::cli::commands::{self, RunOptions};
use solana_bundler::config::Config;

/// Solana Multi-Wallet Bundler
#[derive(Parser)]
#[command(name = "bundler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "bundler.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Folder management
    Folder {
        #[command(subcommand)]
        action: FolderAction,
    },

    /// Wallet management
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },

    /// Back up or restore the whole store
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },

    /// Volume generation across the selected folders
    Volume {
        #[command(subcommand)]
        action: VolumeAction,
    },

    /// Fund every selected wallet from the funder keypair
    Distribute {
        /// Amount per wallet in SOL (default from config)
        #[arg(short, long)]
        amount: Option<f64>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Sweep every selected wallet to an address
    Collect {
        /// Destination address
        #[arg(long)]
        to: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Send a fixed amount from every selected wallet to an address
    Send {
        /// Destination address
        #[arg(long)]
        to: String,

        /// Amount per wallet in SOL
        #[arg(short, long)]
        amount: f64,

        #[command(flatten)]
        run: RunArgs,
    },

    /// View transaction history
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show volume statistics
    Stats,

    /// Show current configuration (secrets masked)
    Config,
}

#[derive(clap::Args, Clone, Copy)]
struct RunArgs {
    /// Print the plan without submitting
    #[arg(long)]
    dry_run: bool,

    /// Skip confirmation prompt
    #[arg(long)]
    force: bool,
}

impl From<RunArgs> for RunOptions {
    fn from(args: RunArgs) -> Self {
        RunOptions {
            dry_run: args.dry_run,
            force: args.force,
        }
    }
}

#[derive(Subcommand)]
enum FolderAction {
    /// Create a folder
    Create {
        /// Display name
        name: String,
    },

    /// List folders (selected folders marked with *)
    List,

    /// Rename a folder
    Rename {
        /// Folder id, short id or name
        folder: String,

        /// New display name
        name: String,
    },

    /// Delete a folder and its wallets
    Delete {
        /// Folder id, short id or name
        folder: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Toggle a folder in or out of the selection
    Select {
        /// Folder id, short id or name
        folder: String,
    },

    /// Select every folder
    SelectAll,

    /// Clear the selection
    Clear,
}

#[derive(Subcommand)]
enum WalletAction {
    /// Generate new wallets in a folder
    Create {
        /// Target folder
        #[arg(long)]
        folder: String,

        /// Number of wallets to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Import an existing wallet
    Import {
        /// Target folder
        #[arg(long)]
        folder: String,

        /// Secret key (base58, base64 or JSON array); prompted when omitted
        #[arg(long, conflicts_with = "address")]
        secret: Option<String>,

        /// Import an address without a signing credential
        #[arg(long)]
        address: Option<String>,

        /// Display name (default "Wallet N")
        #[arg(long)]
        name: Option<String>,
    },

    /// List wallets
    List {
        /// Only this folder
        #[arg(long)]
        folder: Option<String>,
    },

    /// Move a wallet to another folder
    Move {
        /// Wallet id, address or name
        wallet: String,

        /// Destination folder
        folder: String,
    },

    /// Remove a wallet
    Remove {
        /// Wallet id, address or name
        wallet: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Remove wallets that have no signing credential
    Prune {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Write a wallet's keypair to a private JSON file
    Export {
        /// Wallet id, address or name
        wallet: String,

        /// Output file (default <address>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show on-chain balances
    Balances {
        /// Only this folder
        #[arg(long)]
        folder: Option<String>,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Write the store, including secrets, to a private backup file
    Export {
        /// Backup file to create
        out: PathBuf,
    },

    /// Replace the store with a backup
    Import {
        /// Backup file written by 'store export'
        path: PathBuf,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum VolumeAction {
    /// Transfer between every pair of selected folders
    Transfer {
        /// Amount per transfer in SOL (default from config)
        #[arg(short, long)]
        amount: Option<f64>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Mirrored relay trades inside each selected folder
    Trade {
        /// Initiator side: buy or sell
        #[arg(long, default_value = "buy")]
        side: String,

        /// Amount per leg in SOL (default from config)
        #[arg(short, long)]
        amount: Option<f64>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show the volume session
    Status,

    /// Set the session volume cap in SOL ("none" to remove)
    Cap {
        /// Cap in SOL, or "none"
        value: String,
    },

    /// Reset session volume to zero
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("solana_bundler=info".parse()?),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Folder { action } => match action {
            FolderAction::Create { name } => commands::folder_create(&config, &name),
            FolderAction::List => commands::folder_list(&config),
            FolderAction::Rename { folder, name } => commands::folder_rename(&config, &folder, &name),
            FolderAction::Delete { folder, force } => commands::folder_delete(&config, &folder, force),
            FolderAction::Select { folder } => commands::folder_select(&config, &folder),
            FolderAction::SelectAll => commands::folder_select_all(&config),
            FolderAction::Clear => commands::folder_clear(&config),
        },
        Commands::Wallet { action } => match action {
            WalletAction::Create { folder, count } => commands::wallet_create(&config, &folder, count),
            WalletAction::Import {
                folder,
                secret,
                address,
                name,
            } => commands::wallet_import(&config, &folder, secret, address, name),
            WalletAction::List { folder } => commands::wallet_list(&config, folder),
            WalletAction::Move { wallet, folder } => commands::wallet_move(&config, &wallet, &folder),
            WalletAction::Remove { wallet, force } => commands::wallet_remove(&config, &wallet, force),
            WalletAction::Prune { force } => commands::wallet_prune(&config, force),
            WalletAction::Export { wallet, out } => commands::wallet_export(&config, &wallet, out),
            WalletAction::Balances { folder } => commands::wallet_balances(&config, folder).await,
        },
        Commands::Store { action } => match action {
            StoreAction::Export { out } => commands::store_export(&config, &out),
            StoreAction::Import { path, force } => commands::store_import(&config, &path, force),
        },
        Commands::Volume { action } => match action {
            VolumeAction::Transfer { amount, run } => {
                commands::volume_transfer(&config, amount, run.into()).await
            }
            VolumeAction::Trade { side, amount, run } => {
                commands::volume_trade(&config, &side, amount, run.into()).await
            }
            VolumeAction::Status => commands::volume_status(&config),
            VolumeAction::Cap { value } => commands::volume_set_cap(&config, &value),
            VolumeAction::Reset => commands::volume_reset(&config),
        },
        Commands::Distribute { amount, run } => commands::distribute(&config, amount, run.into()).await,
        Commands::Collect { to, run } => commands::collect(&config, &to, run.into()).await,
        Commands::Send { to, amount, run } => commands::send(&config, &to, amount, run.into()).await,
        Commands::History { limit } => commands::history(&config, limit),
        Commands::Stats => commands::stats(&config),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        if e
            .downcast_ref::<solana_bundler::Error>()
            .is_some_and(|e| e.is_store_error())
        {
            error!("Check folders and wallets with 'bundler folder list' and 'bundler wallet list'");
        }
        std::process::exit(1);
    }

    Ok(())
}
