//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::Confirm;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tracing::{error, info, warn};

use crate::config::{Config, FUNDER_KEYPAIR_ENV};
use crate::error::Error;
use crate::metrics::{folder_net_flow, volume_series, VolumeSummary};
use crate::planner::{
    group_eligible, plan_collection, plan_distribution, plan_inter_folder_transfers,
    plan_relay_trades, plan_send_to_address, FolderGroups, Party, PlanStatus, TradeSide,
    TransferAmount, TransferPlan, VolumeAccumulator,
};
use crate::wallet::credentials::{
    decode_secret, encode_secret, generate_keypair, load_keypair_file, parse_address, wallet_keypair,
    write_keypair_file, write_private_file,
};
use crate::wallet::id::to_short_uid;
use crate::wallet::types::{FolderId, StoreSnapshot, WalletId, WalletStatus};
use crate::wallet::{
    lamports_to_sol, sol_to_lamports, CredentialBook, ExecutionReport, PlanExecutor, RpcSubmitter,
    TransferOutcome, TransferSubmitter, WalletStore,
};

/// Options shared by every command that executes a plan
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print the plan without submitting
    pub dry_run: bool,
    /// Skip the confirmation prompt
    pub force: bool,
}

fn open_store(config: &Config) -> Result<WalletStore> {
    WalletStore::open(&config.store.path)
        .with_context(|| format!("Failed to open store {}", config.store.path.display()))
}

/// Resolve a folder by id, short uid or unique name
fn resolve_folder(store: &WalletStore, key: &str) -> Result<FolderId> {
    if let Some(folder) = store.folder(key) {
        return Ok(folder.id.clone());
    }

    let by_short_uid: Vec<_> = store.folders().iter().filter(|f| f.short_uid == key).collect();
    match by_short_uid.as_slice() {
        [folder] => return Ok(folder.id.clone()),
        [] => {}
        _ => anyhow::bail!("Short id '{}' matches several folders, use the full folder id", key),
    }

    let matches: Vec<_> = store
        .folders()
        .iter()
        .filter(|f| f.name.eq_ignore_ascii_case(key))
        .collect();
    match matches.as_slice() {
        [folder] => Ok(folder.id.clone()),
        [] => Err(Error::FolderNotFound(key.to_string()).into()),
        _ => anyhow::bail!("Folder name '{}' is ambiguous, use the folder id", key),
    }
}

/// Resolve a wallet by id, address or unique name
fn resolve_wallet(store: &WalletStore, key: &str) -> Result<WalletId> {
    if let Some(wallet) = store
        .wallets()
        .iter()
        .find(|w| w.id == key || w.address == key)
    {
        return Ok(wallet.id.clone());
    }

    let matches: Vec<_> = store.wallets().iter().filter(|w| w.name == key).collect();
    match matches.as_slice() {
        [wallet] => Ok(wallet.id.clone()),
        [] => Err(Error::WalletNotFound(key.to_string()).into()),
        _ => anyhow::bail!("Wallet name '{}' is ambiguous, use the wallet id or address", key),
    }
}

fn folder_name(store: &WalletStore, id: &str) -> String {
    store
        .folder(id)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| to_short_uid(id, 4))
}

fn short_address(address: &str) -> String {
    to_short_uid(address, 6)
}

fn party_label(store: &WalletStore, party: &Party) -> String {
    match party {
        Party::Wallet(w) => format!("{} [{}]", store.wallet_label(&w.id), folder_name(store, &w.folder_id)),
        Party::External { address } => short_address(address),
    }
}

/// Group the selected folders, warning once about wallets that cannot sign
fn selected_groups(store: &WalletStore) -> Result<FolderGroups> {
    if store.selection().is_empty() {
        anyhow::bail!("No folders selected. Use 'bundler folder select <folder>' first");
    }

    let groups = group_eligible(store.wallets(), store.selection());
    if !groups.skipped.is_empty() {
        warn!(
            "Skipping {} wallets without a signing credential: {}",
            groups.skipped.len(),
            groups.skipped.join(", ")
        );
    }
    Ok(groups)
}

fn amount_or_default(amount_sol: Option<f64>, default_lamports: u64) -> u64 {
    amount_sol.map(sol_to_lamports).unwrap_or(default_lamports)
}

fn print_plan(store: &WalletStore, plan: &TransferPlan) {
    println!("\n=== PLAN: {} ===\n", plan.purpose.to_string().to_uppercase());

    if !plan.is_empty() {
        println!(
            "{:<4} {:<28} {:<28} {:<8} {}",
            "#", "FROM", "TO", "KIND", "AMOUNT (SOL)"
        );
        println!("{}", "-".repeat(85));
        for (i, transfer) in plan.transfers.iter().enumerate() {
            println!(
                "{:<4} {:<28} {:<28} {:<8} {}",
                i + 1,
                party_label(store, &transfer.sender),
                party_label(store, &transfer.receiver),
                transfer.kind.to_string(),
                transfer.amount.to_string()
            );
        }
        println!();
    }

    match &plan.status {
        PlanStatus::Complete => {
            println!(
                "{} transfers, {:.6} SOL total",
                plan.len(),
                lamports_to_sol(plan.total_exact_lamports())
            );
        }
        PlanStatus::VolumeCapReached { cap, used } => {
            println!(
                "Volume cap reached: plan stops at {:.6} / {:.6} SOL ({} transfers)",
                lamports_to_sol(*used),
                lamports_to_sol(*cap),
                plan.len()
            );
        }
        PlanStatus::InsufficientSelection { required, available } => {
            println!(
                "Nothing to do: needs at least {} eligible, found {}",
                required, available
            );
        }
    }
}

fn confirm_plan(config: &Config, plan: &TransferPlan, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }

    let total_sol = lamports_to_sol(plan.total_exact_lamports());
    let has_sweep = plan
        .transfers
        .iter()
        .any(|t| t.amount == TransferAmount::Sweep);
    if !has_sweep && total_sol <= config.safety.confirm_above_sol {
        return Ok(true);
    }

    let prompt = if has_sweep {
        format!("Execute {} ({} transfers, full balances)? This cannot be undone.", plan.purpose, plan.len())
    } else {
        format!(
            "Execute {} ({} transfers, {:.6} SOL)? This cannot be undone.",
            plan.purpose,
            plan.len(),
            total_sol
        )
    };

    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn print_report(store: &WalletStore, report: &ExecutionReport) {
    println!("\n=== RESULT ===\n");
    for (i, item) in report.items.iter().enumerate() {
        let from = party_label(store, &item.planned.sender);
        let to = party_label(store, &item.planned.receiver);
        match &item.outcome {
            TransferOutcome::Confirmed { signature, lamports } => println!(
                "{:<4} OK      {} -> {} {:.6} SOL ({})",
                i + 1,
                from,
                to,
                lamports_to_sol(*lamports),
                signature
            ),
            TransferOutcome::Skipped { reason } => {
                println!("{:<4} SKIPPED {} -> {}: {}", i + 1, from, to, reason)
            }
            TransferOutcome::Failed { error } => {
                println!("{:<4} FAILED  {} -> {}: {}", i + 1, from, to, error)
            }
        }
    }
    println!(
        "\n{} confirmed, {} skipped, {} failed, {:.6} SOL moved",
        report.confirmed_count(),
        report.skipped_count(),
        report.failed_count(),
        lamports_to_sol(report.confirmed_lamports())
    );
}

/// Print, confirm, execute and record a plan
async fn run_plan(
    config: &Config,
    store: &mut WalletStore,
    plan: TransferPlan,
    funder: Option<Keypair>,
    opts: RunOptions,
) -> Result<()> {
    print_plan(store, &plan);

    if plan.is_empty() {
        return Ok(());
    }

    if opts.dry_run {
        println!("\nDRY RUN: nothing submitted");
        return Ok(());
    }

    if !confirm_plan(config, &plan, opts.force)? {
        info!("{} cancelled by user", plan.purpose);
        return Ok(());
    }

    let wallets = store.wallets().to_vec();
    let mut book = CredentialBook::new(&wallets);
    if let Some(funder) = funder {
        book = book.with_funder(funder);
    }

    let submitter = RpcSubmitter::new(&config.rpc);
    let executor = PlanExecutor::new(&submitter, config.planner.fee_reserve_lamports);

    // Persist each confirmation before the next transfer is submitted
    let token = config.planner.token_mint.as_str();
    let mut recorded = 0usize;
    let report = executor
        .execute_with(&plan, &book, |item| {
            if !matches!(item.outcome, TransferOutcome::Confirmed { .. }) {
                return Ok(());
            }
            if store.record_outcome(plan.purpose, item, token) {
                recorded += 1;
            }
            store.save()
        })
        .await;

    print_report(store, &report);
    info!("Recorded {} history entries", recorded);

    if let Some(reason) = &report.halted {
        anyhow::bail!(
            "Stopped after {} of {} transfers, store could not be saved: {}",
            report.items.len(),
            plan.len(),
            reason
        );
    }

    let failed = report.failed_count();
    if failed > 0 {
        warn!("{} transfers failed", failed);
    }
    Ok(())
}

fn load_funder() -> Result<Keypair> {
    let path = Config::funder_keypair_path()
        .ok_or_else(|| Error::MissingEnvVar(FUNDER_KEYPAIR_ENV.to_string()))?;
    Ok(load_keypair_file(&path)?)
}

// ---- Folders ----

pub fn folder_create(config: &Config, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Folder name cannot be empty");
    }
    let mut store = open_store(config)?;
    let folder = store.create_folder(name);
    store.save()?;
    println!("Created folder {} ({})", folder.name, folder.id);
    Ok(())
}

pub fn folder_list(config: &Config) -> Result<()> {
    let store = open_store(config)?;

    println!("\n=== FOLDERS ===\n");
    if store.folders().is_empty() {
        println!("No folders. Create one with 'bundler folder create <name>'.");
        return Ok(());
    }

    println!("{:<3} {:<20} {:<14} {:<8} {}", "SEL", "NAME", "ID", "WALLETS", "SIGNABLE");
    println!("{}", "-".repeat(60));
    for folder in store.folders() {
        let wallets = store.wallets_in_folder(&folder.id);
        let signable = wallets.iter().filter(|w| w.has_secret()).count();
        println!(
            "{:<3} {:<20} {:<14} {:<8} {}",
            if store.is_selected(&folder.id) { "*" } else { "" },
            folder.name,
            folder.short_uid,
            wallets.len(),
            signable
        );
    }
    println!();
    Ok(())
}

pub fn folder_rename(config: &Config, folder: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Folder name cannot be empty");
    }
    let mut store = open_store(config)?;
    let id = resolve_folder(&store, folder)?;
    store.rename_folder(&id, name)?;
    store.save()?;
    println!("Renamed folder {} to {}", id, name.trim());
    Ok(())
}

pub fn folder_delete(config: &Config, folder: &str, force: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let id = resolve_folder(&store, folder)?;
    let wallet_count = store.wallets_in_folder(&id).len();

    if !force && wallet_count > 0 {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete folder {} and its {} wallets? Their keys will be lost.",
                folder_name(&store, &id),
                wallet_count
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Folder deletion cancelled by user");
            return Ok(());
        }
    }

    let removed = store.delete_folder(&id)?;
    store.save()?;
    println!("Deleted folder {} ({} wallets removed)", id, removed);
    Ok(())
}

pub fn folder_select(config: &Config, folder: &str) -> Result<()> {
    let mut store = open_store(config)?;
    let id = resolve_folder(&store, folder)?;
    let selected = store.toggle_folder_selection(&id)?;
    store.save()?;
    println!(
        "Folder {} {}",
        folder_name(&store, &id),
        if selected { "selected" } else { "deselected" }
    );
    Ok(())
}

pub fn folder_select_all(config: &Config) -> Result<()> {
    let mut store = open_store(config)?;
    store.select_all();
    store.save()?;
    println!("Selected {} folders", store.selection().len());
    Ok(())
}

pub fn folder_clear(config: &Config) -> Result<()> {
    let mut store = open_store(config)?;
    store.clear_selection();
    store.save()?;
    println!("Selection cleared");
    Ok(())
}

// ---- Wallets ----

pub fn wallet_create(config: &Config, folder: &str, count: usize) -> Result<()> {
    if count == 0 {
        anyhow::bail!("Count must be at least 1");
    }
    let mut store = open_store(config)?;
    let folder_id = resolve_folder(&store, folder)?;

    for _ in 0..count {
        let (address, secret) = generate_keypair();
        let name = store.next_wallet_name();
        let wallet = store.add_wallet(&name, &address, &folder_id, &secret)?;
        println!("Created {} {}", wallet.name, wallet.address);
    }

    store.save()?;
    info!("Created {} wallets in {}", count, folder_name(&store, &folder_id));
    Ok(())
}

pub fn wallet_import(
    config: &Config,
    folder: &str,
    secret: Option<String>,
    address: Option<String>,
    name: Option<String>,
) -> Result<()> {
    let mut store = open_store(config)?;
    let folder_id = resolve_folder(&store, folder)?;

    let (address, stored_secret) = match (secret, address) {
        (Some(secret), _) => {
            let keypair = decode_secret(&secret)?;
            (keypair.pubkey().to_string(), encode_secret(&keypair))
        }
        (None, Some(address)) => {
            parse_address(&address)?;
            warn!("Importing {} without a signing credential; it cannot send", address);
            (address, String::new())
        }
        (None, None) => {
            let secret = dialoguer::Password::new()
                .with_prompt("Secret key (base58, base64 or JSON array)")
                .interact()?;
            let keypair = decode_secret(&secret)?;
            (keypair.pubkey().to_string(), encode_secret(&keypair))
        }
    };

    let name = name.unwrap_or_else(|| store.next_wallet_name());
    let wallet = store.add_wallet(&name, &address, &folder_id, &stored_secret)?;
    store.save()?;
    println!("Imported {} {} into {}", wallet.name, wallet.address, folder_name(&store, &folder_id));
    Ok(())
}

pub fn wallet_list(config: &Config, folder: Option<String>) -> Result<()> {
    let store = open_store(config)?;
    let filter = folder.map(|f| resolve_folder(&store, &f)).transpose()?;

    println!("\n=== WALLETS ===\n");
    println!("{:<14} {:<20} {:<46} {}", "NAME", "FOLDER", "ADDRESS", "SIGNABLE");
    println!("{}", "-".repeat(90));

    for wallet in store
        .wallets()
        .iter()
        .filter(|w| filter.as_ref().map_or(true, |f| &w.folder_id == f))
    {
        println!(
            "{:<14} {:<20} {:<46} {}",
            wallet.name,
            folder_name(&store, &wallet.folder_id),
            wallet.address,
            if wallet.has_secret() { "yes" } else { "no" }
        );
    }

    println!();
    Ok(())
}

pub fn wallet_move(config: &Config, wallet: &str, folder: &str) -> Result<()> {
    let mut store = open_store(config)?;
    let wallet_id = resolve_wallet(&store, wallet)?;
    let folder_id = resolve_folder(&store, folder)?;
    store.move_wallet(&wallet_id, &folder_id)?;
    store.save()?;
    println!(
        "Moved {} to {}",
        store.wallet_label(&wallet_id),
        folder_name(&store, &folder_id)
    );
    Ok(())
}

pub fn wallet_remove(config: &Config, wallet: &str, force: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let wallet_id = resolve_wallet(&store, wallet)?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove {}? Its key will be lost unless exported with 'bundler wallet export'.",
                store.wallet_label(&wallet_id)
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Wallet removal cancelled by user");
            return Ok(());
        }
    }

    let removed = store.remove_wallet(&wallet_id)?;
    store.save()?;
    println!("Removed {} {}", removed.name, removed.address);
    Ok(())
}

pub fn wallet_prune(config: &Config, force: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let count = store.wallets().iter().filter(|w| !w.has_secret()).count();
    if count == 0 {
        println!("All wallets have a signing credential.");
        return Ok(());
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {} wallets without a signing credential?", count))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Prune cancelled by user");
            return Ok(());
        }
    }

    let pruned = store.prune_wallets_without_secret();
    store.save()?;
    for wallet in &pruned {
        println!("Removed {} {}", wallet.name, wallet.address);
    }
    Ok(())
}

/// Write a wallet's keypair to a private JSON file (default `<address>.json`)
pub fn wallet_export(config: &Config, wallet: &str, out: Option<PathBuf>) -> Result<()> {
    let store = open_store(config)?;
    let wallet_id = resolve_wallet(&store, wallet)?;
    let wallet = store
        .wallet(&wallet_id)
        .ok_or_else(|| Error::WalletNotFound(wallet_id.clone()))?;
    let keypair = wallet_keypair(wallet)?;

    let path = out.unwrap_or_else(|| PathBuf::from(format!("{}.json", wallet.address)));
    write_keypair_file(&keypair, &path)
        .with_context(|| format!("Failed to export {} to {}", wallet.name, path.display()))?;

    warn!("{} contains a private key. Keep it offline.", path.display());
    println!("Exported {} {} to {}", wallet.name, wallet.address, path.display());
    Ok(())
}

pub async fn wallet_balances(config: &Config, folder: Option<String>) -> Result<()> {
    let store = open_store(config)?;
    let filter = folder.map(|f| resolve_folder(&store, &f)).transpose()?;
    let submitter = RpcSubmitter::new(&config.rpc);

    let mut statuses = Vec::new();
    for wallet in store
        .wallets()
        .iter()
        .filter(|w| filter.as_ref().map_or(true, |f| &w.folder_id == f))
    {
        let mut status = WalletStatus {
            name: wallet.name.clone(),
            folder: folder_name(&store, &wallet.folder_id),
            address: wallet.address.clone(),
            balance_lamports: None,
            warnings: Vec::new(),
        };

        match parse_address(&wallet.address) {
            Ok(pubkey) => match submitter.balance(&pubkey).await {
                Ok(lamports) => {
                    if lamports <= config.planner.fee_reserve_lamports {
                        status.warnings.push("below fee reserve".to_string());
                    }
                    status.balance_lamports = Some(lamports);
                }
                Err(e) => status.warnings.push(format!("balance fetch failed: {}", e)),
            },
            Err(e) => status.warnings.push(e.to_string()),
        }
        if !wallet.has_secret() {
            status.warnings.push("no signing credential".to_string());
        }
        statuses.push(status);
    }

    println!("\n=== WALLET BALANCES ===\n");
    println!("{:<14} {:<20} {:<18} {:>14}  {}", "NAME", "FOLDER", "ADDRESS", "SOL", "NOTES");
    println!("{}", "-".repeat(90));

    let mut total = 0u64;
    for status in &statuses {
        total = total.saturating_add(status.balance_lamports.unwrap_or(0));
        println!(
            "{:<14} {:<20} {:<18} {:>14}  {}",
            status.name,
            status.folder,
            short_address(&status.address),
            status
                .balance_lamports
                .map(|l| format!("{:.6}", lamports_to_sol(l)))
                .unwrap_or_else(|| "-".to_string()),
            status.warnings.join("; ")
        );
    }
    println!("\nTotal: {:.6} SOL across {} wallets\n", lamports_to_sol(total), statuses.len());
    Ok(())
}

// ---- Volume ----

fn effective_cap(config: &Config, store: &WalletStore) -> Option<u64> {
    store
        .session()
        .cap()
        .or_else(|| config.planner.volume_cap_lamports())
}

pub async fn volume_transfer(config: &Config, amount_sol: Option<f64>, opts: RunOptions) -> Result<()> {
    let mut store = open_store(config)?;
    let groups = selected_groups(&store)?;
    let amount = amount_or_default(amount_sol, config.planner.default_amount_lamports());

    let plan = plan_inter_folder_transfers(
        &groups,
        amount,
        effective_cap(config, &store),
        store.session().used(),
    )?;
    run_plan(config, &mut store, plan, None, opts).await
}

pub async fn volume_trade(
    config: &Config,
    side: &str,
    amount_sol: Option<f64>,
    opts: RunOptions,
) -> Result<()> {
    let side: TradeSide = side.parse()?;
    let mut store = open_store(config)?;
    let groups = selected_groups(&store)?;
    let amount = amount_or_default(amount_sol, config.planner.default_amount_lamports());

    let plan = plan_relay_trades(
        &groups,
        side,
        amount,
        effective_cap(config, &store),
        store.session().used(),
    )?;
    run_plan(config, &mut store, plan, None, opts).await
}

pub fn volume_status(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let session = VolumeAccumulator::new(effective_cap(config, &store), store.session().used());

    println!("\n=== VOLUME SESSION ===\n");
    println!("Used: {:.6} SOL", lamports_to_sol(session.used()));
    match session.cap() {
        Some(cap) => {
            println!("Cap: {:.6} SOL", lamports_to_sol(cap));
            println!("Remaining: {:.6} SOL", lamports_to_sol(session.remaining().unwrap_or(0)));
            println!("Utilization: {:.1}%", session.utilization_pct().unwrap_or(0.0));
            if store.session().cap().is_none() {
                println!("(cap from configuration)");
            }
        }
        None => println!("Cap: unlimited"),
    }
    println!();
    Ok(())
}

pub fn volume_set_cap(config: &Config, cap: &str) -> Result<()> {
    let cap = match cap.trim().to_ascii_lowercase().as_str() {
        "none" | "off" | "unlimited" => None,
        value => {
            let sol: f64 = value
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid cap '{}': {}", cap, e))?;
            if !(sol > 0.0) {
                anyhow::bail!("Cap must be positive (or 'none')");
            }
            Some(sol_to_lamports(sol))
        }
    };

    let mut store = open_store(config)?;
    store.session_mut().set_cap(cap);
    store.save()?;
    match cap {
        Some(lamports) => println!("Volume cap set to {:.6} SOL", lamports_to_sol(lamports)),
        None => println!("Volume cap removed"),
    }
    Ok(())
}

pub fn volume_reset(config: &Config) -> Result<()> {
    let mut store = open_store(config)?;
    let used = store.session().used();
    store.session_mut().reset();
    store.save()?;
    println!("Volume session reset ({:.6} SOL cleared)", lamports_to_sol(used));
    Ok(())
}

// ---- Payouts ----

pub async fn distribute(config: &Config, amount_sol: Option<f64>, opts: RunOptions) -> Result<()> {
    let funder = load_funder()?;
    let funder_address = funder.pubkey().to_string();

    let mut store = open_store(config)?;
    let groups = selected_groups(&store)?;
    let amount = amount_or_default(amount_sol, config.planner.default_distribution_lamports());

    let plan = plan_distribution(&funder_address, &groups, amount)?;
    run_plan(config, &mut store, plan, Some(funder), opts).await
}

pub async fn collect(config: &Config, to: &str, opts: RunOptions) -> Result<()> {
    let mut store = open_store(config)?;
    let groups = selected_groups(&store)?;
    let plan = plan_collection(&groups, to)?;
    run_plan(config, &mut store, plan, None, opts).await
}

pub async fn send(config: &Config, to: &str, amount_sol: f64, opts: RunOptions) -> Result<()> {
    let mut store = open_store(config)?;
    let groups = selected_groups(&store)?;
    let plan = plan_send_to_address(&groups, to, sol_to_lamports(amount_sol))?;
    run_plan(config, &mut store, plan, None, opts).await
}

// ---- Store backup ----

/// Write the full store (folders, wallets with secrets, history, session) to a private file
pub fn store_export(config: &Config, out: &Path) -> Result<()> {
    let store = open_store(config)?;
    let snapshot = store.snapshot();
    let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize store")?;
    write_private_file(out, json.as_bytes())
        .with_context(|| format!("Failed to write backup {}", out.display()))?;

    println!(
        "Exported {} folders, {} wallets to {}",
        snapshot.folders.len(),
        snapshot.wallets.len(),
        out.display()
    );
    Ok(())
}

/// Replace the store with a backup written by `store_export`
pub fn store_import(config: &Config, path: &Path, force: bool) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup {}", path.display()))?;
    let snapshot: StoreSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse backup {}", path.display()))?;

    let mut store = open_store(config)?;
    if !force && !(store.folders().is_empty() && store.wallets().is_empty()) {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Replace {} folders and {} wallets with the backup ({} folders, {} wallets)?",
                store.folders().len(),
                store.wallets().len(),
                snapshot.folders.len(),
                snapshot.wallets.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Store import cancelled by user");
            return Ok(());
        }
    }

    store.load(snapshot);
    store.save()?;
    println!(
        "Imported {} folders, {} wallets from {}",
        store.folders().len(),
        store.wallets().len(),
        path.display()
    );
    Ok(())
}

// ---- History & stats ----

pub fn history(config: &Config, limit: usize) -> Result<()> {
    let store = open_store(config)?;

    println!("\n=== TRANSACTION HISTORY ===\n");
    if store.transfers().is_empty() && store.trades().is_empty() {
        println!("No transaction history found.\n");
        return Ok(());
    }

    // (timestamp, kind, from, to, lamports, signature)
    let mut rows: Vec<_> = store
        .transfers()
        .iter()
        .map(|t| {
            (
                t.timestamp,
                "transfer".to_string(),
                store.wallet_label(&t.from_wallet_id),
                store.wallet_label(&t.to_wallet_id),
                t.lamports,
                t.signature.as_str(),
            )
        })
        .chain(store.trades().iter().map(|t| {
            (
                t.timestamp,
                t.side.to_string(),
                store.wallet_label(&t.initiator_wallet_id),
                store.wallet_label(&t.relay_wallet_id),
                t.lamports,
                t.signature.as_str(),
            )
        }))
        .collect();
    rows.sort_by(|a, b| b.0.cmp(&a.0));

    println!(
        "{:<20} {:<9} {:<14} {:<14} {:>12}  {}",
        "DATE", "KIND", "FROM", "TO", "SOL", "SIGNATURE"
    );
    println!("{}", "-".repeat(90));
    for (timestamp, kind, from, to, lamports, signature) in rows.into_iter().take(limit) {
        println!(
            "{:<20} {:<9} {:<14} {:<14} {:>12.6}  {}",
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            kind,
            from,
            to,
            lamports_to_sol(lamports),
            short_address(signature)
        );
    }
    println!();
    Ok(())
}

pub fn stats(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let summary = VolumeSummary::from_store(&store);

    println!("\n=== VOLUME STATS ===\n");
    println!("Total volume: {:.6} SOL", lamports_to_sol(summary.total_lamports()));
    println!("Transfer volume: {:.6} SOL", lamports_to_sol(summary.transfer_lamports));
    println!("Trade volume: {:.6} SOL", lamports_to_sol(summary.trade_lamports));
    println!("Transactions: {}", summary.transaction_count);

    let flows = folder_net_flow(&store);
    if !flows.is_empty() {
        println!("\n=== FOLDER NET FLOW ===\n");
        for flow in flows {
            println!(
                "{:<20} {:+.6} SOL",
                flow.name,
                flow.net_lamports as f64 / crate::wallet::LAMPORTS_PER_SOL as f64
            );
        }
    }

    for (label, series) in [
        ("TRANSFERS", volume_series(store.transfers())),
        ("TRADES", volume_series(store.trades())),
    ] {
        if series.is_empty() {
            continue;
        }
        println!("\n=== {} PER SECOND (latest 10) ===\n", label);
        for point in series.iter().rev().take(10).rev() {
            println!(
                "{}  {:.6} SOL",
                point.second.format("%Y-%m-%d %H:%M:%S"),
                lamports_to_sol(point.lamports)
            );
        }
    }

    println!();
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    if let Err(e) = config.validate() {
        error!("Configuration is invalid: {}", e);
    }
    Ok(())
}
