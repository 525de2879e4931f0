//! CLI commands for the wallet
//!
//! Implements all command handlers for the CLI interface.

use crate::config::WalletConfig;
use crate::crypto::{Address, KeyPair};
use crate::multisig::{
    EventLog, LogSink, MultisigWallet, RegistryCall, Tee, TransferExecutor,
    WalletEvent,
};
use crate::storage::{Storage, StorageConfig, WalletSnapshot};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Event sink used by the CLI: keep history and log it
pub type CliSink = Tee<EventLog, LogSink>;

/// Wallet as driven from the CLI
pub type CliWallet = MultisigWallet<TransferExecutor, CliSink>;

/// Application state
pub struct AppState {
    pub wallet: CliWallet,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the wallet from the data directory
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "No wallet found in {:?}. Create one with: vault init",
                data_dir
            )
            .into());
        }

        let snapshot = storage.load()?;
        let sink = Tee(EventLog::with_events(snapshot.events), LogSink);
        let wallet = MultisigWallet::from_state(snapshot.state, snapshot.accounts, sink);

        Ok(Self {
            wallet,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        let snapshot = WalletSnapshot::new(
            self.wallet.state().clone(),
            self.wallet.executor().clone(),
            self.wallet.sink().0.events(),
        );
        self.storage.save(&snapshot)?;
        Ok(())
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Resolve the acting identity from an address or a private key
pub fn resolve_caller(from: Option<&str>, key: Option<&str>) -> CliResult<Address> {
    match (from, key) {
        (Some(address), None) => Ok(address.parse()?),
        (None, Some(key)) => Ok(KeyPair::from_private_key_hex(key)?.address()),
        (Some(_), Some(_)) => Err("Use either --from or --key, not both".into()),
        (None, None) => Err("A caller is required: pass --from <address> or --key <hex>".into()),
    }
}

/// Parse a comma-separated address list
pub fn parse_addresses(list: &str) -> CliResult<Vec<Address>> {
    list.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Address>().map_err(Into::into))
        .collect()
}

/// Create a new wallet
pub fn cmd_init(data_dir: &Path, config: WalletConfig, force: bool) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Wallet already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let state = config.build_state()?;
    let address = state.address;
    let description = state.registry.description();
    storage.save(&WalletSnapshot::new(
        state,
        TransferExecutor::new(),
        Vec::new(),
    ))?;

    println!("✅ Wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   📍 Address: {}", address);
    println!("   🔐 Policy: {}", description);
    for owner in &config.owners {
        println!("   └─ Owner: {}", owner);
    }

    Ok(())
}

/// Generate a new owner key
pub fn cmd_keygen() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔐 New owner key generated!");
    println!("   📍 Address: {}", key_pair.address());
    println!("   🔑 Public Key: {}", key_pair.public_key_hex());
    println!("   🗝️  Private Key: {}", key_pair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: Store the private key safely. It is not saved anywhere.");

    Ok(())
}

/// Show wallet summary
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let wallet = &state.wallet;

    println!("🏦 Wallet Info");
    println!("   ├─ Address: {}", wallet.address());
    if let Some(label) = &wallet.state().label {
        println!("   ├─ Label: {}", label);
    }
    println!("   ├─ Policy: {}", wallet.registry().description());
    println!("   ├─ Balance: {}", wallet.balance());
    println!(
        "   ├─ Transactions: {} ({} pending)",
        wallet.transaction_count(),
        wallet.transaction_count_filtered(true, false)
    );
    println!(
        "   └─ Created: {}",
        wallet.state().created_at.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}

/// List owners
pub fn cmd_owners(state: &AppState) -> CliResult<()> {
    let registry = state.wallet.registry();

    println!(
        "👥 Owners ({}, max {})",
        registry.description(),
        registry.max_owners()
    );
    for owner in registry.owners() {
        println!("   └─ {}", owner);
    }

    Ok(())
}

/// Record an incoming deposit
pub fn cmd_deposit(state: &mut AppState, from: Address, amount: u128) -> CliResult<()> {
    let balance = state.wallet.deposit(from, amount);
    state.save()?;

    println!("💰 Deposit of {} from {}", amount, from);
    println!("   New balance: {}", balance);

    Ok(())
}

/// Submit a new proposal
pub fn cmd_submit(
    state: &mut AppState,
    caller: Address,
    to: Address,
    value: u128,
    data: Option<&str>,
) -> CliResult<()> {
    let data = match data {
        Some(hex_data) => hex::decode(hex_data.trim_start_matches("0x"))?,
        None => Vec::new(),
    };

    let index = state.wallet.submit(caller, to, value, data)?;
    state.save()?;

    println!("📤 Transaction {} submitted", index);
    println!("   To: {}", to);
    println!("   Value: {}", value);
    println!(
        "   Confirm with: vault confirm --tx {} --from <owner>",
        index
    );

    Ok(())
}

/// Submit a registry change
pub fn cmd_propose(state: &mut AppState, caller: Address, call: RegistryCall) -> CliResult<()> {
    let index = state.wallet.submit_registry_call(caller, &call)?;
    state.save()?;

    println!("🗳️  Registry change submitted as transaction {}", index);
    println!("   {:?}", call);
    println!(
        "   Needs {} confirmation(s) at execution time",
        state.wallet.quorum()
    );

    Ok(())
}

/// Confirm a proposal
pub fn cmd_confirm(state: &mut AppState, caller: Address, index: u64) -> CliResult<()> {
    state.wallet.confirm(caller, index)?;
    state.save()?;

    let proposal = state.wallet.transaction(index)?;
    println!(
        "✅ Transaction {} confirmed by {} ({}/{})",
        index,
        caller,
        proposal.confirmations,
        state.wallet.quorum()
    );

    Ok(())
}

/// Revoke a confirmation
pub fn cmd_revoke(state: &mut AppState, caller: Address, index: u64) -> CliResult<()> {
    state.wallet.revoke(caller, index)?;
    state.save()?;

    println!("↩️  Confirmation on transaction {} revoked by {}", index, caller);

    Ok(())
}

/// Execute a proposal
pub fn cmd_execute(state: &mut AppState, caller: Address, index: u64) -> CliResult<()> {
    state.wallet.execute(caller, index)?;
    state.save()?;

    println!("🚀 Transaction {} executed by {}", index, caller);
    println!("   Remaining balance: {}", state.wallet.balance());

    Ok(())
}

/// Show one proposal
pub fn cmd_tx_show(state: &AppState, index: u64) -> CliResult<()> {
    let wallet = &state.wallet;
    let proposal = wallet.transaction(index)?;

    println!("📄 Transaction {}", index);
    println!("   ├─ Status: {:?}", proposal.status());
    println!("   ├─ Submitter: {}", proposal.submitter);
    println!("   ├─ Destination: {}", proposal.destination);
    println!("   ├─ Value: {}", proposal.value);
    println!("   ├─ Data: 0x{}", hex::encode(&proposal.data));
    if proposal.destination == wallet.address() {
        if let Ok(call) = RegistryCall::decode(&proposal.data) {
            println!("   ├─ Registry call: {:?}", call);
        }
    }
    println!(
        "   ├─ Confirmations: {}/{} ({} from current owners)",
        proposal.confirmations,
        wallet.quorum(),
        wallet.active_confirmations(index)?
    );
    for owner in proposal.confirmers() {
        println!("   │  └─ {}", owner);
    }
    println!(
        "   └─ Submitted: {}",
        proposal.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}

/// List proposals
pub fn cmd_tx_list(state: &AppState, pending: bool, executed: bool) -> CliResult<()> {
    let wallet = &state.wallet;
    let ids = wallet.transaction_ids(0, wallet.transaction_count(), pending, executed);

    if ids.is_empty() {
        println!("📭 No transactions found");
        return Ok(());
    }

    println!("📋 Transactions:");
    for index in ids {
        let proposal = wallet.transaction(index)?;
        println!(
            "   #{} | {:?} | {} -> {} | {}/{} confirmations",
            index,
            proposal.status(),
            proposal.value,
            proposal.destination,
            proposal.confirmations,
            wallet.quorum()
        );
    }

    Ok(())
}

/// Show recorded events
pub fn cmd_events(state: &AppState, index: Option<u64>) -> CliResult<()> {
    let log = &state.wallet.sink().0;
    let events: Vec<WalletEvent> = match index {
        Some(index) => log.for_transaction(index),
        None => log.events(),
    };

    println!("📜 Events ({}):", events.len());
    for event in &events {
        println!("   └─ {}", serde_json::to_string(event)?);
    }

    Ok(())
}

/// Show credited accounts
pub fn cmd_accounts(state: &AppState) -> CliResult<()> {
    let accounts = state.wallet.executor().accounts();

    if accounts.is_empty() {
        println!("📭 No payouts yet");
        return Ok(());
    }

    println!("🏧 Payouts:");
    for (address, amount) in accounts {
        println!("   └─ {} = {}", address, amount);
    }

    Ok(())
}

/// Export wallet snapshot to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    let snapshot = WalletSnapshot::new(
        state.wallet.state().clone(),
        state.wallet.executor().clone(),
        state.wallet.sink().0.events(),
    );
    crate::storage::save_to_file(&snapshot, path)?;
    println!("📦 Wallet exported to {:?}", path);
    Ok(())
}

/// List saved backups
pub fn cmd_backups(state: &AppState) -> CliResult<()> {
    let backups = state.storage.list_backups();

    if backups.is_empty() {
        println!("📭 No backups in {:?}", state.storage.data_dir());
        return Ok(());
    }

    println!("🗄️  Backups in {:?} (0 is newest):", state.storage.data_dir());
    for index in backups {
        let snapshot = state.storage.restore_backup(index)?;
        println!(
            "   └─ #{} | saved {} | {} transactions | balance {}",
            index,
            snapshot.saved_at.format("%Y-%m-%d %H:%M:%S"),
            snapshot.state.proposals.len(),
            snapshot.state.balance
        );
    }

    Ok(())
}

/// Roll the wallet back to a saved backup
pub fn cmd_restore(state: &mut AppState, backup: usize) -> CliResult<()> {
    let snapshot = state.storage.restore_backup(backup)?;

    let sink = Tee(EventLog::with_events(snapshot.events), LogSink);
    state.wallet = MultisigWallet::from_state(snapshot.state, snapshot.accounts, sink);
    state.save()?;

    println!("⏪ Wallet restored from backup #{}", backup);
    println!(
        "   {} transactions, balance {}",
        state.wallet.transaction_count(),
        state.wallet.balance()
    );

    Ok(())
}

/// Import wallet snapshot from file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    let snapshot = crate::storage::load_from_file(path)?;

    let sink = Tee(EventLog::with_events(snapshot.events), LogSink);
    state.wallet = MultisigWallet::from_state(snapshot.state, snapshot.accounts, sink);
    state.save()?;

    println!("📥 Wallet imported from {:?}", path);
    println!("   Address: {}", state.wallet.address());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners() -> Vec<Address> {
        ["a", "b", "c"]
            .iter()
            .map(|s| Address::from_seed(s.as_bytes()))
            .collect()
    }

    #[test]
    fn test_resolve_caller() {
        let owner = owners()[0];
        assert_eq!(resolve_caller(Some(&owner.to_hex()), None).unwrap(), owner);

        let key = KeyPair::generate();
        assert_eq!(
            resolve_caller(None, Some(&key.private_key_hex())).unwrap(),
            key.address()
        );

        assert!(resolve_caller(None, None).is_err());
        assert!(resolve_caller(Some(&owner.to_hex()), Some("00")).is_err());
    }

    #[test]
    fn test_parse_addresses() {
        let list: Vec<String> = owners().iter().map(|o| o.to_hex()).collect();
        let parsed = parse_addresses(&list.join(", ")).unwrap();
        assert_eq!(parsed, owners());
        assert!(parse_addresses("0x12,nope").is_err());
    }

    #[test]
    fn test_init_then_operate() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        let [a, b, c]: [Address; 3] = owners().try_into().unwrap();

        cmd_init(&data_dir, WalletConfig::new(owners(), 2), false).unwrap();

        let mut state = AppState::new(data_dir.clone()).unwrap();
        cmd_deposit(&mut state, a, 100).unwrap();
        cmd_submit(&mut state, a, c, 30, Some("0xbeef")).unwrap();
        cmd_confirm(&mut state, a, 0).unwrap();
        cmd_confirm(&mut state, b, 0).unwrap();

        // Reload from disk between steps
        let mut state = AppState::new(data_dir.clone()).unwrap();
        assert_eq!(state.wallet.transaction(0).unwrap().confirmations, 2);
        cmd_execute(&mut state, c, 0).unwrap();

        let state = AppState::new(data_dir).unwrap();
        assert_eq!(state.wallet.balance(), 70);
        assert_eq!(state.wallet.executor().balance_of(&c), 30);
        assert_eq!(state.wallet.transaction(0).unwrap().data, vec![0xbe, 0xef]);

        let names: Vec<&str> = state
            .wallet
            .sink()
            .0
            .events()
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(
            names,
            vec!["deposit", "submission", "confirmation", "confirmation", "execution"]
        );
    }

    #[test]
    fn test_errors_do_not_persist_changes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        cmd_init(&data_dir, WalletConfig::new(owners(), 2), false).unwrap();

        let mut state = AppState::new(data_dir.clone()).unwrap();
        let stranger = Address::from_seed(b"stranger");
        assert!(cmd_submit(&mut state, stranger, stranger, 1, None).is_err());
        assert!(cmd_execute(&mut state, owners()[0], 0).is_err());

        let state = AppState::new(data_dir).unwrap();
        assert_eq!(state.wallet.transaction_count(), 0);
    }

    #[test]
    fn test_missing_wallet() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(AppState::new(temp_dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_export_import_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source_dir = temp_dir.path().join("source");
        let target_dir = temp_dir.path().join("target");
        let export_path = temp_dir.path().join("export.json");
        let [a, b, c]: [Address; 3] = owners().try_into().unwrap();

        cmd_init(&source_dir, WalletConfig::new(owners(), 2), false).unwrap();
        let mut source = AppState::new(source_dir).unwrap();
        cmd_deposit(&mut source, a, 40).unwrap();
        cmd_submit(&mut source, a, c, 15, None).unwrap();
        cmd_confirm(&mut source, a, 0).unwrap();
        cmd_export(&source, &export_path).unwrap();

        // A different wallet is replaced wholesale by the import
        let others = vec![Address::from_seed(b"x"), Address::from_seed(b"y")];
        cmd_init(&target_dir, WalletConfig::new(others, 1), false).unwrap();
        let mut target = AppState::new(target_dir.clone()).unwrap();
        cmd_import(&mut target, &export_path).unwrap();

        let mut target = AppState::new(target_dir).unwrap();
        assert_eq!(target.wallet.address(), source.wallet.address());
        assert_eq!(target.wallet.balance(), 40);
        assert!(target.wallet.is_confirmed(0, &a));
        assert_eq!(target.wallet.sink().0.len(), source.wallet.sink().0.len());

        cmd_confirm(&mut target, b, 0).unwrap();
        cmd_execute(&mut target, b, 0).unwrap();
        assert_eq!(target.wallet.executor().balance_of(&c), 15);
    }

    #[test]
    fn test_import_rejects_tampered_snapshot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().join("wallet");
        let export_path = temp_dir.path().join("export.json");
        let a = owners()[0];

        cmd_init(&data_dir, WalletConfig::new(owners(), 2), false).unwrap();
        let mut state = AppState::new(data_dir.clone()).unwrap();
        cmd_submit(&mut state, a, a, 0, None).unwrap();
        cmd_export(&state, &export_path).unwrap();

        // Claim quorum without any confirmer behind it
        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
        json["state"]["proposals"][0]["confirmations"] = serde_json::json!(2);
        std::fs::write(&export_path, json.to_string()).unwrap();

        assert!(cmd_import(&mut state, &export_path).is_err());
        let state = AppState::new(data_dir).unwrap();
        assert_eq!(state.wallet.transaction(0).unwrap().confirmations, 0);
    }

    #[test]
    fn test_backups_and_restore() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        let a = owners()[0];

        cmd_init(&data_dir, WalletConfig::new(owners(), 2), false).unwrap();
        let mut state = AppState::new(data_dir.clone()).unwrap();
        cmd_deposit(&mut state, a, 10).unwrap();
        cmd_deposit(&mut state, a, 5).unwrap();

        // Backup 0 holds the state before the last deposit
        assert_eq!(state.storage.list_backups(), vec![0, 1]);
        cmd_backups(&state).unwrap();
        cmd_restore(&mut state, 0).unwrap();
        assert_eq!(state.wallet.balance(), 10);

        let state = AppState::new(data_dir.clone()).unwrap();
        assert_eq!(state.wallet.balance(), 10);
        assert_eq!(state.wallet.sink().0.len(), 1);

        let mut state = AppState::new(data_dir).unwrap();
        assert!(cmd_restore(&mut state, 4).is_err());
    }
}
