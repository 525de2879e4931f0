//! Quorum Vault CLI Application
//!
//! A command-line interface for operating a multi-owner wallet.

use clap::{Parser, Subcommand};
use quorum_vault::cli::{self, AppState};
use quorum_vault::config::WalletConfig;
use quorum_vault::crypto::Address;
use quorum_vault::multisig::{RegistryCall, DEFAULT_MAX_OWNERS};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vault")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A quorum-gated multi-owner wallet", long_about = None)]
struct Cli {
    /// Data directory for wallet storage
    #[arg(short, long, default_value = ".vault_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Who is acting
#[derive(clap::Args)]
struct Caller {
    /// Caller address
    #[arg(long)]
    from: Option<String>,

    /// Caller private key (hex); the address is derived from it
    #[arg(long)]
    key: Option<String>,
}

impl Caller {
    fn resolve(&self) -> cli::CliResult<Address> {
        cli::resolve_caller(self.from.as_deref(), self.key.as_deref())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet
    Init {
        /// Owner addresses (comma-separated)
        #[arg(short, long, conflicts_with = "config")]
        owners: Option<String>,

        /// Confirmations required to execute
        #[arg(short, long, requires = "owners")]
        quorum: Option<u32>,

        /// Maximum number of owners
        #[arg(long, default_value_t = DEFAULT_MAX_OWNERS)]
        max_owners: usize,

        /// Optional label for the wallet
        #[arg(short, long)]
        label: Option<String>,

        /// Read the policy from a JSON config file instead
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overwrite an existing wallet
        #[arg(long)]
        force: bool,
    },

    /// Generate an owner key pair
    Keygen,

    /// Show wallet summary
    Info,

    /// List owners and quorum
    Owners,

    /// Record value received by the wallet
    Deposit {
        /// Sender address
        #[arg(short, long)]
        from: String,

        /// Amount received
        #[arg(short, long)]
        amount: u128,
    },

    /// Submit a new transaction proposal
    Submit {
        #[command(flatten)]
        caller: Caller,

        /// Destination address
        #[arg(short, long)]
        to: String,

        /// Value to send
        #[arg(short, long, default_value = "0")]
        value: u128,

        /// Call payload (hex)
        #[arg(long)]
        data: Option<String>,
    },

    /// Confirm a proposal
    Confirm {
        #[command(flatten)]
        caller: Caller,

        /// Transaction index
        #[arg(short, long)]
        tx: u64,
    },

    /// Revoke a confirmation
    Revoke {
        #[command(flatten)]
        caller: Caller,

        /// Transaction index
        #[arg(short, long)]
        tx: u64,
    },

    /// Execute a confirmed proposal
    Execute {
        #[command(flatten)]
        caller: Caller,

        /// Transaction index
        #[arg(short, long)]
        tx: u64,
    },

    /// Inspect proposals
    Tx {
        #[command(subcommand)]
        action: TxCommands,
    },

    /// Propose an owner or quorum change
    Propose {
        #[command(flatten)]
        caller: Caller,

        #[command(subcommand)]
        change: ProposeCommands,
    },

    /// Show recorded events
    Events {
        /// Only events for this transaction
        #[arg(short, long)]
        tx: Option<u64>,
    },

    /// Show accounts credited by executed transfers
    Accounts,

    /// Export wallet to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import wallet from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List saved backups
    Backups,

    /// Roll the wallet back to a saved backup
    Restore {
        /// Backup number (0 is newest)
        #[arg(short, long)]
        backup: usize,
    },
}

#[derive(Subcommand)]
enum TxCommands {
    /// Show one transaction
    Show {
        /// Transaction index
        #[arg(short, long)]
        tx: u64,
    },

    /// List transactions
    List {
        /// Only pending transactions
        #[arg(long, conflicts_with = "executed")]
        pending: bool,

        /// Only executed transactions
        #[arg(long)]
        executed: bool,
    },
}

#[derive(Subcommand)]
enum ProposeCommands {
    /// Add an owner
    AddOwner {
        #[arg(short, long)]
        owner: String,
    },

    /// Remove an owner
    RemoveOwner {
        #[arg(short, long)]
        owner: String,
    },

    /// Replace one owner with another
    ReplaceOwner {
        #[arg(long)]
        old: String,

        #[arg(long)]
        new: String,
    },

    /// Change the quorum
    ChangeQuorum {
        #[arg(short, long)]
        quorum: u32,
    },
}

impl ProposeCommands {
    fn into_call(self) -> cli::CliResult<RegistryCall> {
        Ok(match self {
            ProposeCommands::AddOwner { owner } => RegistryCall::AddOwner {
                owner: owner.parse()?,
            },
            ProposeCommands::RemoveOwner { owner } => RegistryCall::RemoveOwner {
                owner: owner.parse()?,
            },
            ProposeCommands::ReplaceOwner { old, new } => RegistryCall::ReplaceOwner {
                old: old.parse()?,
                new: new.parse()?,
            },
            ProposeCommands::ChangeQuorum { quorum } => RegistryCall::ChangeQuorum { quorum },
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Cli { data_dir, command } = Cli::parse();
    let open = || AppState::new(data_dir.clone());

    match command {
        Commands::Init {
            owners,
            quorum,
            max_owners,
            label,
            config,
            force,
        } => {
            let config = match (config, owners) {
                (Some(path), _) => WalletConfig::load(&path)?,
                (None, Some(owners)) => {
                    let owners = cli::parse_addresses(&owners)?;
                    let quorum = quorum.unwrap_or(owners.len() as u32);
                    let mut config =
                        WalletConfig::new(owners, quorum).with_max_owners(max_owners);
                    config.label = label;
                    config
                }
                (None, None) => return Err("Pass --owners or --config".into()),
            };
            cli::cmd_init(&data_dir, config, force)?;
        }

        Commands::Keygen => cli::cmd_keygen()?,

        Commands::Info => cli::cmd_info(&open()?)?,

        Commands::Owners => cli::cmd_owners(&open()?)?,

        Commands::Deposit { from, amount } => {
            cli::cmd_deposit(&mut open()?, from.parse()?, amount)?;
        }

        Commands::Submit {
            caller,
            to,
            value,
            data,
        } => {
            cli::cmd_submit(&mut open()?, caller.resolve()?, to.parse()?, value, data.as_deref())?;
        }

        Commands::Confirm { caller, tx } => {
            cli::cmd_confirm(&mut open()?, caller.resolve()?, tx)?;
        }

        Commands::Revoke { caller, tx } => {
            cli::cmd_revoke(&mut open()?, caller.resolve()?, tx)?;
        }

        Commands::Execute { caller, tx } => {
            cli::cmd_execute(&mut open()?, caller.resolve()?, tx)?;
        }

        Commands::Tx { action } => match action {
            TxCommands::Show { tx } => cli::cmd_tx_show(&open()?, tx)?,
            TxCommands::List { pending, executed } => {
                // No filter means everything
                let (pending, executed) = if !pending && !executed {
                    (true, true)
                } else {
                    (pending, executed)
                };
                cli::cmd_tx_list(&open()?, pending, executed)?;
            }
        },

        Commands::Propose { caller, change } => {
            let caller = caller.resolve()?;
            cli::cmd_propose(&mut open()?, caller, change.into_call()?)?;
        }

        Commands::Events { tx } => cli::cmd_events(&open()?, tx)?,

        Commands::Accounts => cli::cmd_accounts(&open()?)?,

        Commands::Export { output } => cli::cmd_export(&open()?, &output)?,

        Commands::Import { input } => cli::cmd_import(&mut open()?, &input)?,

        Commands::Backups => cli::cmd_backups(&open()?)?,

        Commands::Restore { backup } => cli::cmd_restore(&mut open()?, backup)?,
    }

    Ok(())
}
