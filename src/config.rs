//! Wallet configuration
//!
//! Initial owner set and quorum, stored as JSON.

use crate::crypto::Address;
use crate::multisig::{OwnerRegistry, WalletError, WalletState, DEFAULT_MAX_OWNERS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid wallet policy: {0}")]
    InvalidPolicy(#[from] WalletError),
}

fn default_max_owners() -> usize {
    DEFAULT_MAX_OWNERS
}

/// Initial policy for a new wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WalletConfig {
    /// Initial owners
    pub owners: Vec<Address>,
    /// Confirmations required to execute
    pub quorum: u32,
    /// Upper bound on the owner count
    #[serde(default = "default_max_owners")]
    pub max_owners: usize,
    /// Optional human-readable label
    #[serde(default)]
    pub label: Option<String>,
}

impl WalletConfig {
    /// Create a configuration with the default owner limit
    pub fn new(owners: Vec<Address>, quorum: u32) -> Self {
        Self {
            owners,
            quorum,
            max_owners: DEFAULT_MAX_OWNERS,
            label: None,
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the owner limit
    pub fn with_max_owners(mut self, max_owners: usize) -> Self {
        self.max_owners = max_owners;
        self
    }

    /// Check the registry invariants without building a wallet
    pub fn validate(&self) -> Result<(), ConfigError> {
        OwnerRegistry::new(
            Address::ZERO,
            self.owners.clone(),
            self.quorum,
            self.max_owners,
        )?;
        Ok(())
    }

    /// Build the initial wallet state
    pub fn build_state(&self) -> Result<WalletState, ConfigError> {
        Ok(WalletState::new(
            self.owners.clone(),
            self.quorum,
            self.max_owners,
            self.label.clone(),
        )?)
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.quorum, self.owners.len())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: WalletConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let file = fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
