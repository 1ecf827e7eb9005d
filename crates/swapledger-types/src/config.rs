//! Configuration for a SwapLedger node.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Asset, LedgerError, Result, constants};

/// Ledger-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Assets accepted by the validator.
    pub assets: Vec<Asset>,
    /// Lock duration used when a caller does not pick one.
    #[serde(default = "default_lock_duration_secs")]
    pub default_lock_duration_secs: u64,
    /// Number of notarised transaction ids the notary remembers.
    #[serde(default = "default_notary_history_size")]
    pub notary_history_size: usize,
}

fn default_lock_duration_secs() -> u64 {
    constants::DEFAULT_LOCK_DURATION_SECS
}

fn default_notary_history_size() -> usize {
    constants::DEFAULT_NOTARY_HISTORY
}

impl LedgerConfig {
    /// Parse a JSON configuration document.
    ///
    /// # Errors
    /// `Serialization` if the JSON is malformed, `Configuration` if the
    /// document parses but is not usable.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    /// Returns [`LedgerError::Configuration`] for an empty or duplicated
    /// asset list, an empty asset code, or a zero notary history.
    pub fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            return Err(LedgerError::Configuration(
                "at least one asset must be configured".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for asset in &self.assets {
            if asset.code.is_empty() {
                return Err(LedgerError::Configuration(
                    "asset code must not be empty".to_string(),
                ));
            }
            if !seen.insert(asset.code.as_str()) {
                return Err(LedgerError::Configuration(format!(
                    "asset {} configured more than once",
                    asset.code
                )));
            }
        }
        if self.notary_history_size == 0 {
            return Err(LedgerError::Configuration(
                "notary_history_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            assets: vec![Asset::btc(), Asset::dash()],
            default_lock_duration_secs: constants::DEFAULT_LOCK_DURATION_SECS,
            notary_history_size: constants::DEFAULT_NOTARY_HISTORY,
        }
    }
}
