//! Supply conservation invariant checker.
//!
//! Invariant enforced by [`SupplyConservation::verify`]:
//! ```text
//! ∀ asset: Σ(unconsumed states, escrows included) == Σ(minted) - Σ(burned)
//! ```
//!
//! Only Mint and Burn change supply. Transfer, Lock, Unlock and Convert move
//! value around without changing the total, so a mismatch means the store
//! and the notary disagree about what was committed.

use std::collections::{BTreeSet, HashMap};

use swapledger_types::{LedgerError, Result};

/// Per-asset minted and burned totals since genesis, keyed by asset code.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    minted: HashMap<String, u128>,
    burned: HashMap<String, u128>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, asset: &str, amount: u64) {
        *self.minted.entry(asset.to_string()).or_insert(0) += u128::from(amount);
    }

    pub fn record_burn(&mut self, asset: &str, amount: u64) {
        *self.burned.entry(asset.to_string()).or_insert(0) += u128::from(amount);
    }

    #[must_use]
    pub fn total_minted(&self, asset: &str) -> u128 {
        self.minted.get(asset).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_burned(&self, asset: &str) -> u128 {
        self.burned.get(asset).copied().unwrap_or(0)
    }

    /// Minted minus burned; `None` if more was burned than minted.
    #[must_use]
    pub fn expected_supply(&self, asset: &str) -> Option<u128> {
        self.total_minted(asset).checked_sub(self.total_burned(asset))
    }

    /// Check `actual_supply` against minted minus burned.
    ///
    /// # Errors
    /// [`LedgerError::SupplyInvariantViolation`] if they differ, or if the
    /// burned total exceeds the minted total.
    pub fn verify(&self, asset: &str, actual_supply: u128) -> Result<()> {
        let minted = self.total_minted(asset);
        let burned = self.total_burned(asset);
        match self.expected_supply(asset) {
            Some(expected) if expected == actual_supply => Ok(()),
            Some(expected) => Err(LedgerError::SupplyInvariantViolation {
                reason: format!(
                    "Asset {asset}: actual supply {actual_supply} != expected {expected} \
                     (minted={minted}, burned={burned})"
                ),
            }),
            None => Err(LedgerError::SupplyInvariantViolation {
                reason: format!("Asset {asset}: burned {burned} exceeds minted {minted}"),
            }),
        }
    }

    /// Asset codes with any recorded mint or burn, sorted.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<String> {
        let assets: BTreeSet<&String> = self.minted.keys().chain(self.burned.keys()).collect();
        assets.into_iter().cloned().collect()
    }
}
