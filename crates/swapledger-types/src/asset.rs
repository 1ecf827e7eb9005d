//! Assets and the asset registry.
//!
//! Amounts are always carried in minor units (`u64`). An [`Asset`] knows its
//! decimal scale so amounts can be rendered in major units for humans.
//!
//! The [`AssetRegistry`] is the allowlist the validator checks every state
//! against. It is an explicit value handed to the validator, never a global,
//! so tests can run against a minimal registry.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LedgerConfig, constants};

/// A fungible asset: a short code plus its decimal precision.
///
/// Two assets are equal only if both the code and the scale match, so a
/// state claiming `BTC` with 2 decimals is not the registry's `BTC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Asset {
    pub code: String,
    pub decimals: u32,
}

impl Asset {
    #[must_use]
    pub fn new(code: impl Into<String>, decimals: u32) -> Self {
        Self {
            code: code.into(),
            decimals,
        }
    }

    /// Bitcoin, 8 decimals.
    #[must_use]
    pub fn btc() -> Self {
        Self::new("BTC", constants::DEFAULT_ASSET_DECIMALS)
    }

    /// Dash, 8 decimals.
    #[must_use]
    pub fn dash() -> Self {
        Self::new("DASH", constants::DEFAULT_ASSET_DECIMALS)
    }

    /// Render `amount` minor units in major units, e.g. `81000000` BTC as
    /// `0.81000000`.
    ///
    /// Falls back to the raw minor-unit count if the scale is beyond what
    /// `Decimal` can represent.
    #[must_use]
    pub fn format_amount(&self, amount: u64) -> String {
        match Decimal::try_from_i128_with_scale(i128::from(amount), self.decimals) {
            Ok(major) => major.to_string(),
            Err(_) => amount.to_string(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Fixed mapping from asset code to decimal precision.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: BTreeMap<String, u32>,
}

impl AssetRegistry {
    /// Build a registry from a list of assets. A later entry with the same
    /// code replaces an earlier one.
    #[must_use]
    pub fn new(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: assets
                .into_iter()
                .map(|asset| (asset.code, asset.decimals))
                .collect(),
        }
    }

    /// Registry with exactly the assets named in `config`.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.assets.iter().cloned())
    }

    /// Is this exact asset (code and scale) a registry member?
    #[must_use]
    pub fn is_supported(&self, asset: &Asset) -> bool {
        self.assets.get(&asset.code) == Some(&asset.decimals)
    }

    /// Decimal precision registered for `code`.
    #[must_use]
    pub fn decimals(&self, code: &str) -> Option<u32> {
        self.assets.get(code).copied()
    }

    /// The registered asset for `code`.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<Asset> {
        self.decimals(code).map(|decimals| Asset::new(code, decimals))
    }

    /// All registered assets, ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = Asset> + '_ {
        self.assets
            .iter()
            .map(|(code, decimals)| Asset::new(code.clone(), *decimals))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Default for AssetRegistry {
    /// `{BTC: 8, DASH: 8}`.
    fn default() -> Self {
        Self::new([Asset::btc(), Asset::dash()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_btc_and_dash() {
        let registry = AssetRegistry::default();
        assert_eq!(registry.len(), 2);
        assert!(registry.is_supported(&Asset::btc()));
        assert!(registry.is_supported(&Asset::dash()));
        assert_eq!(registry.decimals("BTC"), Some(8));
    }

    #[test]
    fn unknown_code_is_unsupported() {
        let registry = AssetRegistry::default();
        assert!(!registry.is_supported(&Asset::new("DOGE", 8)));
        assert_eq!(registry.get("DOGE"), None);
    }

    #[test]
    fn scale_mismatch_is_unsupported() {
        let registry = AssetRegistry::default();
        assert!(!registry.is_supported(&Asset::new("BTC", 2)));
    }

    #[test]
    fn minimal_registry() {
        let registry = AssetRegistry::new([Asset::dash()]);
        assert!(registry.is_supported(&Asset::dash()));
        assert!(!registry.is_supported(&Asset::btc()));
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![Asset::dash()]);
    }

    #[test]
    fn empty_registry_supports_nothing() {
        let registry = AssetRegistry::new([]);
        assert!(registry.is_empty());
        assert!(!registry.is_supported(&Asset::btc()));
    }

    #[test]
    fn format_amount_in_major_units() {
        assert_eq!(Asset::btc().format_amount(81_000_000), "0.81000000");
        assert_eq!(Asset::dash().format_amount(2_108_400_000), "21.08400000");
        assert_eq!(Asset::new("UNIT", 0).format_amount(42), "42");
    }

    #[test]
    fn format_amount_with_oversized_scale_falls_back() {
        assert_eq!(Asset::new("WEIRD", 40).format_amount(7), "7");
    }

    #[test]
    fn asset_display_is_code() {
        assert_eq!(format!("{}", Asset::btc()), "BTC");
    }

    #[test]
    fn registry_serde_roundtrip() {
        let registry = AssetRegistry::default();
        let json = serde_json::to_string(&registry).unwrap();
        let back: AssetRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(registry, back);
    }
}
