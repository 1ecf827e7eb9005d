//! Ledger states: plain value (UTXO) and escrow (HTLC).
//!
//! States are immutable values. Nothing on the ledger is edited in place:
//! a transaction consumes states and produces new ones, and the transformer
//! methods below return fresh copies.
//!
//! ```text
//!   Mint ──▶ ValueState ──Transfer──▶ ValueState ──Burn──▶ ∅
//!                │
//!              Lock
//!                ▼
//!           EscrowState ──Unlock──▶ EscrowState(secret) ──Convert──▶ ValueState
//!                └──────────────── Convert (after locktime) ──────▶ ValueState
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Asset, EscrowState, LedgerError, PartyId, Result, constants};

/// An unspent, owned quantity of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueState {
    /// Current owner; the only party who may spend it (with co-signers).
    pub owner: PartyId,
    pub asset: Asset,
    /// Amount in minor units.
    pub amount: u64,
    /// Parties entitled to see this state. Always contains `owner`.
    pub participants: BTreeSet<PartyId>,
}

impl ValueState {
    /// Create a value state.
    ///
    /// # Errors
    /// [`LedgerError::InvalidState`] if `owner` is not a participant or
    /// there are fewer than two participants.
    pub fn new(
        owner: PartyId,
        asset: Asset,
        amount: u64,
        participants: BTreeSet<PartyId>,
    ) -> Result<Self> {
        let state = Self {
            owner,
            asset,
            amount,
            participants,
        };
        state.check_invariants()?;
        Ok(state)
    }

    /// Value state visible to its owner and one counterparty.
    ///
    /// # Errors
    /// Fails if `counterparty == owner`.
    pub fn with_counterparty(
        owner: PartyId,
        asset: Asset,
        amount: u64,
        counterparty: PartyId,
    ) -> Result<Self> {
        Self::new(owner, asset, amount, BTreeSet::from([owner, counterparty]))
    }

    /// Copy with additional participants.
    #[must_use]
    pub fn with_participants(&self, extra: impl IntoIterator<Item = PartyId>) -> Self {
        let mut next = self.clone();
        next.participants.extend(extra);
        next
    }

    /// Re-check the construction invariants, e.g. after deserialization.
    ///
    /// # Errors
    /// Same conditions as [`ValueState::new`].
    pub fn check_invariants(&self) -> Result<()> {
        if !self.participants.contains(&self.owner) {
            return Err(LedgerError::InvalidState {
                reason: format!("owner {} is not in participants", self.owner),
            });
        }
        if self.participants.len() < constants::MIN_PARTICIPANTS {
            return Err(LedgerError::InvalidState {
                reason: format!(
                    "too few participants: given {}, minimum is {}",
                    self.participants.len(),
                    constants::MIN_PARTICIPANTS
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ValueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "owner={} value={} {}",
            self.owner.short(),
            self.asset.format_amount(self.amount),
            self.asset
        )
    }
}

/// Any state a transaction may consume or produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerState {
    Value(ValueState),
    Escrow(EscrowState),
}

impl LedgerState {
    #[must_use]
    pub fn asset(&self) -> &Asset {
        match self {
            Self::Value(v) => &v.asset,
            Self::Escrow(e) => &e.asset,
        }
    }

    #[must_use]
    pub fn amount(&self) -> u64 {
        match self {
            Self::Value(v) => v.amount,
            Self::Escrow(e) => e.amount,
        }
    }

    #[must_use]
    pub fn participants(&self) -> &BTreeSet<PartyId> {
        match self {
            Self::Value(v) => &v.participants,
            Self::Escrow(e) => &e.participants,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&ValueState> {
        match self {
            Self::Value(v) => Some(v),
            Self::Escrow(_) => None,
        }
    }

    #[must_use]
    pub fn as_escrow(&self) -> Option<&EscrowState> {
        match self {
            Self::Escrow(e) => Some(e),
            Self::Value(_) => None,
        }
    }

    /// Short type name for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Value(_) => "ValueState",
            Self::Escrow(_) => "EscrowState",
        }
    }
}

impl From<ValueState> for LedgerState {
    fn from(state: ValueState) -> Self {
        Self::Value(state)
    }
}

impl From<EscrowState> for LedgerState {
    fn from(state: EscrowState) -> Self {
        Self::Escrow(state)
    }
}

impl fmt::Display for LedgerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => fmt::Display::fmt(v, f),
            Self::Escrow(e) => fmt::Display::fmt(e, f),
        }
    }
}
