//! # EscrowState: the hash time-locked contract
//!
//! An escrow holds value on behalf of a `receiver` until either the receiver
//! reveals a preimage of `secret_hash` before `locktime`, or `locktime`
//! passes and the `sender` takes the value back.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  Unlock (now < locktime)  ┌──────────┐  Convert (now < locktime)  ┌───────────────────────┐
//!   │ LOCKED ├──────────────────────────▶│ UNLOCKED ├───────────────────────────▶│ CONVERTED_TO_RECEIVER │
//!   └───┬────┘                           └────┬─────┘                            └───────────────────────┘
//!       │ Convert (now ≥ locktime)            │ Convert (now ≥ locktime)
//!       ▼                                     ▼
//!   ┌───────────────────────────────────────────────┐
//!   │              CONVERTED_TO_SENDER              │
//!   └───────────────────────────────────────────────┘
//! ```
//!
//! Both `CONVERTED_*` states are terminal: the escrow is consumed and a
//! plain value state replaces it.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Asset, LedgerError, LinearId, PartyId, Result, constants, hashlock};

/// Lifecycle position of an escrow.
///
/// Transitions are **monotonic** and terminal states absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowPhase {
    /// Value is locked; no secret revealed yet.
    Locked,
    /// A valid secret was attached before expiry.
    Unlocked,
    /// Receiver claimed the value with the secret.
    ConvertedToReceiver,
    /// Sender took the value back after expiry.
    ConvertedToSender,
}

impl EscrowPhase {
    /// Can an escrow in this phase move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Locked, Self::Unlocked | Self::ConvertedToSender)
                | (Self::Unlocked, Self::ConvertedToReceiver | Self::ConvertedToSender)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ConvertedToReceiver | Self::ConvertedToSender)
    }
}

impl fmt::Display for EscrowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "LOCKED"),
            Self::Unlocked => write!(f, "UNLOCKED"),
            Self::ConvertedToReceiver => write!(f, "CONVERTED_TO_RECEIVER"),
            Self::ConvertedToSender => write!(f, "CONVERTED_TO_SENDER"),
        }
    }
}

/// Value held under a hash lock and a time lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowState {
    /// Party that locked the value; reclaims it after `locktime`.
    pub sender: PartyId,
    /// Party that may claim the value by revealing the secret.
    pub receiver: PartyId,
    pub asset: Asset,
    /// Amount in minor units.
    pub amount: u64,
    /// Revealed preimage, attached by Unlock.
    pub secret: Option<String>,
    /// SHA-256 of the secret as 64 lowercase hex characters.
    pub secret_hash: String,
    /// Absolute expiry instant.
    pub locktime: DateTime<Utc>,
    /// Survives Unlock so the escrow can be tracked through its lifecycle.
    pub linear_id: LinearId,
    pub participants: BTreeSet<PartyId>,
}

impl EscrowState {
    /// Create a freshly locked escrow with a new linear id and
    /// participants `{sender, receiver}`.
    ///
    /// # Errors
    /// [`LedgerError::InvalidState`] if `sender == receiver`, `secret_hash`
    /// is malformed, or a supplied `secret` does not hash to `secret_hash`.
    pub fn new(
        sender: PartyId,
        receiver: PartyId,
        asset: Asset,
        amount: u64,
        secret: Option<String>,
        secret_hash: impl Into<String>,
        locktime: DateTime<Utc>,
    ) -> Result<Self> {
        let state = Self {
            sender,
            receiver,
            asset,
            amount,
            secret,
            secret_hash: secret_hash.into(),
            locktime,
            linear_id: LinearId::new(),
            participants: BTreeSet::from([sender, receiver]),
        };
        state.check_invariants()?;
        Ok(state)
    }

    /// Re-check the construction invariants, e.g. after deserialization.
    ///
    /// # Errors
    /// Same conditions as [`EscrowState::new`], plus fewer than two
    /// participants.
    pub fn check_invariants(&self) -> Result<()> {
        if self.sender == self.receiver {
            return Err(LedgerError::InvalidState {
                reason: "sender and receiver must differ".to_string(),
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
        if !hashlock::is_well_formed(&self.secret_hash) {
            return Err(LedgerError::InvalidState {
                reason: format!("malformed secret hash {:?}", self.secret_hash),
            });
        }
        if let Some(secret) = &self.secret {
            if !hashlock::verify(secret, &self.secret_hash) {
                return Err(LedgerError::InvalidState {
                    reason: "secret does not match secret hash".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Copy with `secret` revealed. Everything else, `linear_id` included,
    /// is carried over.
    ///
    /// # Errors
    /// [`LedgerError::InvalidState`] if `secret` is not a preimage of
    /// `secret_hash`.
    pub fn with_secret(&self, secret: impl Into<String>) -> Result<Self> {
        let next = Self {
            secret: Some(secret.into()),
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    /// Copy with the secret removed.
    #[must_use]
    pub fn without_secret(&self) -> Self {
        Self {
            secret: None,
            ..self.clone()
        }
    }

    /// Copy with additional participants.
    #[must_use]
    pub fn with_participants(&self, extra: impl IntoIterator<Item = PartyId>) -> Self {
        let mut next = self.clone();
        next.participants.extend(extra);
        next
    }

    /// Is a secret attached and does it open the hash lock?
    #[must_use]
    pub fn is_secret_valid(&self) -> bool {
        self.secret
            .as_deref()
            .is_some_and(|secret| hashlock::verify(secret, &self.secret_hash))
    }

    /// Has the time lock expired at `now`?
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.locktime
    }

    /// Lifecycle phase of a live (not yet converted) escrow.
    #[must_use]
    pub fn phase(&self) -> EscrowPhase {
        if self.is_secret_valid() {
            EscrowPhase::Unlocked
        } else {
            EscrowPhase::Locked
        }
    }

    /// The phase a Convert at `now` would move this escrow into.
    #[must_use]
    pub fn conversion_phase(&self, now: DateTime<Utc>) -> EscrowPhase {
        if self.is_expired(now) {
            EscrowPhase::ConvertedToSender
        } else {
            EscrowPhase::ConvertedToReceiver
        }
    }
}

impl fmt::Display for EscrowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} locked {} {} for {} until {} ({}, hash={})",
            self.sender.short(),
            self.asset.format_amount(self.amount),
            self.asset,
            self.receiver.short(),
            self.locktime.to_rfc3339(),
            self.phase(),
            self.secret_hash.get(..16).unwrap_or(&self.secret_hash),
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn alice() -> PartyId {
        PartyId::dummy(1)
    }

    fn bob() -> PartyId {
        PartyId::dummy(2)
    }

    fn locked(secret: &str) -> EscrowState {
        EscrowState::new(
            alice(),
            bob(),
            Asset::dash(),
            2_108_400_000,
            None,
            hashlock::commit(secret),
            Utc::now() + Duration::seconds(10),
        )
        .unwrap()
    }

    #[test]
    fn new_escrow_is_locked() {
        let e = locked("before_locktime");
        assert_eq!(e.phase(), EscrowPhase::Locked);
        assert_eq!(e.participants, BTreeSet::from([alice(), bob()]));
        assert!(!e.is_secret_valid());
    }

    #[test]
    fn same_sender_and_receiver_rejected() {
        let err = EscrowState::new(
            alice(),
            alice(),
            Asset::btc(),
            1,
            None,
            hashlock::commit("s"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn malformed_hash_rejected() {
        let err = EscrowState::new(
            alice(),
            bob(),
            Asset::btc(),
            1,
            None,
            "not-a-hash",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn wrong_secret_rejected_at_construction() {
        let err = EscrowState::new(
            alice(),
            bob(),
            Asset::btc(),
            1,
            Some("wrong".into()),
            hashlock::commit("right"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn with_secret_preserves_everything_else() {
        let e = locked("before_locktime");
        let unlocked = e.with_secret("before_locktime").unwrap();
        assert_eq!(unlocked.linear_id, e.linear_id);
        assert_eq!(unlocked.phase(), EscrowPhase::Unlocked);
        assert_eq!(unlocked.without_secret(), e);
        assert!(e.secret.is_none(), "original must be untouched");
    }

    #[test]
    fn with_wrong_secret_fails() {
        let e = locked("before_locktime");
        assert!(e.with_secret("after_locktime").is_err());
    }

    #[test]
    fn expiry_is_inclusive_of_locktime() {
        let e = locked("s");
        assert!(!e.is_expired(e.locktime - Duration::milliseconds(1)));
        assert!(e.is_expired(e.locktime));
        assert_eq!(
            e.conversion_phase(e.locktime),
            EscrowPhase::ConvertedToSender
        );
        assert_eq!(
            e.conversion_phase(e.locktime - Duration::seconds(1)),
            EscrowPhase::ConvertedToReceiver
        );
    }

    #[test]
    fn phase_transitions_valid() {
        assert!(EscrowPhase::Locked.can_transition_to(EscrowPhase::Unlocked));
        assert!(EscrowPhase::Locked.can_transition_to(EscrowPhase::ConvertedToSender));
        assert!(EscrowPhase::Unlocked.can_transition_to(EscrowPhase::ConvertedToReceiver));
        assert!(EscrowPhase::Unlocked.can_transition_to(EscrowPhase::ConvertedToSender));
    }

    #[test]
    fn phase_transitions_invalid() {
        assert!(!EscrowPhase::Locked.can_transition_to(EscrowPhase::ConvertedToReceiver));
        assert!(!EscrowPhase::Unlocked.can_transition_to(EscrowPhase::Locked));
        assert!(!EscrowPhase::ConvertedToSender.can_transition_to(EscrowPhase::Locked));
        assert!(!EscrowPhase::ConvertedToReceiver.can_transition_to(EscrowPhase::Unlocked));
        assert!(EscrowPhase::ConvertedToReceiver.is_terminal());
        assert!(!EscrowPhase::Unlocked.is_terminal());
    }

    #[test]
    fn with_participants_returns_new_value() {
        let e = locked("s");
        let carol = PartyId::dummy(3);
        let wider = e.with_participants([carol]);
        assert_eq!(e.participants.len(), 2);
        assert_eq!(wider.participants.len(), 3);
        assert_eq!(wider.linear_id, e.linear_id);
    }

    #[test]
    fn serde_roundtrip() {
        let e = locked("s").with_secret("s").unwrap();
        let json = serde_json::to_string(&e).unwrap();
        let back: EscrowState = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
        assert!(back.check_invariants().is_ok());
    }
}
