//! In-memory state store.
//!
//! Every output a notarised transaction produces is recorded under a
//! [`StateRef`] (`tx_id`, output index). Consuming a state marks it spent;
//! spent states stay resolvable so a second spend is reported as a double
//! spend rather than as an unknown reference.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use swapledger_types::{
    Asset, EscrowState, LedgerError, LedgerState, LinearId, PartyId, Result, TxId, ValueState,
};

/// Pointer to one output of a notarised transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct StateRef {
    pub tx_id: TxId,
    pub index: u32,
}

impl StateRef {
    #[must_use]
    pub fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

/// A state together with the reference it was recorded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateAndRef {
    pub state: LedgerState,
    pub state_ref: StateRef,
}

impl StateAndRef {
    #[must_use]
    pub fn as_value(&self) -> Option<&ValueState> {
        self.state.as_value()
    }

    #[must_use]
    pub fn as_escrow(&self) -> Option<&EscrowState> {
        self.state.as_escrow()
    }
}

/// Storage seam between the notary and whatever keeps the states.
pub trait StateStore {
    /// Record the outputs of `tx_id` and return their references in order.
    ///
    /// # Errors
    /// `AlreadyNotarised` if outputs of `tx_id` are already recorded,
    /// `Internal` if the output count does not fit a `u32` index.
    fn record(&mut self, tx_id: TxId, outputs: &[LedgerState]) -> Result<Vec<StateRef>>;

    /// Mark every ref as consumed. All-or-nothing: on error nothing changes.
    ///
    /// # Errors
    /// `UnknownState` for a ref never recorded, `DoubleSpend` for a ref
    /// already consumed or listed twice.
    fn consume(&mut self, refs: &[StateRef]) -> Result<()>;

    /// Look up a recorded state, consumed or not.
    ///
    /// # Errors
    /// `UnknownState` if `state_ref` was never recorded.
    fn resolve(&self, state_ref: &StateRef) -> Result<StateAndRef>;

    fn is_consumed(&self, state_ref: &StateRef) -> bool;

    /// Whether any output of `tx_id` has been recorded, consumed or not.
    fn contains_tx(&self, tx_id: &TxId) -> bool;

    /// All states not yet consumed, in reference order.
    fn unconsumed(&self) -> Vec<StateAndRef>;
}

/// Map-backed [`StateStore`] with the queries transaction builders need.
#[derive(Debug, Default)]
pub struct Vault {
    states: BTreeMap<StateRef, LedgerState>,
    consumed: BTreeSet<StateRef>,
}

impl Vault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn unconsumed_iter(&self) -> impl Iterator<Item = (&StateRef, &LedgerState)> {
        self.states
            .iter()
            .filter(|(state_ref, _)| !self.consumed.contains(*state_ref))
    }

    /// Unconsumed value states of `asset` owned by `party`.
    #[must_use]
    pub fn value_states_owned_by(&self, party: &PartyId, asset: &Asset) -> Vec<StateAndRef> {
        self.unconsumed_iter()
            .filter(|(_, state)| {
                state
                    .as_value()
                    .is_some_and(|v| v.owner == *party && v.asset == *asset)
            })
            .map(|(state_ref, state)| StateAndRef {
                state: state.clone(),
                state_ref: *state_ref,
            })
            .collect()
    }

    /// The live escrow carrying `linear_id`, if it has not been converted.
    #[must_use]
    pub fn escrow_by_linear_id(&self, linear_id: &LinearId) -> Option<StateAndRef> {
        self.unconsumed_iter()
            .find(|(_, state)| state.as_escrow().is_some_and(|e| e.linear_id == *linear_id))
            .map(|(state_ref, state)| StateAndRef {
                state: state.clone(),
                state_ref: *state_ref,
            })
    }

    /// Sum of unconsumed value states of `asset` owned by `party`.
    ///
    /// Escrowed value is excluded: it belongs to nobody until converted.
    #[must_use]
    pub fn balance_of(&self, party: &PartyId, asset: &Asset) -> u128 {
        self.value_states_owned_by(party, asset)
            .iter()
            .map(|s| u128::from(s.state.amount()))
            .sum()
    }

    /// Sum of every unconsumed state of `asset`, escrows included.
    #[must_use]
    pub fn unconsumed_total(&self, asset: &Asset) -> u128 {
        self.unconsumed_iter()
            .filter(|(_, state)| state.asset() == asset)
            .map(|(_, state)| u128::from(state.amount()))
            .sum()
    }

    /// Number of recorded states, consumed included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl StateStore for Vault {
    fn record(&mut self, tx_id: TxId, outputs: &[LedgerState]) -> Result<Vec<StateRef>> {
        if self.contains_tx(&tx_id) {
            return Err(LedgerError::AlreadyNotarised(tx_id));
        }
        let mut refs = Vec::with_capacity(outputs.len());
        for (index, state) in outputs.iter().enumerate() {
            let index = u32::try_from(index)
                .map_err(|_| LedgerError::Internal(format!("too many outputs in {tx_id}")))?;
            let state_ref = StateRef::new(tx_id, index);
            self.states.insert(state_ref, state.clone());
            refs.push(state_ref);
        }
        Ok(refs)
    }

    fn consume(&mut self, refs: &[StateRef]) -> Result<()> {
        let mut batch = BTreeSet::new();
        for state_ref in refs {
            if !self.states.contains_key(state_ref) {
                return Err(LedgerError::UnknownState(state_ref.to_string()));
            }
            if self.consumed.contains(state_ref) || !batch.insert(*state_ref) {
                return Err(LedgerError::DoubleSpend {
                    state: state_ref.to_string(),
                });
            }
        }
        self.consumed.extend(batch);
        Ok(())
    }

    fn resolve(&self, state_ref: &StateRef) -> Result<StateAndRef> {
        self.states
            .get(state_ref)
            .map(|state| StateAndRef {
                state: state.clone(),
                state_ref: *state_ref,
            })
            .ok_or_else(|| LedgerError::UnknownState(state_ref.to_string()))
    }

    fn is_consumed(&self, state_ref: &StateRef) -> bool {
        self.consumed.contains(state_ref)
    }

    fn contains_tx(&self, tx_id: &TxId) -> bool {
        self.states
            .range(StateRef::new(*tx_id, 0)..)
            .next()
            .is_some_and(|(state_ref, _)| state_ref.tx_id == *tx_id)
    }

    fn unconsumed(&self) -> Vec<StateAndRef> {
        self.unconsumed_iter()
            .map(|(state_ref, state)| StateAndRef {
                state: state.clone(),
                state_ref: *state_ref,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use swapledger_types::hashlock;

    use super::*;

    fn alice() -> PartyId {
        PartyId::dummy(1)
    }

    fn bob() -> PartyId {
        PartyId::dummy(2)
    }

    fn value(owner: PartyId, asset: Asset, amount: u64) -> LedgerState {
        let other = if owner == alice() { bob() } else { alice() };
        ValueState::with_counterparty(owner, asset, amount, other)
            .unwrap()
            .into()
    }

    fn tx(n: u8) -> TxId {
        TxId([n; 32])
    }

    #[test]
    fn record_assigns_indices_in_order() {
        let mut vault = Vault::new();
        let refs = vault
            .record(tx(1), &[value(alice(), Asset::btc(), 1), value(bob(), Asset::btc(), 2)])
            .unwrap();
        assert_eq!(refs, vec![StateRef::new(tx(1), 0), StateRef::new(tx(1), 1)]);
        assert_eq!(vault.resolve(&refs[1]).unwrap().state.amount(), 2);
        assert_eq!(vault.len(), 2);
    }

    #[test]
    fn record_refuses_to_overwrite_a_transaction() {
        let mut vault = Vault::new();
        vault.record(tx(1), &[value(alice(), Asset::btc(), 100)]).unwrap();
        vault.record(tx(3), &[value(alice(), Asset::btc(), 1)]).unwrap();
        assert!(vault.contains_tx(&tx(1)));
        assert!(!vault.contains_tx(&tx(2)));

        let err = vault
            .record(tx(1), &[value(alice(), Asset::btc(), 7)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyNotarised(id) if id == tx(1)));
        assert_eq!(vault.resolve(&StateRef::new(tx(1), 0)).unwrap().state.amount(), 100);
        assert_eq!(vault.len(), 2);
    }

    #[test]
    fn resolve_unknown_ref() {
        let vault = Vault::new();
        let err = vault.resolve(&StateRef::new(tx(9), 0)).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownState(_)));
    }

    #[test]
    fn consumed_states_still_resolve() {
        let mut vault = Vault::new();
        let refs = vault.record(tx(1), &[value(alice(), Asset::btc(), 5)]).unwrap();
        vault.consume(&refs).unwrap();
        assert!(vault.is_consumed(&refs[0]));
        assert!(vault.resolve(&refs[0]).is_ok());
        assert!(vault.unconsumed().is_empty());
    }

    #[test]
    fn consume_twice_is_double_spend() {
        let mut vault = Vault::new();
        let refs = vault.record(tx(1), &[value(alice(), Asset::btc(), 5)]).unwrap();
        vault.consume(&refs).unwrap();
        let err = vault.consume(&refs).unwrap_err();
        assert!(matches!(err, LedgerError::DoubleSpend { .. }));
    }

    #[test]
    fn consume_is_all_or_nothing() {
        let mut vault = Vault::new();
        let refs = vault.record(tx(1), &[value(alice(), Asset::btc(), 5)]).unwrap();
        let err = vault
            .consume(&[refs[0], StateRef::new(tx(2), 0)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownState(_)));
        assert!(!vault.is_consumed(&refs[0]));

        let err = vault.consume(&[refs[0], refs[0]]).unwrap_err();
        assert!(matches!(err, LedgerError::DoubleSpend { .. }));
        assert!(!vault.is_consumed(&refs[0]));
    }

    #[test]
    fn ownership_queries() {
        let mut vault = Vault::new();
        vault
            .record(
                tx(1),
                &[
                    value(alice(), Asset::btc(), 3),
                    value(alice(), Asset::btc(), 4),
                    value(alice(), Asset::dash(), 100),
                    value(bob(), Asset::btc(), 7),
                ],
            )
            .unwrap();
        assert_eq!(vault.value_states_owned_by(&alice(), &Asset::btc()).len(), 2);
        assert_eq!(vault.balance_of(&alice(), &Asset::btc()), 7);
        assert_eq!(vault.balance_of(&bob(), &Asset::dash()), 0);
        assert_eq!(vault.unconsumed_total(&Asset::btc()), 14);
    }

    #[test]
    fn escrow_lookup_follows_linear_id() {
        let now = Utc::now();
        let escrow = EscrowState::new(
            alice(),
            bob(),
            Asset::btc(),
            10,
            None,
            hashlock::commit("s"),
            now + Duration::seconds(10),
        )
        .unwrap();
        let linear_id = escrow.linear_id;

        let mut vault = Vault::new();
        let refs = vault.record(tx(1), &[escrow.clone().into()]).unwrap();
        assert_eq!(
            vault.escrow_by_linear_id(&linear_id).unwrap().state_ref,
            refs[0]
        );
        assert_eq!(vault.unconsumed_total(&Asset::btc()), 10);
        assert_eq!(vault.balance_of(&alice(), &Asset::btc()), 0);

        vault.consume(&refs).unwrap();
        let unlocked = escrow.with_secret("s").unwrap();
        let next = vault.record(tx(2), &[unlocked.into()]).unwrap();
        let found = vault.escrow_by_linear_id(&linear_id).unwrap();
        assert_eq!(found.state_ref, next[0]);
        assert!(found.as_escrow().unwrap().is_secret_valid());
    }
}
