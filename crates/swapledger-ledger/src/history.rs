//! Notarisation history: prevents committing the same transaction twice.
//!
//! Each transaction id can be notarised once. A second submission returns
//! [`LedgerError::AlreadyNotarised`]. The history is a bounded LRU-style set
//! so memory stays predictable on a long-running notary.

use std::collections::{HashSet, VecDeque};

use swapledger_types::{LedgerError, Result, TxId};

/// Bounded set of notarised transaction ids with oldest-first eviction.
#[derive(Debug)]
pub struct NotaryHistory {
    seen: HashSet<TxId>,
    /// Insertion order, front = oldest.
    order: VecDeque<TxId>,
    max_size: usize,
}

impl NotaryHistory {
    /// History holding at most `max_size` ids.
    ///
    /// # Errors
    /// [`LedgerError::Configuration`] if `max_size` is zero.
    pub fn new(max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(LedgerError::Configuration(
                "notary history size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            max_size,
        })
    }

    /// Fail if `tx_id` is already in the history.
    ///
    /// # Errors
    /// [`LedgerError::AlreadyNotarised`].
    pub fn check(&self, tx_id: &TxId) -> Result<()> {
        if self.seen.contains(tx_id) {
            return Err(LedgerError::AlreadyNotarised(*tx_id));
        }
        Ok(())
    }

    /// Remember `tx_id`, evicting the oldest entry when full.
    ///
    /// # Errors
    /// [`LedgerError::AlreadyNotarised`] if it is already present.
    pub fn insert(&mut self, tx_id: TxId) -> Result<()> {
        self.check(&tx_id)?;

        if self.seen.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        self.seen.insert(tx_id);
        self.order.push_back(tx_id);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, tx_id: &TxId) -> bool {
        self.seen.contains(tx_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(n: u8) -> TxId {
        TxId([n; 32])
    }

    #[test]
    fn second_insert_blocked() {
        let mut history = NotaryHistory::new(10).unwrap();
        history.insert(tx(1)).unwrap();
        assert!(history.contains(&tx(1)));
        let err = history.insert(tx(1)).unwrap_err();
        assert!(
            matches!(err, LedgerError::AlreadyNotarised(id) if id == tx(1)),
            "Expected AlreadyNotarised, got: {err:?}"
        );
        assert!(history.check(&tx(2)).is_ok());
    }

    #[test]
    fn evicts_oldest() {
        let mut history = NotaryHistory::new(3).unwrap();
        for n in 1..=4 {
            history.insert(tx(n)).unwrap();
        }
        assert_eq!(history.len(), 3);
        assert!(!history.contains(&tx(1)), "oldest should have been evicted");
        assert!(history.contains(&tx(2)));
        assert!(history.contains(&tx(4)));
    }

    #[test]
    fn zero_size_rejected() {
        assert!(matches!(
            NotaryHistory::new(0).unwrap_err(),
            LedgerError::Configuration(_)
        ));
    }

    #[test]
    fn starts_empty() {
        let history = NotaryHistory::new(1).unwrap();
        assert!(history.is_empty());
        assert!(!history.contains(&tx(0)));
    }
}
