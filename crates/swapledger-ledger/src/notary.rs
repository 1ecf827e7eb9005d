//! Notary: the single sequencer that commits transactions to the store.
//!
//! ## Pipeline
//!
//! ```text
//!   SignedTransaction
//!        │ 1. history       already notarised?         → AlreadyNotarised
//!        │                  outputs already recorded?  → AlreadyNotarised
//!        │ 2. resolve       every input ref recorded?  → UnknownState
//!        │                  repeated or consumed?      → DoubleSpend
//!        │ 3. signatures    all valid?                 → InvalidSignature
//!        │                  all required present?      → MissingSignatures
//!        │ 4. validate      transition rules           → Rejected(Violation)
//!        ▼ 5. commit        consume, record, sequence, supply
//!   NotarisedTx
//! ```
//!
//! Steps 1-4 only read. Nothing is mutated unless every check passes, so a
//! rejected submission leaves the ledger exactly as it was.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use swapledger_types::{
    Asset, AssetRegistry, Command, LedgerConfig, LedgerError, LedgerState, Result,
    Transaction, TxId,
};

use crate::history::NotaryHistory;
use crate::signing::SignedTransaction;
use crate::supply::SupplyConservation;
use crate::vault::{StateRef, StateStore, Vault};

/// Receipt for a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotarisedTx {
    pub tx_id: TxId,
    /// Position in the notary's total order, starting at 1.
    pub sequence: u64,
    pub command: Command,
    /// References of the recorded outputs, in output order.
    pub outputs: Vec<StateRef>,
    pub notarised_at: DateTime<Utc>,
}

/// Single-writer sequencer over an in-memory [`Vault`].
#[derive(Debug)]
pub struct Notary {
    vault: Vault,
    registry: AssetRegistry,
    history: NotaryHistory,
    supply: SupplyConservation,
    last_sequence: u64,
}

impl Notary {
    /// Notary with an empty vault, configured from `config`.
    ///
    /// # Errors
    /// `Configuration` if `config` is not usable.
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            vault: Vault::new(),
            registry: AssetRegistry::from_config(config),
            history: NotaryHistory::new(config.notary_history_size)?,
            supply: SupplyConservation::new(),
            last_sequence: 0,
        })
    }

    #[must_use]
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    #[must_use]
    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }

    /// Sequence number of the last committed transaction, 0 if none.
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    #[must_use]
    pub fn is_notarised(&self, tx_id: &TxId) -> bool {
        self.history.contains(tx_id)
    }

    /// Check and commit `stx` as of `now`.
    ///
    /// # Errors
    /// See the module pipeline. On error the ledger is unchanged.
    pub fn notarise(&mut self, stx: &SignedTransaction, now: DateTime<Utc>) -> Result<NotarisedTx> {
        let result = self.check(stx, now).and_then(|tx| self.commit(stx, &tx, now));
        if let Err(err) = &result {
            tracing::warn!(
                tx_id = %stx.id(),
                command = %stx.tx().command(),
                error = %err,
                "Notarisation rejected"
            );
        }
        result
    }

    /// Steps 1-4: read-only checks; returns the validated transaction.
    fn check(&self, stx: &SignedTransaction, now: DateTime<Utc>) -> Result<Transaction> {
        let wire = stx.tx();
        let tx_id = wire.id();
        self.history.check(&tx_id)?;
        // The history is bounded; recorded outputs are not.
        if self.vault.contains_tx(&tx_id) {
            return Err(LedgerError::AlreadyNotarised(tx_id));
        }

        let mut seen = BTreeSet::new();
        let mut inputs = Vec::with_capacity(wire.inputs().len());
        for state_ref in wire.inputs() {
            let resolved = self.vault.resolve(state_ref)?;
            if !seen.insert(*state_ref) || self.vault.is_consumed(state_ref) {
                return Err(LedgerError::DoubleSpend {
                    state: state_ref.to_string(),
                });
            }
            inputs.push(resolved.state);
        }

        let signers = stx.verify_required_signatures()?;

        let tx = Transaction {
            inputs,
            outputs: wire.outputs().to_vec(),
            commands: vec![wire.command()],
            signers,
        };
        swapledger_validator::validate(&tx, now, &self.registry)?;
        Ok(tx)
    }

    /// Step 5: apply a checked transaction.
    fn commit(
        &mut self,
        stx: &SignedTransaction,
        tx: &Transaction,
        now: DateTime<Utc>,
    ) -> Result<NotarisedTx> {
        let wire = stx.tx();
        let tx_id = wire.id();

        self.vault.consume(wire.inputs())?;
        let outputs = self.vault.record(tx_id, &tx.outputs)?;
        self.history.insert(tx_id)?;
        self.last_sequence += 1;

        match wire.command() {
            Command::Mint => {
                for state in &tx.outputs {
                    self.supply.record_mint(&state.asset().code, state.amount());
                }
            }
            Command::Burn => {
                for state in &tx.inputs {
                    self.supply.record_burn(&state.asset().code, state.amount());
                }
            }
            command if command.is_escrow_command() => log_escrow_transition(tx, now),
            _ => {}
        }

        tracing::info!(
            tx_id = %tx_id,
            sequence = self.last_sequence,
            command = %wire.command(),
            inputs = tx.inputs.len(),
            outputs = outputs.len(),
            "Transaction notarised"
        );

        Ok(NotarisedTx {
            tx_id,
            sequence: self.last_sequence,
            command: wire.command(),
            outputs,
            notarised_at: now,
        })
    }

    /// Compare the store's unconsumed total of `asset` with minted minus
    /// burned.
    ///
    /// # Errors
    /// [`LedgerError::SupplyInvariantViolation`] on mismatch.
    pub fn audit(&self, asset: &Asset) -> Result<()> {
        self.supply
            .verify(&asset.code, self.vault.unconsumed_total(asset))
    }

    /// [`Notary::audit`] over every registry asset.
    ///
    /// # Errors
    /// The first failing asset.
    pub fn audit_all(&self) -> Result<()> {
        self.registry.iter().try_for_each(|asset| self.audit(&asset))
    }
}

fn log_escrow_transition(tx: &Transaction, now: DateTime<Utc>) {
    let (Some(input), Some(output)) = (tx.inputs.first(), tx.outputs.first()) else {
        return;
    };
    let (linear_id, from, to) = match (input, output) {
        (LedgerState::Value(_), LedgerState::Escrow(escrow)) => {
            (escrow.linear_id, None, escrow.phase())
        }
        (LedgerState::Escrow(before), LedgerState::Escrow(after)) => {
            (after.linear_id, Some(before.phase()), after.phase())
        }
        (LedgerState::Escrow(escrow), LedgerState::Value(_)) => (
            escrow.linear_id,
            Some(escrow.phase()),
            escrow.conversion_phase(now),
        ),
        (LedgerState::Value(_), LedgerState::Value(_)) => return,
    };

    match from {
        Some(from) if !from.can_transition_to(to) => tracing::warn!(
            linear_id = %linear_id,
            from = %from,
            to = %to,
            "Unexpected escrow phase transition"
        ),
        Some(from) => tracing::info!(
            linear_id = %linear_id,
            from = %from,
            to = %to,
            "Escrow phase changed"
        ),
        None => tracing::info!(
            linear_id = %linear_id,
            to = %to,
            "Escrow created"
        ),
    }
}
