//! Commands and candidate transactions.
//!
//! A [`Transaction`] is what the validator judges: the consumed states, the
//! produced states, the command, and the set of parties that signed. It is
//! an immutable value; the validator never partially applies it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{LedgerState, PartyId};

/// The intent of a transaction. Exactly one per transaction.
///
/// ```text
///   Mint      []            → [ValueState]
///   Burn      [ValueState…] → []
///   Transfer  [ValueState…] → [ValueState…]
///   Lock      [ValueState]  → [EscrowState]           (no secret)
///   Unlock    [EscrowState] → [EscrowState]           (secret attached)
///   Convert   [EscrowState] → [ValueState]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Mint,
    Burn,
    Transfer,
    Lock,
    Unlock,
    Convert,
}

impl Command {
    pub const ALL: [Self; 6] = [
        Self::Mint,
        Self::Burn,
        Self::Transfer,
        Self::Lock,
        Self::Unlock,
        Self::Convert,
    ];

    /// Mint and Burn are the only commands that create or destroy value.
    #[must_use]
    pub fn changes_supply(&self) -> bool {
        matches!(self, Self::Mint | Self::Burn)
    }

    /// Commands that touch an escrow.
    #[must_use]
    pub fn is_escrow_command(&self) -> bool {
        matches!(self, Self::Lock | Self::Unlock | Self::Convert)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => write!(f, "MINT"),
            Self::Burn => write!(f, "BURN"),
            Self::Transfer => write!(f, "TRANSFER"),
            Self::Lock => write!(f, "LOCK"),
            Self::Unlock => write!(f, "UNLOCK"),
            Self::Convert => write!(f, "CONVERT"),
        }
    }
}

/// A candidate transaction as seen by the validator.
///
/// `commands` is a list only so that a malformed transaction carrying zero
/// or several commands can be represented and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<LedgerState>,
    pub outputs: Vec<LedgerState>,
    pub commands: Vec<Command>,
    pub signers: BTreeSet<PartyId>,
}

impl Transaction {
    /// Empty transaction carrying a single command.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: vec![command],
            signers: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_input(mut self, state: impl Into<LedgerState>) -> Self {
        self.inputs.push(state.into());
        self
    }

    #[must_use]
    pub fn with_output(mut self, state: impl Into<LedgerState>) -> Self {
        self.outputs.push(state.into());
        self
    }

    #[must_use]
    pub fn with_signers(mut self, signers: impl IntoIterator<Item = PartyId>) -> Self {
        self.signers.extend(signers);
        self
    }

    /// The command, if there is exactly one.
    #[must_use]
    pub fn single_command(&self) -> Option<Command> {
        match self.commands.as_slice() {
            [command] => Some(*command),
            _ => None,
        }
    }

    /// Inputs followed by outputs.
    pub fn states(&self) -> impl Iterator<Item = &LedgerState> {
        self.inputs.iter().chain(&self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Asset, ValueState};

    fn value(owner: u8, amount: u64) -> ValueState {
        ValueState::with_counterparty(
            PartyId::dummy(owner),
            Asset::btc(),
            amount,
            PartyId::dummy(owner + 1),
        )
        .unwrap()
    }

    #[test]
    fn builder_collects_states_in_order() {
        let tx = Transaction::new(Command::Transfer)
            .with_input(value(1, 10))
            .with_output(value(1, 4))
            .with_output(value(2, 6));
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.outputs.len(), 2);
        let amounts: Vec<u64> = tx.states().map(LedgerState::amount).collect();
        assert_eq!(amounts, vec![10, 4, 6]);
    }

    #[test]
    fn single_command_requires_exactly_one() {
        let mut tx = Transaction::new(Command::Mint);
        assert_eq!(tx.single_command(), Some(Command::Mint));
        tx.commands.push(Command::Burn);
        assert_eq!(tx.single_command(), None);
        tx.commands.clear();
        assert_eq!(tx.single_command(), None);
    }

    #[test]
    fn supply_changing_commands() {
        let changing: Vec<Command> = Command::ALL
            .into_iter()
            .filter(Command::changes_supply)
            .collect();
        assert_eq!(changing, vec![Command::Mint, Command::Burn]);
    }

    #[test]
    fn escrow_commands() {
        assert!(Command::Lock.is_escrow_command());
        assert!(Command::Unlock.is_escrow_command());
        assert!(Command::Convert.is_escrow_command());
        assert!(!Command::Transfer.is_escrow_command());
    }

    #[test]
    fn signers_are_deduplicated() {
        let a = PartyId::dummy(1);
        let tx = Transaction::new(Command::Burn).with_signers([a, a]);
        assert_eq!(tx.signers.len(), 1);
    }

    #[test]
    fn command_display() {
        assert_eq!(format!("{}", Command::Convert), "CONVERT");
    }
}
