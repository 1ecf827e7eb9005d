//! Checks that apply to every transaction before command dispatch.
//!
//! In order:
//! 1. exactly one command
//! 2. one participant set of at least two parties across all states,
//!    fully signed
//! 3. one asset across all states, present in the registry
//! 4. strictly positive amounts whose sums fit in `u64`
//! 5. input sum == output sum, except for Mint and Burn

use swapledger_types::{AssetRegistry, LedgerState, Transaction, ViolationKind, constants};

use crate::rules::RuleChain;

/// Sum of state amounts, `None` on overflow.
#[must_use]
pub fn checked_sum(states: &[LedgerState]) -> Option<u64> {
    states
        .iter()
        .try_fold(0u64, |acc, state| acc.checked_add(state.amount()))
}

/// The global rule chain for `tx`.
pub fn global_rules<'a>(tx: &'a Transaction, registry: &'a AssetRegistry) -> RuleChain<'a> {
    let first = tx.states().next();

    RuleChain::new()
        .require(
            ViolationKind::Structural,
            "exactly one command must be present",
            move || tx.commands.len() == 1,
        )
        .require(
            ViolationKind::Participant,
            "participants must be the same in all inputs and outputs",
            move || {
                first.is_none_or(|first| {
                    tx.states()
                        .all(|state| state.participants() == first.participants())
                })
            },
        )
        .require(
            ViolationKind::Participant,
            "every state must have at least two participants",
            move || {
                tx.states()
                    .all(|state| state.participants().len() >= constants::MIN_PARTICIPANTS)
            },
        )
        .require(
            ViolationKind::Signature,
            "all participants must sign the transaction",
            move || first.is_none_or(|first| first.participants().is_subset(&tx.signers)),
        )
        .require(
            ViolationKind::Asset,
            "all inputs and outputs must use the same asset",
            move || first.is_none_or(|first| tx.states().all(|state| state.asset() == first.asset())),
        )
        .require(
            ViolationKind::Asset,
            "only registry assets are allowed",
            move || first.is_none_or(|first| registry.is_supported(first.asset())),
        )
        .require(
            ViolationKind::Conservation,
            "all amounts must be positive",
            move || tx.states().all(|state| state.amount() > 0),
        )
        .require(
            ViolationKind::Conservation,
            "amount sums must not overflow",
            move || checked_sum(&tx.inputs).is_some() && checked_sum(&tx.outputs).is_some(),
        )
        .require(
            ViolationKind::Conservation,
            "input and output amounts must be equal for any command except Mint and Burn",
            move || {
                tx.single_command().is_some_and(|command| command.changes_supply())
                    || checked_sum(&tx.inputs) == checked_sum(&tx.outputs)
            },
        )
}
