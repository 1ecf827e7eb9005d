//! Entry point: judge one candidate transaction.

use chrono::{DateTime, Utc};
use swapledger_types::{AssetRegistry, Transaction, Violation, ViolationKind};

use crate::commands::verify_command;
use crate::global::global_rules;

/// Accept or reject `tx` at instant `now` against the assets in `registry`.
///
/// Global checks run first, then the rules of the single command. The first
/// failing check decides the outcome. Pure: the same arguments always give
/// the same answer, and nothing is mutated.
///
/// # Errors
/// The [`Violation`] of the first failing check.
pub fn validate(
    tx: &Transaction,
    now: DateTime<Utc>,
    registry: &AssetRegistry,
) -> Result<(), Violation> {
    let outcome = global_rules(tx, registry).evaluate().and_then(|()| {
        let command = tx.single_command().ok_or_else(|| {
            ViolationKind::Structural.with_reason("exactly one command must be present")
        })?;
        verify_command(command, tx, now, registry)
    });

    match &outcome {
        Ok(()) => tracing::debug!(
            commands = ?tx.commands,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            now = %now,
            "transaction accepted"
        ),
        Err(violation) => tracing::debug!(
            commands = ?tx.commands,
            kind = %violation.kind(),
            reason = violation.reason(),
            now = %now,
            "transaction rejected"
        ),
    }

    outcome
}
