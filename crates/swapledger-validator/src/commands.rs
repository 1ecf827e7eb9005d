//! Per-command rules.
//!
//! Each command first checks its input/output shape, then its own rule
//! chain. Global checks have already run by the time these are reached.

use chrono::{DateTime, Utc};
use swapledger_types::{
    AssetRegistry, Command, EscrowState, LedgerState, Transaction, ValueState, Violation,
    ViolationKind, hashlock,
};

use crate::rules::RuleChain;

/// Dispatch to the rule set of `command`.
///
/// # Errors
/// The first violated rule of the command.
pub fn verify_command(
    command: Command,
    tx: &Transaction,
    now: DateTime<Utc>,
    registry: &AssetRegistry,
) -> Result<(), Violation> {
    match command {
        Command::Mint => verify_mint(tx, registry),
        Command::Burn => verify_burn(tx),
        Command::Transfer => verify_transfer(tx),
        Command::Lock => verify_lock(tx, now),
        Command::Unlock => verify_unlock(tx, now),
        Command::Convert => verify_convert(tx, now),
    }
}

fn structural(reason: &'static str) -> Violation {
    ViolationKind::Structural.with_reason(reason)
}

fn is_value(state: &LedgerState) -> bool {
    matches!(state, LedgerState::Value(_))
}

fn is_escrow(state: &LedgerState) -> bool {
    matches!(state, LedgerState::Escrow(_))
}

fn hash_format_rule<'a>(escrow: &'a EscrowState) -> RuleChain<'a> {
    RuleChain::new().require(
        ViolationKind::HashFormat,
        "secret hash must be a 64-character lowercase hex SHA-256 digest",
        move || hashlock::is_well_formed(&escrow.secret_hash),
    )
}

// [] -> [ValueState]
fn verify_mint(tx: &Transaction, registry: &AssetRegistry) -> Result<(), Violation> {
    RuleChain::new()
        .require(
            ViolationKind::Structural,
            "no input states must be consumed",
            || tx.inputs.is_empty(),
        )
        .require(
            ViolationKind::Structural,
            "exactly one output state must be created",
            || tx.outputs.len() == 1,
        )
        .require(ViolationKind::Structural, "output must be a ValueState", || {
            tx.outputs.iter().all(is_value)
        })
        .evaluate()?;

    let [LedgerState::Value(output)] = tx.outputs.as_slice() else {
        return Err(structural("output must be a ValueState"));
    };

    RuleChain::new()
        .require(
            ViolationKind::Participant,
            "owner must be among participants",
            || output.participants.contains(&output.owner),
        )
        .require(
            ViolationKind::Conservation,
            "minted amount must be positive",
            || output.amount > 0,
        )
        .require(ViolationKind::Asset, "minted asset must be supported", || {
            registry.is_supported(&output.asset)
        })
        .evaluate()
}

// [ValueState, ...] -> []
fn verify_burn(tx: &Transaction) -> Result<(), Violation> {
    RuleChain::new()
        .require(
            ViolationKind::Structural,
            "at least one input state must be consumed",
            || !tx.inputs.is_empty(),
        )
        .require(
            ViolationKind::Structural,
            "no output states must be created",
            || tx.outputs.is_empty(),
        )
        .require(ViolationKind::Structural, "inputs must be ValueStates", || {
            tx.inputs.iter().all(is_value)
        })
        .evaluate()
}

// [ValueState, ...] -> [ValueState, ...]
fn verify_transfer(tx: &Transaction) -> Result<(), Violation> {
    RuleChain::new()
        .require(
            ViolationKind::Structural,
            "at least one input state must be consumed",
            || !tx.inputs.is_empty(),
        )
        .require(
            ViolationKind::Structural,
            "at least one output state must be created",
            || !tx.outputs.is_empty(),
        )
        .require(
            ViolationKind::Structural,
            "inputs and outputs must be ValueStates",
            || tx.states().all(is_value),
        )
        .evaluate()?;

    let inputs: Vec<&ValueState> = tx.inputs.iter().filter_map(LedgerState::as_value).collect();
    let outputs: Vec<&ValueState> = tx.outputs.iter().filter_map(LedgerState::as_value).collect();
    let Some(first) = inputs.first() else {
        return Err(structural("at least one input state must be consumed"));
    };

    RuleChain::new()
        .require(
            ViolationKind::Participant,
            "new owners must be among input participants",
            || {
                outputs
                    .iter()
                    .all(|output| first.participants.contains(&output.owner))
            },
        )
        .evaluate()
}

// [ValueState] -> [EscrowState]
fn verify_lock(tx: &Transaction, now: DateTime<Utc>) -> Result<(), Violation> {
    RuleChain::new()
        .require(
            ViolationKind::Structural,
            "exactly one input state must be consumed",
            || tx.inputs.len() == 1,
        )
        .require(
            ViolationKind::Structural,
            "exactly one output state must be created",
            || tx.outputs.len() == 1,
        )
        .require(ViolationKind::Structural, "input must be a ValueState", || {
            tx.inputs.iter().all(is_value)
        })
        .require(ViolationKind::Structural, "output must be an EscrowState", || {
            tx.outputs.iter().all(is_escrow)
        })
        .evaluate()?;

    let ([LedgerState::Value(input)], [LedgerState::Escrow(output)]) =
        (tx.inputs.as_slice(), tx.outputs.as_slice())
    else {
        return Err(structural("lock must consume a ValueState and produce an EscrowState"));
    };

    hash_format_rule(output)
        .require(
            ViolationKind::Participant,
            "sender must be the owner of the locked state",
            || output.sender == input.owner,
        )
        .require(
            ViolationKind::Participant,
            "receiver must not be the owner of the locked state",
            || output.receiver != input.owner,
        )
        .require(
            ViolationKind::Participant,
            "receiver must be among participants",
            || input.participants.contains(&output.receiver),
        )
        .require(
            ViolationKind::Secret,
            "secret must not be shared on locking",
            || output.secret.is_none(),
        )
        .require(
            ViolationKind::Timing,
            "locktime must be after the current time",
            move || output.locktime > now,
        )
        .require(
            ViolationKind::Asset,
            "locked asset must be unchanged",
            || output.asset == input.asset,
        )
        .require(
            ViolationKind::Conservation,
            "locked amount must be unchanged",
            || output.amount == input.amount,
        )
        .evaluate()
}

// [EscrowState] -> [EscrowState + secret]
fn verify_unlock(tx: &Transaction, now: DateTime<Utc>) -> Result<(), Violation> {
    RuleChain::new()
        .require(
            ViolationKind::Structural,
            "exactly one input state must be consumed",
            || tx.inputs.len() == 1,
        )
        .require(
            ViolationKind::Structural,
            "exactly one output state must be created",
            || tx.outputs.len() == 1,
        )
        .require(
            ViolationKind::Structural,
            "input and output must be EscrowStates",
            || tx.states().all(is_escrow),
        )
        .evaluate()?;

    let ([LedgerState::Escrow(input)], [LedgerState::Escrow(output)]) =
        (tx.inputs.as_slice(), tx.outputs.as_slice())
    else {
        return Err(structural("input and output must be EscrowStates"));
    };

    hash_format_rule(input)
        .require(
            ViolationKind::Secret,
            "input escrow must not already carry a secret",
            || input.secret.is_none(),
        )
        .require(
            ViolationKind::Structural,
            "linear id must be preserved",
            || output.linear_id == input.linear_id,
        )
        .require(
            ViolationKind::Structural,
            "all fields except secret must remain the same",
            || output.without_secret() == *input,
        )
        .require(
            ViolationKind::Timing,
            "locktime is reached, value can only be reclaimed by the sender with Convert",
            move || now < input.locktime,
        )
        .require(
            ViolationKind::Secret,
            "valid secret must be provided to unlock",
            || output.is_secret_valid(),
        )
        .evaluate()
}

// [EscrowState] -> [ValueState]
fn verify_convert(tx: &Transaction, now: DateTime<Utc>) -> Result<(), Violation> {
    RuleChain::new()
        .require(
            ViolationKind::Structural,
            "exactly one input state must be consumed",
            || tx.inputs.len() == 1,
        )
        .require(
            ViolationKind::Structural,
            "exactly one output state must be created",
            || tx.outputs.len() == 1,
        )
        .require(ViolationKind::Structural, "input must be an EscrowState", || {
            tx.inputs.iter().all(is_escrow)
        })
        .require(ViolationKind::Structural, "output must be a ValueState", || {
            tx.outputs.iter().all(is_value)
        })
        .evaluate()?;

    let ([LedgerState::Escrow(input)], [LedgerState::Value(output)]) =
        (tx.inputs.as_slice(), tx.outputs.as_slice())
    else {
        return Err(structural("convert must consume an EscrowState and produce a ValueState"));
    };

    let carried = hash_format_rule(input)
        .require(
            ViolationKind::Asset,
            "converted asset must be unchanged",
            || output.asset == input.asset,
        )
        .require(
            ViolationKind::Conservation,
            "converted amount must be unchanged",
            || output.amount == input.amount,
        );

    let claim = if input.is_expired(now) {
        RuleChain::new().require(
            ViolationKind::Participant,
            "only the sender can reclaim value after locktime",
            || output.owner == input.sender,
        )
    } else {
        RuleChain::new()
            .require(
                ViolationKind::Secret,
                "valid secret must be provided to claim value before locktime",
                || input.is_secret_valid(),
            )
            .require(
                ViolationKind::Participant,
                "only the receiver can claim value before locktime",
                || output.owner == input.receiver,
            )
    };

    carried.then(claim).evaluate()
}
