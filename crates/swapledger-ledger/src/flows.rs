//! Transaction builders, one per command.
//!
//! Builders read the vault, pick the states to consume and return an
//! unsigned [`WireTransaction`]. They do not validate: the notary runs the
//! validator on submission. Required signers are always the union of the
//! participants of every state involved.
//!
//! Because all states in a transaction must share one participant set,
//! builders only pick inputs whose participants are exactly
//! `{party, counterparty}`.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use swapledger_types::{
    Asset, Command, EscrowState, LedgerConfig, LedgerError, LedgerState, LinearId, PartyId, Result,
    ValueState,
};

use crate::signing::WireTransaction;
use crate::vault::{StateAndRef, StateRef, Vault};

fn pair(a: PartyId, b: PartyId) -> BTreeSet<PartyId> {
    BTreeSet::from([a, b])
}

fn required_signers<'a>(states: impl IntoIterator<Item = &'a LedgerState>) -> BTreeSet<PartyId> {
    states
        .into_iter()
        .flat_map(|state| state.participants().iter().copied())
        .collect()
}

fn build(
    inputs: &[StateAndRef],
    outputs: Vec<LedgerState>,
    command: Command,
) -> Result<WireTransaction> {
    let signers = required_signers(inputs.iter().map(|s| &s.state).chain(&outputs));
    let refs: Vec<StateRef> = inputs.iter().map(|s| s.state_ref).collect();
    WireTransaction::new(refs, outputs, command, signers)
}

/// Value states of `owner` in `asset` shared exactly with `counterparty`.
fn owned_with(
    vault: &Vault,
    owner: PartyId,
    counterparty: PartyId,
    asset: &Asset,
) -> Vec<StateAndRef> {
    let participants = pair(owner, counterparty);
    vault
        .value_states_owned_by(&owner, asset)
        .into_iter()
        .filter(|s| s.state.participants() == &participants)
        .collect()
}

/// Lock duration configured as the default.
///
/// # Errors
/// `Configuration` if the configured seconds do not fit a [`Duration`].
pub fn default_lock_duration(config: &LedgerConfig) -> Result<Duration> {
    i64::try_from(config.default_lock_duration_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| {
            LedgerError::Configuration(format!(
                "lock duration of {}s is out of range",
                config.default_lock_duration_secs
            ))
        })
}

/// Issue `amount` of `asset` to `issuer`, visible to `counterparty`.
///
/// # Errors
/// `InvalidState` if `issuer == counterparty`.
pub fn mint(
    issuer: PartyId,
    counterparty: PartyId,
    asset: Asset,
    amount: u64,
) -> Result<WireTransaction> {
    let output = ValueState::with_counterparty(issuer, asset, amount, counterparty)?;
    build(&[], vec![output.into()], Command::Mint)
}

/// Destroy every value state of `asset` that `owner` shares with
/// `counterparty`.
///
/// # Errors
/// `NoMatchingState` if there is nothing to burn.
pub fn burn(
    vault: &Vault,
    owner: PartyId,
    counterparty: PartyId,
    asset: &Asset,
) -> Result<WireTransaction> {
    let inputs = owned_with(vault, owner, counterparty, asset);
    if inputs.is_empty() {
        return Err(LedgerError::NoMatchingState {
            reason: format!("{owner} holds no {asset} shared with {counterparty}"),
        });
    }
    build(&inputs, Vec::new(), Command::Burn)
}

/// Send `amount` of `asset` from `sender` to `receiver`.
///
/// Inputs are taken in vault order until they cover `amount`; any surplus
/// comes back to `sender` as a change output.
///
/// # Errors
/// `InvalidState` for a zero amount or `sender == receiver`,
/// `InsufficientFunds` if the selected states do not cover `amount`.
pub fn transfer(
    vault: &Vault,
    sender: PartyId,
    receiver: PartyId,
    asset: &Asset,
    amount: u64,
) -> Result<WireTransaction> {
    if amount == 0 {
        return Err(LedgerError::InvalidState {
            reason: "transfer amount must be positive".to_string(),
        });
    }

    let mut selected = Vec::new();
    let mut covered: u128 = 0;
    for candidate in owned_with(vault, sender, receiver, asset) {
        if covered >= u128::from(amount) {
            break;
        }
        covered += u128::from(candidate.state.amount());
        selected.push(candidate);
    }
    if covered < u128::from(amount) {
        return Err(LedgerError::InsufficientFunds {
            asset: asset.code.clone(),
            needed: amount,
            available: u64::try_from(covered).unwrap_or(u64::MAX),
        });
    }

    let mut outputs: Vec<LedgerState> =
        vec![ValueState::with_counterparty(receiver, asset.clone(), amount, sender)?.into()];
    let change = covered - u128::from(amount);
    if change > 0 {
        let change = u64::try_from(change).map_err(|_| LedgerError::InvalidState {
            reason: "change does not fit a single state".to_string(),
        })?;
        outputs.push(ValueState::with_counterparty(sender, asset.clone(), change, receiver)?.into());
    }

    tracing::debug!(
        sender = %sender,
        receiver = %receiver,
        asset = %asset,
        amount,
        inputs = selected.len(),
        "Transfer built"
    );
    build(&selected, outputs, Command::Transfer)
}

/// Arguments of [`lock`].
#[derive(Debug, Clone)]
pub struct LockRequest {
    pub sender: PartyId,
    pub receiver: PartyId,
    pub asset: Asset,
    pub amount: u64,
    pub duration: Duration,
    pub secret_hash: String,
}

/// Move one value state of exactly `amount` into an escrow for `receiver`,
/// expiring at `now + duration`.
///
/// # Errors
/// `NoMatchingState` if `sender` has no state of exactly `amount` shared
/// with `receiver`; `InvalidState` if the escrow cannot be built.
pub fn lock(vault: &Vault, request: LockRequest, now: DateTime<Utc>) -> Result<WireTransaction> {
    let LockRequest {
        sender,
        receiver,
        asset,
        amount,
        duration,
        secret_hash,
    } = request;

    let candidates: Vec<StateAndRef> = owned_with(vault, sender, receiver, &asset)
        .into_iter()
        .filter(|s| s.state.amount() == amount)
        .collect();
    let Some(input) = candidates.first() else {
        return Err(LedgerError::NoMatchingState {
            reason: format!(
                "{sender} holds no {asset} state of exactly {amount}, obtain it first"
            ),
        });
    };
    if candidates.len() > 1 {
        tracing::debug!(
            sender = %sender,
            count = candidates.len(),
            "Several states with the exact amount, using the first"
        );
    }

    let locktime = now
        .checked_add_signed(duration)
        .ok_or_else(|| LedgerError::InvalidState {
            reason: format!("locktime {now} + {duration} is out of range"),
        })?;
    let output = EscrowState::new(sender, receiver, asset, amount, None, secret_hash, locktime)?;
    build(std::slice::from_ref(input), vec![output.into()], Command::Lock)
}

/// Attach `secret` to the live escrow `linear_id`.
///
/// # Errors
/// `NoMatchingState` if no live escrow has that id, `InvalidState` if the
/// secret does not open the hash lock.
pub fn unlock(vault: &Vault, linear_id: &LinearId, secret: &str) -> Result<WireTransaction> {
    let (input, escrow) = live_escrow(vault, linear_id)?;
    let output = escrow.with_secret(secret)?;
    build(&[input], vec![output.into()], Command::Unlock)
}

/// Turn the live escrow `linear_id` back into a value state owned by
/// `claimant`: the receiver before expiry, the sender after.
///
/// # Errors
/// `NoMatchingState` if no live escrow has that id, `InvalidState` if
/// `claimant` is not an escrow participant.
pub fn convert(vault: &Vault, claimant: PartyId, linear_id: &LinearId) -> Result<WireTransaction> {
    let (input, escrow) = live_escrow(vault, linear_id)?;
    let output = ValueState::new(
        claimant,
        escrow.asset.clone(),
        escrow.amount,
        escrow.participants.clone(),
    )?;
    build(&[input], vec![output.into()], Command::Convert)
}

fn live_escrow(vault: &Vault, linear_id: &LinearId) -> Result<(StateAndRef, EscrowState)> {
    let found = vault
        .escrow_by_linear_id(linear_id)
        .ok_or_else(|| LedgerError::NoMatchingState {
            reason: format!("no live escrow {linear_id}"),
        })?;
    let escrow = found
        .as_escrow()
        .cloned()
        .ok_or_else(|| LedgerError::Internal(format!("{linear_id} resolved to a value state")))?;
    Ok((found, escrow))
}
