//! Parties, wire transactions and ed25519 signatures.
//!
//! A [`WireTransaction`] references its inputs by [`StateRef`] and carries a
//! random privacy salt so two otherwise identical transactions get distinct
//! ids. Its [`TxId`] is SHA-256 over a domain-separated JSON payload; each
//! party signs the 32 id bytes.
//!
//! ```text
//!   WireTransaction ──id()──▶ TxId ──Party::sign──▶ Signature
//!          │                                            │
//!          └──────────── SignedTransaction ◀────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use swapledger_types::{Command, LedgerError, LedgerState, PartyId, Result, TxId, constants};

use crate::vault::StateRef;

// ---------------------------------------------------------------------------
// Party
// ---------------------------------------------------------------------------

/// A named participant holding its own signing key.
pub struct Party {
    name: String,
    key: SigningKey,
}

impl Party {
    /// Party with a freshly generated key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Party with a key derived from a fixed seed.
    #[must_use]
    pub fn from_seed(name: impl Into<String>, seed: [u8; 32]) -> Self {
        Self {
            name: name.into(),
            key: SigningKey::from_bytes(&seed),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn id(&self) -> PartyId {
        PartyId::from_verifying_key(&self.key.verifying_key())
    }

    /// Sign the id of `tx`.
    #[must_use]
    pub fn sign(&self, tx_id: &TxId) -> Signature {
        self.key.sign(tx_id.as_bytes())
    }
}

impl fmt::Debug for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Party")
            .field("name", &self.name)
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// WireTransaction
// ---------------------------------------------------------------------------

/// Unsigned transaction as built by a flow and submitted to the notary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireTransaction {
    id: TxId,
    inputs: Vec<StateRef>,
    outputs: Vec<LedgerState>,
    command: Command,
    required_signers: BTreeSet<PartyId>,
    privacy_salt: [u8; 32],
}

#[derive(Serialize)]
struct SigningPayload<'a> {
    inputs: &'a [StateRef],
    outputs: &'a [LedgerState],
    command: Command,
    required_signers: &'a BTreeSet<PartyId>,
    privacy_salt: String,
}

impl WireTransaction {
    /// Build a transaction with a random privacy salt.
    ///
    /// # Errors
    /// `Serialization` if the signing payload cannot be encoded.
    pub fn new(
        inputs: Vec<StateRef>,
        outputs: Vec<LedgerState>,
        command: Command,
        required_signers: BTreeSet<PartyId>,
    ) -> Result<Self> {
        Self::with_salt(inputs, outputs, command, required_signers, rand::random())
    }

    /// Build a transaction with a caller-chosen salt.
    ///
    /// # Errors
    /// `Serialization` if the signing payload cannot be encoded.
    pub fn with_salt(
        inputs: Vec<StateRef>,
        outputs: Vec<LedgerState>,
        command: Command,
        required_signers: BTreeSet<PartyId>,
        privacy_salt: [u8; 32],
    ) -> Result<Self> {
        let id = Self::compute_id(&inputs, &outputs, command, &required_signers, &privacy_salt)?;
        Ok(Self {
            id,
            inputs,
            outputs,
            command,
            required_signers,
            privacy_salt,
        })
    }

    fn compute_id(
        inputs: &[StateRef],
        outputs: &[LedgerState],
        command: Command,
        required_signers: &BTreeSet<PartyId>,
        privacy_salt: &[u8; 32],
    ) -> Result<TxId> {
        let payload = serde_json::to_vec(&SigningPayload {
            inputs,
            outputs,
            command,
            required_signers,
            privacy_salt: hex::encode(privacy_salt),
        })?;

        let mut hasher = Sha256::new();
        hasher.update(constants::TX_ID_DOMAIN);
        hasher.update(&payload);
        Ok(TxId(hasher.finalize().into()))
    }

    #[must_use]
    pub fn id(&self) -> TxId {
        self.id
    }

    #[must_use]
    pub fn inputs(&self) -> &[StateRef] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[LedgerState] {
        &self.outputs
    }

    #[must_use]
    pub fn command(&self) -> Command {
        self.command
    }

    #[must_use]
    pub fn required_signers(&self) -> &BTreeSet<PartyId> {
        &self.required_signers
    }
}

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// A wire transaction plus the signatures collected so far.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    tx: WireTransaction,
    signatures: BTreeMap<PartyId, Signature>,
}

impl SignedTransaction {
    #[must_use]
    pub fn new(tx: WireTransaction) -> Self {
        Self {
            tx,
            signatures: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn tx(&self) -> &WireTransaction {
        &self.tx
    }

    #[must_use]
    pub fn id(&self) -> TxId {
        self.tx.id
    }

    /// Add `party`'s signature.
    ///
    /// # Errors
    /// [`LedgerError::UnexpectedSigner`] if `party` is not a required signer.
    pub fn sign_by(&mut self, party: &Party) -> Result<()> {
        let party_id = party.id();
        if !self.tx.required_signers.contains(&party_id) {
            return Err(LedgerError::UnexpectedSigner(party_id));
        }
        self.signatures.insert(party_id, party.sign(&self.tx.id));
        Ok(())
    }

    /// Builder form of [`SignedTransaction::sign_by`] over several parties.
    ///
    /// # Errors
    /// Same as [`SignedTransaction::sign_by`].
    pub fn signed_by<'p>(mut self, parties: impl IntoIterator<Item = &'p Party>) -> Result<Self> {
        for party in parties {
            self.sign_by(party)?;
        }
        Ok(self)
    }

    /// Attach a signature as received from elsewhere, unchecked.
    pub fn add_signature(&mut self, party: PartyId, signature: Signature) {
        self.signatures.insert(party, signature);
    }

    /// Parties that have attached a signature, verified or not.
    pub fn signers(&self) -> impl Iterator<Item = &PartyId> {
        self.signatures.keys()
    }

    /// Verify every attached signature against the transaction id.
    ///
    /// # Errors
    /// [`LedgerError::InvalidSignature`] for the first signature that does not
    /// verify, or whose party id is not a valid ed25519 key.
    pub fn verify_signatures(&self) -> Result<BTreeSet<PartyId>> {
        for (party, signature) in &self.signatures {
            let key = party
                .verifying_key()
                .map_err(|_| LedgerError::InvalidSignature(*party))?;
            key.verify_strict(self.tx.id.as_bytes(), signature)
                .map_err(|_| LedgerError::InvalidSignature(*party))?;
        }
        Ok(self.signatures.keys().copied().collect())
    }

    /// Required signers with no signature attached.
    #[must_use]
    pub fn missing_signers(&self) -> Vec<PartyId> {
        self.tx
            .required_signers
            .iter()
            .filter(|party| !self.signatures.contains_key(*party))
            .copied()
            .collect()
    }

    /// Verify attached signatures, then require all required signers.
    ///
    /// # Errors
    /// `InvalidSignature` first, then `MissingSignatures`.
    pub fn verify_required_signatures(&self) -> Result<BTreeSet<PartyId>> {
        let verified = self.verify_signatures()?;
        let missing = self.missing_signers();
        if !missing.is_empty() {
            return Err(LedgerError::MissingSignatures { missing });
        }
        Ok(verified)
    }
}
