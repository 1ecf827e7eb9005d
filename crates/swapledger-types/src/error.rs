//! Error types for SwapLedger.
//!
//! All errors use the `SL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Transition violations (validator outcomes)
//! - 2xx: State construction errors
//! - 3xx: Funds errors
//! - 4xx: State store errors
//! - 5xx: Signing errors
//! - 6xx: Notary / sequencing errors
//! - 9xx: General / internal errors

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PartyId, TxId};

// =====================================================================
// Transition violations (1xx)
// =====================================================================

/// Category of a rejected transition, without the rule label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Wrong count or type of inputs, outputs or commands.
    Structural,
    /// Participant set mismatch, or a mandated party is not a participant.
    Participant,
    /// A required signer is missing.
    Signature,
    /// Unsupported or mismatched asset code.
    Asset,
    /// Non-positive amount, overflow, or input/output sum mismatch.
    Conservation,
    /// `secret_hash` is not a 64-character lowercase hex digest.
    HashFormat,
    /// Missing or non-matching preimage.
    Secret,
    /// Locktime ordering rule broken.
    Timing,
}

impl ViolationKind {
    /// Tag this kind with the label of the rule that failed.
    #[must_use]
    pub fn with_reason(self, reason: impl Into<String>) -> Violation {
        let reason = reason.into();
        match self {
            Self::Structural => Violation::Structural { reason },
            Self::Participant => Violation::Participant { reason },
            Self::Signature => Violation::Signature { reason },
            Self::Asset => Violation::Asset { reason },
            Self::Conservation => Violation::Conservation { reason },
            Self::HashFormat => Violation::HashFormat { reason },
            Self::Secret => Violation::Secret { reason },
            Self::Timing => Violation::Timing { reason },
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => write!(f, "STRUCTURAL"),
            Self::Participant => write!(f, "PARTICIPANT"),
            Self::Signature => write!(f, "SIGNATURE"),
            Self::Asset => write!(f, "ASSET"),
            Self::Conservation => write!(f, "CONSERVATION"),
            Self::HashFormat => write!(f, "HASH_FORMAT"),
            Self::Secret => write!(f, "SECRET"),
            Self::Timing => write!(f, "TIMING"),
        }
    }
}

/// The first rule a candidate transaction violated.
///
/// Violations are deterministic and never retryable: the same transaction
/// validated at the same instant against the same registry always produces
/// the same violation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Violation {
    #[error("SL_ERR_100: Structural violation: {reason}")]
    Structural { reason: String },

    #[error("SL_ERR_101: Participant violation: {reason}")]
    Participant { reason: String },

    #[error("SL_ERR_102: Signature violation: {reason}")]
    Signature { reason: String },

    #[error("SL_ERR_103: Asset violation: {reason}")]
    Asset { reason: String },

    #[error("SL_ERR_104: Conservation violation: {reason}")]
    Conservation { reason: String },

    #[error("SL_ERR_105: Hash format violation: {reason}")]
    HashFormat { reason: String },

    #[error("SL_ERR_106: Secret violation: {reason}")]
    Secret { reason: String },

    #[error("SL_ERR_107: Timing violation: {reason}")]
    Timing { reason: String },
}

impl Violation {
    #[must_use]
    pub fn kind(&self) -> ViolationKind {
        match self {
            Self::Structural { .. } => ViolationKind::Structural,
            Self::Participant { .. } => ViolationKind::Participant,
            Self::Signature { .. } => ViolationKind::Signature,
            Self::Asset { .. } => ViolationKind::Asset,
            Self::Conservation { .. } => ViolationKind::Conservation,
            Self::HashFormat { .. } => ViolationKind::HashFormat,
            Self::Secret { .. } => ViolationKind::Secret,
            Self::Timing { .. } => ViolationKind::Timing,
        }
    }

    /// Label of the rule that failed.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Structural { reason }
            | Self::Participant { reason }
            | Self::Signature { reason }
            | Self::Asset { reason }
            | Self::Conservation { reason }
            | Self::HashFormat { reason }
            | Self::Secret { reason }
            | Self::Timing { reason } => reason,
        }
    }
}

// =====================================================================
// Ledger errors (2xx..9xx)
// =====================================================================

/// Central error enum for everything outside the validator.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =================================================================
    // State Errors (2xx)
    // =================================================================
    /// A state failed its construction-time invariants.
    #[error("SL_ERR_200: Invalid state: {reason}")]
    InvalidState { reason: String },

    // =================================================================
    // Funds Errors (3xx)
    // =================================================================
    /// The party does not own enough unconsumed value of the asset.
    #[error("SL_ERR_301: Insufficient funds of {asset}: need {needed}, have {available}")]
    InsufficientFunds {
        asset: String,
        needed: u64,
        available: u64,
    },

    /// No unconsumed state satisfies the query a builder needed.
    #[error("SL_ERR_302: No matching state: {reason}")]
    NoMatchingState { reason: String },

    // =================================================================
    // State Store Errors (4xx)
    // =================================================================
    /// A state reference does not resolve to any recorded state.
    #[error("SL_ERR_400: Unknown state reference: {0}")]
    UnknownState(String),

    // =================================================================
    // Signing Errors (5xx)
    // =================================================================
    /// An attached signature did not verify.
    #[error("SL_ERR_500: Invalid signature from {0}")]
    InvalidSignature(PartyId),

    /// Required signers have not signed yet.
    #[error("SL_ERR_501: Missing signatures from {} parties", .missing.len())]
    MissingSignatures { missing: Vec<PartyId> },

    /// A party tried to sign a transaction it is not a required signer of.
    #[error("SL_ERR_502: Unexpected signer {0}")]
    UnexpectedSigner(PartyId),

    // =================================================================
    // Notary Errors (6xx)
    // =================================================================
    /// The validator rejected the transaction.
    #[error("SL_ERR_600: Transaction rejected: {0}")]
    Rejected(#[from] Violation),

    /// An input is already consumed or repeated within the transaction.
    #[error("SL_ERR_601: Double spend of {state}")]
    DoubleSpend { state: String },

    /// This transaction id has already been notarised.
    #[error("SL_ERR_602: Transaction already notarised: {0}")]
    AlreadyNotarised(TxId),

    /// Supply conservation invariant violated. Critical safety alert.
    #[error("SL_ERR_603: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config, empty registry, etc.).
    #[error("SL_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_display_contains_code_and_reason() {
        let v = ViolationKind::Secret.with_reason("valid secret must be provided");
        let msg = format!("{v}");
        assert!(msg.starts_with("SL_ERR_106"), "Got: {msg}");
        assert!(msg.contains("valid secret must be provided"));
    }

    #[test]
    fn kind_roundtrips_through_violation() {
        let kinds = [
            ViolationKind::Structural,
            ViolationKind::Participant,
            ViolationKind::Signature,
            ViolationKind::Asset,
            ViolationKind::Conservation,
            ViolationKind::HashFormat,
            ViolationKind::Secret,
            ViolationKind::Timing,
        ];
        for kind in kinds {
            let v = kind.with_reason("label");
            assert_eq!(v.kind(), kind);
            assert_eq!(v.reason(), "label");
        }
    }

    #[test]
    fn violation_converts_into_ledger_error() {
        let err: LedgerError = ViolationKind::Timing.with_reason("expired").into();
        let msg = format!("{err}");
        assert!(msg.starts_with("SL_ERR_600"), "Got: {msg}");
        assert!(msg.contains("SL_ERR_107"));
    }

    #[test]
    fn insufficient_funds_display() {
        let err = LedgerError::InsufficientFunds {
            asset: "BTC".into(),
            needed: 100,
            available: 50,
        };
        let msg = format!("{err}");
        assert!(msg.contains("SL_ERR_301"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn all_errors_have_sl_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(LedgerError::InvalidState {
                reason: "x".into(),
            }),
            Box::new(LedgerError::UnknownState("ref".into())),
            Box::new(LedgerError::MissingSignatures {
                missing: vec![PartyId::dummy(1)],
            }),
            Box::new(LedgerError::AlreadyNotarised(TxId([0; 32]))),
            Box::new(LedgerError::Internal("test".into())),
            Box::new(ViolationKind::Asset.with_reason("DOGE")),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("SL_ERR_"),
                "Error missing SL_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn violation_serde_roundtrip() {
        let v = ViolationKind::Conservation.with_reason("sum mismatch");
        let json = serde_json::to_string(&v).unwrap();
        let back: Violation = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
