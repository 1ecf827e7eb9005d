//! # swapledger-ledger
//!
//! **Orchestration plane**: builds, signs and notarises transactions on top
//! of the pure validator.
//!
//! ## Architecture
//!
//! A swap moves through the plane as follows:
//! 1. A flow in [`flows`] reads the [`Vault`] and builds a [`WireTransaction`]
//! 2. Every required [`Party`] signs it, giving a [`SignedTransaction`]
//! 3. The [`Notary`] resolves inputs, rejects double spends, verifies
//!    signatures and runs the validator
//! 4. On success the notary commits: inputs consumed, outputs recorded,
//!    supply updated, sequence number assigned
//!
//! [`Notary::audit`] checks supply conservation at any point.

pub mod flows;
pub mod history;
pub mod notary;
pub mod signing;
pub mod supply;
pub mod vault;

pub use flows::LockRequest;
pub use history::NotaryHistory;
pub use notary::{NotarisedTx, Notary};
pub use signing::{Party, SignedTransaction, WireTransaction};
pub use supply::SupplyConservation;
pub use vault::{StateAndRef, StateRef, StateStore, Vault};
