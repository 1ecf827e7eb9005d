//! # swapledger-types
//!
//! Shared types, errors, and configuration for the **SwapLedger** ledger.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PartyId`], [`LinearId`], [`TxId`]
//! - **Assets**: [`Asset`], [`AssetRegistry`]
//! - **State model**: [`ValueState`], [`EscrowState`], [`EscrowPhase`], [`LedgerState`]
//! - **Transactions**: [`Command`], [`Transaction`]
//! - **Hash commitments**: [`hashlock::commit`], [`hashlock::verify`]
//! - **Configuration**: [`LedgerConfig`]
//! - **Errors**: [`Violation`] for rejected transitions, [`LedgerError`] for
//!   everything else, both with `SL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod asset;
pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod hashlock;
pub mod ids;
pub mod state;
pub mod transaction;

// Re-export all primary types at crate root for ergonomic imports:
//   use swapledger_types::{ValueState, EscrowState, Transaction, ...};

pub use asset::*;
pub use config::*;
pub use error::*;
pub use escrow::*;
pub use ids::*;
pub use state::*;
pub use transaction::*;

// Constants and hashlock helpers are accessed via their module paths
// (not re-exported to avoid name collisions).
