//! # swapledger-validator
//!
//! **Pure transition rules for the SwapLedger.**
//!
//! The validator takes a candidate [`Transaction`](swapledger_types::Transaction),
//! an explicit "now" and the asset registry, and either accepts it or names
//! the first rule it breaks. It has:
//!
//! - **No side effects**: no storage, no clocks, no signature crypto
//! - **Deterministic output**: same input gives the same verdict everywhere
//! - **Ordered rules**: global checks, then the command's own checks
//!
//! Signature verification and input resolution belong to the ledger crate;
//! here `signers` is taken at face value.

pub mod commands;
pub mod global;
pub mod rules;
pub mod validator;

pub use commands::verify_command;
pub use global::{checked_sum, global_rules};
pub use rules::RuleChain;
pub use validator::validate;
