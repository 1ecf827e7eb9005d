//! System-wide constants for the SwapLedger ledger.

/// Length of a well-formed secret hash: SHA-256 rendered as lowercase hex.
pub const SECRET_HASH_HEX_LEN: usize = 64;

/// Minimum number of participants on any ledger state.
///
/// Every value state names its owner plus at least one counterparty, and an
/// escrow always names its sender and receiver.
pub const MIN_PARTICIPANTS: usize = 2;

/// Default decimal precision for the built-in assets.
pub const DEFAULT_ASSET_DECIMALS: u32 = 8;

/// Default escrow lock duration in seconds.
pub const DEFAULT_LOCK_DURATION_SECS: u64 = 60;

/// Number of notarised transaction ids the notary remembers.
pub const DEFAULT_NOTARY_HISTORY: usize = 500_000;

/// Domain separator for transaction ids.
pub const TX_ID_DOMAIN: &[u8] = b"swapledger:tx:v1:";

