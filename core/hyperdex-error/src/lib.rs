//! The error taxonomy of spec §7, split one enum per propagation boundary
//! the way `near-store`'s `StoreOpenerError` and `near-primitives`'s
//! `TxExecutionError` split theirs: client-facing status codes, the
//! datatype apply/validate errors, the storage-shard result codes, and
//! configuration parse failures.

mod apply;
mod config;
mod status;
mod store;

pub use apply::ApplyError;
pub use config::ConfigError;
pub use status::StatusCode;
pub use store::StoreError;

/// Raised when a keyholder state machine observes a condition that can only
/// follow from a bug or on-disk corruption (spec §7, "Fatal"). These are not
/// propagated as `Result`s: the caller aborts the daemon, trusting the chain
/// to recover the region via a fresh replica.
#[derive(Debug, thiserror::Error)]
#[error("replication invariant violated: {0}")]
pub struct InvariantViolation(pub String);

impl InvariantViolation {
    pub fn new(message: impl Into<String>) -> Self {
        InvariantViolation(message.into())
    }
}
