//! Chain replication (spec §4.G): per-key pending-write state, the
//! CHAIN_PUT/CHAIN_DEL/CHAIN_ACK/CHAIN_PENDING/CHAIN_SUBSPACE state
//! machine, and the stripe-locked table that holds one keyholder per
//! live (region, key) pair.

mod apply;
mod chain;
mod keyholder;
mod pending;
mod table;

pub use apply::apply_pending_op;
pub use chain::chain_hop;
pub use keyholder::{Action, AckDeferred, Keyholder};
pub use pending::{ClientOpHandle, NextHop, PendingOp, PendingRecord};
pub use table::{KeyholderTable, StripeGuard, DEFAULT_STRIPES};
