//! The coordinator configuration and placement layer (spec §4.E): parses
//! the line-based configuration the coordinator publishes, validates it as
//! a whole, and derives the chain-hop and routing facts the replication
//! and transport layers need. Does not speak to a coordinator itself —
//! only the receiving half of that protocol lives here, the way
//! `near-chain-configs` models the genesis/client config a node receives
//! without modeling how it propagates across the network.

mod configuration;
mod host;
mod parser;
mod region;
mod schema;
mod transfer;
mod version;

pub use configuration::Configuration;
pub use host::Host;
pub use region::Region;
pub use schema::{Attribute, Space, Subspace};
pub use transfer::Transfer;
pub use version::ConfigVersion;
