//! Turns a `Configuration`'s chain topology into the `NextHop` a keyholder
//! transition needs. Cross-subspace hops additionally need the new
//! attribute values and their datatypes to compute `chain_next_subspace`,
//! which this crate deliberately doesn't depend on
//! (`hyperdex-datatype`/`hyperdex-hash` stay out of the replication
//! layer); the daemon composes that call and passes the resulting
//! `NextHop::Subspace` in directly.

use crate::pending::NextHop;
use hyperdex_config::Configuration;
use hyperdex_ids::VirtualServerId;

/// The next hop within `at`'s own region chain, or `NextHop::None` at the
/// tail.
pub fn chain_hop(config: &Configuration, at: VirtualServerId) -> NextHop {
    match config.next(at) {
        Some(next) => NextHop::Chain(next),
        None => NextHop::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdex_config::ConfigVersion;

    fn minimal() -> &'static str {
        "host 1 127.0.0.1 2000 1 2001 1\n\
         space 1 people key:string value:int64\n\
         subspace people 0 key\n\
         region people 0 0 0 1\n\
         end\tof\tline"
    }

    #[test]
    fn the_tail_of_a_one_replica_chain_has_no_next_hop() {
        let cfg = Configuration::parse(ConfigVersion(1), minimal(), None).unwrap();
        let region = cfg
            .region_for_point(hyperdex_ids::SubspaceId::key_subspace(hyperdex_ids::SpaceId::new(1)), 0)
            .unwrap();
        let head = cfg.head(region.id).unwrap();
        assert_eq!(chain_hop(&cfg, head), NextHop::None);
    }
}
