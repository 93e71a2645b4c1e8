use crate::host::Host;
use crate::parser::{parse_lines, Builder};
use crate::region::Region;
use crate::schema::Space;
use crate::transfer::Transfer;
use crate::version::ConfigVersion;
use hyperdex_datatype::DataType;
use hyperdex_error::ConfigError;
use hyperdex_ids::{RegionId, SpaceId, SubspaceId, VirtualServerId};
use std::collections::BTreeMap;

/// A fully parsed, internally consistent cluster configuration (spec
/// §4.E): the hosts, spaces, subspaces, regions, and pending transfers the
/// coordinator has published, plus the derivations the replication and
/// transport layers need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    pub version: ConfigVersion,
    pub(crate) hosts: std::collections::HashMap<u32, Host>,
    pub(crate) spaces_by_name: std::collections::HashMap<String, SpaceId>,
    pub(crate) spaces: std::collections::HashMap<SpaceId, Space>,
    pub(crate) subspaces: std::collections::HashMap<SubspaceId, crate::schema::Subspace>,
    pub(crate) regions: std::collections::HashMap<RegionId, Region>,
    pub(crate) transfers: std::collections::HashMap<u16, Transfer>,
}

impl Configuration {
    /// Parses a coordinator line stream into a configuration, rejecting it
    /// wholesale on the first bad line, an incomplete tiling of any
    /// subspace, or a version that does not strictly exceed `prev`'s.
    pub fn parse(
        version: ConfigVersion,
        text: &str,
        prev: Option<&Configuration>,
    ) -> Result<Configuration, ConfigError> {
        if let Some(prev) = prev {
            if version <= prev.version {
                return Err(ConfigError::NonMonotonicVersion { prev: prev.version.0, new: version.0 });
            }
        }

        let Builder { hosts, spaces_by_name, spaces, subspaces, regions, transfers } =
            parse_lines(text)?;

        check_tiling(&subspaces, &regions)?;

        Ok(Configuration { version, hosts, spaces_by_name, spaces, subspaces, regions, transfers })
    }

    pub fn host(&self, id: u32) -> Option<&Host> {
        self.hosts.get(&id)
    }

    pub fn space(&self, name: &str) -> Option<&Space> {
        let id = self.spaces_by_name.get(name)?;
        self.spaces.get(id)
    }

    pub fn space_by_id(&self, id: SpaceId) -> Option<&Space> {
        self.spaces.get(&id)
    }

    pub fn subspace(&self, id: SubspaceId) -> Option<&crate::schema::Subspace> {
        self.subspaces.get(&id)
    }

    pub fn subspace_count(&self, space: SpaceId) -> u16 {
        self.subspaces.keys().filter(|s| s.space == space).count() as u16
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn region_for_point(&self, subspace: SubspaceId, point: u64) -> Option<&Region> {
        self.regions.values().find(|r| r.id.subspace == subspace && r.id.contains(point))
    }

    /// Every region tiling `subspace`, for a search executor that must
    /// consider every candidate region rather than a single point.
    pub fn regions_of(&self, subspace: SubspaceId) -> Vec<&Region> {
        self.regions.values().filter(|r| r.id.subspace == subspace).collect()
    }

    /// `head(region)`: the entity at replica index 0.
    pub fn head(&self, region: RegionId) -> Option<VirtualServerId> {
        self.region(region).map(|_| VirtualServerId::new(region, 0))
    }

    /// `tail(region)`: the entity at the last replica index.
    pub fn tail(&self, region: RegionId) -> Option<VirtualServerId> {
        let r = self.region(region)?;
        let last = r.chain.len().checked_sub(1)? as u8;
        Some(VirtualServerId::new(region, last))
    }

    /// `next(entity)`: the following hop in this region's chain, or `None`
    /// at the tail.
    pub fn next(&self, entity: VirtualServerId) -> Option<VirtualServerId> {
        let r = self.region(entity.region)?;
        let next_index = entity.index as usize + 1;
        if next_index < r.chain.len() {
            Some(VirtualServerId::new(entity.region, next_index as u8))
        } else {
            None
        }
    }

    /// `prev(entity)`: the preceding hop in this region's chain, or `None`
    /// at the head.
    pub fn prev(&self, entity: VirtualServerId) -> Option<VirtualServerId> {
        if entity.index == 0 {
            None
        } else {
            Some(VirtualServerId::new(entity.region, entity.index - 1))
        }
    }

    /// The host currently serving `entity`, under this configuration.
    pub fn instance_of(&self, entity: VirtualServerId) -> Option<&Host> {
        let r = self.region(entity.region)?;
        let host_id = *r.chain.get(entity.index as usize)?;
        self.host(host_id)
    }

    /// The region of subspace 0 (and therefore the point leader) that owns
    /// `key`, found from its primary hash.
    pub fn region_for_key(
        &self,
        space_name: &str,
        key_kind: DataType,
        key: &[u8],
    ) -> Result<&Region, ConfigError> {
        let space_id = self.space_id(space_name)?;
        let point = hyperdex_hash::primary_hash(key_kind, key);
        let subspace = SubspaceId::key_subspace(space_id);
        self.region_for_point(subspace, point)
            .ok_or_else(|| ConfigError::UnknownSubspace { space_name: space_name.to_string(), subspace_num: 0 })
    }

    /// `chain_next_subspace(key)`: once a write commits at the tail of
    /// subspace `current_subspace_num`, the head entity of the next
    /// subspace's region that the new attribute values hash into — or
    /// `None` once every subspace has been walked (spec §4.E, §4.G).
    pub fn chain_next_subspace(
        &self,
        space_name: &str,
        current_subspace_num: u16,
        attr_kinds: &[DataType],
        attr_values: &[&[u8]],
    ) -> Result<Option<VirtualServerId>, ConfigError> {
        let space_id = self.space_id(space_name)?;
        let next_num = current_subspace_num + 1;
        if next_num >= self.subspace_count(space_id) {
            return Ok(None);
        }
        let next_id = SubspaceId::new(space_id, next_num);
        let subspace = self
            .subspaces
            .get(&next_id)
            .ok_or_else(|| ConfigError::UnknownSubspace { space_name: space_name.to_string(), subspace_num: next_num })?;
        let mask = subspace.attr_indices();
        let point = hyperdex_hash::secondary_hash(attr_kinds, attr_values, &mask);
        let region = self
            .region_for_point(next_id, point)
            .ok_or_else(|| ConfigError::UnknownSubspace { space_name: space_name.to_string(), subspace_num: next_num })?;
        Ok(Some(VirtualServerId::new(region.id, 0)))
    }

    /// Transfers for which `host_id` is the sink (a new region replica
    /// being populated).
    pub fn transfers_to(&self, host_id: u32) -> Vec<&Transfer> {
        self.transfers.values().filter(|t| t.dest_host == host_id).collect()
    }

    /// Transfers for which `host_id` is the source: it currently serves
    /// the tail of the region being transferred.
    pub fn transfers_from(&self, host_id: u32) -> Vec<&Transfer> {
        self.transfers
            .values()
            .filter(|t| self.region(t.region).and_then(Region::tail_host) == Some(host_id))
            .collect()
    }

    /// The message-acceptance check every inbound message undergoes (spec
    /// §4.F): its embedded version must match this configuration, and its
    /// claimed destination must currently resolve to `local_host`.
    pub fn accepts_message(&self, msg_version: ConfigVersion, to: VirtualServerId, local_host: u32) -> bool {
        msg_version == self.version && self.instance_of(to).map(|h| h.id) == Some(local_host)
    }

    fn space_id(&self, name: &str) -> Result<SpaceId, ConfigError> {
        self.spaces_by_name
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownSpace { space_name: name.to_string() })
    }
}

fn check_tiling(
    subspaces: &std::collections::HashMap<SubspaceId, crate::schema::Subspace>,
    regions: &std::collections::HashMap<RegionId, Region>,
) -> Result<(), ConfigError> {
    let mut by_subspace: BTreeMap<SubspaceId, Vec<&Region>> = BTreeMap::new();
    for region in regions.values() {
        by_subspace.entry(region.id.subspace).or_default().push(region);
    }

    for subspace_id in subspaces.keys() {
        by_subspace.entry(*subspace_id).or_default();
    }

    for (subspace_id, mut regions) in by_subspace {
        if regions.is_empty() {
            continue;
        }
        regions.sort_by_key(|r| r.id.prefix);

        let mut expected: u128 = 0;
        for region in &regions {
            if region.id.prefix as u128 != expected {
                if subspace_id.is_key_subspace() {
                    return Err(ConfigError::AmbiguousPointLeader { key_hex: format!("{:016x}", expected) });
                }
                return Err(ConfigError::RegionsDoNotTile {
                    subspace: subspace_id.to_string(),
                    detail: format!("gap before {}", region.id),
                });
            }
            let span: u128 = 1u128 << (64 - region.id.prefix_len as u32);
            expected += span;
        }
        if expected != 1u128 << 64 {
            return Err(ConfigError::RegionsDoNotTile {
                subspace: subspace_id.to_string(),
                detail: "regions do not cover the full hyperspace".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> &'static str {
        "host 1 127.0.0.1 2000 1 2001 1\n\
         host 2 127.0.0.1 3000 1 3001 1\n\
         space 1 people key:string value:int64\n\
         subspace people 0 key\n\
         subspace people 1 value\n\
         region people 0 0 0 1 2\n\
         region people 1 0 0 1\n\
         end\tof\tline"
    }

    #[test]
    fn parses_and_derives_chain_hops() {
        let cfg = Configuration::parse(ConfigVersion(1), minimal(), None).unwrap();
        let region = cfg.region_for_point(SubspaceId::key_subspace(SpaceId::new(1)), 0).unwrap();
        let head = cfg.head(region.id).unwrap();
        let tail = cfg.tail(region.id).unwrap();
        assert!(head.is_head());
        assert_eq!(cfg.next(head), Some(tail));
        assert_eq!(cfg.prev(tail), Some(head));
        assert_eq!(cfg.next(tail), None);
    }

    #[test]
    fn rejects_non_monotonic_version() {
        let cfg = Configuration::parse(ConfigVersion(5), minimal(), None).unwrap();
        let err = Configuration::parse(ConfigVersion(5), minimal(), Some(&cfg)).unwrap_err();
        assert!(matches!(err, ConfigError::NonMonotonicVersion { .. }));
    }

    #[test]
    fn rejects_incomplete_tiling() {
        let text = "host 1 127.0.0.1 2000 1 2001 1\n\
                    space 1 people key:string\n\
                    subspace people 0 key\n\
                    region people 0 1 0000000000000000 1\n\
                    end\tof\tline";
        let err = Configuration::parse(ConfigVersion(1), text, None).unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousPointLeader { .. }));
    }

    #[test]
    fn accepts_message_checks_version_and_destination() {
        let cfg = Configuration::parse(ConfigVersion(1), minimal(), None).unwrap();
        let region = cfg.region_for_point(SubspaceId::key_subspace(SpaceId::new(1)), 0).unwrap();
        let head = cfg.head(region.id).unwrap();
        assert!(cfg.accepts_message(ConfigVersion(1), head, 1));
        assert!(!cfg.accepts_message(ConfigVersion(2), head, 1));
        assert!(!cfg.accepts_message(ConfigVersion(1), head, 2));
    }

    #[test]
    fn transfers_to_and_from_partition_by_role() {
        let text = "host 1 127.0.0.1 2000 1 2001 1\n\
                    host 2 127.0.0.1 3000 1 3001 1\n\
                    space 1 people key:string\n\
                    subspace people 0 key\n\
                    region people 0 0 0 1\n\
                    transfer 7 people 0 0 0 2\n\
                    end\tof\tline";
        let cfg = Configuration::parse(ConfigVersion(1), text, None).unwrap();
        assert_eq!(cfg.transfers_to(2).len(), 1);
        assert_eq!(cfg.transfers_from(1).len(), 1);
        assert_eq!(cfg.transfers_to(1).len(), 0);
    }
}
