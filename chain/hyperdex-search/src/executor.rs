//! The search executor (spec §4.I): once a subspace is chosen, resolve
//! it to a set of matched regions, scan each region's snapshot applying
//! the residual predicate, and hand back a paginated cursor.

use crate::error::SearchError;
use crate::predicate::Predicate;
use crate::select::{is_fully_pinned, select_subspace};
use hyperdex_config::{Region, Space, Subspace};
use hyperdex_datatype::DataType;
use hyperdex_hash::secondary_hash;
use hyperdex_ids::{RegionId, Version};
use hyperdex_store::RegionReplica;

/// One matched item, ready to serialize into `RESP_SEARCH_ITEM`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchItem {
    pub key: Vec<u8>,
    pub version: Version,
    pub values: Vec<Vec<u8>>,
}

/// Picks the regions of `subspace` a predicate can possibly match: the
/// single region containing the predicate's exact coordinate when every
/// one of the subspace's attributes is equality-pinned (spec §4.I step
/// 2: "matched regions are those whose prefix intersects the mask"),
/// or every region of the subspace otherwise — a conservative
/// over-approximation the residual filter narrows down during the scan.
pub fn matched_regions<'a>(
    space: &Space,
    subspace: &Subspace,
    regions: &'a [Region],
    predicate: &Predicate,
) -> Vec<&'a Region> {
    if is_fully_pinned(subspace, predicate) {
        let kinds = space.attr_kinds();
        let mut values: Vec<Option<Vec<u8>>> = vec![None; kinds.len()];
        for clause in &predicate.clauses {
            if let crate::predicate::ClauseOp::Equals(v) = &clause.op {
                values[clause.attr_index] = Some(v.clone());
            }
        }
        // Every selected attribute is pinned by construction of
        // `is_fully_pinned`, so these unwraps cannot fail.
        let refs: Vec<&[u8]> = values.iter().map(|v| v.as_deref().unwrap_or(&[])).collect();
        let mask = subspace.attr_indices();
        let point = secondary_hash(&kinds, &refs, &mask);
        return regions.iter().filter(|r| r.id.subspace == space_subspace_id(subspace, space) && r.id.contains(point)).collect();
    }
    regions.iter().filter(|r| r.id.subspace == space_subspace_id(subspace, space)).collect()
}

fn space_subspace_id(subspace: &Subspace, space: &Space) -> hyperdex_ids::SubspaceId {
    hyperdex_ids::SubspaceId::new(space.id, subspace.number)
}

/// Scans `region`'s snapshot applying the residual predicate, appending
/// matches to `out` in key order.
pub fn scan_region(space: &Space, region: &RegionReplica, predicate: &Predicate, out: &mut Vec<SearchItem>) {
    let kinds = space.attr_kinds();
    let mut snapshot = region.snapshot();
    snapshot.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, version, values) in snapshot {
        if predicate.matches(&kinds, &key, &values) {
            out.push(SearchItem { key, version, values });
        }
    }
}

/// Runs the full executor pipeline for one query: selects a subspace,
/// scans its matched regions, and returns the ordered match list a
/// [`crate::cursor::SearchCursor`] then paginates over.
pub fn execute(
    space: &Space,
    candidates: &[Subspace],
    regions: &[Region],
    region_replicas: &[(RegionId, &RegionReplica)],
    predicate: &Predicate,
) -> Result<Vec<SearchItem>, SearchError> {
    let subspace = select_subspace(candidates, predicate).ok_or(SearchError::NoCandidateSubspace)?;
    let matched = matched_regions(space, subspace, regions, predicate);

    let mut out = Vec::new();
    for region in matched {
        if let Some((_, replica)) = region_replicas.iter().find(|(id, _)| *id == region.id) {
            scan_region(space, replica, predicate, &mut out);
        }
    }
    out.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Clause, ClauseOp};
    use hyperdex_config::Attribute;
    use hyperdex_datatype::encode_int64;
    use hyperdex_ids::{SpaceId, SubspaceId};
    use hyperdex_store::{RegionReplicaConfig, ShardConfig};
    use tempfile::tempdir;

    fn space() -> Space {
        Space {
            id: SpaceId::new(1),
            name: "people".to_string(),
            attrs: vec![
                Attribute { name: "key".to_string(), kind: DataType::Int64 },
                Attribute { name: "age".to_string(), kind: DataType::Int64 },
            ],
        }
    }

    #[test]
    fn executes_an_unconstrained_predicate_over_a_single_region() {
        let space = space();
        let subspace = Subspace { space: space.id, number: 0, mask: vec![true, false] };
        let region_id = RegionId::new(SubspaceId::key_subspace(space.id), 0, 0);
        let region = Region { id: region_id, chain: vec![1] };

        let dir = tempdir().unwrap();
        let replica = RegionReplica::create(
            dir.path(),
            RegionReplicaConfig {
                initial_shard: ShardConfig { hash_table_entries: 8, search_index_entries: 32, data_segment_size: 4096 },
                shard_bits: 0,
            },
        )
        .unwrap();
        let key = encode_int64(1);
        replica.put(&key, 1, 1, Version(1), vec![encode_int64(30)]);

        let predicate = Predicate { clauses: vec![] };
        let items = execute(&space, &[subspace], &[region], &[(region_id, &replica)], &predicate).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, key);
    }

    #[test]
    fn a_fully_pinned_equality_predicate_narrows_to_one_region() {
        let space = space();
        let subspace = Subspace { space: space.id, number: 1, mask: vec![false, true] };
        let age_value = encode_int64(30);
        let point = secondary_hash(&space.attr_kinds(), &[&[], &age_value], &[1]);
        let (lo, hi) = RegionId::new(SubspaceId::new(space.id, 1), 0, 0).split();
        let matching_region_id = if lo.contains(point) { lo } else { hi };
        let regions = vec![Region { id: lo, chain: vec![1] }, Region { id: hi, chain: vec![1] }];

        let predicate = Predicate { clauses: vec![Clause { attr_index: 1, op: ClauseOp::Equals(age_value) }] };
        let matched = matched_regions(&space, &subspace, &regions, &predicate);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, matching_region_id);
    }
}
