//! Subspace selection (spec §4.I step 1): pick the subspace whose
//! attribute bitmask best covers the predicate's equality/range
//! attributes, so as much of the predicate as possible collapses into a
//! region-prefix match instead of a residual filter.

use crate::predicate::Predicate;
use hyperdex_config::Subspace;

/// Scores a subspace by how many of the predicate's clauses it covers,
/// weighting equality clauses (which can pin an exact coordinate) above
/// range clauses (which only narrow the residual filter).
fn coverage_score(subspace: &Subspace, predicate: &Predicate) -> usize {
    let mut score = 0;
    for clause in &predicate.clauses {
        if subspace.mask.get(clause.attr_index).copied().unwrap_or(false) {
            score += if clause.is_equality() { 2 } else { 1 };
        }
    }
    score
}

/// Picks the best-covering subspace from `candidates`; ties favor the
/// earliest (lowest-numbered) subspace, matching a coordinator-assigned
/// subspace 0's precedence for an unconstrained predicate.
pub fn select_subspace<'a>(candidates: &'a [Subspace], predicate: &Predicate) -> Option<&'a Subspace> {
    candidates.iter().max_by_key(|s| (coverage_score(s, predicate), std::cmp::Reverse(s.number)))
}

/// True iff every attribute this subspace's mask selects is pinned by an
/// equality clause in the predicate — the case where a single exact
/// coordinate (and therefore a single region) can be computed instead of
/// scanning every region of the subspace.
pub fn is_fully_pinned(subspace: &Subspace, predicate: &Predicate) -> bool {
    let equal: std::collections::HashSet<usize> = predicate.equality_attrs().collect();
    subspace.attr_indices().iter().all(|i| equal.contains(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Clause, ClauseOp};
    use hyperdex_datatype::encode_int64;
    use hyperdex_ids::SpaceId;

    fn subspace(space: SpaceId, number: u16, mask: &[bool]) -> Subspace {
        Subspace { space, number, mask: mask.to_vec() }
    }

    #[test]
    fn prefers_the_subspace_covering_more_equality_clauses() {
        let space = SpaceId::new(1);
        let key_only = subspace(space, 0, &[true, false, false]);
        let second_attr = subspace(space, 1, &[false, true, false]);
        let predicate = Predicate { clauses: vec![Clause { attr_index: 1, op: ClauseOp::Equals(encode_int64(5)) }] };

        let chosen = select_subspace(&[key_only, second_attr.clone()], &predicate).unwrap();
        assert_eq!(chosen.number, second_attr.number);
    }

    #[test]
    fn a_fully_pinned_subspace_is_detected() {
        let space = SpaceId::new(1);
        let ss = subspace(space, 1, &[false, true, false]);
        let predicate = Predicate { clauses: vec![Clause { attr_index: 1, op: ClauseOp::Equals(encode_int64(5)) }] };
        assert!(is_fully_pinned(&ss, &predicate));

        let partial_predicate = Predicate {
            clauses: vec![Clause { attr_index: 1, op: ClauseOp::Range { lower: None, upper: None } }],
        };
        assert!(!is_fully_pinned(&ss, &partial_predicate));
    }
}
