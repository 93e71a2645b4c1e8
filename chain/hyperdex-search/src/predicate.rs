//! A conjunctive search predicate (spec §4.I): a set of per-attribute
//! clauses, each an equality or a bounded range, indexed the same way
//! `hyperdex-config::Space::attrs` is — index 0 is always the key.

use hyperdex_datatype::{compare, DataType};
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClauseOp {
    Equals(Vec<u8>),
    Range { lower: Option<(Vec<u8>, bool)>, upper: Option<(Vec<u8>, bool)> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub attr_index: usize,
    pub op: ClauseOp,
}

impl Clause {
    fn is_satisfied_by(&self, kind: DataType, value: &[u8]) -> bool {
        match &self.op {
            ClauseOp::Equals(expected) => compare(kind, value, expected) == Ordering::Equal,
            ClauseOp::Range { lower, upper } => {
                if let Some((bound, inclusive)) = lower {
                    let ord = compare(kind, value, bound);
                    if !(ord == Ordering::Greater || (*inclusive && ord == Ordering::Equal)) {
                        return false;
                    }
                }
                if let Some((bound, inclusive)) = upper {
                    let ord = compare(kind, value, bound);
                    if !(ord == Ordering::Less || (*inclusive && ord == Ordering::Equal)) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Only equality clauses pin a single point in a subspace's secondary
    /// hash space; a range clause can only ever be checked as a residual
    /// filter over a snapshot.
    pub fn is_equality(&self) -> bool {
        matches!(self.op, ClauseOp::Equals(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predicate {
    pub clauses: Vec<Clause>,
}

impl Predicate {
    /// `attr_kinds[0]` is the key's datatype; `attr_kinds[1..]` line up
    /// with `values`. Every clause must hold for the predicate to match.
    pub fn matches(&self, attr_kinds: &[DataType], key: &[u8], values: &[Vec<u8>]) -> bool {
        self.clauses.iter().all(|clause| {
            let value: &[u8] = if clause.attr_index == 0 { key } else { &values[clause.attr_index - 1] };
            clause.is_satisfied_by(attr_kinds[clause.attr_index], value)
        })
    }

    pub fn equality_attrs(&self) -> impl Iterator<Item = usize> + '_ {
        self.clauses.iter().filter(|c| c.is_equality()).map(|c| c.attr_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdex_datatype::encode_int64;

    #[test]
    fn an_equals_clause_matches_only_the_exact_value() {
        let clause = Clause { attr_index: 1, op: ClauseOp::Equals(encode_int64(5)) };
        assert!(clause.is_satisfied_by(DataType::Int64, &encode_int64(5)));
        assert!(!clause.is_satisfied_by(DataType::Int64, &encode_int64(6)));
    }

    #[test]
    fn a_range_clause_respects_inclusivity_at_both_ends() {
        let clause = Clause {
            attr_index: 1,
            op: ClauseOp::Range { lower: Some((encode_int64(0), true)), upper: Some((encode_int64(10), false)) },
        };
        assert!(clause.is_satisfied_by(DataType::Int64, &encode_int64(0)));
        assert!(clause.is_satisfied_by(DataType::Int64, &encode_int64(9)));
        assert!(!clause.is_satisfied_by(DataType::Int64, &encode_int64(10)));
        assert!(!clause.is_satisfied_by(DataType::Int64, &encode_int64(-1)));
    }

    #[test]
    fn predicate_matching_checks_every_clause() {
        let predicate = Predicate {
            clauses: vec![
                Clause { attr_index: 0, op: ClauseOp::Equals(encode_int64(1)) },
                Clause { attr_index: 1, op: ClauseOp::Equals(encode_int64(2)) },
            ],
        };
        let kinds = [DataType::Int64, DataType::Int64];
        assert!(predicate.matches(&kinds, &encode_int64(1), &[encode_int64(2)]));
        assert!(!predicate.matches(&kinds, &encode_int64(1), &[encode_int64(3)]));
    }
}
