use crate::aggregate::{compare_list, compare_map};
use crate::kind::DataType;
use crate::scalar::{compare_float, compare_int64, compare_string};
use std::cmp::Ordering;

/// The total order used for list/set element ordering and for range
/// searches (spec §4.B `compare`). Aggregate types order lexicographically
/// over their decoded elements, falling back to length when one is a
/// prefix of the other, the same rule `Vec<T>`'s own `Ord` impl uses.
pub fn compare(kind: DataType, lhs: &[u8], rhs: &[u8]) -> Ordering {
    use DataType::*;
    match kind {
        String | MacaroonSecret => compare_string(lhs, rhs),
        Int64 => compare_int64(lhs, rhs),
        Float => compare_float(lhs, rhs),
        ListString | SetString => compare_list(lhs, rhs, DataType::String),
        ListInt64 | SetInt64 => compare_list(lhs, rhs, DataType::Int64),
        ListFloat | SetFloat => compare_list(lhs, rhs, DataType::Float),
        MapStringString => compare_map(lhs, rhs, DataType::String, DataType::String),
        MapStringInt64 => compare_map(lhs, rhs, DataType::String, DataType::Int64),
        MapStringFloat => compare_map(lhs, rhs, DataType::String, DataType::Float),
        MapInt64String => compare_map(lhs, rhs, DataType::Int64, DataType::String),
        MapInt64Int64 => compare_map(lhs, rhs, DataType::Int64, DataType::Int64),
        MapInt64Float => compare_map(lhs, rhs, DataType::Int64, DataType::Float),
        MapFloatString => compare_map(lhs, rhs, DataType::Float, DataType::String),
        MapFloatInt64 => compare_map(lhs, rhs, DataType::Float, DataType::Int64),
        MapFloatFloat => compare_map(lhs, rhs, DataType::Float, DataType::Float),
    }
}
