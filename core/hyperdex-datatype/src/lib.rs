//! Per-attribute value semantics (spec §4.B): for each datatype, a
//! `validate`/`apply`/`compare` contract. This crate has no notion of
//! schemas, keys, or regions — only of encoded byte slices and their
//! datatype tag — so it is shared unchanged by the hashing, configuration,
//! storage, and replication layers.

mod aggregate;
mod apply;
mod compare;
mod kind;
mod op;
mod scalar;
mod validate;

pub use apply::apply;
pub use compare::compare;
pub use kind::DataType;
pub use op::MutationOp;
pub use validate::validate;

pub use aggregate::{decode_elements, decode_pairs, encode_elements, encode_pairs};
pub use scalar::{decode_float, decode_int64, encode_float, encode_int64};
