//! The hashing and ordered-encoding layer (spec §4.A): turns a key and its
//! attributes into the primary/secondary hash coordinates the placement
//! and storage layers route and partition on. Knows nothing about schemas,
//! regions, or wire formats — `hyperdex-config` and `hyperdex-store` build
//! on top of these pure functions.

mod coordinate;
mod encoding;
mod interleave;

pub use coordinate::{attribute_enc, coordinate, primary_hash, secondary_hash, Coordinate};
pub use encoding::{
    hash_string, ordered_decode_double, ordered_decode_int64, ordered_encode_double,
    ordered_encode_int64,
};
pub use interleave::{interleave_bits, shares};
