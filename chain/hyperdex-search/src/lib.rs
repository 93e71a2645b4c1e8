//! The search executor (spec §4.I): subspace selection by predicate
//! coverage, coordinate-mask narrowing to matched regions, per-region
//! snapshot scanning with residual-predicate filtering, and client-facing
//! pagination.

mod cursor;
mod error;
mod executor;
mod predicate;
mod select;

pub use cursor::SearchCursor;
pub use error::SearchError;
pub use executor::{execute, matched_regions, scan_region, SearchItem};
pub use predicate::{Clause, ClauseOp, Predicate};
pub use select::{is_fully_pinned, select_subspace};
