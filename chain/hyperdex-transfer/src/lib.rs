//! The transfer manager (spec §4.H): copies a region's contents from its
//! existing replicas to a newly provisioned one while writes continue,
//! via an ordered source-side snapshot drain and a sink-side hold/replay
//! of live chain writes.

mod error;
mod sink;
mod source;

pub use error::TransferError;
pub use sink::{HeldWrite, Sink, SinkAction};
pub use source::Source;
