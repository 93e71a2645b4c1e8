//! The transfer source (spec §4.H step 2): holds an ordered snapshot of a
//! region and drains it as a sequence of `XFER_DATA` messages. Grounded
//! on `hyperdex-store::RegionReplica::snapshot`'s own doc comment ("a
//! point-in-time view... for search and transfer") — this is that
//! second consumer.

use hyperdex_ids::Version;
use hyperdex_network::{XferData, XferOp};

/// Drains a region's snapshot in key order, one `XFER_DATA` per call.
/// The source's normal writes continue underneath; the snapshot itself
/// is a stable, already-materialized `Vec` so later writes to the region
/// never perturb what this yields (spec §4.H: "the snapshot yields a
/// stable key-ordered view").
pub struct Source {
    entries: std::vec::IntoIter<(Vec<u8>, Version, Vec<Vec<u8>>)>,
    next_seq: u64,
}

impl Source {
    pub fn new(mut entries: Vec<(Vec<u8>, Version, Vec<Vec<u8>>)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Source { entries: entries.into_iter(), next_seq: 0 }
    }

    /// The next `XFER_DATA` to send, or `None` once the snapshot is
    /// exhausted — the caller should send `XFER_DONE` at that point.
    pub fn next_message(&mut self) -> Option<XferData> {
        let (key, version, values) = self.entries.next()?;
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(XferData { seq, op: XferOp::Put, version, key, values })
    }

    pub fn is_exhausted(&self) -> bool {
        self.entries.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_entries_in_key_order_with_contiguous_sequence_numbers() {
        let mut source = Source::new(vec![
            (b"b".to_vec(), Version(1), vec![b"vb".to_vec()]),
            (b"a".to_vec(), Version(2), vec![b"va".to_vec()]),
        ]);
        let first = source.next_message().unwrap();
        assert_eq!(first.key, b"a");
        assert_eq!(first.seq, 0);
        let second = source.next_message().unwrap();
        assert_eq!(second.key, b"b");
        assert_eq!(second.seq, 1);
        assert!(source.next_message().is_none());
        assert!(source.is_exhausted());
    }
}
