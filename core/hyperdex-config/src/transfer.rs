use hyperdex_ids::RegionId;

/// A pending region transfer (spec §4.H, §6 `transfer` record): `region`
/// is gaining a new replica, `dest_host`, which will become the sink; the
/// region's current tail is the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub xfer_id: u16,
    pub region: RegionId,
    pub dest_host: u32,
}
