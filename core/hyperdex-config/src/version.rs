use std::fmt;

/// The monotonically increasing version stamped on a configuration (spec
/// §4.E, §6). Distinct from `hyperdex_ids::Version`, which versions a
/// single key's value rather than the whole cluster configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigVersion(pub u64);

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config-v{}", self.0)
    }
}
