use std::fmt;

/// A 64-bit monotonically increasing version within a key. `ABSENT` (0)
/// means the key has no committed value (spec §3: "version 0 means
/// absent").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Version(pub u64);

impl Version {
    pub const ABSENT: Version = Version(0);

    pub const fn is_absent(self) -> bool {
        self.0 == 0
    }

    pub const fn is_present(self) -> bool {
        !self.is_absent()
    }

    /// The version a fresh successor update takes on. Per spec §9 Open
    /// Question (c) we never reuse a version for a key, even across a
    /// delete: the caller is expected to pass the last version ever seen
    /// for this key's bucket (from a retained tombstone), not merely the
    /// last *present* version.
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_version_zero() {
        assert!(Version::ABSENT.is_absent());
        assert!(!Version::ABSENT.is_present());
    }

    #[test]
    fn next_is_strictly_increasing() {
        let v = Version(41);
        assert_eq!(v.next(), Version(42));
        assert!(v.next() > v);
    }
}
