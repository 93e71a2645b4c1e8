/// Errors rejecting a coordinator configuration (spec §4.E, §6). Parsing is
/// strict: any single malformed or unknown line invalidates the *entire*
/// version, so every variant here carries enough context to explain the
/// rejection back to the coordinator (`BAD\n`) and to a human in the log.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("line {line_no}: unrecognized record kind {kind:?}")]
    UnknownLineKind { line_no: usize, kind: String },

    #[error("line {line_no}: malformed {kind} record: {reason}")]
    MalformedLine { line_no: usize, kind: &'static str, reason: String },

    #[error("configuration is missing the `end\\tof\\tline` trailer")]
    MissingTrailer,

    #[error("region references undefined host {host_id:#x}")]
    UnknownHost { host_id: u64 },

    #[error("region references undefined space {space_name:?}")]
    UnknownSpace { space_name: String },

    #[error("region references undefined subspace {subspace_num} of space {space_name:?}")]
    UnknownSubspace { space_name: String, subspace_num: u16 },

    #[error(
        "subspace {subspace_num} of space {space_name:?} selects aggregate-typed attribute \
         {attr:?}, which cannot contribute a secondary-hash dimension"
    )]
    AggregateAttributeInSubspace { space_name: String, subspace_num: u16, attr: String },

    #[error(
        "regions of {subspace} do not exactly tile the hyperspace: {detail}"
    )]
    RegionsDoNotTile { subspace: String, detail: String },

    #[error("new configuration version {new} does not exceed previous version {prev}")]
    NonMonotonicVersion { prev: u64, new: u64 },

    #[error("key {key_hex} would have more than one head of subspace 0 under this configuration")]
    AmbiguousPointLeader { key_hex: String },
}
