/// Errors from the attribute apply/validate contract (spec §4.B). Checked in
/// order: type, then value well-formedness, then semantic — callers must
/// preserve that order so a malformed-but-right-typed argument is never
/// mistakenly reported as a type error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// The mutation argument's datatype mismatches the target attribute.
    #[error("WRONGTYPE: argument datatype mismatches target")]
    WrongType,
    /// The argument fails `validate` for its claimed datatype.
    #[error("MALFORMED: argument fails validate")]
    Malformed,
    /// A numeric mutation over/underflowed.
    #[error("OVERFLOW: numeric mutation over/underflowed")]
    Overflow,
    /// The mutation op is not supported by the target datatype.
    #[error("WRONGACTION: mutation not supported by this datatype")]
    WrongAction,
}
