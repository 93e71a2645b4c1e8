/// One typed mutation function from the list `apply` applies atomically
/// (spec §4.B). Numeric ops carry their scalar argument pre-validated as a
/// raw attribute-encoded byte string; `apply` re-validates it against the
/// target's kind regardless, since a blocked/deferred update can carry an
/// op captured before a schema change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOp {
    Set(Vec<u8>),
    NumAdd(Vec<u8>),
    NumSub(Vec<u8>),
    NumMul(Vec<u8>),
    NumDiv(Vec<u8>),
    NumMod(Vec<u8>),
    NumAnd(Vec<u8>),
    NumOr(Vec<u8>),
    NumXor(Vec<u8>),
    StringPrepend(Vec<u8>),
    StringAppend(Vec<u8>),
    ListLpush(Vec<u8>),
    ListRpush(Vec<u8>),
    SetAdd(Vec<u8>),
    SetRemove(Vec<u8>),
    SetUnion(Vec<u8>),
    SetIntersect(Vec<u8>),
    MapAdd(Vec<u8>, Vec<u8>),
    MapRemove(Vec<u8>),
}

impl MutationOp {
    pub fn name(&self) -> &'static str {
        match self {
            MutationOp::Set(_) => "SET",
            MutationOp::NumAdd(_) => "NUM_ADD",
            MutationOp::NumSub(_) => "NUM_SUB",
            MutationOp::NumMul(_) => "NUM_MUL",
            MutationOp::NumDiv(_) => "NUM_DIV",
            MutationOp::NumMod(_) => "NUM_MOD",
            MutationOp::NumAnd(_) => "NUM_AND",
            MutationOp::NumOr(_) => "NUM_OR",
            MutationOp::NumXor(_) => "NUM_XOR",
            MutationOp::StringPrepend(_) => "STRING_PREPEND",
            MutationOp::StringAppend(_) => "STRING_APPEND",
            MutationOp::ListLpush(_) => "LIST_LPUSH",
            MutationOp::ListRpush(_) => "LIST_RPUSH",
            MutationOp::SetAdd(_) => "SET_ADD",
            MutationOp::SetRemove(_) => "SET_REMOVE",
            MutationOp::SetUnion(_) => "SET_UNION",
            MutationOp::SetIntersect(_) => "SET_INTERSECT",
            MutationOp::MapAdd(..) => "MAP_ADD",
            MutationOp::MapRemove(_) => "MAP_REMOVE",
        }
    }
}
