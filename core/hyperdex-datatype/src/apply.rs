use crate::aggregate::{map_add, map_remove, set_add, set_intersect, set_remove, set_union};
use crate::kind::DataType;
use crate::op::MutationOp;
use crate::scalar::{decode_float, decode_int64, encode_float, encode_int64};
use crate::validate::validate;
use hyperdex_error::ApplyError;

/// Apply every op in `ops` to `old` in order, atomically: if any op fails,
/// `old` is returned untouched inside the error and nothing is partially
/// applied (spec §4.B: "atomically apply a list of typed mutation
/// functions"). Errors are checked in the order the spec prescribes: is the
/// action supported by this datatype (`WRONGACTION`)/does the argument's
/// implied type match (`WRONGTYPE`), then is the argument well-formed
/// (`MALFORMED`), then does the semantic operation succeed (`OVERFLOW`).
pub fn apply(old: &[u8], ops: &[MutationOp], kind: DataType) -> Result<Vec<u8>, ApplyError> {
    let mut current = old.to_vec();
    for op in ops {
        current = apply_one(&current, op, kind)?;
    }
    Ok(current)
}

fn apply_one(old: &[u8], op: &MutationOp, kind: DataType) -> Result<Vec<u8>, ApplyError> {
    match op {
        MutationOp::Set(arg) => {
            if !validate(kind, arg) {
                return Err(ApplyError::WrongType);
            }
            Ok(arg.clone())
        }
        MutationOp::NumAdd(arg) => numeric(old, arg, kind, NumOp::Add),
        MutationOp::NumSub(arg) => numeric(old, arg, kind, NumOp::Sub),
        MutationOp::NumMul(arg) => numeric(old, arg, kind, NumOp::Mul),
        MutationOp::NumDiv(arg) => numeric(old, arg, kind, NumOp::Div),
        MutationOp::NumMod(arg) => numeric(old, arg, kind, NumOp::Mod),
        MutationOp::NumAnd(arg) => bitwise(old, arg, kind, BitOp::And),
        MutationOp::NumOr(arg) => bitwise(old, arg, kind, BitOp::Or),
        MutationOp::NumXor(arg) => bitwise(old, arg, kind, BitOp::Xor),
        MutationOp::StringPrepend(arg) => {
            require_string(kind)?;
            if !validate(DataType::String, arg) {
                return Err(ApplyError::Malformed);
            }
            let mut new = arg.clone();
            new.extend_from_slice(old);
            Ok(new)
        }
        MutationOp::StringAppend(arg) => {
            require_string(kind)?;
            if !validate(DataType::String, arg) {
                return Err(ApplyError::Malformed);
            }
            let mut new = old.to_vec();
            new.extend_from_slice(arg);
            Ok(new)
        }
        MutationOp::ListLpush(arg) => {
            let elem_kind = require_list(kind)?;
            if !validate(elem_kind, arg) {
                return Err(ApplyError::Malformed);
            }
            let mut elems = crate::aggregate::decode_elements(old).ok_or(ApplyError::Malformed)?;
            elems.insert(0, arg.clone());
            Ok(crate::aggregate::encode_elements(&elems))
        }
        MutationOp::ListRpush(arg) => {
            let elem_kind = require_list(kind)?;
            if !validate(elem_kind, arg) {
                return Err(ApplyError::Malformed);
            }
            let mut elems = crate::aggregate::decode_elements(old).ok_or(ApplyError::Malformed)?;
            elems.push(arg.clone());
            Ok(crate::aggregate::encode_elements(&elems))
        }
        MutationOp::SetAdd(arg) => {
            let elem_kind = require_set(kind)?;
            if !validate(elem_kind, arg) {
                return Err(ApplyError::Malformed);
            }
            set_add(old, arg.clone(), elem_kind).ok_or(ApplyError::Malformed)
        }
        MutationOp::SetRemove(arg) => {
            let elem_kind = require_set(kind)?;
            if !validate(elem_kind, arg) {
                return Err(ApplyError::Malformed);
            }
            set_remove(old, arg, elem_kind).ok_or(ApplyError::Malformed)
        }
        MutationOp::SetUnion(arg) => {
            let elem_kind = require_set(kind)?;
            if !crate::aggregate::validate_set(arg, elem_kind) {
                return Err(ApplyError::Malformed);
            }
            set_union(old, arg, elem_kind).ok_or(ApplyError::Malformed)
        }
        MutationOp::SetIntersect(arg) => {
            let elem_kind = require_set(kind)?;
            if !crate::aggregate::validate_set(arg, elem_kind) {
                return Err(ApplyError::Malformed);
            }
            set_intersect(old, arg, elem_kind).ok_or(ApplyError::Malformed)
        }
        MutationOp::MapAdd(key, val) => {
            let (key_kind, val_kind) = require_map(kind)?;
            if !validate(key_kind, key) || !validate(val_kind, val) {
                return Err(ApplyError::Malformed);
            }
            map_add(old, key.clone(), val.clone(), key_kind).ok_or(ApplyError::Malformed)
        }
        MutationOp::MapRemove(key) => {
            let (key_kind, _val_kind) = require_map(kind)?;
            if !validate(key_kind, key) {
                return Err(ApplyError::Malformed);
            }
            map_remove(old, key, key_kind).ok_or(ApplyError::Malformed)
        }
    }
}

enum NumOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

enum BitOp {
    And,
    Or,
    Xor,
}

fn numeric(old: &[u8], arg: &[u8], kind: DataType, op: NumOp) -> Result<Vec<u8>, ApplyError> {
    match kind {
        DataType::Int64 => {
            if !validate(DataType::Int64, arg) {
                return Err(ApplyError::Malformed);
            }
            let a = decode_int64(old).ok_or(ApplyError::Malformed)?;
            let b = decode_int64(arg).ok_or(ApplyError::Malformed)?;
            let result = match op {
                NumOp::Add => a.checked_add(b),
                NumOp::Sub => a.checked_sub(b),
                NumOp::Mul => a.checked_mul(b),
                NumOp::Div => a.checked_div(b),
                NumOp::Mod => a.checked_rem(b),
            };
            Ok(encode_int64(result.ok_or(ApplyError::Overflow)?))
        }
        DataType::Float => {
            if !validate(DataType::Float, arg) {
                return Err(ApplyError::Malformed);
            }
            let a = decode_float(old).ok_or(ApplyError::Malformed)?;
            let b = decode_float(arg).ok_or(ApplyError::Malformed)?;
            let result = match op {
                NumOp::Add => a + b,
                NumOp::Sub => a - b,
                NumOp::Mul => a * b,
                NumOp::Div => a / b,
                NumOp::Mod => a % b,
            };
            if result.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(ApplyError::Overflow);
            }
            Ok(encode_float(result))
        }
        _ => Err(ApplyError::WrongAction),
    }
}

fn bitwise(old: &[u8], arg: &[u8], kind: DataType, op: BitOp) -> Result<Vec<u8>, ApplyError> {
    if kind != DataType::Int64 {
        return Err(ApplyError::WrongAction);
    }
    if !validate(DataType::Int64, arg) {
        return Err(ApplyError::Malformed);
    }
    let a = decode_int64(old).ok_or(ApplyError::Malformed)?;
    let b = decode_int64(arg).ok_or(ApplyError::Malformed)?;
    let result = match op {
        BitOp::And => a & b,
        BitOp::Or => a | b,
        BitOp::Xor => a ^ b,
    };
    Ok(encode_int64(result))
}

fn require_string(kind: DataType) -> Result<(), ApplyError> {
    if kind == DataType::String {
        Ok(())
    } else {
        Err(ApplyError::WrongAction)
    }
}

fn require_list(kind: DataType) -> Result<DataType, ApplyError> {
    if kind.is_list() {
        Ok(kind.element_kind().expect("list kind has an element kind"))
    } else {
        Err(ApplyError::WrongAction)
    }
}

fn require_set(kind: DataType) -> Result<DataType, ApplyError> {
    if kind.is_set() {
        Ok(kind.element_kind().expect("set kind has an element kind"))
    } else {
        Err(ApplyError::WrongAction)
    }
}

fn require_map(kind: DataType) -> Result<(DataType, DataType), ApplyError> {
    if kind.is_map() {
        Ok((
            kind.element_kind().expect("map kind has a key kind"),
            kind.map_value_kind().expect("map kind has a value kind"),
        ))
    } else {
        Err(ApplyError::WrongAction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{decode_elements, encode_elements};

    #[test]
    fn set_replaces_value_when_well_formed() {
        let out = apply(&encode_int64_old(1), &[MutationOp::Set(encode_int64(9))], DataType::Int64).unwrap();
        assert_eq!(decode_int64(&out), Some(9));
    }

    #[test]
    fn set_rejects_malformed_argument() {
        let err = apply(&encode_int64_old(1), &[MutationOp::Set(vec![1, 2, 3])], DataType::Int64).unwrap_err();
        assert_eq!(err, ApplyError::WrongType);
    }

    #[test]
    fn num_add_overflows() {
        let err = apply(
            &encode_int64(i64::MAX),
            &[MutationOp::NumAdd(encode_int64(1))],
            DataType::Int64,
        )
        .unwrap_err();
        assert_eq!(err, ApplyError::Overflow);
    }

    #[test]
    fn string_append_on_int64_is_wrong_action() {
        let err = apply(&encode_int64(1), &[MutationOp::StringAppend(b"x".to_vec())], DataType::Int64)
            .unwrap_err();
        assert_eq!(err, ApplyError::WrongAction);
    }

    #[test]
    fn macaroon_secret_only_accepts_set() {
        let old = b"secret".to_vec();
        let ok = apply(&old, &[MutationOp::Set(b"new-secret".to_vec())], DataType::MacaroonSecret).unwrap();
        assert_eq!(ok, b"new-secret");
        let err = apply(&old, &[MutationOp::StringAppend(b"x".to_vec())], DataType::MacaroonSecret)
            .unwrap_err();
        assert_eq!(err, ApplyError::WrongAction);
    }

    #[test]
    fn multiple_ops_apply_atomically() {
        let old = encode_int64(10);
        let ops = vec![MutationOp::NumAdd(encode_int64(5)), MutationOp::NumMul(encode_int64(2))];
        let out = apply(&old, &ops, DataType::Int64).unwrap();
        assert_eq!(decode_int64(&out), Some(30));

        // A failing op partway through must not be partially applied to
        // the value returned to the caller: the whole call errors.
        let ops = vec![MutationOp::NumAdd(encode_int64(5)), MutationOp::NumDiv(encode_int64(0))];
        let err = apply(&old, &ops, DataType::Int64).unwrap_err();
        assert_eq!(err, ApplyError::Overflow);
    }

    #[test]
    fn list_lpush_and_rpush() {
        let old = encode_elements(&[b"b".to_vec()]);
        let out = apply(&old, &[MutationOp::ListLpush(b"a".to_vec())], DataType::ListString).unwrap();
        let out = apply(&out, &[MutationOp::ListRpush(b"c".to_vec())], DataType::ListString).unwrap();
        assert_eq!(
            decode_elements(&out).unwrap(),
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
    }

    fn encode_int64_old(v: i64) -> Vec<u8> {
        encode_int64(v)
    }
}
