use crate::aggregate::{validate_list, validate_map, validate_set};
use crate::kind::DataType;
use crate::scalar::{validate_float, validate_int64, validate_string};

/// Is `bytes` a well-formed value of `kind`? (spec §4.B `validate`)
pub fn validate(kind: DataType, bytes: &[u8]) -> bool {
    use DataType::*;
    match kind {
        String | MacaroonSecret => validate_string(bytes),
        Int64 => validate_int64(bytes),
        Float => validate_float(bytes),
        ListString => validate_list(bytes, DataType::String),
        ListInt64 => validate_list(bytes, DataType::Int64),
        ListFloat => validate_list(bytes, DataType::Float),
        SetString => validate_set(bytes, DataType::String),
        SetInt64 => validate_set(bytes, DataType::Int64),
        SetFloat => validate_set(bytes, DataType::Float),
        MapStringString => validate_map(bytes, DataType::String, DataType::String),
        MapStringInt64 => validate_map(bytes, DataType::String, DataType::Int64),
        MapStringFloat => validate_map(bytes, DataType::String, DataType::Float),
        MapInt64String => validate_map(bytes, DataType::Int64, DataType::String),
        MapInt64Int64 => validate_map(bytes, DataType::Int64, DataType::Int64),
        MapInt64Float => validate_map(bytes, DataType::Int64, DataType::Float),
        MapFloatString => validate_map(bytes, DataType::Float, DataType::String),
        MapFloatInt64 => validate_map(bytes, DataType::Float, DataType::Int64),
        MapFloatFloat => validate_map(bytes, DataType::Float, DataType::Float),
    }
}
