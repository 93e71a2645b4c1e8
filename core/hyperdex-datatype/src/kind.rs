use std::fmt;

/// The attribute datatypes a space's schema may use (spec §3, §4.B).
///
/// `MacaroonSecret` is a string subtype that only ever accepts the `Set`
/// mutation; everything else about it — validation, comparison, hashing —
/// is identical to `String` (spec §9 Open Question (b): in the original
/// source `datatype_macaroon_secret` only supports `SET` and is otherwise
/// identical to string).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    String,
    MacaroonSecret,
    Int64,
    Float,
    ListString,
    ListInt64,
    ListFloat,
    SetString,
    SetInt64,
    SetFloat,
    MapStringString,
    MapStringInt64,
    MapStringFloat,
    MapInt64String,
    MapInt64Int64,
    MapInt64Float,
    MapFloatString,
    MapFloatInt64,
    MapFloatFloat,
}

impl DataType {
    /// Aggregate (list/set/map) attributes never contribute a useful
    /// secondary-hash dimension: the original only defines `_hash` for
    /// scalar types (spec §4.A supplement). `hyperdex-config` uses this to
    /// reject a subspace bitmask that selects one.
    pub fn is_aggregate(self) -> bool {
        !matches!(self, DataType::String | DataType::MacaroonSecret | DataType::Int64 | DataType::Float)
    }

    pub fn is_list(self) -> bool {
        matches!(self, DataType::ListString | DataType::ListInt64 | DataType::ListFloat)
    }

    pub fn is_set(self) -> bool {
        matches!(self, DataType::SetString | DataType::SetInt64 | DataType::SetFloat)
    }

    pub fn is_map(self) -> bool {
        matches!(
            self,
            DataType::MapStringString
                | DataType::MapStringInt64
                | DataType::MapStringFloat
                | DataType::MapInt64String
                | DataType::MapInt64Int64
                | DataType::MapInt64Float
                | DataType::MapFloatString
                | DataType::MapFloatInt64
                | DataType::MapFloatFloat
        )
    }

    /// The scalar type of a list/set's elements, or of a map's keys.
    pub fn element_kind(self) -> Option<DataType> {
        use DataType::*;
        Some(match self {
            ListString | SetString => String,
            ListInt64 | SetInt64 => Int64,
            ListFloat | SetFloat => Float,
            MapStringString | MapStringInt64 | MapStringFloat => String,
            MapInt64String | MapInt64Int64 | MapInt64Float => Int64,
            MapFloatString | MapFloatInt64 | MapFloatFloat => Float,
            _ => return None,
        })
    }

    /// The scalar type of a map's values. `None` for non-map types.
    pub fn map_value_kind(self) -> Option<DataType> {
        use DataType::*;
        Some(match self {
            MapStringString | MapInt64String | MapFloatString => String,
            MapStringInt64 | MapInt64Int64 | MapFloatInt64 => Int64,
            MapStringFloat | MapInt64Float | MapFloatFloat => Float,
            _ => return None,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl DataType {
    /// The token a space-definition line uses to name this type (spec §6's
    /// `space` record, extended with a `name:type` attribute form since the
    /// admin CLI / space-definition parser that would otherwise assign
    /// types is explicitly out of scope).
    pub fn token(self) -> &'static str {
        use DataType::*;
        match self {
            String => "string",
            MacaroonSecret => "macaroon_secret",
            Int64 => "int64",
            Float => "float",
            ListString => "list_string",
            ListInt64 => "list_int64",
            ListFloat => "list_float",
            SetString => "set_string",
            SetInt64 => "set_int64",
            SetFloat => "set_float",
            MapStringString => "map_string_string",
            MapStringInt64 => "map_string_int64",
            MapStringFloat => "map_string_float",
            MapInt64String => "map_int64_string",
            MapInt64Int64 => "map_int64_int64",
            MapInt64Float => "map_int64_float",
            MapFloatString => "map_float_string",
            MapFloatInt64 => "map_float_int64",
            MapFloatFloat => "map_float_float",
        }
    }

    pub fn from_token(token: &str) -> Option<DataType> {
        use DataType::*;
        Some(match token {
            "string" => String,
            "macaroon_secret" => MacaroonSecret,
            "int64" => Int64,
            "float" => Float,
            "list_string" => ListString,
            "list_int64" => ListInt64,
            "list_float" => ListFloat,
            "set_string" => SetString,
            "set_int64" => SetInt64,
            "set_float" => SetFloat,
            "map_string_string" => MapStringString,
            "map_string_int64" => MapStringInt64,
            "map_string_float" => MapStringFloat,
            "map_int64_string" => MapInt64String,
            "map_int64_int64" => MapInt64Int64,
            "map_int64_float" => MapInt64Float,
            "map_float_string" => MapFloatString,
            "map_float_int64" => MapFloatInt64,
            "map_float_float" => MapFloatFloat,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod token_tests {
    use super::*;

    #[test]
    fn every_variant_round_trips_through_its_token() {
        let all = [
            DataType::String,
            DataType::MacaroonSecret,
            DataType::Int64,
            DataType::Float,
            DataType::ListString,
            DataType::ListInt64,
            DataType::ListFloat,
            DataType::SetString,
            DataType::SetInt64,
            DataType::SetFloat,
            DataType::MapStringString,
            DataType::MapStringInt64,
            DataType::MapStringFloat,
            DataType::MapInt64String,
            DataType::MapInt64Int64,
            DataType::MapInt64Float,
            DataType::MapFloatString,
            DataType::MapFloatInt64,
            DataType::MapFloatFloat,
        ];
        for kind in all {
            assert_eq!(DataType::from_token(kind.token()), Some(kind));
        }
    }

    #[test]
    fn unknown_token_is_none() {
        assert_eq!(DataType::from_token("bogus"), None);
    }
}
