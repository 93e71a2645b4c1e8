/// The client-visible status codes of spec §6
/// (`network_returncode`/`hyperclient_returncode`). Exactly one of these is
/// returned per client operation, alongside the original nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success,
    NotFound,
    WrongArity,
    NotASpace,
    BadSearch,
    CoordFail,
    ServerError,
    ConnectFail,
    Disconnect,
    Reconfigure,
    LogicError,
    CmpFail,
    Overflow,
}

impl StatusCode {
    pub const fn is_success(self) -> bool {
        matches!(self, StatusCode::Success)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusCode::Success => "SUCCESS",
            StatusCode::NotFound => "NOTFOUND",
            StatusCode::WrongArity => "WRONGARITY",
            StatusCode::NotASpace => "NOTASPACE",
            StatusCode::BadSearch => "BADSEARCH",
            StatusCode::CoordFail => "COORDFAIL",
            StatusCode::ServerError => "SERVERERROR",
            StatusCode::ConnectFail => "CONNECTFAIL",
            StatusCode::Disconnect => "DISCONNECT",
            StatusCode::Reconfigure => "RECONFIGURE",
            StatusCode::LogicError => "LOGICERROR",
            StatusCode::CmpFail => "CMPFAIL",
            StatusCode::Overflow => "OVERFLOW",
        };
        f.write_str(s)
    }
}

impl From<super::ApplyError> for StatusCode {
    fn from(e: super::ApplyError) -> Self {
        match e {
            super::ApplyError::WrongType => StatusCode::WrongArity,
            super::ApplyError::Malformed => StatusCode::LogicError,
            super::ApplyError::Overflow => StatusCode::Overflow,
            super::ApplyError::WrongAction => StatusCode::WrongArity,
        }
    }
}

impl From<super::StoreError> for StatusCode {
    fn from(e: super::StoreError) -> Self {
        match e {
            super::StoreError::NotFound => StatusCode::NotFound,
            super::StoreError::DataFull
            | super::StoreError::HashFull
            | super::StoreError::SearchFull => StatusCode::ServerError,
        }
    }
}
