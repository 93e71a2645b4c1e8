//! The wire message catalog (spec §6, §4.F, §4.G, §4.H): one byte tag per
//! message type, matching the original's `network_msgtype` enum one for
//! one so every chain/transfer/client message this system speaks has a
//! stable wire identity.

use hyperdex_error::StatusCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    ReqGet = 1,
    RespGet = 2,
    ReqPut = 3,
    ReqDel = 4,
    RespStatus = 5,
    ReqSearchStart = 6,
    ReqSearchNext = 7,
    ReqSearchStop = 8,
    RespSearchItem = 9,
    ChainPut = 10,
    ChainDel = 11,
    ChainSubspace = 12,
    ChainPending = 13,
    ChainAck = 14,
    XferMore = 15,
    XferData = 16,
    XferDone = 17,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MessageTypeError {
    #[error("unrecognized message type tag {0}")]
    Unknown(u8),
}

impl MessageType {
    pub fn from_tag(tag: u8) -> Result<MessageType, MessageTypeError> {
        use MessageType::*;
        Ok(match tag {
            1 => ReqGet,
            2 => RespGet,
            3 => ReqPut,
            4 => ReqDel,
            5 => RespStatus,
            6 => ReqSearchStart,
            7 => ReqSearchNext,
            8 => ReqSearchStop,
            9 => RespSearchItem,
            10 => ChainPut,
            11 => ChainDel,
            12 => ChainSubspace,
            13 => ChainPending,
            14 => ChainAck,
            15 => XferMore,
            16 => XferData,
            17 => XferDone,
            other => return Err(MessageTypeError::Unknown(other)),
        })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

pub(crate) fn status_tag(status: StatusCode) -> u8 {
    match status {
        StatusCode::Success => 0,
        StatusCode::NotFound => 1,
        StatusCode::WrongArity => 2,
        StatusCode::NotASpace => 3,
        StatusCode::BadSearch => 4,
        StatusCode::CoordFail => 5,
        StatusCode::ServerError => 6,
        StatusCode::ConnectFail => 7,
        StatusCode::Disconnect => 8,
        StatusCode::Reconfigure => 9,
        StatusCode::LogicError => 10,
        StatusCode::CmpFail => 11,
        StatusCode::Overflow => 12,
    }
}

pub(crate) fn status_from_tag(tag: u8) -> Option<StatusCode> {
    use StatusCode::*;
    Some(match tag {
        0 => Success,
        1 => NotFound,
        2 => WrongArity,
        3 => NotASpace,
        4 => BadSearch,
        5 => CoordFail,
        6 => ServerError,
        7 => ConnectFail,
        8 => Disconnect,
        9 => Reconfigure,
        10 => LogicError,
        11 => CmpFail,
        12 => Overflow,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_message_type_round_trips_through_its_tag() {
        let all = [
            MessageType::ReqGet,
            MessageType::RespGet,
            MessageType::ReqPut,
            MessageType::ReqDel,
            MessageType::RespStatus,
            MessageType::ReqSearchStart,
            MessageType::ReqSearchNext,
            MessageType::ReqSearchStop,
            MessageType::RespSearchItem,
            MessageType::ChainPut,
            MessageType::ChainDel,
            MessageType::ChainSubspace,
            MessageType::ChainPending,
            MessageType::ChainAck,
            MessageType::XferMore,
            MessageType::XferData,
            MessageType::XferDone,
        ];
        for mt in all {
            assert_eq!(MessageType::from_tag(mt.tag()).unwrap(), mt);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(MessageType::from_tag(200), Err(MessageTypeError::Unknown(200)));
    }

    #[test]
    fn every_status_code_round_trips_through_its_tag() {
        let all = [
            StatusCode::Success,
            StatusCode::NotFound,
            StatusCode::WrongArity,
            StatusCode::NotASpace,
            StatusCode::BadSearch,
            StatusCode::CoordFail,
            StatusCode::ServerError,
            StatusCode::ConnectFail,
            StatusCode::Disconnect,
            StatusCode::Reconfigure,
            StatusCode::LogicError,
            StatusCode::CmpFail,
            StatusCode::Overflow,
        ];
        for status in all {
            assert_eq!(status_from_tag(status_tag(status)), Some(status));
        }
    }
}
