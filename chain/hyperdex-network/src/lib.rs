//! The logical transport (spec §4.F): frames messages on the wire, checks
//! each inbound message's configuration version and destination before
//! handing it to the replication layer, and delivers outbound messages to
//! whichever host currently instantiates the destination entity. Grounded
//! on `src/hyperdex/network_*` for the envelope shape and on spec §9's
//! explicit instruction that the core stays synchronous — this crate never
//! pulls in an async runtime.

mod envelope;
mod message;
mod payload;
mod transport;

pub use envelope::{Envelope, FrameError, MAX_FRAME_LEN};
pub use message::{MessageType, MessageTypeError};
pub use payload::{
    ChainDel, ChainPut, ChainSubspace, ChainVersionedKey, PayloadError, ReqDel, ReqGet, ReqPut, RespGet,
    RespSearchItem, RespStatus, XferData, XferOp,
};
pub use transport::{ByteTransport, TcpTransport};
