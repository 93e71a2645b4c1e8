use std::net::IpAddr;

/// A daemon the coordinator has admitted to the cluster (spec §6 `host`
/// record): an inbound address/version for chain and client messages, and
/// an outbound one used when this host originates a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Host {
    pub id: u32,
    pub ip: IpAddr,
    pub inbound_port: u16,
    pub inbound_version: u16,
    pub outbound_port: u16,
    pub outbound_version: u16,
}
