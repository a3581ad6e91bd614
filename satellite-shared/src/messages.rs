//! Inter-node message envelope.
//!
//! Framing, addressing, and transport are handled by the message dispatcher
//! collaborator (see `satellite::dispatcher`) and are out of scope here.
//! This module only defines the payload shapes the satellite manager
//! produces and consumes.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A peer satellite reachable via `CONNECT_DIRECTIVE`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerSatellite {
    pub address: Address,
    pub ip: String,
}

/// A fully resolved node parameter value, ready to hand to the container.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Str(String),
    Float(f64),
    Bool(bool),
    File(String),
}

/// One message type per wire-level interface the satellite manager sends
/// or receives. Variants carry exactly the fields that type needs;
/// framing/addressing metadata is added by the dispatcher, not here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Message {
    /// sat -> master, empty payload.
    IdRequest,
    /// master -> sat.
    IdResponse { address: Address },
    /// sat -> master, fire-and-forget.
    IdDelete { address: Address },
    /// master -> sat.
    ConnectDirective { peers: Vec<PeerSatellite> },
    /// sat -> self/adapter.
    StartContainer { address: Address, home_dir: String },
    /// sat -> self/adapter.
    StopContainer { address: Address },
    /// sat <-> sat: the set of local container addresses the sender
    /// announces as routable through it.
    RouteInfo { addresses: Vec<Address> },
    /// sat -> container: a fully resolved node definition.
    RosAdd {
        node_id: String,
        package: String,
        executable: String,
        params: HashMap<String, ParamValue>,
    },
    /// sat -> container.
    RosRemove { node_id: String },
    /// sat <-> sat, sat <-> container.
    RosMsg {
        interface: String,
        payload: Vec<u8>,
    },
}

/// Discriminant of [`Message`], used by the dispatcher to route inbound
/// traffic to a registered processor without matching on the full payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    IdRequest,
    IdResponse,
    IdDelete,
    ConnectDirective,
    StartContainer,
    StopContainer,
    RouteInfo,
    RosAdd,
    RosRemove,
    RosMsg,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::IdRequest => MessageKind::IdRequest,
            Message::IdResponse { .. } => MessageKind::IdResponse,
            Message::IdDelete { .. } => MessageKind::IdDelete,
            Message::ConnectDirective { .. } => MessageKind::ConnectDirective,
            Message::StartContainer { .. } => MessageKind::StartContainer,
            Message::StopContainer { .. } => MessageKind::StopContainer,
            Message::RouteInfo { .. } => MessageKind::RouteInfo,
            Message::RosAdd { .. } => MessageKind::RosAdd,
            Message::RosRemove { .. } => MessageKind::RosRemove,
            Message::RosMsg { .. } => MessageKind::RosMsg,
        }
    }
}
