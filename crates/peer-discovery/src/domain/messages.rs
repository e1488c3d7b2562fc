//! Discovery message model.
//!
//! These are the typed events exchanged with the transport collaborator,
//! which owns encoding and signatures. Every inbound message has already been
//! decoded and signature-verified; `node_id` is the identity recovered from
//! that signature.

use std::fmt;
use std::net::SocketAddr;

use rand::Rng;
use uuid::{Builder, Uuid};

use super::entities::{Node, NodeId};

/// Correlation id of a request/response pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Draw a fresh random (v4) id from the given source.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(Builder::from_random_bytes(rng.gen()).into_uuid())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Discovery message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Liveness request.
    Ping = 0x01,
    /// Response to a PING, copies its id.
    Pong = 0x02,
    /// Request for nodes close to a target id.
    FindNode = 0x03,
    /// Response to a FIND_NODE, copies its id.
    Neighbors = 0x04,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping => write!(f, "PING"),
            Self::Pong => write!(f, "PONG"),
            Self::FindNode => write!(f, "FIND_NODE"),
            Self::Neighbors => write!(f, "NEIGHBORS"),
        }
    }
}

/// Fields every discovery payload carries, used for response correlation.
pub trait DiscoveryPayload {
    const MESSAGE_TYPE: MessageType;

    fn message_id(&self) -> MessageId;

    /// Identity of the sender.
    fn node_id(&self) -> &NodeId;

    fn network_id(&self) -> Option<u32>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingMessage {
    pub message_id: MessageId,
    pub node_id: NodeId,
    /// Address the sender advertises for itself.
    pub host: String,
    pub port: u16,
    pub network_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PongMessage {
    pub message_id: MessageId,
    pub node_id: NodeId,
    pub network_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindNodeMessage {
    pub message_id: MessageId,
    pub node_id: NodeId,
    /// Id whose neighborhood is requested.
    pub target: NodeId,
    pub network_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborsMessage {
    pub message_id: MessageId,
    pub node_id: NodeId,
    pub nodes: Vec<Node>,
    pub network_id: Option<u32>,
}

macro_rules! impl_payload {
    ($ty:ty, $kind:expr) => {
        impl DiscoveryPayload for $ty {
            const MESSAGE_TYPE: MessageType = $kind;

            fn message_id(&self) -> MessageId {
                self.message_id
            }

            fn node_id(&self) -> &NodeId {
                &self.node_id
            }

            fn network_id(&self) -> Option<u32> {
                self.network_id
            }
        }
    };
}

impl_payload!(PingMessage, MessageType::Ping);
impl_payload!(PongMessage, MessageType::Pong);
impl_payload!(FindNodeMessage, MessageType::FindNode);
impl_payload!(NeighborsMessage, MessageType::Neighbors);

/// Any discovery message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMessage {
    Ping(PingMessage),
    Pong(PongMessage),
    FindNode(FindNodeMessage),
    Neighbors(NeighborsMessage),
}

impl DiscoveryMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Ping(_) => MessageType::Ping,
            Self::Pong(_) => MessageType::Pong,
            Self::FindNode(_) => MessageType::FindNode,
            Self::Neighbors(_) => MessageType::Neighbors,
        }
    }

    pub fn message_id(&self) -> MessageId {
        match self {
            Self::Ping(m) => m.message_id,
            Self::Pong(m) => m.message_id,
            Self::FindNode(m) => m.message_id,
            Self::Neighbors(m) => m.message_id,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Ping(m) => &m.node_id,
            Self::Pong(m) => &m.node_id,
            Self::FindNode(m) => &m.node_id,
            Self::Neighbors(m) => &m.node_id,
        }
    }

    pub fn network_id(&self) -> Option<u32> {
        match self {
            Self::Ping(m) => m.network_id,
            Self::Pong(m) => m.network_id,
            Self::FindNode(m) => m.network_id,
            Self::Neighbors(m) => m.network_id,
        }
    }
}

/// A message paired with the remote address it came from or goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEvent {
    pub message: DiscoveryMessage,
    pub address: SocketAddr,
}

impl DiscoveryEvent {
    pub fn new(message: DiscoveryMessage, address: SocketAddr) -> Self {
        Self { message, address }
    }
}
