//! Locating entities in the remote object graph and walking its references.

pub mod resolver;
pub mod walker;

use crate::error::EntityKind;
use grpcscope_proto::{Channel, Server, Socket, Subchannel};

pub use resolver::resolve;
pub use walker::{
    all_subchannels, expand_channel, expand_server, expand_subchannel, fetch_socket,
    listen_sockets,
};

/// A fetched record an operator can select by ID (and for some kinds, by target).
pub trait Entity {
    const KIND: EntityKind;

    fn id(&self) -> i64;

    /// `None` for kinds that have no target string.
    fn target(&self) -> Option<&str>;
}

impl Entity for Channel {
    const KIND: EntityKind = EntityKind::Channel;

    fn id(&self) -> i64 {
        self.r#ref.as_ref().map_or(0, |r| r.channel_id)
    }

    fn target(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.target.as_str())
    }
}

impl Entity for Subchannel {
    const KIND: EntityKind = EntityKind::Subchannel;

    fn id(&self) -> i64 {
        self.r#ref.as_ref().map_or(0, |r| r.subchannel_id)
    }

    fn target(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.target.as_str())
    }
}

impl Entity for Server {
    const KIND: EntityKind = EntityKind::Server;

    fn id(&self) -> i64 {
        self.r#ref.as_ref().map_or(0, |r| r.server_id)
    }

    fn target(&self) -> Option<&str> {
        None
    }
}

impl Entity for Socket {
    const KIND: EntityKind = EntityKind::Socket;

    fn id(&self) -> i64 {
        self.r#ref.as_ref().map_or(0, |r| r.socket_id)
    }

    fn target(&self) -> Option<&str> {
        None
    }
}
