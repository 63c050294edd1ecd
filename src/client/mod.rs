//! The introspection capability the rest of the crate is written against.
//!
//! Resolution and graph walking only ever see this trait, so they can be
//! exercised against in-memory snapshots as easily as against a live process.

pub mod grpc;
pub mod memory;

use crate::Result;
use async_trait::async_trait;
use grpcscope_proto::{Channel, Server, Socket, SocketRef, Subchannel};

pub use grpc::{ConnectOptions, GrpcIntrospector};
pub use memory::MemoryIntrospector;

#[async_trait]
pub trait IntrospectionClient: Send + Sync {
    /// Every top-level channel, in the order the remote reports them.
    async fn list_top_channels(&self) -> Result<Vec<Channel>>;

    /// `Ok(None)` when the remote no longer knows the subchannel.
    async fn fetch_subchannel(&self, id: i64) -> Result<Option<Subchannel>>;

    /// Every server, in the order the remote reports them.
    async fn list_servers(&self) -> Result<Vec<Server>>;

    /// `Ok(None)` when the remote no longer knows the socket.
    async fn fetch_socket(&self, id: i64) -> Result<Option<Socket>>;

    /// References to the sockets a server has accepted.
    async fn list_server_socket_refs(&self, server_id: i64) -> Result<Vec<SocketRef>>;
}

/// The standard `grpc.health.v1` check.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Status name for `service`; the empty name asks for the whole server.
    async fn serving_status(&self, service: &str) -> Result<String>;
}
