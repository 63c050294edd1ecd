//! In-memory [`IntrospectionClient`] serving a fixed snapshot.
//!
//! Every call is recorded, so callers can check which RPCs a walk issued and
//! in what order.

use super::{HealthChecker, IntrospectionClient};
use crate::introspect::Entity;
use crate::Result;
use async_trait::async_trait;
use grpcscope_proto::{Channel, Server, Socket, SocketRef, Subchannel};
use std::collections::HashMap;
use std::sync::Mutex;

/// One RPC issued against a [`MemoryIntrospector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListTopChannels,
    FetchSubchannel(i64),
    ListServers,
    FetchSocket(i64),
    ListServerSocketRefs(i64),
    HealthCheck(String),
}

#[derive(Default)]
pub struct MemoryIntrospector {
    channels: Vec<Channel>,
    subchannels: HashMap<i64, Subchannel>,
    servers: Vec<Server>,
    sockets: HashMap<i64, Socket>,
    server_sockets: HashMap<i64, Vec<SocketRef>>,
    unreachable_sockets: Vec<i64>,
    health: HashMap<String, String>,
    calls: Mutex<Vec<Call>>,
}

impl MemoryIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_subchannel(mut self, subchannel: Subchannel) -> Self {
        self.subchannels.insert(subchannel.id(), subchannel);
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_socket(mut self, socket: Socket) -> Self {
        self.sockets.insert(socket.id(), socket);
        self
    }

    /// Records `socket_id` as accepted by `server_id`, in call order.
    pub fn with_server_socket(mut self, server_id: i64, socket_id: i64) -> Self {
        self.server_sockets
            .entry(server_id)
            .or_default()
            .push(SocketRef {
                socket_id,
                name: String::new(),
            });
        self
    }

    /// Fetching `socket_id` fails with an `UNAVAILABLE` status.
    pub fn with_unreachable_socket(mut self, socket_id: i64) -> Self {
        self.unreachable_sockets.push(socket_id);
        self
    }

    /// `service` reports `status`. Unknown services fail with `NOT_FOUND`,
    /// as the health service does.
    pub fn with_health(mut self, service: &str, status: &str) -> Self {
        self.health.insert(service.to_string(), status.to_string());
        self
    }

    /// Every call issued so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl IntrospectionClient for MemoryIntrospector {
    async fn list_top_channels(&self) -> Result<Vec<Channel>> {
        self.record(Call::ListTopChannels);
        Ok(self.channels.clone())
    }

    async fn fetch_subchannel(&self, id: i64) -> Result<Option<Subchannel>> {
        self.record(Call::FetchSubchannel(id));
        Ok(self.subchannels.get(&id).cloned())
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        self.record(Call::ListServers);
        Ok(self.servers.clone())
    }

    async fn fetch_socket(&self, id: i64) -> Result<Option<Socket>> {
        self.record(Call::FetchSocket(id));
        if self.unreachable_sockets.contains(&id) {
            return Err(tonic::Status::unavailable("connection reset").into());
        }
        Ok(self.sockets.get(&id).cloned())
    }

    async fn list_server_socket_refs(&self, server_id: i64) -> Result<Vec<SocketRef>> {
        self.record(Call::ListServerSocketRefs(server_id));
        Ok(self
            .server_sockets
            .get(&server_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl HealthChecker for MemoryIntrospector {
    async fn serving_status(&self, service: &str) -> Result<String> {
        self.record(Call::HealthCheck(service.to_string()));
        self.health
            .get(service)
            .cloned()
            .ok_or_else(|| tonic::Status::not_found("unknown service").into())
    }
}
