//! [`IntrospectionClient`] backed by a live gRPC connection.

use super::{HealthChecker, IntrospectionClient};
use crate::introspect::Entity;
use crate::render::normalize::unrecognized;
use crate::{Result, ScopeError};
use async_trait::async_trait;
use grpcscope_proto::health::health_check_response::ServingStatus;
use grpcscope_proto::health::HealthCheckRequest;
use grpcscope_proto::{
    Channel, ChannelzClient, GetServerSocketsRequest, GetServersRequest, GetSocketRequest,
    GetSubchannelRequest, GetTopChannelsRequest, HealthClient, Server, Socket, SocketRef,
    Subchannel,
};
use std::path::PathBuf;
use std::time::Duration;
use tonic::transport::{Certificate, ClientTlsConfig, Endpoint};
use tonic::{Code, Status};
use tracing::{debug, info};

/// How long to wait for the connection to become ready.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how to dial the inspected process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// `host:port` to dial.
    pub address: String,
    /// Dial with TLS. Requires `ca_file`.
    pub tls: bool,
    /// CA bundle the server certificate is verified against.
    pub ca_file: Option<PathBuf>,
    /// Name to verify the server certificate against instead of the host.
    pub server_name_override: Option<String>,
}

impl ConnectOptions {
    /// URI scheme for the endpoint. TLS without a CA file is refused rather
    /// than dialed in plaintext.
    pub fn scheme(&self) -> Result<&'static str> {
        match (self.tls, &self.ca_file) {
            (false, _) => Ok("http"),
            (true, Some(_)) => Ok("https"),
            (true, None) => Err(ScopeError::Config(format!(
                "Security tls for {} requires IdentityFile or --ca-file",
                self.address
            ))),
        }
    }
}

pub struct GrpcIntrospector {
    channelz: ChannelzClient<tonic::transport::Channel>,
    health: HealthClient<tonic::transport::Channel>,
}

impl GrpcIntrospector {
    pub fn new(channel: tonic::transport::Channel) -> Self {
        Self {
            channelz: ChannelzClient::new(channel.clone()),
            health: HealthClient::new(channel),
        }
    }

    /// Connect and wait (up to [`CONNECT_TIMEOUT`]) for the channel to be ready.
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        let scheme = options.scheme()?;
        let mut endpoint = Endpoint::from_shared(format!("{}://{}", scheme, options.address))?
            .connect_timeout(CONNECT_TIMEOUT);

        if let Some(ca_file) = options.ca_file.as_ref().filter(|_| options.tls) {
            let pem = tokio::fs::read(ca_file).await.map_err(|e| {
                ScopeError::Config(format!(
                    "cannot read CA file {}: {}",
                    ca_file.display(),
                    e
                ))
            })?;
            let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
            if let Some(name) = &options.server_name_override {
                tls = tls.domain_name(name.clone());
            }
            endpoint = endpoint.tls_config(tls)?;
        }

        info!(
            address = %options.address,
            tls = options.tls,
            "Connecting"
        );
        let channel = endpoint.connect().await?;
        Ok(Self::new(channel))
    }
}

/// Name of a health status as the proto spells it.
pub fn serving_status_name(status: i32) -> String {
    ServingStatus::try_from(status)
        .map(|s| s.as_str_name().to_string())
        .unwrap_or_else(|_| unrecognized(status))
}

/// Turns `NOT_FOUND` into `None`; every other status is a transport failure.
fn found<T>(result: std::result::Result<Option<T>, Status>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(status) if status.code() == Code::NotFound => Ok(None),
        Err(status) => Err(status.into()),
    }
}

/// Start id for the next page, or `None` once the listing is complete.
///
/// A page that does not advance past `start` also ends the listing, so a
/// server that ignores the start id cannot keep us looping.
fn next_page_start(end: bool, last_id: Option<i64>, start: i64) -> Option<i64> {
    match last_id {
        Some(id) if !end && id >= start => id.checked_add(1),
        _ => None,
    }
}

#[async_trait]
impl IntrospectionClient for GrpcIntrospector {
    async fn list_top_channels(&self) -> Result<Vec<Channel>> {
        let mut client = self.channelz.clone();
        let mut channels = Vec::new();
        let mut start_channel_id = 0;
        loop {
            debug!(start_channel_id, "GetTopChannels");
            let page = client
                .get_top_channels(GetTopChannelsRequest {
                    start_channel_id,
                    max_results: 0,
                })
                .await?
                .into_inner();
            let last_id = page.channel.last().map(|c| c.id());
            channels.extend(page.channel);
            match next_page_start(page.end, last_id, start_channel_id) {
                Some(next) => start_channel_id = next,
                None => break,
            }
        }
        Ok(channels)
    }

    async fn fetch_subchannel(&self, id: i64) -> Result<Option<Subchannel>> {
        debug!(subchannel_id = id, "GetSubchannel");
        let mut client = self.channelz.clone();
        found(
            client
                .get_subchannel(GetSubchannelRequest { subchannel_id: id })
                .await
                .map(|response| response.into_inner().subchannel),
        )
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        let mut client = self.channelz.clone();
        let mut servers = Vec::new();
        let mut start_server_id = 0;
        loop {
            debug!(start_server_id, "GetServers");
            let page = client
                .get_servers(GetServersRequest {
                    start_server_id,
                    max_results: 0,
                })
                .await?
                .into_inner();
            let last_id = page.server.last().map(|s| s.id());
            servers.extend(page.server);
            match next_page_start(page.end, last_id, start_server_id) {
                Some(next) => start_server_id = next,
                None => break,
            }
        }
        Ok(servers)
    }

    async fn fetch_socket(&self, id: i64) -> Result<Option<Socket>> {
        debug!(socket_id = id, "GetSocket");
        let mut client = self.channelz.clone();
        found(
            client
                .get_socket(GetSocketRequest {
                    socket_id: id,
                    summary: false,
                })
                .await
                .map(|response| response.into_inner().socket),
        )
    }

    async fn list_server_socket_refs(&self, server_id: i64) -> Result<Vec<SocketRef>> {
        let mut client = self.channelz.clone();
        let mut refs = Vec::new();
        let mut start_socket_id = 0;
        loop {
            debug!(server_id, start_socket_id, "GetServerSockets");
            let page = client
                .get_server_sockets(GetServerSocketsRequest {
                    server_id,
                    start_socket_id,
                    max_results: 0,
                })
                .await?
                .into_inner();
            let last_id = page.socket_ref.last().map(|r| r.socket_id);
            refs.extend(page.socket_ref);
            match next_page_start(page.end, last_id, start_socket_id) {
                Some(next) => start_socket_id = next,
                None => break,
            }
        }
        Ok(refs)
    }
}

#[async_trait]
impl HealthChecker for GrpcIntrospector {
    async fn serving_status(&self, service: &str) -> Result<String> {
        debug!(service, "Health/Check");
        let mut client = self.health.clone();
        let response = client
            .check(HealthCheckRequest {
                service: service.to_string(),
            })
            .await?
            .into_inner();
        Ok(serving_status_name(response.status))
    }
}
