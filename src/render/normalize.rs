//! Pure conversions from polymorphic channelz records to display strings and
//! row shapes.
//!
//! These never fail on odd input: unknown enum values and address encodings
//! render as placeholders. The one exception is [`security`], which rejects a
//! TLS descriptor that carries no cipher suite.

use super::time::TimeFormat;
use crate::introspect::Entity;
use crate::{Result, ScopeError};
use grpcscope_proto::address;
use grpcscope_proto::channel_connectivity_state::State;
use grpcscope_proto::channel_trace_event::{ChildRef, Severity};
use grpcscope_proto::security::{tls::CipherSuite, Model};
use grpcscope_proto::{
    Address, Channel, ChannelData, ChannelTraceEvent, Security, Socket, SocketOption,
    Subchannel,
};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Rendered for any address encoding other than TCP/IP.
pub const UNSUPPORTED_ADDRESS: &str = "<unsupported>";

/// Rendered for an absent flow-control window.
pub const NOT_AVAILABLE: &str = "N/A";

pub fn unrecognized(value: i32) -> String {
    format!("<unrecognized:{}>", value)
}

pub fn format_address(address: Option<&Address>) -> String {
    match address.and_then(|a| a.address.as_ref()) {
        Some(address::Address::TcpipAddress(tcpip)) => format_tcpip(tcpip),
        Some(address::Address::UdsAddress(_))
        | Some(address::Address::OtherAddress(_))
        | None => UNSUPPORTED_ADDRESS.to_string(),
    }
}

fn format_tcpip(tcpip: &address::TcpIpAddress) -> String {
    let ip = match tcpip.ip_address.len() {
        4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(&tcpip.ip_address);
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&tcpip.ip_address);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return UNSUPPORTED_ADDRESS.to_string(),
    };
    match u16::try_from(tcpip.port) {
        Ok(port) => SocketAddr::new(ip, port).to_string(),
        Err(_) => UNSUPPORTED_ADDRESS.to_string(),
    }
}

/// `local->remote`
pub fn format_socket_pair(socket: &Socket) -> String {
    format!(
        "{}->{}",
        format_address(socket.local.as_ref()),
        format_address(socket.remote.as_ref())
    )
}

pub fn connectivity_state_name(state: i32) -> String {
    State::try_from(state)
        .map(|s| s.as_str_name().to_string())
        .unwrap_or_else(|_| unrecognized(state))
}

pub fn severity_name(severity: i32) -> String {
    Severity::try_from(severity)
        .map(|s| s.as_str_name().to_string())
        .unwrap_or_else(|_| unrecognized(severity))
}

pub fn child_ref(event: &ChannelTraceEvent) -> String {
    match &event.child_ref {
        Some(ChildRef::ChannelRef(r)) => format!("channel({})", r.channel_id),
        Some(ChildRef::SubchannelRef(r)) => format!("subchannel({})", r.subchannel_id),
        None => String::new(),
    }
}

/// The human value when present, otherwise a description of the raw payload.
pub fn option_value(option: &SocketOption) -> String {
    if !option.value.is_empty() {
        return option.value.clone();
    }
    match &option.additional {
        Some(any) => format!("{} ({} bytes)", any.type_url, any.value.len()),
        None => String::new(),
    }
}

/// Security section of a socket detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityView {
    /// `TLS` or `Other`.
    pub model: &'static str,
    pub name_label: &'static str,
    pub name: String,
}

/// `Ok(None)` when there is nothing to show: no descriptor, or a descriptor
/// with no model set.
pub fn security(security: Option<&Security>) -> Result<Option<SecurityView>> {
    let Some(model) = security.and_then(|s| s.model.as_ref()) else {
        return Ok(None);
    };
    let view = match model {
        Model::Tls(tls) => match &tls.cipher_suite {
            Some(CipherSuite::StandardName(name)) => SecurityView {
                model: "TLS",
                name_label: "Standard Name",
                name: name.clone(),
            },
            Some(CipherSuite::OtherName(name)) => SecurityView {
                model: "TLS",
                name_label: "Other Name",
                name: name.clone(),
            },
            None => {
                return Err(ScopeError::UnsupportedVariant(
                    "TLS cipher suite encoding".to_string(),
                ))
            }
        },
        Model::Other(other) => SecurityView {
            model: "Other",
            name_label: "Name",
            name: other.name.clone(),
        },
    };
    Ok(Some(view))
}

/// Started/succeeded/failed triple, rendered `a/b/c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub started: i64,
    pub succeeded: i64,
    pub failed: i64,
}

impl std::fmt::Display for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.started, self.succeeded, self.failed)
    }
}

/// A channel or subchannel, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRow {
    pub id: i64,
    pub target: String,
    pub state: String,
    pub calls: Counters,
    pub created: String,
}

fn channel_row_from(id: i64, data: Option<&ChannelData>, time: &TimeFormat) -> ChannelRow {
    let default = ChannelData::default();
    let data = data.unwrap_or(&default);
    ChannelRow {
        id,
        target: data.target.clone(),
        state: connectivity_state_name(data.state.as_ref().map_or(0, |s| s.state)),
        calls: Counters {
            started: data.calls_started,
            succeeded: data.calls_succeeded,
            failed: data.calls_failed,
        },
        created: time.format(
            data.trace
                .as_ref()
                .and_then(|t| t.creation_timestamp.as_ref()),
        ),
    }
}

pub fn channel_row(channel: &Channel, time: &TimeFormat) -> ChannelRow {
    channel_row_from(channel.id(), channel.data.as_ref(), time)
}

pub fn subchannel_row(subchannel: &Subchannel, time: &TimeFormat) -> ChannelRow {
    channel_row_from(subchannel.id(), subchannel.data.as_ref(), time)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRow {
    pub severity: String,
    pub time: String,
    pub child_ref: String,
    pub description: String,
}

pub fn trace_rows(data: Option<&ChannelData>, time: &TimeFormat) -> Vec<TraceRow> {
    data.and_then(|d| d.trace.as_ref())
        .map(|trace| {
            trace
                .events
                .iter()
                .map(|event| TraceRow {
                    severity: severity_name(event.severity),
                    time: time.format(event.timestamp.as_ref()),
                    child_ref: child_ref(event),
                    description: event.description.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// A socket, flattened for the socket sub-table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketRow {
    pub id: i64,
    pub addresses: String,
    pub streams: Counters,
    pub messages_sent: i64,
    pub messages_received: i64,
}

pub fn socket_row(socket: &Socket) -> SocketRow {
    let data = socket.data.clone().unwrap_or_default();
    SocketRow {
        id: socket.id(),
        addresses: format_socket_pair(socket),
        streams: Counters {
            started: data.streams_started,
            succeeded: data.streams_succeeded,
            failed: data.streams_failed,
        },
        messages_sent: data.messages_sent,
        messages_received: data.messages_received,
    }
}

/// Go-style bracketed list, e.g. `[10.0.0.1:80 10.0.0.1:443]`.
pub fn bracketed(items: &[String]) -> String {
    format!("[{}]", items.join(" "))
}
