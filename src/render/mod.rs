//! Presentation of fetched records.
//!
//! Structured output serializes the records exactly as fetched. Tabular output
//! runs them through [`normalize`] and prints fixed column sets. Neither mode
//! issues RPCs: everything shown must already be fetched.

pub mod normalize;
pub mod table;
pub mod time;

use crate::introspect::Entity;
use crate::Result;
use grpcscope_proto::{Channel, ChannelData, Server, Socket, Subchannel};
use normalize::{
    bracketed, format_address, format_socket_pair, option_value, security, ChannelRow,
    Counters, NOT_AVAILABLE,
};
use serde::Serialize;
use std::io::Write;
use table::Table;
use time::TimeFormat;

const SEPARATOR: &str = "---";

const CALLS_HEADER: &str = "Calls(Started/Succeeded/Failed)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned tables with derived fields.
    Tabular,
    /// Indented JSON of the records as fetched.
    Structured,
}

/// A server together with its resolved listening sockets.
#[derive(Debug, Clone)]
pub struct ServerListing {
    pub server: Server,
    pub listen_sockets: Vec<Socket>,
}

impl ServerListing {
    fn listen_addresses(&self) -> String {
        let addresses: Vec<String> = self
            .listen_sockets
            .iter()
            .map(|socket| format_address(socket.local.as_ref()))
            .collect();
        bracketed(&addresses)
    }

    fn calls(&self) -> Counters {
        let data = self.server.data.clone().unwrap_or_default();
        Counters {
            started: data.calls_started,
            succeeded: data.calls_succeeded,
            failed: data.calls_failed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    format: OutputFormat,
    time: TimeFormat,
}

impl Presenter {
    pub fn new(format: OutputFormat, time: TimeFormat) -> Self {
        Self { format, time }
    }

    pub fn is_structured(&self) -> bool {
        self.format == OutputFormat::Structured
    }

    fn structured<T, W>(&self, out: &mut W, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        W: Write + ?Sized,
    {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
        Ok(())
    }

    /// Channels list.
    pub fn channels<W: Write + ?Sized>(&self, out: &mut W, channels: &[Channel]) -> Result<()> {
        if self.is_structured() {
            return self.structured(out, channels);
        }
        let rows = channels
            .iter()
            .map(|c| normalize::channel_row(c, &self.time));
        channel_table("Channel ID", rows).write_to(out)?;
        Ok(())
    }

    /// Channel detail followed by its subchannels and trace events.
    pub fn channel<W: Write + ?Sized>(
        &self,
        out: &mut W,
        channel: &Channel,
        subchannels: &[Subchannel],
    ) -> Result<()> {
        if self.is_structured() {
            return self.structured(out, channel);
        }
        let row = normalize::channel_row(channel, &self.time);
        channel_fields("Channel ID", &row).write_to(out)?;

        if !subchannels.is_empty() {
            writeln!(out, "{}", SEPARATOR)?;
            let rows = subchannels
                .iter()
                .map(|s| normalize::subchannel_row(s, &self.time));
            channel_table("Subchannel ID", rows).write_to(out)?;
        }
        self.trace_events(out, channel.data.as_ref())
    }

    /// Subchannel detail followed by its sockets.
    pub fn subchannel<W: Write + ?Sized>(
        &self,
        out: &mut W,
        subchannel: &Subchannel,
        sockets: &[Socket],
    ) -> Result<()> {
        if self.is_structured() {
            return self.structured(out, subchannel);
        }
        let row = normalize::subchannel_row(subchannel, &self.time);
        channel_fields("Subchannel ID", &row).write_to(out)?;

        if !sockets.is_empty() {
            writeln!(out, "{}", SEPARATOR)?;
            socket_table(sockets).write_to(out)?;
        }
        self.trace_events(out, subchannel.data.as_ref())
    }

    fn trace_events<W: Write + ?Sized>(
        &self,
        out: &mut W,
        data: Option<&ChannelData>,
    ) -> Result<()> {
        let rows = normalize::trace_rows(data, &self.time);
        if rows.is_empty() {
            return Ok(());
        }
        writeln!(out, "{}", SEPARATOR)?;
        let mut table = Table::with_header(["Severity", "Time", "Child Ref", "Description"]);
        for row in rows {
            table.row([row.severity, row.time, row.child_ref, row.description]);
        }
        table.write_to(out)?;
        Ok(())
    }

    /// Servers list.
    pub fn servers<W: Write + ?Sized>(&self, out: &mut W, servers: &[ServerListing]) -> Result<()> {
        if self.is_structured() {
            let records: Vec<&Server> = servers.iter().map(|s| &s.server).collect();
            return self.structured(out, &records);
        }
        let mut table = Table::with_header([
            "Server ID",
            "Listen Addresses",
            CALLS_HEADER,
            "Created Time",
        ]);
        for listing in servers {
            table.row([
                listing.server.id().to_string(),
                listing.listen_addresses(),
                listing.calls().to_string(),
                self.last_call_started(&listing.server),
            ]);
        }
        table.write_to(out)?;
        Ok(())
    }

    /// Server detail followed by its accepted sockets.
    pub fn server<W: Write + ?Sized>(
        &self,
        out: &mut W,
        listing: &ServerListing,
        sockets: &[Socket],
    ) -> Result<()> {
        if self.is_structured() {
            return self.structured(out, &listing.server);
        }
        let calls = listing.calls();
        let mut fields = Table::new();
        fields
            .field("Server ID", listing.server.id())
            .field("Listen Addresses", listing.listen_addresses())
            .field("Calls Started", calls.started)
            .field("Calls Succeeded", calls.succeeded)
            .field("Calls Failed", calls.failed)
            .field("Created Time", self.last_call_started(&listing.server));
        fields.write_to(out)?;

        if !sockets.is_empty() {
            writeln!(out, "{}", SEPARATOR)?;
            socket_table(sockets).write_to(out)?;
        }
        Ok(())
    }

    fn last_call_started(&self, server: &Server) -> String {
        self.time.format(
            server
                .data
                .as_ref()
                .and_then(|d| d.last_call_started_timestamp.as_ref()),
        )
    }

    /// Socket detail, then its options and security, when present.
    pub fn socket<W: Write + ?Sized>(&self, out: &mut W, socket: &Socket) -> Result<()> {
        if self.is_structured() {
            return self.structured(out, socket);
        }
        // Reject a malformed security descriptor before printing anything.
        let security = security(socket.security.as_ref())?;
        let data = socket.data.clone().unwrap_or_default();
        let window = |w: Option<grpcscope_proto::Int64Value>| {
            w.map_or_else(|| NOT_AVAILABLE.to_string(), |w| w.value.to_string())
        };

        let mut fields = Table::new();
        fields
            .field("Socket ID", socket.id())
            .field("Address", format_socket_pair(socket))
            .field("Streams Started", data.streams_started)
            .field("Streams Succeeded", data.streams_succeeded)
            .field("Streams Failed", data.streams_failed)
            .field("Messages Sent", data.messages_sent)
            .field("Messages Received", data.messages_received)
            .field("Keep Alives Sent", data.keep_alives_sent)
            .field(
                "Last Local Stream Created",
                self.time
                    .format(data.last_local_stream_created_timestamp.as_ref()),
            )
            .field(
                "Last Remote Stream Created",
                self.time
                    .format(data.last_remote_stream_created_timestamp.as_ref()),
            )
            .field(
                "Last Message Sent",
                self.time.format(data.last_message_sent_timestamp.as_ref()),
            )
            .field(
                "Last Message Received",
                self.time
                    .format(data.last_message_received_timestamp.as_ref()),
            )
            .field(
                "Local Flow Control Window",
                window(data.local_flow_control_window),
            )
            .field(
                "Remote Flow Control Window",
                window(data.remote_flow_control_window),
            );
        fields.write_to(out)?;

        if !data.option.is_empty() {
            writeln!(out, "{}", SEPARATOR)?;
            let mut options = Table::with_header(["Socket Options Name", "Value"]);
            for option in &data.option {
                options.row([option.name.clone(), option_value(option)]);
            }
            options.write_to(out)?;
        }

        if let Some(view) = security {
            writeln!(out, "{}", SEPARATOR)?;
            let mut block = Table::new();
            block
                .field("Security Model", view.model)
                .field(view.name_label, view.name);
            block.write_to(out)?;
        }
        Ok(())
    }
}

fn channel_table(id_header: &str, rows: impl Iterator<Item = ChannelRow>) -> Table {
    let mut table = Table::with_header([
        id_header,
        "Target",
        "State",
        CALLS_HEADER,
        "Created Time",
    ]);
    for row in rows {
        table.row([
            row.id.to_string(),
            row.target,
            row.state,
            row.calls.to_string(),
            row.created,
        ]);
    }
    table
}

fn channel_fields(id_label: &str, row: &ChannelRow) -> Table {
    let mut fields = Table::new();
    fields
        .field(id_label, row.id)
        .field("Target", &row.target)
        .field("State", &row.state)
        .field("Calls Started", row.calls.started)
        .field("Calls Succeeded", row.calls.succeeded)
        .field("Calls Failed", row.calls.failed)
        .field("Created Time", &row.created);
    fields
}

fn socket_table(sockets: &[Socket]) -> Table {
    let mut table = Table::with_header([
        "Socket ID",
        "Local->Remote",
        "Streams(Started/Succeeded/Failed)",
        "Messages(Sent/Received)",
    ]);
    for row in sockets.iter().map(normalize::socket_row) {
        table.row([
            row.id.to_string(),
            row.addresses,
            row.streams.to_string(),
            format!("{}/{}", row.messages_sent, row.messages_received),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use grpcscope_proto::security::{tls::CipherSuite, Model, Tls};
    use grpcscope_proto::{
        address, Address, Int64Value, Security, SocketData, SocketOption, SocketRef,
    };

    fn tabular() -> Presenter {
        Presenter::new(OutputFormat::Tabular, TimeFormat::Exact)
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn tcpip(ip: [u8; 4], port: i32) -> Option<Address> {
        Some(Address {
            address: Some(address::Address::TcpipAddress(address::TcpIpAddress {
                ip_address: ip.to_vec(),
                port,
            })),
        })
    }

    fn socket() -> Socket {
        Socket {
            r#ref: Some(SocketRef {
                socket_id: 17,
                name: String::new(),
            }),
            data: Some(SocketData {
                streams_started: 5,
                streams_succeeded: 4,
                streams_failed: 1,
                local_flow_control_window: Some(Int64Value { value: 65535 }),
                ..Default::default()
            }),
            local: tcpip([10, 0, 0, 1], 1234),
            remote: tcpip([10, 0, 0, 2], 443),
            security: None,
            remote_name: String::new(),
        }
    }

    #[test]
    fn test_socket_detail_without_options_or_security() {
        let text = render(|out| tabular().socket(out, &socket()));
        assert!(text.contains("Address:"));
        assert!(text.contains("10.0.0.1:1234->10.0.0.2:443"));
        assert!(text.contains("Last Message Sent:"));
        assert!(text.contains("65535"));
        assert!(text.contains("N/A"));
        assert!(!text.contains(SEPARATOR));
        assert!(!text.contains("Security Model"));
    }

    #[test]
    fn test_socket_detail_with_options_and_tls() {
        let mut socket = socket();
        if let Some(data) = socket.data.as_mut() {
            data.option.push(SocketOption {
                name: "SO_REUSEADDR".to_string(),
                value: "1".to_string(),
                additional: None,
            });
        }
        socket.security = Some(Security {
            model: Some(Model::Tls(Tls {
                cipher_suite: Some(CipherSuite::StandardName(
                    "TLS_AES_128_GCM_SHA256".to_string(),
                )),
                ..Default::default()
            })),
        });

        let text = render(|out| tabular().socket(out, &socket));
        let sections: Vec<&str> = text.split("---\n").collect();
        assert_eq!(sections.len(), 3);
        assert!(sections[1].starts_with("Socket Options Name"));
        assert!(sections[1].contains("SO_REUSEADDR"));
        assert!(sections[2].contains("Security Model:"));
        assert!(sections[2].contains("TLS"));
        assert!(sections[2].contains("Standard Name:"));
    }

    #[test]
    fn test_malformed_security_prints_nothing() {
        let mut socket = socket();
        socket.security = Some(Security {
            model: Some(Model::Tls(Tls::default())),
        });

        let mut out = Vec::new();
        assert!(tabular().socket(&mut out, &socket).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_structured_socket_is_lossless() {
        let presenter = Presenter::new(OutputFormat::Structured, TimeFormat::Exact);
        let original = socket();
        let text = render(|out| presenter.socket(out, &original));
        let decoded: Socket = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_empty_channel_list_prints_header_only() {
        let text = render(|out| tabular().channels(out, &[]));
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Channel ID"));
        assert!(text.contains("Calls(Started/Succeeded/Failed)"));
    }
}
