//! gRPC protocol definitions for grpcscope
//!
//! Defines:
//! - `grpc.channelz.v1` messages and the `ChannelzClient`
//! - `grpc.health.v1` messages and the `HealthClient`
//!
//! Generated from `proto/grpc/{channelz,health}/v1/*.proto`. Every generated
//! type derives serde, so a fetched record can be written out with the proto
//! field names and nesting.

pub mod channelz {
    tonic::include_proto!("grpc.channelz.v1");
}

pub mod health {
    tonic::include_proto!("grpc.health.v1");
}

pub mod wkt;

pub use channelz::channelz_client::ChannelzClient;
pub use channelz::*;
pub use health::health_client::HealthClient;
pub use wkt::{Any, Int64Value, Timestamp};

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    fn sample_socket() -> Socket {
        Socket {
            r#ref: Some(SocketRef {
                socket_id: 42,
                name: String::new(),
            }),
            data: Some(SocketData {
                streams_started: 3,
                local_flow_control_window: Some(Int64Value { value: 65535 }),
                option: vec![SocketOption {
                    name: "SO_KEEPALIVE".to_string(),
                    value: "1".to_string(),
                    additional: None,
                }],
                ..Default::default()
            }),
            local: Some(Address {
                address: Some(address::Address::TcpipAddress(address::TcpIpAddress {
                    ip_address: vec![127, 0, 0, 1],
                    port: 50051,
                })),
            }),
            remote: None,
            security: Some(Security {
                model: Some(security::Model::Tls(security::Tls {
                    cipher_suite: Some(security::tls::CipherSuite::StandardName(
                        "TLS_AES_128_GCM_SHA256".to_string(),
                    )),
                    local_certificate: vec![1, 2, 3],
                    remote_certificate: Vec::new(),
                })),
            }),
            remote_name: String::new(),
        }
    }

    #[test]
    fn test_socket_wire_decode_matches_encode() {
        let socket = sample_socket();
        let bytes = socket.encode_to_vec();
        let decoded = Socket::decode(bytes.as_slice()).expect("decodes");
        assert_eq!(decoded, socket);
    }

    #[test]
    fn test_serde_uses_proto_field_names() {
        let json = serde_json::to_value(sample_socket()).expect("serializes");
        assert_eq!(json["ref"]["socket_id"], 42);
        assert_eq!(
            json["local"]["address"]["tcpip_address"]["port"],
            serde_json::json!(50051)
        );
        assert_eq!(
            json["security"]["model"]["tls"]["cipher_suite"]["standard_name"],
            "TLS_AES_128_GCM_SHA256"
        );
    }

    #[test]
    fn test_enum_names() {
        use channel_connectivity_state::State;
        use health::health_check_response::ServingStatus;

        assert_eq!(
            State::try_from(4).map(|s| s.as_str_name()),
            Ok("TRANSIENT_FAILURE")
        );
        assert!(State::try_from(9).is_err());
        assert_eq!(ServingStatus::NotServing.as_str_name(), "NOT_SERVING");
    }

    #[test]
    fn test_timestamp_unset() {
        assert!(Timestamp::default().is_unset());
        assert!(!Timestamp {
            seconds: 1,
            nanos: 0
        }
        .is_unset());
    }
}
