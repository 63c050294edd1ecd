const SERDE_DERIVE: &str = "#[derive(serde::Serialize, serde::Deserialize)]";
const SNAKE_CASE: &str = "#[serde(rename_all = \"snake_case\")]";

// Oneofs serialize externally tagged by their proto field name.
const ONEOFS: &[&str] = &[
    ".grpc.channelz.v1.ChannelTraceEvent.child_ref",
    ".grpc.channelz.v1.Address.address",
    ".grpc.channelz.v1.Security.model",
    ".grpc.channelz.v1.Security.Tls.cipher_suite",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = tonic_build::configure()
        .build_server(false)
        .compile_well_known_types(true)
        .type_attribute(".", SERDE_DERIVE)
        .extern_path(".google.protobuf.Timestamp", "crate::wkt::Timestamp")
        .extern_path(".google.protobuf.Int64Value", "crate::wkt::Int64Value")
        .extern_path(".google.protobuf.Any", "crate::wkt::Any");

    for oneof in ONEOFS {
        builder = builder.type_attribute(oneof, SNAKE_CASE);
    }

    builder.compile_protos(
        &[
            "proto/grpc/channelz/v1/channelz.proto",
            "proto/grpc/health/v1/health.proto",
        ],
        &["proto"],
    )?;
    Ok(())
}
