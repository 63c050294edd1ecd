pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grpcscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect the live channelz state of a running gRPC process", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short = 'o', long, global = true, help = "Print the result as JSON")]
    pub json: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Print exact timestamps instead of relative times"
    )]
    pub timestamp: bool,

    #[arg(long, global = true, help = "CA certificate file; connects with TLS")]
    pub ca_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Server name to verify the certificate against")]
    pub server_name_override: Option<String>,

    #[arg(help = "Address of the process to inspect (host:port)")]
    pub target: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Display channelz state in a human readable way")]
    Channelz {
        #[command(subcommand)]
        query: ChannelzQuery,
    },
    #[command(about = "Check health status of the target application")]
    Health {
        #[arg(help = "Services to check; the overall status when empty")]
        services: Vec<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ChannelzQuery {
    #[command(about = "List client channels")]
    Channels,
    #[command(about = "Display one channel, its subchannels and trace events")]
    Channel {
        #[arg(help = "Channel ID or target")]
        id_or_target: String,
    },
    #[command(about = "Display one subchannel and its sockets")]
    Subchannel {
        #[arg(help = "Subchannel ID or target")]
        id_or_target: String,
    },
    #[command(about = "Display one socket")]
    Socket {
        #[arg(help = "Socket ID")]
        id: String,
    },
    #[command(about = "List servers")]
    Servers,
    #[command(about = "Display one server and its accepted sockets")]
    Server {
        #[arg(help = "Server ID")]
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_query() {
        let cli = Cli::try_parse_from([
            "grpcscope",
            "localhost:50051",
            "channelz",
            "channel",
            "dns:///shop:443",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.target, "localhost:50051");
        assert!(cli.json);
        assert!(!cli.timestamp);
        match cli.command {
            Commands::Channelz { query } => assert_eq!(
                query,
                ChannelzQuery::Channel {
                    id_or_target: "dns:///shop:443".to_string()
                }
            ),
            Commands::Health { .. } => panic!("expected channelz"),
        }
    }

    #[test]
    fn test_parse_health_services() {
        let cli = Cli::try_parse_from(["grpcscope", "-t", "localhost:50051", "health", "a", "b"])
            .unwrap();
        assert!(cli.timestamp);
        match cli.command {
            Commands::Health { services } => assert_eq!(services, vec!["a", "b"]),
            Commands::Channelz { .. } => panic!("expected health"),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
