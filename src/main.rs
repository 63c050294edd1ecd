use clap::Parser;
use grpcscope::cli::{commands, Cli};
use std::error::Error;
use std::process;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The error and its sources on one line.
fn one_line(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message.replace('\n', " ")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting grpcscope v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = commands::handle_command(cli).await {
        eprintln!("Error: {}", one_line(&e));
        process::exit(1);
    }
}
