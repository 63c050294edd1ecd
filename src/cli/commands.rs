use crate::cli::{ChannelzQuery, Cli, Commands};
use crate::client::{ConnectOptions, GrpcIntrospector, HealthChecker, IntrospectionClient};
use crate::config;
use crate::introspect::{
    all_subchannels, expand_channel, expand_server, expand_subchannel, fetch_socket,
    listen_sockets, resolve,
};
use crate::render::table::Table;
use crate::render::time::TimeFormat;
use crate::render::{OutputFormat, Presenter, ServerListing};
use crate::Result;
use grpcscope_proto::Server;
use std::io::{self, Write};
use tracing::{debug, info};

pub async fn handle_command(cli: Cli) -> Result<()> {
    let options = connect_options(&cli)?;
    let client = GrpcIntrospector::connect(&options).await?;
    let presenter = presenter_for(&cli);

    // Output is buffered so a failed command prints nothing but its error.
    let mut buffer = Vec::new();
    match cli.command {
        Commands::Channelz { query } => {
            run_channelz(&client, &presenter, query, &mut buffer).await?
        }
        Commands::Health { services } => {
            run_health(&client, &presenter, &services, &mut buffer).await?
        }
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(&buffer)?;
    stdout.flush()?;
    Ok(())
}

/// Config file block for the target, with command-line flags taking precedence.
pub fn connect_options(cli: &Cli) -> Result<ConnectOptions> {
    let server_config = config::server_config_for(&cli.target)?;
    let mut options = server_config.connect_options(&cli.target);
    if let Some(ca_file) = &cli.ca_file {
        options.tls = true;
        options.ca_file = Some(ca_file.clone());
    }
    if let Some(name) = &cli.server_name_override {
        options.server_name_override = Some(name.clone());
    }
    debug!(?options, pattern = %server_config.pattern, "Resolved connection options");
    Ok(options)
}

pub fn presenter_for(cli: &Cli) -> Presenter {
    let format = if cli.json {
        OutputFormat::Structured
    } else {
        OutputFormat::Tabular
    };
    let time = if cli.timestamp {
        TimeFormat::Exact
    } else {
        TimeFormat::relative()
    };
    Presenter::new(format, time)
}

pub async fn run_channelz<C, W>(
    client: &C,
    presenter: &Presenter,
    query: ChannelzQuery,
    out: &mut W,
) -> Result<()>
where
    C: IntrospectionClient + ?Sized,
    W: Write + ?Sized,
{
    info!(?query, "Running channelz query");
    match query {
        ChannelzQuery::Channels => {
            let channels = client.list_top_channels().await?;
            presenter.channels(out, &channels)
        }
        ChannelzQuery::Channel { id_or_target } => {
            show_channel(client, presenter, &id_or_target, out).await
        }
        ChannelzQuery::Subchannel { id_or_target } => {
            show_subchannel(client, presenter, &id_or_target, out).await
        }
        ChannelzQuery::Socket { id } => {
            let socket = fetch_socket(client, &id).await?;
            presenter.socket(out, &socket)
        }
        ChannelzQuery::Servers => list_servers(client, presenter, out).await,
        ChannelzQuery::Server { id } => show_server(client, presenter, &id, out).await,
    }
}

// Structured output emits only the selected record, so the walks below are
// skipped in that mode.

async fn show_channel<C, W>(
    client: &C,
    presenter: &Presenter,
    token: &str,
    out: &mut W,
) -> Result<()>
where
    C: IntrospectionClient + ?Sized,
    W: Write + ?Sized,
{
    let channel = resolve(token, client.list_top_channels().await?)?;
    let subchannels = if presenter.is_structured() {
        Vec::new()
    } else {
        expand_channel(client, &channel).await?
    };
    presenter.channel(out, &channel, &subchannels)
}

async fn show_subchannel<C, W>(
    client: &C,
    presenter: &Presenter,
    token: &str,
    out: &mut W,
) -> Result<()>
where
    C: IntrospectionClient + ?Sized,
    W: Write + ?Sized,
{
    let subchannel = resolve(token, all_subchannels(client).await?)?;
    let sockets = if presenter.is_structured() {
        Vec::new()
    } else {
        expand_subchannel(client, &subchannel).await?
    };
    presenter.subchannel(out, &subchannel, &sockets)
}

async fn server_listing<C>(
    client: &C,
    presenter: &Presenter,
    server: Server,
) -> Result<ServerListing>
where
    C: IntrospectionClient + ?Sized,
{
    let listen_sockets = if presenter.is_structured() {
        Vec::new()
    } else {
        listen_sockets(client, &server).await?
    };
    Ok(ServerListing {
        server,
        listen_sockets,
    })
}

async fn list_servers<C, W>(client: &C, presenter: &Presenter, out: &mut W) -> Result<()>
where
    C: IntrospectionClient + ?Sized,
    W: Write + ?Sized,
{
    let mut listings = Vec::new();
    for server in client.list_servers().await? {
        listings.push(server_listing(client, presenter, server).await?);
    }
    presenter.servers(out, &listings)
}

async fn show_server<C, W>(
    client: &C,
    presenter: &Presenter,
    token: &str,
    out: &mut W,
) -> Result<()>
where
    C: IntrospectionClient + ?Sized,
    W: Write + ?Sized,
{
    let server = resolve(token, client.list_servers().await?)?;
    let sockets = if presenter.is_structured() {
        Vec::new()
    } else {
        expand_server(client, &server).await?
    };
    let listing = server_listing(client, presenter, server).await?;
    presenter.server(out, &listing, &sockets)
}

/// Overall status alone when no services are named, otherwise one
/// `service: STATUS` row per service.
pub async fn run_health<H, W>(
    client: &H,
    presenter: &Presenter,
    services: &[String],
    out: &mut W,
) -> Result<()>
where
    H: HealthChecker + ?Sized,
    W: Write + ?Sized,
{
    let names: Vec<&str> = if services.is_empty() {
        vec![""]
    } else {
        services.iter().map(String::as_str).collect()
    };

    let mut statuses = Vec::with_capacity(names.len());
    for name in names {
        statuses.push((name, client.serving_status(name).await?));
    }

    if presenter.is_structured() {
        let map: serde_json::Map<String, serde_json::Value> = statuses
            .into_iter()
            .map(|(name, status)| (name.to_string(), serde_json::Value::String(status)))
            .collect();
        serde_json::to_writer_pretty(&mut *out, &map)?;
        writeln!(out)?;
    } else if services.is_empty() {
        for (_, status) in statuses {
            writeln!(out, "{}", status)?;
        }
    } else {
        let mut table = Table::new();
        for (name, status) in statuses {
            table.field(name, status);
        }
        table.write_to(out)?;
    }
    Ok(())
}
