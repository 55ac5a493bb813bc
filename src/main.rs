use std::{fs::OpenOptions, future::IntoFuture as _};

use anyhow::Context as _;
use sync_events::DisplayKind;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let secrets = util::load_env()?;
    let config_name = util::config_name(&secrets);
    let config = util::load_config(&config_name)?;

    let server_config = api::init_config(&config)?;
    let poller_config = sync_events::init_config(&config)?;

    init_tracing(
        poller_config.enabled && poller_config.display == DisplayKind::Terminal,
    )?;
    info!(task = "load config", config = config_name);

    let shutdown = CancellationToken::new();

    let server = if server_config.enabled {
        Some(serve_api(server_config.addr, shutdown.clone()).await?)
    } else {
        None
    };

    let poller = if poller_config.enabled {
        Some(sync_events::serve(&poller_config)?)
    } else {
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!(task = "shutdown");

    if let Some(poller) = poller {
        poller.stop().await;
    }

    shutdown.cancel();
    if let Some(server) = server {
        match server.await {
            Ok(Err(e)) => error!(task = "serve api", err = e.to_string()),
            Err(e) => error!(task = "serve api", err = e.to_string()),
            Ok(Ok(())) => {}
        }
    }

    Ok(())
}

async fn serve_api(
    addr: std::net::SocketAddr,
    shutdown: CancellationToken,
) -> anyhow::Result<JoinHandle<std::io::Result<()>>> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(task = "listen", addr = addr.to_string());

    let router = api::serve(repository::init_repository());

    Ok(tokio::spawn(
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .into_future(),
    ))
}

/// The terminal feed owns stdout, so logs go to `log.txt` instead.
fn init_tracing(feed_on_terminal: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if feed_on_terminal {
        let out_file = OpenOptions::new()
            .append(true)
            .create(true)
            .open("log.txt")
            .context("failed to open log.txt")?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(out_file)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}
