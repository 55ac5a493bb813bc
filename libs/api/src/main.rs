use anyhow::Context as _;
use api::{init_config, serve};
use repository::init_repository;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let secrets = util::load_env()?;
    let config = util::load_config(&util::config_name(&secrets))?;
    let config = init_config(&config)?;

    let router = serve(init_repository());

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    info!(task = "listen", addr = config.addr.to_string());

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(task = "listen for ctrl-c", err = e.to_string());
            }
        })
        .await?;

    Ok(())
}
