use std::{path::PathBuf, time::Duration};

mod client;
mod container;
mod poller;
mod render;
mod response;

use anyhow::Context as _;
use toml::{map::Map, Value};
use tracing::info;

pub use client::Client;
pub use container::{
    Block, Container, HtmlFileContainer, MemoryContainer, TerminalContainer,
    BLOCK_CLASS,
};
pub use poller::{spawn, Poller, PollerHandle, RefreshOutcome, EVENTS_PATH};
pub use render::{describe, format_timestamp, Skipped, Zone, TIMESTAMP_FORMAT};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:10000";
const DEFAULT_INTERVAL_SECS: i64 = 15;
const DEFAULT_TIMEOUT_SECS: i64 = 10;
const DEFAULT_CONTAINER_ID: &str = "events";
const DEFAULT_HTML_PATH: &str = "events.html";

#[derive(Debug, thiserror::Error)]
pub enum SyncEventsError {
    #[error("in reqwest crate: {}: {}", message, source)]
    ReqwestError {
        source: reqwest::Error,
        message: String,
    },

    #[error("unsuccessful status code {}: {}", status_code, message)]
    FailedStatusCode {
        status_code: reqwest::StatusCode,
        message: String,
    },

    #[error("in serde_json crate: {}: {}", message, source)]
    SerdeJsonError {
        source: serde_json::Error,
        message: String,
    },

    #[error("in std::io: {}: {}", message, source)]
    StdIoError {
        source: std::io::Error,
        message: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayKind {
    Terminal,
    Html,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub enabled: bool,
    pub base_url: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub zone: Zone,
    pub container_id: String,
    pub display: DisplayKind,
    pub html_path: PathBuf,
}

pub fn init_config(config: &Map<String, Value>) -> anyhow::Result<Config> {
    let enabled = util::get_bool(config, "poller", "enabled")?.unwrap_or(true);

    let base_url = util::get_str(config, "poller", "base_url")?
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string();

    let interval_secs = util::get_integer(config, "poller", "interval_secs")?
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    anyhow::ensure!(interval_secs > 0, "poller.interval_secs must be positive");

    let timeout_secs = util::get_integer(config, "poller", "timeout_secs")?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    anyhow::ensure!(timeout_secs > 0, "poller.timeout_secs must be positive");

    let zone = match util::get_str(config, "poller", "timezone")? {
        Some(zone) => zone
            .parse::<Zone>()
            .context("failed to parse poller.timezone config")?,
        None => Zone::Local,
    };

    let container_id = util::get_str(config, "poller", "container_id")?
        .unwrap_or(DEFAULT_CONTAINER_ID)
        .to_string();

    let display = match util::get_str(config, "poller", "display")? {
        None | Some("terminal") => DisplayKind::Terminal,
        Some("html") => DisplayKind::Html,
        Some(other) => anyhow::bail!("unknown poller.display config: {}", other),
    };

    let html_path = util::get_str(config, "poller", "html_path")?
        .unwrap_or(DEFAULT_HTML_PATH)
        .into();

    Ok(Config {
        enabled,
        base_url,
        interval: Duration::from_secs(interval_secs as u64),
        timeout: Duration::from_secs(timeout_secs as u64),
        zone,
        container_id,
        display,
        html_path,
    })
}

/// Starts polling into the configured container. Must be called from
/// within a tokio runtime.
pub fn serve(config: &Config) -> anyhow::Result<PollerHandle> {
    info!(
        task = "start event polling",
        base_url = %config.base_url,
        interval_secs = config.interval.as_secs(),
    );

    let client = Client::new(&config.base_url, config.timeout)?;

    let handle = match config.display {
        DisplayKind::Terminal => spawn(
            Poller::new(
                client,
                config.zone,
                TerminalContainer::stdout(&config.container_id),
            ),
            config.interval,
        ),
        DisplayKind::Html => spawn(
            Poller::new(
                client,
                config.zone,
                HtmlFileContainer::new(&config.container_id, &config.html_path),
            ),
            config.interval,
        ),
    };

    Ok(handle)
}
