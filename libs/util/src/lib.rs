use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use toml::{map::Map, Value};

const DEFAULT_CONFIG: &str = "Config.toml";

/// Root of the workspace. `WORKSPACE_DIR` wins over asking cargo, and the
/// current directory is used when neither is available.
pub fn workspace_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("WORKSPACE_DIR") {
        return PathBuf::from(dir);
    }
    locate_workspace().unwrap_or_else(|| PathBuf::from("."))
}

fn locate_workspace() -> Option<PathBuf> {
    let output = std::process::Command::new(env!("CARGO"))
        .arg("locate-project")
        .arg("--workspace")
        .arg("--message-format=plain")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let cargo_path = Path::new(std::str::from_utf8(&output.stdout).ok()?.trim());
    cargo_path.parent().map(Path::to_path_buf)
}

pub fn load_config(config_name: &str) -> anyhow::Result<Map<String, Value>> {
    load_config_from(&workspace_dir(), config_name)
}

pub fn load_config_from(
    dir: &Path,
    config_name: &str,
) -> anyhow::Result<Map<String, Value>> {
    let path = dir.join(config_name);
    let config = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    toml::from_str::<Map<String, Value>>(&config)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads `Secrets.toml`. A missing file is an empty table.
pub fn load_env() -> anyhow::Result<Map<String, Value>> {
    let workspace_dir = workspace_dir();
    let secrets =
        match std::fs::read_to_string(workspace_dir.join("Secrets.toml")) {
            Ok(secrets) => secrets,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Map::new())
            }
            Err(e) => {
                return Err(e).context("failed to read Secrets.toml");
            }
        };

    toml::from_str::<Map<String, Value>>(&secrets)
        .context("failed to parse Secrets.toml")
}

/// `Config{CONFIG}` where `CONFIG` comes from the environment or the
/// secrets table, `Config.toml` otherwise.
pub fn config_name(secrets: &Map<String, Value>) -> String {
    let suffix = std::env::var("CONFIG").ok().or_else(|| {
        secrets
            .get("CONFIG")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match suffix {
        Some(suffix) => format!("Config{}", suffix),
        None => DEFAULT_CONFIG.to_string(),
    }
}

pub fn lookup<'a>(
    config: &'a Map<String, Value>,
    section: &str,
    key: &str,
) -> Option<&'a Value> {
    config.get(section)?.get(key)
}

pub fn get_str<'a>(
    config: &'a Map<String, Value>,
    section: &str,
    key: &str,
) -> anyhow::Result<Option<&'a str>> {
    lookup(config, section, key)
        .map(|value| {
            value.as_str().with_context(|| {
                format!("failed to parse {}.{} config", section, key)
            })
        })
        .transpose()
}

pub fn get_integer(
    config: &Map<String, Value>,
    section: &str,
    key: &str,
) -> anyhow::Result<Option<i64>> {
    lookup(config, section, key)
        .map(|value| {
            value.as_integer().with_context(|| {
                format!("failed to parse {}.{} config", section, key)
            })
        })
        .transpose()
}

pub fn get_bool(
    config: &Map<String, Value>,
    section: &str,
    key: &str,
) -> anyhow::Result<Option<bool>> {
    lookup(config, section, key)
        .map(|value| {
            value.as_bool().with_context(|| {
                format!("failed to parse {}.{} config", section, key)
            })
        })
        .transpose()
}
