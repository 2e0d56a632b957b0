//! Reads and writes `~/.simbridge/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! `SIMBRIDGE_*` environment variables override whatever the file says, and
//! command-line flags override both.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Interface both listeners bind to.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// Control API port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Simulator WebSocket port.
    #[serde(default = "default_simulator_port")]
    pub simulator_port: u16,

    /// Where `autopilot` and `probe` find the control API.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    simbridge_control::DEFAULT_HTTP_PORT
}
fn default_simulator_port() -> u16 {
    simbridge_middleware::DEFAULT_SIMULATOR_PORT
}
fn default_bridge_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_request_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            http_port: default_http_port(),
            simulator_port: default_simulator_port(),
            bridge_url: default_bridge_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".simbridge").join("config.toml")
}

/// File config (or defaults) with environment overrides applied.
pub fn load() -> Result<Config, String> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config at {}: {}", path.display(), e))
}

/// | Variable | Config field |
/// |---|---|
/// | `SIMBRIDGE_BIND_HOST` | `bind_host` |
/// | `SIMBRIDGE_HTTP_PORT` | `http_port` |
/// | `SIMBRIDGE_SIMULATOR_PORT` | `simulator_port` |
/// | `SIMBRIDGE_BRIDGE_URL` | `bridge_url` |
/// | `SIMBRIDGE_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |
///
/// Unparseable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SIMBRIDGE_BIND_HOST") {
        cfg.bind_host = v;
    }
    if let Some(v) = lookup("SIMBRIDGE_BRIDGE_URL") {
        cfg.bridge_url = v;
    }
    if let Some(port) = lookup("SIMBRIDGE_HTTP_PORT").and_then(|v| v.trim().parse().ok()) {
        cfg.http_port = port;
    }
    if let Some(port) = lookup("SIMBRIDGE_SIMULATOR_PORT").and_then(|v| v.trim().parse().ok()) {
        cfg.simulator_port = port;
    }
    if let Some(secs) =
        lookup("SIMBRIDGE_REQUEST_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok())
    {
        cfg.request_timeout_secs = secs;
    }
}

pub fn save(cfg: &Config) -> Result<PathBuf, String> {
    let path = config_path();
    save_to(cfg, &path)?;
    Ok(path)
}

/// Write `cfg`, owner-only on Unix.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
