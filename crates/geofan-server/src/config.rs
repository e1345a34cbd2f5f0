use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file; a missing file yields the
    /// defaults so the server can start without any configuration.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&raw).map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.upstream.timeout_ms == 0 {
            return Err("upstream.timeout_ms must be > 0".into());
        }
        if self.cache.expiry_days < 0 {
            return Err("cache.expiry_days must be >= 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.data.dir.is_empty() {
            return Err("data.dir must not be empty".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.timeout_ms as u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Outbound-call settings. Every upstream call carries this timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_upstream_timeout_ms() -> u32 {
    10_000
}
fn default_user_agent() -> String {
    concat!("geofan/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_upstream_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whole-day age threshold; entries older than this are stale.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
}

fn default_expiry_days() -> i64 {
    7
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            expiry_days: default_expiry_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `schemas/` and `tables/`.
    #[serde(default = "default_data_dir")]
    pub dir: String,
    #[serde(default = "default_input_schema")]
    pub input_schema: String,
    #[serde(default = "default_output_schema")]
    pub output_schema: String,
}

fn default_data_dir() -> String {
    "data".into()
}
fn default_input_schema() -> String {
    "api-in".into()
}
fn default_output_schema() -> String {
    "api-out".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            input_schema: default_input_schema(),
            output_schema: default_output_schema(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
