use std::{env, path::PathBuf};

use geofan_server::config::AppConfig;
use geofan_server::{ServerBuilder, apply_logging_level, init_tracing};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From GEOFAN_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (geofan.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (GEOFAN_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present, for local development.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    init_tracing();

    let (config_path, source) = resolve_config_path();

    let cfg = match AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = %config_path.display(),
        source = %source,
        "Configuration loaded"
    );

    apply_logging_level(&cfg.logging.level);

    let server = match ServerBuilder::new().with_config(cfg).build().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Server initialization failed: {e}");
            std::process::exit(2);
        }
    };

    if let Err(err) = server.run().await {
        eprintln!("Server error: {err}");
    }
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. GEOFAN_CONFIG environment variable
/// 3. Default: geofan.toml in the working directory
fn resolve_config_path() -> (PathBuf, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config"
            && let Some(path) = args.next()
        {
            return (PathBuf::from(path), ConfigSource::CliArgument);
        }
    }

    if let Ok(path) = env::var("GEOFAN_CONFIG") {
        return (PathBuf::from(path), ConfigSource::EnvironmentVariable);
    }

    (PathBuf::from("geofan.toml"), ConfigSource::Default)
}
