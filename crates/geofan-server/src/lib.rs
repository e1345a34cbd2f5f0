pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::{AppConfig, CacheSettings, DataConfig, ServerConfig, UpstreamConfig};
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use server::{AppState, GeofanServer, ServerBuilder, build_app};
