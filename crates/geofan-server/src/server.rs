use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use geofan_pipeline::{RequestOrchestrator, RequestOrchestratorBuilder, ResultCache};
use geofan_providers::{
    FileDataSource, HttpExecutor, MappingNormalizer, ProviderError, SchemaUrlAssembler,
};

use crate::{config::AppConfig, handlers};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RequestOrchestrator>,
}

pub struct GeofanServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // The query endpoint
        .route("/geolocate", get(handlers::geolocate))
        .with_state(state)
        // Browser clients call the query endpoint directly.
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http.request",
                        http.method = %method,
                        http.target = %uri,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Wires the shipped collaborators and builds the server.
    pub async fn build(self) -> Result<GeofanServer, ProviderError> {
        let cfg = &self.config;

        let data_source = Arc::new(FileDataSource::load(cfg.data.dir.clone()).await?);
        let executor = Arc::new(HttpExecutor::new(
            cfg.upstream_timeout(),
            &cfg.upstream.user_agent,
        )?);
        let cache = Arc::new(ResultCache::new(cfg.cache.expiry_days));

        let orchestrator = RequestOrchestratorBuilder::new(
            data_source,
            Arc::new(SchemaUrlAssembler),
            executor,
            Arc::new(MappingNormalizer),
        )
        .with_cache(cache)
        .with_schema_ids(cfg.data.input_schema.clone(), cfg.data.output_schema.clone())
        .build();

        let state = AppState {
            orchestrator: Arc::new(orchestrator),
        };
        let app = build_app(cfg, state);

        Ok(GeofanServer {
            addr: self.addr,
            app,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GeofanServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
