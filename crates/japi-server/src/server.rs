use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use japi_core::{CoreError, ResourceGraph, ResourceGraphDefinition};
use japi_openapi::OpenApiService;
use thiserror::Error;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, normalize_host};
use crate::handlers;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load resource model from {path}: {source}")]
    Model { path: String, source: CoreError },
}

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OpenApiService>,
    pub public_scheme: Arc<str>,
    pub base_path: Arc<str>,
    pub fallback_host: Arc<str>,
    /// Normalized `server.allowed_hosts`.
    pub allowed_hosts: Arc<[String]>,
}

impl AppState {
    pub fn new(cfg: &AppConfig, graph: ResourceGraph) -> Self {
        Self {
            service: Arc::new(OpenApiService::new(Arc::new(graph), cfg.openapi.clone())),
            public_scheme: cfg.server.public_scheme.as_str().into(),
            base_path: cfg.server.base_path.as_str().into(),
            fallback_host: cfg.fallback_host().into(),
            allowed_hosts: cfg
                .server
                .allowed_hosts
                .iter()
                .map(|h| normalize_host(h, &cfg.server.public_scheme))
                .collect(),
        }
    }

    /// Host written into generated server URLs for a request.
    ///
    /// The document cache is keyed by this value, so hosts outside
    /// `allowed_hosts` collapse onto the fallback host.
    pub fn resolve_host(&self, requested: Option<&str>) -> String {
        let Some(host) = requested.map(|h| normalize_host(h, &self.public_scheme)) else {
            return self.fallback_host.to_string();
        };
        if host.is_empty() || (!self.allowed_hosts.is_empty() && !self.allowed_hosts.contains(&host)) {
            return self.fallback_host.to_string();
        }
        host
    }
}

/// Reads and resolves the configured resource model.
pub fn load_graph(cfg: &AppConfig) -> Result<ResourceGraph, StartupError> {
    let Some(path) = cfg.model.path.as_deref() else {
        tracing::warn!("no model.path configured, serving an empty resource graph");
        return Ok(ResourceGraph::empty());
    };
    let graph = ResourceGraphDefinition::from_path(path)
        .and_then(|definition| definition.build())
        .map_err(|source| StartupError::Model {
            path: path.to_string(),
            source,
        })?;
    tracing::info!(path, resource_types = graph.len(), "Resource model loaded");
    Ok(graph)
}

pub fn build_app(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/openapi/{document}/openapi.json", get(handlers::openapi_document));

    let base_path = state.base_path.clone();
    let router = if base_path.is_empty() {
        routes.with_state(state)
    } else {
        Router::new().nest(&base_path, routes.with_state(state))
    };

    router
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(|res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                    span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                    tracing::info!(
                        http.status = %res.status().as_u16(),
                        elapsed_ms = %latency.as_millis(),
                        "request handled"
                    );
                }),
        )
}

pub struct JapiServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    graph: Option<ResourceGraph>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            graph: None,
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

    /// Uses an already resolved graph instead of reading `model.path`.
    pub fn with_graph(mut self, graph: ResourceGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn build(self) -> Result<JapiServer, StartupError> {
        let graph = match self.graph {
            Some(graph) => graph,
            None => load_graph(&self.config)?,
        };
        let app = build_app(AppState::new(&self.config, graph));

        Ok(JapiServer { addr: self.addr, app })
    }
}

impl JapiServer {
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
