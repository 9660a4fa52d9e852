//! MCP context HTTP server.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::errors::{ContextError, RegistryError};
use crate::domain::models::{
    ContextBundle, ContextQuery, DomainModelDescriptor, DomainSummary, LoadReport,
    McpServerConfig, TraceEntry,
};
use crate::services::{ContextService, RegistryStats};

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9200,
            enable_cors: true,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

impl From<ContextError> for ErrorResponse {
    fn from(e: ContextError) -> Self {
        Self {
            error: e.to_string(),
            code: context_error_code(&e).to_string(),
        }
    }
}

fn context_error_code(e: &ContextError) -> &'static str {
    match e {
        ContextError::EmptyQuery => "EMPTY_QUERY",
        ContextError::NoMatch(_) => "NO_MATCH",
        ContextError::UnknownDomains(_) => "UNKNOWN_DOMAINS",
        ContextError::DuplicateRequestId(_) => "DUPLICATE_REQUEST_ID",
        ContextError::TraceNotFound(_) => "TRACE_NOT_FOUND",
        ContextError::Registry(RegistryError::NotFound(_)) => "NOT_FOUND",
        ContextError::Registry(_) => "REGISTRY_ERROR",
        ContextError::TraceStore(_) => "TRACE_STORE_ERROR",
        ContextError::Internal(_) => "INTERNAL_ERROR",
    }
}

fn context_error(e: ContextError) -> ApiError {
    let status = match &e {
        ContextError::EmptyQuery => StatusCode::BAD_REQUEST,
        ContextError::NoMatch(_)
        | ContextError::UnknownDomains(_)
        | ContextError::TraceNotFound(_)
        | ContextError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
        ContextError::DuplicateRequestId(_) => StatusCode::CONFLICT,
        ContextError::Registry(RegistryError::DirectoryNotFound(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::from(e)))
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub loaded: bool,
    pub domain_models: usize,
    pub uptime_secs: i64,
}

/// Metrics response.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub registry: RegistryStats,
    pub trace_count: usize,
}

/// Query parameters for recent traces.
#[derive(Debug, Deserialize)]
pub struct TraceListParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Shared state for the HTTP server.
struct AppState {
    service: ContextService,
    servers: Vec<McpServerConfig>,
    started_at: DateTime<Utc>,
}

/// MCP context HTTP server.
pub struct McpHttpServer {
    config: HttpConfig,
    service: ContextService,
    servers: Vec<McpServerConfig>,
}

impl McpHttpServer {
    pub fn new(service: ContextService, servers: Vec<McpServerConfig>, config: HttpConfig) -> Self {
        Self {
            config,
            service,
            servers,
        }
    }

    /// Build the router.
    pub fn router(self) -> Router {
        let state = Arc::new(AppState {
            service: self.service,
            servers: self.servers,
            started_at: Utc::now(),
        });

        let app = Router::new()
            .route("/api/mcp/health", get(health_check))
            .route("/api/mcp/metrics", get(metrics))
            .route("/api/mcp/servers", get(list_servers))
            .route("/api/mcp/domain-models", get(list_domain_models))
            .route("/api/mcp/domain-models/{id}", get(get_domain_model))
            .route("/api/mcp/reload", post(reload))
            .route("/api/mcp/resolve", post(resolve))
            .route("/api/mcp/traces", get(recent_traces))
            .route("/api/mcp/traces/{request_id}", get(get_trace))
            .with_state(state);

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(
        self,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.router();

        tracing::info!("MCP context HTTP server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

// Handler functions

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.service.registry().stats().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        loaded: stats.loaded,
        domain_models: stats.size,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<Json<MetricsResponse>, ApiError> {
    let registry = state.service.registry().stats().await;
    let trace_count = state.service.trace_count().await.map_err(context_error)?;
    Ok(Json(MetricsResponse {
        registry,
        trace_count,
    }))
}

async fn list_servers(State(state): State<Arc<AppState>>) -> Json<Vec<McpServerConfig>> {
    Json(state.servers.clone())
}

async fn list_domain_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DomainSummary>>, ApiError> {
    state
        .service
        .list_domains()
        .await
        .map(Json)
        .map_err(context_error)
}

async fn get_domain_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DomainModelDescriptor>, ApiError> {
    match state.service.registry().get(&id).await {
        Ok(descriptor) => Ok(Json(descriptor.as_ref().clone())),
        Err(e) => Err(context_error(e.into())),
    }
}

async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<LoadReport>, ApiError> {
    state
        .service
        .registry()
        .reload()
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::SERVICE_UNAVAILABLE, "RELOAD_ERROR", e))
}

async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(query): Json<ContextQuery>,
) -> Result<Json<ContextBundle>, ApiError> {
    state
        .service
        .resolve(query)
        .await
        .map(Json)
        .map_err(context_error)
}

async fn recent_traces(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TraceListParams>,
) -> Result<Json<Vec<TraceEntry>>, ApiError> {
    state
        .service
        .recent_traces(params.limit)
        .await
        .map(Json)
        .map_err(context_error)
}

async fn get_trace(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Json<TraceEntry>, ApiError> {
    state
        .service
        .get_trace(&request_id)
        .await
        .map(Json)
        .map_err(context_error)
}
