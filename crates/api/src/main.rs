use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealscope_core::domain::financial::FinancialRecord;
use dealscope_core::domain::pipeline::{IndustryComparison, PipelineEntry};
use dealscope_core::ingest::provider::{ProviderError, ProviderErrorKind};
use dealscope_core::llm::prompt::DocumentText;
use dealscope_core::research::{CompanyReport, DocumentAnalysis, ResearchRequest, ResearchService};
use dealscope_core::storage::memory::MemoryStore;
use dealscope_core::storage::pipeline::PipelineStore;
use dealscope_core::storage::KvStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = dealscope_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let store: Arc<dyn KvStore> = match dealscope_core::storage::open_from_settings(&settings).await
    {
        Ok(store) => store,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "store unavailable; starting API with in-memory storage");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!(backend = store.backend_name(), "store opened");

    let service = ResearchService::from_settings(&settings, store.clone())?;
    let pipeline = PipelineStore::load(store).await?;

    let state = AppState {
        service: Arc::new(service),
        pipeline: Arc::new(Mutex::new(pipeline)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/research", post(research))
        .route("/documents/analyze", post(analyze_documents))
        .route("/financials/:symbol", get(get_financials))
        .route("/pipeline", get(get_pipeline))
        .route("/pipeline/industries", get(get_industry_comparison))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: Arc<ResearchService>,
    pipeline: Arc<Mutex<PipelineStore>>,
}

impl AppState {
    fn check_documents(&self, documents: &[DocumentText]) -> Result<(), StatusCode> {
        self.service.check_documents(documents).map_err(|e| {
            tracing::warn!(error = %e, "rejected document upload");
            StatusCode::BAD_REQUEST
        })
    }
}

async fn research(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Result<Json<CompanyReport>, StatusCode> {
    if req.query.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    state.check_documents(&req.documents)?;

    // Held across the whole search so concurrent requests cannot interleave upserts.
    let mut pipeline = state.pipeline.lock().await;
    let report = state
        .service
        .research(&req, &mut pipeline)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, query = %req.query, "research failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(report))
}

async fn analyze_documents(
    State(state): State<AppState>,
    Json(documents): Json<Vec<DocumentText>>,
) -> Result<Json<DocumentAnalysis>, StatusCode> {
    if documents.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    state.check_documents(&documents)?;

    let analysis = state
        .service
        .analyze_documents_only(&documents)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "document analysis failed");
            StatusCode::BAD_GATEWAY
        })?;

    Ok(Json(analysis))
}

async fn get_financials(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<FinancialRecord>, StatusCode> {
    if !state.service.has_financial_provider() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let record = state.service.financials(&symbol).await.map_err(|e| {
        let status = match e.downcast_ref::<ProviderError>().map(|p| p.kind) {
            Some(ProviderErrorKind::ErrorPayload | ProviderErrorKind::NoData) => {
                StatusCode::NOT_FOUND
            }
            Some(ProviderErrorKind::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::BAD_GATEWAY {
            sentry_anyhow::capture_anyhow(&e);
        }
        tracing::warn!(error = %e, %symbol, %status, "financial fetch failed");
        status
    })?;

    Ok(Json(record))
}

async fn get_pipeline(State(state): State<AppState>) -> Json<Vec<PipelineEntry>> {
    let pipeline = state.pipeline.lock().await;
    Json(pipeline.list().to_vec())
}

async fn get_industry_comparison(State(state): State<AppState>) -> Json<IndustryComparison> {
    let pipeline = state.pipeline.lock().await;
    Json(pipeline.industry_comparison())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &dealscope_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
