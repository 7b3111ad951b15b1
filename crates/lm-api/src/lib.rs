use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::connect_info::ConnectInfo,
    extract::DefaultBodyLimit,
    extract::State,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
    http::Method,
    http::Request,
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenvy::dotenv;
use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::keyed::DashMapStateStore, Quota,
    RateLimiter,
};
use lm_common::config::EngineSettings;
use lm_common::db::{create_pool_from_url_checked, PgCandidateStore, PgSimilarityIndex};
use lm_common::embedding::{create_embedding_provider, EmbeddingProviderSettings};
use lm_common::index::{InMemorySimilarityIndex, SimilarityIndex};
use lm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use lm_common::matching::{MatchEngine, MatchEngineConfig};
use lm_common::store::{CandidateStore, MemoryCandidateStore};
use serde::Deserialize;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{embeddings, health, notify, score, search};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Parser)]
#[command(name = "lm-api", about = "Worker/job match search API")]
struct Cli {
    /// PostgreSQL connection string. Without it the API serves an in-memory
    /// snapshot (empty, or loaded from --seed-file).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JSON file with `{"workers": [...], "jobs": [...]}` for the in-memory store
    #[arg(long, env = "LM_SEED_FILE")]
    seed_file: Option<PathBuf>,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "LM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Expose Prometheus metrics on GET /metrics
    #[arg(
        long,
        env = "LM_METRICS_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    metrics: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub seed_file: Option<PathBuf>,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub metrics: bool,
    pub engine: EngineSettings,
    pub embedder: EmbeddingProviderSettings,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "LM_CORS_ORIGINS must list explicit origins".into(),
            ));
        }

        Ok(Self {
            database_url: cli.database_url.filter(|url| !url.trim().is_empty()),
            seed_file: cli.seed_file,
            port: cli.port,
            cors_origins,
            metrics: cli.metrics,
            engine: EngineSettings::from_env(),
            embedder: EmbeddingProviderSettings::from_env(),
        })
    }

    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            seed_file: None,
            port: 3001,
            cors_origins: vec!["http://localhost:3000".into()],
            metrics: false,
            engine: EngineSettings::default(),
            embedder: EmbeddingProviderSettings {
                kind: "null".into(),
                ..EmbeddingProviderSettings::default()
            },
        }
    }
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Clone)]
pub struct RateLimits {
    global: Arc<IpRateLimiter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_sec: u64,
    pub burst: u32,
}

impl RateLimitConfig {
    fn parse_env<T: std::str::FromStr + PartialOrd + Default>(name: &str) -> Option<T> {
        env::var(name)
            .ok()
            .and_then(|value| value.trim().parse::<T>().ok())
            .filter(|value| *value > T::default())
    }

    fn from_env() -> Self {
        Self {
            per_sec: Self::parse_env("LM_RATE_LIMIT_PER_SEC").unwrap_or(20),
            burst: Self::parse_env("LM_RATE_LIMIT_BURST").unwrap_or(40),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub engine: Arc<MatchEngine>,
    pub store: Arc<dyn CandidateStore>,
    pub(crate) rate_limits: RateLimits,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn build_ip_limiter(per_second: u64, burst_size: u32) -> Arc<IpRateLimiter> {
    let nanos_per_token = 1_000_000_000u64 / per_second.max(1);
    let burst = NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(Duration::from_nanos(nanos_per_token.max(1)))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst);

    Arc::new(RateLimiter::keyed(quota))
}

pub fn default_rate_limits() -> RateLimits {
    let cfg = RateLimitConfig::from_env();
    RateLimits {
        global: build_ip_limiter(cfg.per_sec, cfg.burst),
    }
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

fn enforce_rate_limit(limiter: &IpRateLimiter, ip: Option<IpAddr>) -> Result<(), ApiError> {
    if let Some(client_ip) = ip {
        if limiter.check_key(&client_ip).is_err() {
            return Err(ApiError::TooManyRequests("rate limit exceeded".into()));
        }
    }

    Ok(())
}

async fn global_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rate_limits.global, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route("/workers/search", post(search::search_workers))
        .route("/jobs/search", post(search::search_jobs))
        .route("/jobs/:id/match-workers", post(notify::match_workers))
        .route("/score", post(score::score_candidate))
        .route("/embeddings", post(embeddings::create_embedding));

    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    workers: Vec<lm_common::Worker>,
    #[serde(default)]
    jobs: Vec<lm_common::Job>,
}

fn load_seed(path: &std::path::Path) -> Result<MemoryCandidateStore, ApiError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| ApiError::Internal(format!("failed to read seed file: {err}")))?;
    let seed: SeedFile = serde_json::from_str(&raw)
        .map_err(|err| ApiError::BadRequest(format!("invalid seed file: {err}")))?;

    Ok(MemoryCandidateStore::new(seed.workers, seed.jobs))
}

/// State over an in-memory snapshot with an index built from its vectors.
pub fn memory_state(config: AppConfig, store: MemoryCandidateStore) -> SharedState {
    let index = InMemorySimilarityIndex::from_candidates(&store.candidates());
    let provider = create_embedding_provider(&config.embedder);
    let engine = MatchEngine::new(MatchEngineConfig::from_settings(
        &config.engine,
        provider,
        Arc::new(index),
    ));

    Arc::new(AppState {
        config,
        engine: Arc::new(engine),
        store: Arc::new(store),
        rate_limits: default_rate_limits(),
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

pub fn test_state(store: MemoryCandidateStore) -> SharedState {
    memory_state(AppConfig::for_tests(), store)
}

async fn build_state(config: AppConfig) -> Result<SharedState, ApiError> {
    let Some(database_url) = config.database_url.clone() else {
        let store = match config.seed_file.as_deref() {
            Some(path) => load_seed(path)?,
            None => {
                warn!("DATABASE_URL not set; serving an empty in-memory store");
                MemoryCandidateStore::default()
            }
        };
        return Ok(memory_state(config, store));
    };

    let pool = create_pool_from_url_checked(&database_url).await?;
    let index: Arc<dyn SimilarityIndex> = Arc::new(PgSimilarityIndex::new(pool.clone()));
    let provider = create_embedding_provider(&config.embedder);
    let engine = MatchEngine::new(MatchEngineConfig::from_settings(
        &config.engine,
        provider,
        index,
    ));

    Ok(Arc::new(AppState {
        config,
        engine: Arc::new(engine),
        store: Arc::new(PgCandidateStore::new(pool)),
        rate_limits: default_rate_limits(),
        readiness: Arc::new(AtomicBool::new(true)),
    }))
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;
    if config.metrics {
        lm_metrics::init_metrics();
    }

    let state = build_state(config.clone()).await?;

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(
        %addr,
        store = state.store.name(),
        embedder = state.engine.embedding_provider().name(),
        run_id = lm_common::run_id::get(),
        "lm-api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);

    // Let load balancers see /readyz fail before connections stop.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Mutex;
    use tower::ServiceExt;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn with_envs(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _guard = ENV_GUARD.lock().unwrap();

        let previous: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(var, value)| {
                let old = env::var(var).ok();
                match value {
                    Some(v) => env::set_var(var, v),
                    None => env::remove_var(var),
                }
                (*var, old)
            })
            .collect();

        f();

        for (var, previous_value) in previous {
            match previous_value {
                Some(v) => env::set_var(var, v),
                None => env::remove_var(var),
            }
        }
    }

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(SetRequestIdLayer::new(
                HeaderName::from_static("x-request-id"),
                MakeRequestUuid::default(),
            ));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn rate_limit_config_respects_env_overrides() {
        with_envs(
            &[
                ("LM_RATE_LIMIT_PER_SEC", Some("10")),
                ("LM_RATE_LIMIT_BURST", Some("25")),
            ],
            || {
                assert_eq!(
                    RateLimitConfig::from_env(),
                    RateLimitConfig {
                        per_sec: 10,
                        burst: 25,
                    }
                );
            },
        );

        with_envs(
            &[
                ("LM_RATE_LIMIT_PER_SEC", Some("0")),
                ("LM_RATE_LIMIT_BURST", Some("lots")),
            ],
            || {
                assert_eq!(
                    RateLimitConfig::from_env(),
                    RateLimitConfig {
                        per_sec: 20,
                        burst: 40,
                    }
                );
            },
        );
    }

    #[test]
    fn rejects_wildcard_cors() {
        let cli = Cli::parse_from(["lm-api", "--cors-origins", "*"]);
        assert!(matches!(
            AppConfig::from_cli(cli),
            Err(ApiError::BadRequest(_))
        ));

        let cli = Cli::parse_from([
            "lm-api",
            "--cors-origins",
            "https://a.example, ,https://b.example",
        ]);
        let config = AppConfig::from_cli(cli).unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn loads_seed_file() {
        let path =
            env::temp_dir().join(format!("lm-seed-{}.json", lm_common::run_id::generate()));
        std::fs::write(
            &path,
            r#"{"workers":[{"id":"w1","skills":["Plumbing"]}],"jobs":[{"id":"j1","skill":"Plumbing"}]}"#,
        )
        .unwrap();

        let store = load_seed(&path).unwrap();
        assert_eq!(store.candidates().len(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
