mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use crate::config::Settings;
use crate::core::{AdvisoryScorer, HeuristicScorer, Ranker, RankerConfig, Scorer};
use models::ScoringWeights;
use routes::rankings::AppState;
use services::{AdvisoryClient, CacheManager, CatalogClient, PostgresClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST),
        )
        .content_type("application/json")
        .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    // Initialize logging from the explicit settings
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&settings.logging.level))
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting DealMatch ranking service...");
    info!("Configuration loaded successfully");

    // Initialize the advisory client
    let advisory = Arc::new(AdvisoryClient::new(
        settings.advisory.endpoint.clone(),
        settings.advisory.api_key.clone(),
        settings.advisory.model.clone(),
        settings.advisory.timeout_secs.unwrap_or(20),
        settings.advisory.max_attempts.unwrap_or(2),
    ));

    info!("Advisory client initialized (model: {})", settings.advisory.model);

    // Initialize the catalog client
    let catalog = Arc::new(CatalogClient::new(
        settings.catalog.endpoint.clone(),
        settings.catalog.api_key.clone(),
        settings.catalog.timeout_secs.unwrap_or(10),
    ));

    info!("Catalog client initialized");

    // Initialize cache manager
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl).await {
        Ok(c) => {
            info!(
                "Cache manager initialized (L1: {} entries, TTL: {}s)",
                l1_cache_size, cache_ttl
            );
            Arc::new(c)
        }
        Err(e) => {
            error!("Failed to connect to Redis ({})", e);
            return Err(std::io::Error::other("Redis connection required"));
        }
    };

    // Initialize PostgreSQL client
    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
        )
        .await
        .unwrap_or_else(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            panic!("PostgreSQL connection error: {}", e);
        }),
    );

    info!(
        "PostgreSQL client initialized (max: {} connections)",
        settings.database.max_connections.unwrap_or(10)
    );

    // Build the scorer from configuration
    let weights = ScoringWeights {
        price: settings.scoring.weights.price,
        industry: settings.scoring.weights.industry,
        financial: settings.scoring.weights.financial,
        location: settings.scoring.weights.location,
        risk: settings.scoring.weights.risk,
        involvement: settings.scoring.weights.involvement,
    };

    let heuristic = HeuristicScorer::new(weights);
    let scorer: Arc<dyn Scorer> = match settings.scoring.mode.as_str() {
        "heuristic" => {
            info!("Scoring mode: heuristic only");
            Arc::new(heuristic)
        }
        _ => {
            info!("Scoring mode: advisory with heuristic fallback");
            Arc::new(AdvisoryScorer::new(advisory.clone(), heuristic))
        }
    };

    // Assemble the ranking orchestrator with explicit dependencies
    let ranker_config = RankerConfig {
        batch_delay: Duration::from_millis(settings.ranking.batch_delay_ms),
        refresh_delay: Duration::from_millis(settings.ranking.refresh_delay_ms),
        candidate_batch: settings.ranking.candidate_batch,
    };

    let ranker = Arc::new(Ranker::new(
        scorer,
        postgres.clone(),
        catalog.clone(),
        ranker_config,
    ));

    info!("Ranker initialized with config: {:?}", ranker_config);

    // Build application state
    let app_state = AppState {
        ranker,
        catalog,
        postgres,
        cache,
        max_limit: settings.ranking.max_limit.unwrap_or(100),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
