use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::filters::filter_listings;
use crate::core::ranker::{Ranker, RankingError};
use crate::models::{
    ErrorResponse, HealthResponse, RankBatchRequest, RankBusinessRequest, RankingsResponse,
    RefreshRankingsRequest, RefreshResponse, SavePreferencesRequest, ScoreResponse,
    SearchListingsRequest, SearchListingsResponse, TopRankedQuery,
};
use crate::services::{CacheKey, CacheManager, CatalogClient, PostgresClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub ranker: Arc<Ranker>,
    pub catalog: Arc<CatalogClient>,
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub max_limit: u16,
}

/// Configure all ranking-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/rankings/business", web::post().to(rank_business))
        .route("/rankings/batch", web::post().to(rank_batch))
        .route("/rankings/top", web::get().to(top_ranked))
        .route("/rankings/refresh", web::post().to(refresh_rankings))
        .route("/preferences", web::get().to(get_preferences))
        .route("/preferences", web::put().to(put_preferences))
        .route("/listings/search", web::post().to(search_listings));
}

/// Map domain ranking failures onto HTTP responses
fn ranking_error_response(error: &RankingError) -> HttpResponse {
    match error {
        RankingError::PreferencesRequired(user_id) => HttpResponse::Conflict().json(ErrorResponse {
            error: "preferences_required".to_string(),
            message: format!(
                "User {} has no preferences yet; onboarding must be completed first",
                user_id
            ),
            status_code: 409,
        }),
        other => HttpResponse::InternalServerError().json(ErrorResponse {
            error: "ranking_failed".to_string(),
            message: other.to_string(),
            status_code: 500,
        }),
    }
}

fn validation_error_response(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Rank a single business for a user
///
/// POST /api/v1/rankings/business
async fn rank_business(
    state: web::Data<AppState>,
    req: web::Json<RankBusinessRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(errors);
    }

    let preferences = match state.postgres.fetch_preferences(&req.user_id).await {
        Ok(Some(prefs)) => prefs,
        Ok(None) => {
            return ranking_error_response(&RankingError::PreferencesRequired(
                req.user_id.clone(),
            ))
        }
        Err(e) => {
            tracing::error!("Failed to fetch preferences for {}: {}", req.user_id, e);
            return ranking_error_response(&RankingError::Repository(e.to_string()));
        }
    };

    let business = match state.catalog.fetch_business(&req.business_id).await {
        Ok(Some(business)) => business,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "listing_not_found".to_string(),
                message: format!("Business {} not found in catalog", req.business_id),
                status_code: 404,
            })
        }
        Err(e) => {
            tracing::error!("Failed to fetch business {}: {}", req.business_id, e);
            return ranking_error_response(&RankingError::Catalog(e.to_string()));
        }
    };

    match state.ranker.rank_business(&business, &preferences).await {
        Ok(score) => HttpResponse::Ok().json(ScoreResponse { score }),
        Err(e) => {
            tracing::error!("Failed to rank business {}: {}", req.business_id, e);
            ranking_error_response(&e)
        }
    }
}

/// Rank a batch of businesses for a user
///
/// POST /api/v1/rankings/batch
async fn rank_batch(
    state: web::Data<AppState>,
    req: web::Json<RankBatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(errors);
    }

    tracing::info!(
        "Batch ranking {} businesses for user {}",
        req.business_ids.len(),
        req.user_id
    );

    // Resolve ids against the catalog; unknown ids are skipped, not fatal
    let mut businesses = Vec::with_capacity(req.business_ids.len());
    for business_id in &req.business_ids {
        match state.catalog.fetch_business(business_id).await {
            Ok(Some(business)) => businesses.push(business),
            Ok(None) => {
                tracing::warn!("Business {} not in catalog, skipping", business_id);
            }
            Err(e) => {
                tracing::error!("Failed to fetch business {}: {}", business_id, e);
                return ranking_error_response(&RankingError::Catalog(e.to_string()));
            }
        }
    }

    match state.ranker.rank_businesses(&businesses, &req.user_id).await {
        Ok(rankings) => {
            let total_results = rankings.len();
            HttpResponse::Ok().json(RankingsResponse {
                rankings,
                total_results,
            })
        }
        Err(e) => {
            tracing::error!("Batch ranking failed for {}: {}", req.user_id, e);
            ranking_error_response(&e)
        }
    }
}

/// Top-N ranked businesses for a user, cache-first
///
/// GET /api/v1/rankings/top?userId={userId}&limit={limit}
async fn top_ranked(
    state: web::Data<AppState>,
    query: web::Query<TopRankedQuery>,
) -> impl Responder {
    let limit = query.limit.min(state.max_limit) as usize;
    let cache_key = CacheKey::top_rankings(&query.user_id, limit);

    if let Ok(cached) = state.cache.get::<RankingsResponse>(&cache_key).await {
        tracing::debug!("Serving top rankings for {} from cache", query.user_id);
        return HttpResponse::Ok().json(cached);
    }

    match state.ranker.top_ranked(&query.user_id, limit).await {
        Ok(rankings) => {
            let response = RankingsResponse {
                total_results: rankings.len(),
                rankings,
            };
            if let Err(e) = state.cache.set(&cache_key, &response).await {
                tracing::warn!("Failed to cache top rankings: {}", e);
            }
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            tracing::error!("Top ranking failed for {}: {}", query.user_id, e);
            ranking_error_response(&e)
        }
    }
}

/// Re-rank everything cached for a user
///
/// POST /api/v1/rankings/refresh
async fn refresh_rankings(
    state: web::Data<AppState>,
    req: web::Json<RefreshRankingsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(errors);
    }

    match state.ranker.refresh_rankings(&req.user_id).await {
        Ok(outcome) => {
            if let Err(e) = state.cache.invalidate_user(&req.user_id).await {
                tracing::warn!("Failed to invalidate cache for {}: {}", req.user_id, e);
            }
            HttpResponse::Ok().json(RefreshResponse {
                refreshed: outcome.refreshed,
                skipped: outcome.skipped,
            })
        }
        Err(e) => {
            tracing::error!("Refresh failed for {}: {}", req.user_id, e);
            ranking_error_response(&e)
        }
    }
}

/// Fetch a user's stored preferences
///
/// GET /api/v1/preferences?userId={userId}
async fn get_preferences(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing userId parameter".to_string(),
                message: "userId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    match state.postgres.fetch_preferences(user_id).await {
        Ok(Some(preferences)) => HttpResponse::Ok().json(preferences),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: "preferences_not_found".to_string(),
            message: format!("No preferences stored for user {}", user_id),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch preferences for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "repository_failure".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Create or replace a user's preferences and re-rank in the background
///
/// PUT /api/v1/preferences
async fn put_preferences(
    state: web::Data<AppState>,
    req: web::Json<SavePreferencesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(errors);
    }

    let preferences = req.into_inner().into_preferences();
    let user_id = preferences.user_id.clone();

    if let Err(e) = state.postgres.save_preferences(&preferences).await {
        tracing::error!("Failed to save preferences for {}: {}", user_id, e);
        return HttpResponse::InternalServerError().json(ErrorResponse {
            error: "repository_failure".to_string(),
            message: e.to_string(),
            status_code: 500,
        });
    }

    if let Err(e) = state.cache.invalidate_user(&user_id).await {
        tracing::warn!("Failed to invalidate cache for {}: {}", user_id, e);
    }

    // Preference changes invalidate every stored score for the user;
    // re-rank in the background so this write returns promptly.
    let ranker = state.ranker.clone();
    let spawn_user = user_id.clone();
    let job_id = uuid::Uuid::new_v4().to_string();
    tokio::spawn(async move {
        match ranker.refresh_rankings(&spawn_user).await {
            Ok(outcome) => tracing::info!(
                job_id = %job_id,
                user_id = %spawn_user,
                refreshed = outcome.refreshed,
                skipped = outcome.skipped,
                "Background re-rank complete"
            ),
            Err(e) => tracing::error!(
                job_id = %job_id,
                user_id = %spawn_user,
                "Background re-rank failed: {}",
                e
            ),
        }
    });

    HttpResponse::Ok().json(preferences)
}

/// Multi-criteria listing search
///
/// POST /api/v1/listings/search
async fn search_listings(
    state: web::Data<AppState>,
    req: web::Json<SearchListingsRequest>,
) -> impl Responder {
    let limit = req.limit.min(state.max_limit) as usize;
    let cache_key = CacheKey::listings_search(&req.criteria, limit);

    if let Ok(cached) = state.cache.get::<SearchListingsResponse>(&cache_key).await {
        return HttpResponse::Ok().json(cached);
    }

    let fetched = match state.catalog.search_listings(&req.criteria, &[], limit).await {
        Ok(listings) => listings,
        Err(e) => {
            tracing::error!("Catalog search failed: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "catalog_failure".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    // The engine owns the filter semantics; re-apply them over whatever
    // subset the catalog chose to return.
    let listings = filter_listings(fetched, &req.criteria);

    let response = SearchListingsResponse {
        total_results: listings.len(),
        listings,
    };
    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!("Failed to cache search results: {}", e);
    }

    HttpResponse::Ok().json(response)
}
