use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::location::locations_match;
use crate::core::scoring::{Scorer, ScoringError};
use crate::models::{
    Business, BusinessScore, FilterCriteria, InvestorPreferences, ScoreBreakdown,
};

/// Domain-level ranking failures surfaced to the API layer
#[derive(Debug, Error)]
pub enum RankingError {
    /// The user has no preferences record; recoverable by completing onboarding
    #[error("No preferences found for user {0}; onboarding must be completed first")]
    PreferencesRequired(String),

    /// Persistent store unavailable; retryable infrastructure failure
    #[error("Score repository failure: {0}")]
    Repository(String),

    /// Catalog collaborator unavailable
    #[error("Listing catalog failure: {0}")]
    Catalog(String),

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),
}

/// Persistence contract for scores and preferences
///
/// Implemented by `services::postgres::PostgresClient`; faked in tests.
/// Upserts must resolve conflicts on the (user_id, business_id) key in
/// place, never creating a second row.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn get_score(
        &self,
        user_id: &str,
        business_id: &str,
    ) -> Result<Option<BusinessScore>, RankingError>;

    /// Cached scores for a user, ordered score descending
    async fn get_top_scores(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BusinessScore>, RankingError>;

    /// Every cached score for a user, for full re-ranking
    async fn get_all_scores(&self, user_id: &str) -> Result<Vec<BusinessScore>, RankingError>;

    async fn upsert_score(&self, score: BusinessScore) -> Result<BusinessScore, RankingError>;

    /// Overwrite score/reasoning/factors on an existing row
    async fn update_score(
        &self,
        user_id: &str,
        business_id: &str,
        breakdown: &ScoreBreakdown,
    ) -> Result<(), RankingError>;

    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<InvestorPreferences>, RankingError>;
}

/// Listing catalog contract
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_business(&self, business_id: &str) -> Result<Option<Business>, RankingError>;

    /// Listings satisfying the criteria, excluding the given ids
    async fn search(
        &self,
        criteria: &FilterCriteria,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Business>, RankingError>;
}

/// Orchestrator tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct RankerConfig {
    /// Pause between scoring calls inside a batch, for advisory rate limits
    pub batch_delay: Duration,
    /// Pause between items during a full refresh
    pub refresh_delay: Duration,
    /// Upper bound on fresh candidates ranked per top-N request
    pub candidate_batch: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_millis(100),
            refresh_delay: Duration::from_millis(200),
            candidate_batch: 20,
        }
    }
}

/// Outcome counts for a full re-rank
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOutcome {
    pub refreshed: usize,
    pub skipped: usize,
}

/// Ranking orchestrator
///
/// Composes the scorer, score store and catalog behind explicit injection
/// so every collaborator can be substituted in tests.
pub struct Ranker {
    scorer: Arc<dyn Scorer>,
    store: Arc<dyn ScoreStore>,
    catalog: Arc<dyn Catalog>,
    config: RankerConfig,
}

impl Ranker {
    pub fn new(
        scorer: Arc<dyn Scorer>,
        store: Arc<dyn ScoreStore>,
        catalog: Arc<dyn Catalog>,
        config: RankerConfig,
    ) -> Self {
        Self {
            scorer,
            store,
            catalog,
            config,
        }
    }

    /// Score one business for one investor and persist the result
    ///
    /// Always yields a fully populated score: the advisory scorer falls
    /// back to the deterministic heuristic on any advisory failure.
    pub async fn rank_business(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> Result<BusinessScore, RankingError> {
        let breakdown = self.scorer.score(business, preferences).await?;
        let score = BusinessScore::from_breakdown(&preferences.user_id, business, breakdown);
        self.store.upsert_score(score).await
    }

    /// Rank a batch of businesses for a user, reusing cached scores
    ///
    /// Cache misses are scored sequentially with an inter-call delay to
    /// respect advisory rate limits. A failure on one business skips that
    /// business and continues; partial results are a success.
    pub async fn rank_businesses(
        &self,
        businesses: &[Business],
        user_id: &str,
    ) -> Result<Vec<BusinessScore>, RankingError> {
        let preferences = self
            .store
            .get_preferences(user_id)
            .await?
            .ok_or_else(|| RankingError::PreferencesRequired(user_id.to_string()))?;

        let mut rankings = Vec::with_capacity(businesses.len());
        let mut scored_any = false;

        for business in businesses {
            if let Some(cached) = self.store.get_score(user_id, &business.id).await? {
                tracing::debug!(
                    business_id = %business.id,
                    "Reusing cached score {}",
                    cached.score
                );
                rankings.push(cached);
                continue;
            }

            if scored_any {
                tokio::time::sleep(self.config.batch_delay).await;
            }
            scored_any = true;

            match self.rank_business(business, &preferences).await {
                Ok(score) => rankings.push(score),
                Err(RankingError::Scoring(e)) => {
                    tracing::warn!(
                        business_id = %business.id,
                        "Skipping business after scoring failure: {}",
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        rankings.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(rankings)
    }

    /// Cache-first top-N retrieval
    ///
    /// Serves from cached scores when the location-filtered cache already
    /// covers the limit; otherwise tops up with fresh catalog candidates
    /// (at most `candidate_batch`) before merging and re-sorting.
    pub async fn top_ranked(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BusinessScore>, RankingError> {
        let preferences = self
            .store
            .get_preferences(user_id)
            .await?
            .ok_or_else(|| RankingError::PreferencesRequired(user_id.to_string()))?;

        let cached = self.store.get_top_scores(user_id, limit * 2).await?;
        let cached_ids: Vec<String> = cached.iter().map(|s| s.business_id.clone()).collect();

        let mut rankings: Vec<BusinessScore> = cached
            .into_iter()
            .filter(|score| {
                preferences.any_location()
                    || locations_match(&score.business_location, &preferences.location)
            })
            .collect();

        if rankings.len() >= limit {
            rankings.truncate(limit);
            return Ok(rankings);
        }

        tracing::debug!(
            user_id,
            cached = rankings.len(),
            "Cache too thin for limit {}, topping up from catalog",
            limit
        );

        let criteria = FilterCriteria {
            location: (!preferences.any_location()).then(|| preferences.location.clone()),
            ..Default::default()
        };
        let candidates = self
            .catalog
            .search(&criteria, &cached_ids, self.config.candidate_batch)
            .await?;

        let fresh = self
            .rank_businesses(&candidates, user_id)
            .await?
            .into_iter()
            .filter(|score| !cached_ids.contains(&score.business_id));
        rankings.extend(fresh);

        rankings.sort_by(|a, b| b.score.cmp(&a.score));
        rankings.truncate(limit);
        Ok(rankings)
    }

    /// Re-rank every cached business for a user after a preference change
    ///
    /// Runs item by item with a larger delay than batch ranking since it
    /// can touch every row the user has ever scored. Per-item failures are
    /// logged and skipped.
    pub async fn refresh_rankings(&self, user_id: &str) -> Result<RefreshOutcome, RankingError> {
        let preferences = self
            .store
            .get_preferences(user_id)
            .await?
            .ok_or_else(|| RankingError::PreferencesRequired(user_id.to_string()))?;

        let scored = self.store.get_all_scores(user_id).await?;
        let mut outcome = RefreshOutcome::default();

        for (index, existing) in scored.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.refresh_delay).await;
            }

            let business = match self.catalog.get_business(&existing.business_id).await {
                Ok(Some(business)) => business,
                Ok(None) => {
                    tracing::warn!(
                        business_id = %existing.business_id,
                        "Business no longer in catalog, skipping refresh"
                    );
                    outcome.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        business_id = %existing.business_id,
                        "Catalog lookup failed during refresh, skipping: {}",
                        e
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            let breakdown = match self.scorer.score(&business, &preferences).await {
                Ok(breakdown) => breakdown,
                Err(e) => {
                    tracing::warn!(
                        business_id = %business.id,
                        "Scoring failed during refresh, skipping: {}",
                        e
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            self.store
                .update_score(user_id, &business.id, &breakdown)
                .await?;
            outcome.refreshed += 1;
        }

        tracing::info!(
            user_id,
            refreshed = outcome.refreshed,
            skipped = outcome.skipped,
            "Refreshed rankings after preference change"
        );
        Ok(outcome)
    }
}
