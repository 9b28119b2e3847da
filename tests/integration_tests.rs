// Integration tests for the ranking orchestrator, run against in-memory
// fakes of the score store and catalog collaborators.

use async_trait::async_trait;
use dealmatch_algo::core::{
    Catalog, HeuristicScorer, Ranker, RankerConfig, RankingError, ScoreStore, Scorer,
    ScoringError,
};
use dealmatch_algo::models::{
    Business, BusinessScore, FilterCriteria, InvestorPreferences, ScoreBreakdown,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn business(id: &str, price: i64, industry: &str, location: &str) -> Business {
    Business {
        id: id.to_string(),
        name: format!("Business {}", id),
        description: "Established operation".to_string(),
        location: location.to_string(),
        industry: industry.to_string(),
        asking_price: price,
        annual_revenue: 1_200_000,
        cash_flow: 200_000,
        ebitda: 180_000,
        employees: 10,
        year_established: Some(2012),
    }
}

fn preferences(user_id: &str, location: &str) -> InvestorPreferences {
    InvestorPreferences {
        user_id: user_id.to_string(),
        capital_min: 400_000,
        capital_max: 600_000,
        target_income: 150_000,
        risk_tolerance: "medium".to_string(),
        involvement: "hands-on".to_string(),
        location: location.to_string(),
        industries: vec!["Technology".to_string()],
        business_size: "6-15".to_string(),
        payback_period_years: 5,
    }
}

#[derive(Default)]
struct MemoryStore {
    scores: Mutex<HashMap<(String, String), BusinessScore>>,
    preferences: Mutex<HashMap<String, InvestorPreferences>>,
    upserts: AtomicUsize,
}

impl MemoryStore {
    fn with_preferences(prefs: InvestorPreferences) -> Self {
        let store = Self::default();
        store
            .preferences
            .lock()
            .unwrap()
            .insert(prefs.user_id.clone(), prefs);
        store
    }

    fn set_preferences(&self, prefs: InvestorPreferences) {
        self.preferences
            .lock()
            .unwrap()
            .insert(prefs.user_id.clone(), prefs);
    }

    fn row_count(&self) -> usize {
        self.scores.lock().unwrap().len()
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn get_score(
        &self,
        user_id: &str,
        business_id: &str,
    ) -> Result<Option<BusinessScore>, RankingError> {
        Ok(self
            .scores
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), business_id.to_string()))
            .cloned())
    }

    async fn get_top_scores(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BusinessScore>, RankingError> {
        let mut scores: Vec<BusinessScore> = self
            .scores
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores.truncate(limit);
        Ok(scores)
    }

    async fn get_all_scores(&self, user_id: &str) -> Result<Vec<BusinessScore>, RankingError> {
        Ok(self
            .scores
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_score(&self, score: BusinessScore) -> Result<BusinessScore, RankingError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.scores.lock().unwrap().insert(
            (score.user_id.clone(), score.business_id.clone()),
            score.clone(),
        );
        Ok(score)
    }

    async fn update_score(
        &self,
        user_id: &str,
        business_id: &str,
        breakdown: &ScoreBreakdown,
    ) -> Result<(), RankingError> {
        let mut scores = self.scores.lock().unwrap();
        if let Some(row) = scores.get_mut(&(user_id.to_string(), business_id.to_string())) {
            row.score = breakdown.score;
            row.reasoning = breakdown.reasoning.clone();
            row.factors = breakdown.factors;
        }
        Ok(())
    }

    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<InvestorPreferences>, RankingError> {
        Ok(self.preferences.lock().unwrap().get(user_id).cloned())
    }
}

#[derive(Default)]
struct MemoryCatalog {
    listings: Vec<Business>,
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn get_business(&self, business_id: &str) -> Result<Option<Business>, RankingError> {
        Ok(self.listings.iter().find(|b| b.id == business_id).cloned())
    }

    async fn search(
        &self,
        criteria: &FilterCriteria,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Business>, RankingError> {
        let mut listings: Vec<Business> = self
            .listings
            .iter()
            .filter(|b| !exclude_ids.contains(&b.id))
            .filter(|b| dealmatch_algo::core::matches_criteria(b, criteria))
            .cloned()
            .collect();
        listings.truncate(limit);
        Ok(listings)
    }
}

struct FlakyScorer {
    fail_ids: Vec<String>,
    inner: HeuristicScorer,
}

#[async_trait]
impl Scorer for FlakyScorer {
    async fn score(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> Result<ScoreBreakdown, ScoringError> {
        if self.fail_ids.contains(&business.id) {
            return Err(ScoringError::Failed("simulated scoring failure".to_string()));
        }
        Ok(self.inner.breakdown(business, preferences))
    }
}

fn fast_config() -> RankerConfig {
    RankerConfig {
        batch_delay: Duration::from_millis(0),
        refresh_delay: Duration::from_millis(0),
        candidate_batch: 20,
    }
}

#[tokio::test]
async fn test_end_to_end_batch_top_and_refresh() {
    let store = Arc::new(MemoryStore::with_preferences(preferences(
        "u1",
        "Austin, TX",
    )));
    let catalog = Arc::new(MemoryCatalog {
        listings: vec![
            business("fit", 500_000, "Technology", "Austin, TX"),
            business("wrong_industry", 500_000, "Mining", "Austin, TX"),
            business("wrong_city", 500_000, "Technology", "Boise, ID"),
        ],
    });
    let ranker = Ranker::new(
        Arc::new(HeuristicScorer::default()),
        store.clone(),
        catalog.clone(),
        fast_config(),
    );

    // Batch-rank everything in the catalog
    let rankings = ranker
        .rank_businesses(&catalog.listings, "u1")
        .await
        .unwrap();
    assert_eq!(rankings.len(), 3);
    assert_eq!(rankings[0].business_id, "fit");

    // Top-N is location-filtered and sorted
    let top = ranker.top_ranked("u1", 2).await.unwrap();
    assert!(top.len() <= 2);
    assert!(top.iter().all(|s| s.business_location.contains("Austin")));
    for pair in top.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    // Preference change followed by refresh rewrites stored rows
    store.set_preferences(preferences("u1", "Boise, ID"));
    let outcome = ranker.refresh_rankings("u1").await.unwrap();
    assert_eq!(outcome.refreshed, 3);

    let boise = store.get_score("u1", "wrong_city").await.unwrap().unwrap();
    assert_eq!(boise.factors.location_score, 80);
}

#[tokio::test]
async fn test_batch_resilience_skips_only_failed_item() {
    let store = Arc::new(MemoryStore::with_preferences(preferences(
        "u1",
        "Austin, TX",
    )));
    let ranker = Ranker::new(
        Arc::new(FlakyScorer {
            fail_ids: vec!["b3".to_string()],
            inner: HeuristicScorer::default(),
        }),
        store,
        Arc::new(MemoryCatalog::default()),
        fast_config(),
    );

    let businesses: Vec<Business> = (1..=5)
        .map(|i| business(&format!("b{}", i), 500_000, "Technology", "Austin, TX"))
        .collect();

    let rankings = ranker.rank_businesses(&businesses, "u1").await.unwrap();

    assert_eq!(rankings.len(), 4);
    assert!(rankings.iter().all(|s| s.business_id != "b3"));
}

#[tokio::test]
async fn test_preferences_required_for_batch_and_top() {
    let ranker = Ranker::new(
        Arc::new(HeuristicScorer::default()),
        Arc::new(MemoryStore::default()),
        Arc::new(MemoryCatalog::default()),
        fast_config(),
    );

    let batch = ranker
        .rank_businesses(&[business("b1", 500_000, "Technology", "Austin, TX")], "ghost")
        .await;
    assert!(matches!(batch, Err(RankingError::PreferencesRequired(_))));

    let top = ranker.top_ranked("ghost", 10).await;
    assert!(matches!(top, Err(RankingError::PreferencesRequired(_))));
}

#[tokio::test]
async fn test_repeated_upserts_keep_single_row() {
    let store = Arc::new(MemoryStore::with_preferences(preferences(
        "u1",
        "Austin, TX",
    )));
    let ranker = Ranker::new(
        Arc::new(HeuristicScorer::default()),
        store.clone(),
        Arc::new(MemoryCatalog::default()),
        fast_config(),
    );

    let b = business("b1", 500_000, "Technology", "Austin, TX");
    let prefs = preferences("u1", "Austin, TX");

    ranker.rank_business(&b, &prefs).await.unwrap();
    ranker.rank_business(&b, &prefs).await.unwrap();
    ranker.rank_business(&b, &prefs).await.unwrap();

    assert_eq!(store.row_count(), 1);
    assert_eq!(store.upserts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_top_ranked_tops_up_thin_cache_from_catalog() {
    let store = Arc::new(MemoryStore::with_preferences(preferences(
        "u1",
        "Austin, TX",
    )));
    let catalog = Arc::new(MemoryCatalog {
        listings: (0..8)
            .map(|i| business(&format!("fresh{}", i), 500_000, "Technology", "Austin, TX"))
            .collect(),
    });
    let ranker = Ranker::new(
        Arc::new(HeuristicScorer::default()),
        store.clone(),
        catalog,
        fast_config(),
    );

    // Empty cache forces a catalog top-up
    let top = ranker.top_ranked("u1", 5).await.unwrap();

    assert_eq!(top.len(), 5);
    // The freshly ranked candidates were persisted
    assert!(store.row_count() >= 5);
}

#[tokio::test]
async fn test_top_ranked_ignores_off_location_cache_rows() {
    let store = Arc::new(MemoryStore::with_preferences(preferences(
        "u1",
        "Austin, TX",
    )));
    let catalog = Arc::new(MemoryCatalog::default());
    let ranker = Ranker::new(
        Arc::new(HeuristicScorer::default()),
        store.clone(),
        catalog,
        fast_config(),
    );

    ranker
        .rank_businesses(
            &[
                business("austin", 500_000, "Technology", "Austin, TX"),
                business("denver", 500_000, "Technology", "Denver, CO"),
                business("houston", 500_000, "Technology", "Houston, TX"),
            ],
            "u1",
        )
        .await
        .unwrap();

    let top = ranker.top_ranked("u1", 3).await.unwrap();

    let ids: Vec<&str> = top.iter().map(|s| s.business_id.as_str()).collect();
    assert!(ids.contains(&"austin"));
    assert!(!ids.contains(&"denver"));
    assert!(!ids.contains(&"houston"));
}

#[tokio::test]
async fn test_any_location_preference_keeps_all_cache_rows() {
    let store = Arc::new(MemoryStore::with_preferences(preferences("u1", "any")));
    let ranker = Ranker::new(
        Arc::new(HeuristicScorer::default()),
        store.clone(),
        Arc::new(MemoryCatalog::default()),
        fast_config(),
    );

    ranker
        .rank_businesses(
            &[
                business("austin", 500_000, "Technology", "Austin, TX"),
                business("denver", 500_000, "Technology", "Denver, CO"),
            ],
            "u1",
        )
        .await
        .unwrap();

    let top = ranker.top_ranked("u1", 2).await.unwrap();
    assert_eq!(top.len(), 2);
}
