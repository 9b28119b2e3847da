use async_trait::async_trait;
use thiserror::Error;

use crate::core::location::locations_match;
use crate::models::{Business, FactorMap, InvestorPreferences, ScoreBreakdown, ScoringWeights};

/// Error raised while scoring a single (business, preferences) pair
///
/// Advisory failures never reach this type; the advisory scorer resolves
/// them to a fallback result internally. This surfaces only genuine
/// per-item failures inside batch loops.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Advisory service error: {0}")]
    Advisory(String),

    #[error("Scoring failed: {0}")]
    Failed(String),
}

/// Capability for scoring one business against one set of preferences
///
/// One ranking orchestrator, two implementations: the heuristic scorer
/// and the advisory scorer with guaranteed heuristic fallback. Selected
/// by `scoring.mode` in configuration.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> Result<ScoreBreakdown, ScoringError>;
}

/// Boundary to the external advisory service
///
/// Implemented by `services::advisory::AdvisoryClient`; kept as a trait so
/// the advisory scorer can be exercised against fakes.
#[async_trait]
pub trait AdvisoryApi: Send + Sync {
    async fn request_verdict(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> Result<ScoreBreakdown, ScoringError>;
}

/// Deterministic local scorer, no I/O
///
/// Same inputs always produce the same factor map and composite score.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    weights: ScoringWeights,
}

impl HeuristicScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Compute the six-factor breakdown and weighted composite
    pub fn breakdown(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> ScoreBreakdown {
        let factors = compute_factors(business, preferences);

        let composite = f64::from(factors.price_match) * self.weights.price
            + f64::from(factors.industry_fit) * self.weights.industry
            + f64::from(factors.financial_health) * self.weights.financial
            + f64::from(factors.location_score) * self.weights.location
            + f64::from(factors.risk_alignment) * self.weights.risk
            + f64::from(factors.involvement_fit) * self.weights.involvement;

        let score = composite.round().clamp(0.0, 100.0) as u8;

        ScoreBreakdown {
            score,
            reasoning: build_reasoning(business, &factors),
            factors,
        }
    }
}

#[async_trait]
impl Scorer for HeuristicScorer {
    async fn score(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> Result<ScoreBreakdown, ScoringError> {
        Ok(self.breakdown(business, preferences))
    }
}

fn compute_factors(business: &Business, preferences: &InvestorPreferences) -> FactorMap {
    FactorMap {
        price_match: price_match_factor(business, preferences),
        industry_fit: industry_fit_factor(business, preferences),
        risk_alignment: 60,
        involvement_fit: 60,
        location_score: location_factor(business, preferences),
        financial_health: financial_health_factor(business),
    }
}

#[inline]
fn price_match_factor(business: &Business, preferences: &InvestorPreferences) -> u8 {
    if preferences.capital_range_contains(business.asking_price) {
        90
    } else {
        20
    }
}

#[inline]
fn industry_fit_factor(business: &Business, preferences: &InvestorPreferences) -> u8 {
    if preferences.wants_industry(&business.industry) {
        85
    } else {
        30
    }
}

/// Revenue-multiple bands. The 3x/5x thresholds are tuning constants
/// carried over from the original pricing heuristic, not derived rules.
#[inline]
fn financial_health_factor(business: &Business) -> u8 {
    let multiple = business.revenue_multiple();
    if multiple < 3.0 {
        80
    } else if multiple < 5.0 {
        60
    } else {
        30
    }
}

#[inline]
fn location_factor(business: &Business, preferences: &InvestorPreferences) -> u8 {
    // The "any" sentinel means no constraint, so no location credit either
    if !preferences.any_location() && locations_match(&business.location, &preferences.location) {
        80
    } else {
        40
    }
}

/// Fixed human-readable template naming the driving factors
fn build_reasoning(business: &Business, factors: &FactorMap) -> String {
    let price = if factors.price_match >= 90 {
        "within"
    } else {
        "outside"
    };
    let industry = if factors.industry_fit >= 85 {
        "matches a preferred industry"
    } else {
        "falls outside the preferred industries"
    };
    let location = if factors.location_score >= 80 {
        "in the preferred area"
    } else {
        "outside the preferred area"
    };

    format!(
        "Deterministic assessment: asking price is {} the target capital range, \
         the business {}, the asking price is {:.1}x annual revenue, and the \
         location is {}.",
        price,
        industry,
        business.revenue_multiple(),
        location
    )
}

/// Scorer backed by the external advisory service
///
/// Any advisory failure (network, service error, unparsable reply) is
/// logged and resolved locally with the heuristic scorer; callers always
/// receive a fully populated breakdown.
pub struct AdvisoryScorer {
    advisory: std::sync::Arc<dyn AdvisoryApi>,
    fallback: HeuristicScorer,
}

impl AdvisoryScorer {
    pub fn new(advisory: std::sync::Arc<dyn AdvisoryApi>, fallback: HeuristicScorer) -> Self {
        Self { advisory, fallback }
    }
}

#[async_trait]
impl Scorer for AdvisoryScorer {
    async fn score(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> Result<ScoreBreakdown, ScoringError> {
        match self.advisory.request_verdict(business, preferences).await {
            Ok(mut breakdown) => {
                breakdown.score = breakdown.score.min(100);
                Ok(breakdown)
            }
            Err(e) => {
                tracing::warn!(
                    business_id = %business.id,
                    "Advisory scoring failed, using heuristic fallback: {}",
                    e
                );
                Ok(self.fallback.breakdown(business, preferences))
            }
        }
    }
}
