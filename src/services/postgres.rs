use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::core::ranker::{RankingError, ScoreStore};
use crate::models::{BusinessScore, FactorMap, InvestorPreferences, ScoreBreakdown};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Upsert with conflict resolution on the (user_id, business_id) key.
/// Concurrent callers can never create a second row for the same pair;
/// the second writer's values win.
const UPSERT_SCORE_SQL: &str = r#"
    INSERT INTO business_scores
        (user_id, business_id, business_location, score, reasoning, factors, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (user_id, business_id)
    DO UPDATE SET
        business_location = EXCLUDED.business_location,
        score = EXCLUDED.score,
        reasoning = EXCLUDED.reasoning,
        factors = EXCLUDED.factors
    RETURNING user_id, business_id, business_location, score, reasoning, factors, created_at
"#;

/// PostgreSQL-backed score repository and preferences store
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new client and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    pub async fn fetch_score(
        &self,
        user_id: &str,
        business_id: &str,
    ) -> Result<Option<BusinessScore>, PostgresError> {
        let query = r#"
            SELECT user_id, business_id, business_location, score, reasoning, factors, created_at
            FROM business_scores
            WHERE user_id = $1 AND business_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_score).transpose()
    }

    /// Top cached scores for a user, highest first
    pub async fn fetch_top_scores(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BusinessScore>, PostgresError> {
        let query = r#"
            SELECT user_id, business_id, business_location, score, reasoning, factors, created_at
            FROM business_scores
            WHERE user_id = $1
            ORDER BY score DESC
            LIMIT $2
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_score).collect()
    }

    /// Every cached score for a user, for full re-ranking
    pub async fn fetch_all_scores(
        &self,
        user_id: &str,
    ) -> Result<Vec<BusinessScore>, PostgresError> {
        let query = r#"
            SELECT user_id, business_id, business_location, score, reasoning, factors, created_at
            FROM business_scores
            WHERE user_id = $1
            ORDER BY score DESC
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_score).collect()
    }

    pub async fn save_score(&self, score: &BusinessScore) -> Result<BusinessScore, PostgresError> {
        let factors = serde_json::to_value(score.factors)
            .map_err(|e| PostgresError::InvalidData(e.to_string()))?;

        let row = sqlx::query(UPSERT_SCORE_SQL)
            .bind(&score.user_id)
            .bind(&score.business_id)
            .bind(&score.business_location)
            .bind(i32::from(score.score))
            .bind(&score.reasoning)
            .bind(factors)
            .bind(score.created_at)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(
            user_id = %score.user_id,
            business_id = %score.business_id,
            "Upserted score {}",
            score.score
        );

        row_to_score(row)
    }

    /// Overwrite score/reasoning/factors on an existing row
    pub async fn overwrite_score(
        &self,
        user_id: &str,
        business_id: &str,
        breakdown: &ScoreBreakdown,
    ) -> Result<(), PostgresError> {
        let factors = serde_json::to_value(breakdown.factors)
            .map_err(|e| PostgresError::InvalidData(e.to_string()))?;

        let query = r#"
            UPDATE business_scores
            SET score = $3, reasoning = $4, factors = $5
            WHERE user_id = $1 AND business_id = $2
        "#;

        sqlx::query(query)
            .bind(user_id)
            .bind(business_id)
            .bind(i32::from(breakdown.score))
            .bind(&breakdown.reasoning)
            .bind(factors)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn fetch_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<InvestorPreferences>, PostgresError> {
        let query = r#"
            SELECT user_id, capital_min, capital_max, target_income, risk_tolerance,
                   involvement, location, industries, business_size, payback_period_years
            FROM investor_preferences
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_preferences).transpose()
    }

    /// Insert or replace a user's preferences record
    pub async fn save_preferences(
        &self,
        preferences: &InvestorPreferences,
    ) -> Result<(), PostgresError> {
        let industries = serde_json::to_value(&preferences.industries)
            .map_err(|e| PostgresError::InvalidData(e.to_string()))?;

        let query = r#"
            INSERT INTO investor_preferences
                (user_id, capital_min, capital_max, target_income, risk_tolerance,
                 involvement, location, industries, business_size, payback_period_years,
                 updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET
                capital_min = EXCLUDED.capital_min,
                capital_max = EXCLUDED.capital_max,
                target_income = EXCLUDED.target_income,
                risk_tolerance = EXCLUDED.risk_tolerance,
                involvement = EXCLUDED.involvement,
                location = EXCLUDED.location,
                industries = EXCLUDED.industries,
                business_size = EXCLUDED.business_size,
                payback_period_years = EXCLUDED.payback_period_years,
                updated_at = NOW()
        "#;

        sqlx::query(query)
            .bind(&preferences.user_id)
            .bind(preferences.capital_min)
            .bind(preferences.capital_max)
            .bind(preferences.target_income)
            .bind(&preferences.risk_tolerance)
            .bind(&preferences.involvement)
            .bind(&preferences.location)
            .bind(industries)
            .bind(&preferences.business_size)
            .bind(i32::from(preferences.payback_period_years))
            .execute(&self.pool)
            .await?;

        tracing::info!(user_id = %preferences.user_id, "Saved preferences");

        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn row_to_score(row: sqlx::postgres::PgRow) -> Result<BusinessScore, PostgresError> {
    let factors: FactorMap = serde_json::from_value(row.get::<serde_json::Value, _>("factors"))
        .map_err(|e| PostgresError::InvalidData(format!("Bad factors column: {}", e)))?;
    let score: i32 = row.get("score");

    Ok(BusinessScore {
        user_id: row.get("user_id"),
        business_id: row.get("business_id"),
        business_location: row.get("business_location"),
        score: score.clamp(0, 100) as u8,
        reasoning: row.get("reasoning"),
        factors,
        created_at: row.get("created_at"),
    })
}

fn row_to_preferences(row: sqlx::postgres::PgRow) -> Result<InvestorPreferences, PostgresError> {
    let industries: Vec<String> =
        serde_json::from_value(row.get::<serde_json::Value, _>("industries"))
            .map_err(|e| PostgresError::InvalidData(format!("Bad industries column: {}", e)))?;
    let payback: i32 = row.get("payback_period_years");

    Ok(InvestorPreferences {
        user_id: row.get("user_id"),
        capital_min: row.get("capital_min"),
        capital_max: row.get("capital_max"),
        target_income: row.get("target_income"),
        risk_tolerance: row.get("risk_tolerance"),
        involvement: row.get("involvement"),
        location: row.get("location"),
        industries,
        business_size: row.get("business_size"),
        payback_period_years: payback.max(0) as u16,
    })
}

#[async_trait]
impl ScoreStore for PostgresClient {
    async fn get_score(
        &self,
        user_id: &str,
        business_id: &str,
    ) -> Result<Option<BusinessScore>, RankingError> {
        self.fetch_score(user_id, business_id)
            .await
            .map_err(|e| RankingError::Repository(e.to_string()))
    }

    async fn get_top_scores(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BusinessScore>, RankingError> {
        self.fetch_top_scores(user_id, limit)
            .await
            .map_err(|e| RankingError::Repository(e.to_string()))
    }

    async fn get_all_scores(&self, user_id: &str) -> Result<Vec<BusinessScore>, RankingError> {
        self.fetch_all_scores(user_id)
            .await
            .map_err(|e| RankingError::Repository(e.to_string()))
    }

    async fn upsert_score(&self, score: BusinessScore) -> Result<BusinessScore, RankingError> {
        self.save_score(&score)
            .await
            .map_err(|e| RankingError::Repository(e.to_string()))
    }

    async fn update_score(
        &self,
        user_id: &str,
        business_id: &str,
        breakdown: &ScoreBreakdown,
    ) -> Result<(), RankingError> {
        self.overwrite_score(user_id, business_id, breakdown)
            .await
            .map_err(|e| RankingError::Repository(e.to_string()))
    }

    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<InvestorPreferences>, RankingError> {
        self.fetch_preferences(user_id)
            .await
            .map_err(|e| RankingError::Repository(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_resolves_conflicts_on_pair_key() {
        // The uniqueness guarantee lives in the SQL itself
        assert!(UPSERT_SCORE_SQL.contains("ON CONFLICT (user_id, business_id)"));
        assert!(UPSERT_SCORE_SQL.contains("DO UPDATE"));
    }
}
