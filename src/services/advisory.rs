use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::core::scoring::{AdvisoryApi, ScoringError};
use crate::models::{Business, FactorMap, InvestorPreferences, ScoreBreakdown};

/// Errors that can occur when consulting the advisory service
///
/// None of these surface to end users; the advisory scorer resolves them
/// with the heuristic fallback.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Advisory attempts exhausted after {attempts} tries: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: String },
}

/// Strict JSON shape the advisory service must reply with
#[derive(Debug, Deserialize)]
struct AdvisoryVerdict {
    score: i64,
    reasoning: String,
    factors: FactorMap,
}

/// Client for the external natural-language advisory service
///
/// Issues one chat-completions-style request per scoring call, demanding a
/// strict JSON verdict. Each attempt carries a hard timeout and the whole
/// call is bounded by a fixed retry budget.
pub struct AdvisoryClient {
    endpoint: String,
    api_key: String,
    model: String,
    max_attempts: u32,
    retry_pause: Duration,
    client: Client,
}

impl AdvisoryClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        timeout_secs: u64,
        max_attempts: u32,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key,
            model,
            max_attempts: max_attempts.max(1),
            retry_pause: Duration::from_millis(500),
            client,
        }
    }

    /// Request a compatibility verdict, retrying up to the attempt budget
    pub async fn request_score(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> Result<ScoreBreakdown, AdvisoryError> {
        let prompt = build_prompt(business, preferences);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.request_once(&prompt).await {
                Ok(breakdown) => return Ok(breakdown),
                Err(e) => {
                    tracing::warn!(
                        business_id = %business.id,
                        attempt,
                        "Advisory attempt failed: {}",
                        e
                    );
                    last_error = e.to_string();
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_pause).await;
                    }
                }
            }
        }

        Err(AdvisoryError::AttemptsExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }

    async fn request_once(&self, prompt: &str) -> Result<ScoreBreakdown, AdvisoryError> {
        let url = format!(
            "{}/chat/completions",
            self.endpoint.trim_end_matches('/')
        );

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.2,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisoryError::ApiError(format!(
                "Advisory service returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        let content = body
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                AdvisoryError::InvalidResponse("Missing choices[0].message.content".into())
            })?;

        let verdict: AdvisoryVerdict = serde_json::from_str(content.trim()).map_err(|e| {
            AdvisoryError::InvalidResponse(format!("Verdict is not valid JSON: {}", e))
        })?;

        Ok(ScoreBreakdown {
            score: verdict.score.clamp(0, 100) as u8,
            reasoning: verdict.reasoning,
            factors: verdict.factors,
        })
    }
}

#[async_trait]
impl AdvisoryApi for AdvisoryClient {
    async fn request_verdict(
        &self,
        business: &Business,
        preferences: &InvestorPreferences,
    ) -> Result<ScoreBreakdown, ScoringError> {
        self.request_score(business, preferences)
            .await
            .map_err(|e| ScoringError::Advisory(e.to_string()))
    }
}

/// Structured natural-language description of the pair being scored
fn build_prompt(business: &Business, preferences: &InvestorPreferences) -> String {
    format!(
        "You are an acquisition advisor. Assess how well this business matches \
         the investor's preferences.\n\n\
         Business:\n\
         - Name: {}\n\
         - Industry: {}\n\
         - Location: {}\n\
         - Asking price: ${}\n\
         - Annual revenue: ${}\n\
         - Cash flow: ${}\n\
         - EBITDA: ${}\n\
         - Employees: {}\n\n\
         Investor preferences:\n\
         - Capital range: ${} to ${}\n\
         - Target income: ${}\n\
         - Risk tolerance: {}\n\
         - Involvement: {}\n\
         - Preferred location: {}\n\
         - Preferred industries: {}\n\n\
         Reply with strict JSON only, no prose, matching exactly:\n\
         {{\"score\": <integer 0-100>, \"reasoning\": <string>, \"factors\": \
         {{\"priceMatch\": <0-100>, \"industryFit\": <0-100>, \"riskAlignment\": <0-100>, \
         \"involvementFit\": <0-100>, \"locationScore\": <0-100>, \"financialHealth\": <0-100>}}}}",
        business.name,
        business.industry,
        business.location,
        business.asking_price,
        business.annual_revenue,
        business.cash_flow,
        business.ebitda,
        business.employees,
        preferences.capital_min,
        preferences.capital_max,
        preferences.target_income,
        preferences.risk_tolerance,
        preferences.involvement,
        preferences.location,
        preferences.industries.join(", "),
    )
}
