use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::core::ranker::{Catalog, RankingError};
use crate::models::{Business, FilterCriteria};

/// Errors that can occur when talking to the listing catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// HTTP client for the listing catalog collaborator
///
/// The catalog owns the business records; this client only reads them,
/// either one by id or as a filtered search feeding the ranking pipeline.
pub struct CatalogClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl CatalogClient {
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
        }
    }

    /// Fetch a single listing; None when the catalog does not know the id
    pub async fn fetch_business(
        &self,
        business_id: &str,
    ) -> Result<Option<Business>, CatalogError> {
        let url = format!(
            "{}/listings/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(business_id)
        );

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CatalogError::ApiError(format!(
                "Failed to fetch listing: {}",
                response.status()
            )));
        }

        let business = response
            .json::<Business>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(format!("Failed to parse listing: {}", e)))?;

        Ok(Some(business))
    }

    /// Search listings with the multi-criteria filter, excluding known ids
    pub async fn search_listings(
        &self,
        criteria: &FilterCriteria,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Business>, CatalogError> {
        let url = format!(
            "{}/listings?{}",
            self.base_url.trim_end_matches('/'),
            build_query(criteria, exclude_ids, limit)
        );

        tracing::debug!("Querying catalog: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::ApiError(format!(
                "Failed to search listings: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);

        let documents = json
            .get("listings")
            .and_then(|l| l.as_array())
            .ok_or_else(|| CatalogError::InvalidResponse("Missing listings array".into()))?;

        // Tolerate individual malformed documents rather than failing the page
        let listings: Vec<Business> = documents
            .iter()
            .filter_map(|doc| serde_json::from_value(doc.clone()).ok())
            .filter(|b: &Business| !exclude_ids.contains(&b.id))
            .collect();

        tracing::debug!("Catalog returned {} listings (total: {})", listings.len(), total);

        Ok(listings)
    }
}

/// Serialize the filter criteria as catalog query parameters
fn build_query(criteria: &FilterCriteria, exclude_ids: &[String], limit: usize) -> String {
    let mut params: Vec<String> = Vec::new();

    let mut push = |key: &str, value: String| {
        params.push(format!("{}={}", key, urlencoding::encode(&value)));
    };

    if let Some(min) = criteria.price_min {
        push("priceMin", min.to_string());
    }
    if let Some(max) = criteria.price_max {
        push("priceMax", max.to_string());
    }
    if let Some(min) = criteria.revenue_min {
        push("revenueMin", min.to_string());
    }
    if let Some(max) = criteria.revenue_max {
        push("revenueMax", max.to_string());
    }
    if let Some(location) = &criteria.location {
        push("location", location.clone());
    }
    if let Some(industries) = &criteria.industries {
        if !industries.is_empty() {
            push("industries", industries.join(","));
        }
    }
    if let Some(bucket) = criteria.employees {
        push("employees", bucket.label().to_string());
    }
    if let Some(query) = &criteria.query {
        push("q", query.clone());
    }
    if !exclude_ids.is_empty() {
        push("excludeIds", exclude_ids.join(","));
    }
    push("limit", limit.to_string());

    params.join("&")
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn get_business(&self, business_id: &str) -> Result<Option<Business>, RankingError> {
        self.fetch_business(business_id)
            .await
            .map_err(|e| RankingError::Catalog(e.to_string()))
    }

    async fn search(
        &self,
        criteria: &FilterCriteria,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Business>, RankingError> {
        self.search_listings(criteria, exclude_ids, limit)
            .await
            .map_err(|e| RankingError::Catalog(e.to_string()))
    }
}
