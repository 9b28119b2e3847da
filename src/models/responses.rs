use serde::{Deserialize, Serialize};

use crate::models::domain::{Business, BusinessScore};

/// Response for the single-business ranking endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub score: BusinessScore,
}

/// Response for batch ranking and top-ranked endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsResponse {
    pub rankings: Vec<BusinessScore>,
    pub total_results: usize,
}

/// Response for the refresh endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub refreshed: usize,
    pub skipped: usize,
}

/// Response for listing search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchListingsResponse {
    pub listings: Vec<Business>,
    pub total_results: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
