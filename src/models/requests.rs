use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{FilterCriteria, InvestorPreferences};

/// Request to rank a single business for a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankBusinessRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "business_id", rename = "businessId")]
    pub business_id: String,
}

/// Request to rank a batch of businesses for a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankBatchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "business_ids", rename = "businessIds")]
    pub business_ids: Vec<String>,
}

/// Query parameters for the top-ranked endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopRankedQuery {
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: u16,
}

fn default_limit() -> u16 {
    20
}

/// Request to re-rank everything cached for a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRankingsRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Preferences payload for PUT /preferences
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SavePreferencesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(rename = "capitalMin")]
    pub capital_min: i64,
    #[serde(rename = "capitalMax")]
    pub capital_max: i64,
    #[serde(rename = "targetIncome", default)]
    pub target_income: i64,
    #[serde(rename = "riskTolerance")]
    pub risk_tolerance: String,
    pub involvement: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(rename = "businessSize", default)]
    pub business_size: String,
    #[serde(rename = "paybackPeriodYears", default)]
    pub payback_period_years: u16,
}

impl SavePreferencesRequest {
    pub fn into_preferences(self) -> InvestorPreferences {
        InvestorPreferences {
            user_id: self.user_id,
            capital_min: self.capital_min,
            capital_max: self.capital_max,
            target_income: self.target_income,
            risk_tolerance: self.risk_tolerance,
            involvement: self.involvement,
            location: self
                .location
                .unwrap_or_else(|| crate::models::domain::ANY_LOCATION.to_string()),
            industries: self.industries,
            business_size: self.business_size,
            payback_period_years: self.payback_period_years,
        }
    }
}

/// Request body for POST /listings/search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchListingsRequest {
    #[serde(flatten)]
    pub criteria: FilterCriteria,
    #[serde(default = "default_search_limit")]
    pub limit: u16,
}

fn default_search_limit() -> u16 {
    50
}
