// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Business, BusinessScore, EmployeeBucket, FactorMap, FilterCriteria, InvestorPreferences,
    ScoreBreakdown, ScoringWeights, ANY_LOCATION,
};
pub use requests::{
    RankBatchRequest, RankBusinessRequest, RefreshRankingsRequest, SavePreferencesRequest,
    SearchListingsRequest, TopRankedQuery,
};
pub use responses::{
    ErrorResponse, HealthResponse, RankingsResponse, RefreshResponse, ScoreResponse,
    SearchListingsResponse,
};
