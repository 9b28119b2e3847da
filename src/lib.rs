//! DealMatch Algo - compatibility ranking service for business acquisitions
//!
//! This library turns a (business, investor preferences) pair into a 0-100
//! compatibility score with explanatory sub-factors, persists and reuses
//! those scores, and serves top-N ranked listings under filtering
//! constraints.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    locations_match, HeuristicScorer, Ranker, RankerConfig, RankingError, Scorer,
};
pub use models::{
    Business, BusinessScore, FactorMap, FilterCriteria, InvestorPreferences, ScoreBreakdown,
};
