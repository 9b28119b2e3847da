// Core algorithm exports
pub mod filters;
pub mod location;
pub mod ranker;
pub mod scoring;

pub use filters::{filter_listings, matches_criteria, matches_free_text};
pub use location::locations_match;
pub use ranker::{Catalog, Ranker, RankerConfig, RankingError, RefreshOutcome, ScoreStore};
pub use scoring::{AdvisoryApi, AdvisoryScorer, HeuristicScorer, Scorer, ScoringError};
