// Service exports
pub mod advisory;
pub mod cache;
pub mod catalog;
pub mod postgres;

pub use advisory::{AdvisoryClient, AdvisoryError};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use catalog::{CatalogClient, CatalogError};
pub use postgres::{PostgresClient, PostgresError};
