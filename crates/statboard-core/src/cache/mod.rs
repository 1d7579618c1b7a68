//! Per-entity caching of stats API data.
//!
//! Each `Entity` carries a `CacheData` holding the last-fetched records per
//! indicator and frequency. Data is considered stale after 60 minutes, at
//! which point the `CacheService` goes back to the API.
//!
//! `CacheStore` persists an entity's cache as JSON so a later run can reuse
//! fresh data.

pub mod data;
pub mod service;
pub mod store;

pub use data::{CacheData, CacheIndicator, CACHE_STALE_MINUTES};
pub use service::CacheService;
pub use store::CacheStore;
