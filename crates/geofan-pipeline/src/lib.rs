pub mod cache;
pub mod orchestrator;
pub mod tables;

pub use cache::{CacheEntry, CacheKey, ResultCache};
pub use orchestrator::{QueryResponse, RequestOrchestrator, RequestOrchestratorBuilder};
pub use tables::TableUpdateAggregator;
