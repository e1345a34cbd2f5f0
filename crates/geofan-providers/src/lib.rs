pub mod assemble;
pub mod error;
pub mod file_source;
pub mod http_executor;
pub mod normalize;
pub mod traits;
pub mod types;

pub use assemble::SchemaUrlAssembler;
pub use error::ProviderError;
pub use file_source::FileDataSource;
pub use http_executor::HttpExecutor;
pub use normalize::MappingNormalizer;
pub use traits::{GeoDataSource, ItemNormalizer, ServiceExecutor, UrlAssembler};
pub use types::{
    AssembledRequest, NormalizeContext, NormalizedBatch, SchemaMap, Table, TableMap, service_schema,
};
