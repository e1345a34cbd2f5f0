use geofan_core::ResultItem;
use geofan_schema::SchemaNode;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Mapping of schema identifier to schema tree, as served by the data
/// source. Identifiers cover the input/output API schemas plus one
/// schema per upstream service.
pub type SchemaMap = IndexMap<String, SchemaNode>;

/// One lookup table: code to value.
pub type Table = Map<String, Value>;

/// Mapping of table name ("generic", "province", ...) to its contents.
/// Tables are mutated during a request when adapters discover new
/// codes; mutations stay request-scoped until explicitly persisted.
pub type TableMap = IndexMap<String, Table>;

/// A fully assembled upstream request produced by a [`crate::UrlAssembler`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRequest {
    /// Target URL for the service call.
    pub url: String,
    /// Query pairs to send, in assembly order.
    pub params: Vec<(String, String)>,
    /// Per-service code tables discovered while assembling, to merge
    /// into the shared table mapping before the call.
    pub table_updates: Option<TableMap>,
}

impl AssembledRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            table_updates: None,
        }
    }
}

/// Read-only context handed to the normalization adapter.
#[derive(Debug)]
pub struct NormalizeContext<'a> {
    /// The shared table mapping, including any updates merged earlier
    /// in the same fan-out.
    pub tables: &'a TableMap,
    /// The requested response language. The shipped lookup tables are
    /// language-neutral, so [`crate::MappingNormalizer`] never reads
    /// this; a language-aware normalizer keys its table lookups on it.
    pub lang: &'a str,
}

/// Output of one normalization call.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    /// Normalized items in the adapter's emission order, already
    /// filtered through the shared dedup set.
    pub items: Vec<ResultItem>,
    /// Codes the adapter observed that the shared tables do not carry
    /// yet, keyed by table name.
    pub table_updates: TableMap,
}

/// Looks up a service schema by id, with a typed error.
pub fn service_schema<'a>(
    schemas: &'a SchemaMap,
    service_id: &str,
) -> Result<&'a SchemaNode, crate::ProviderError> {
    schemas
        .get(service_id)
        .ok_or_else(|| crate::ProviderError::schema_not_found(service_id))
}
