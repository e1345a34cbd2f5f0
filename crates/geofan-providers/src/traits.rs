//! Collaborator traits consumed by the request pipeline.
//!
//! The orchestrator only ever talks to these seams; the shipped
//! implementations live beside them in this crate, and tests swap in
//! hand-rolled fakes.

use async_trait::async_trait;
use geofan_core::DedupKeys;
use geofan_schema::SchemaNode;
use serde_json::Value;

use crate::error::ProviderError;
use crate::types::{AssembledRequest, NormalizeContext, NormalizedBatch, SchemaMap, Table, TableMap};

/// Source of parameter schemas and lookup tables.
///
/// Implementations must be thread-safe (`Send + Sync`). `write_table`
/// is a whole-table overwrite: the caller hands the entire current
/// contents for the named table, not a delta.
#[async_trait]
pub trait GeoDataSource: Send + Sync {
    /// Returns every known schema, keyed by schema identifier.
    async fn schemas(&self) -> Result<SchemaMap, ProviderError>;

    /// Returns every known lookup table. The returned mapping is the
    /// caller's to mutate for the duration of its request.
    async fn tables(&self) -> Result<TableMap, ProviderError>;

    /// Persists the entire current contents of one table.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O or serialization failures; the caller
    /// decides whether persistence failures are fatal.
    async fn write_table(&self, name: &str, snapshot: &Table) -> Result<(), ProviderError>;
}

/// Per-service URL assembly.
///
/// Receives a fresh copy of the validated parameter set so assemblers
/// cannot observe each other's mutations.
pub trait UrlAssembler: Send + Sync {
    /// Produces the request URL and query pairs for one service, plus
    /// any per-service code tables discovered along the way.
    fn assemble(
        &self,
        service_schema: &SchemaNode,
        params: geofan_core::ParamSet,
    ) -> Result<AssembledRequest, ProviderError>;
}

/// Executes the outbound call for one service.
///
/// A completed call may still signal failure in-band: a response
/// object carrying `"key": "unsuccess"` is treated as a failed service
/// by the orchestrator. Transport-level errors surface as
/// `ProviderError::Upstream` and are folded into the same handling.
#[async_trait]
pub trait ServiceExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &AssembledRequest,
        service_id: &str,
    ) -> Result<Value, ProviderError>;
}

/// Reshapes one raw service response into normalized result items.
pub trait ItemNormalizer: Send + Sync {
    /// Normalizes `response` for `service_id`.
    ///
    /// `dedup` is the shared per-request key set; items whose key is
    /// already present must be dropped and new keys recorded.
    #[allow(clippy::too_many_arguments)]
    fn normalize(
        &self,
        service_id: &str,
        ctx: &NormalizeContext<'_>,
        service_schema: &SchemaNode,
        output_item_schema: &SchemaNode,
        response: &Value,
        dedup: &mut DedupKeys,
        dev: bool,
    ) -> Result<NormalizedBatch, ProviderError>;
}
