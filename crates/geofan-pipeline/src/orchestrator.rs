//! Top-level request orchestration.
//!
//! Consumes the raw parameter tree, validates it, then answers from
//! one of three modes: static lookup-table contents, a cached merged
//! answer, or a live sequential fan-out across the requested services.
//! Per-service failures never abort the request; they disable caching
//! and, in diagnostic mode, surface as a record at the head of the
//! result list.

use std::sync::Arc;

use serde_json::{Value, json};

use geofan_core::{CoreError, DedupKeys, ParamSet, ResultItem, Timestamp, now_utc};
use geofan_providers::{
    GeoDataSource, ItemNormalizer, NormalizeContext, ProviderError, ServiceExecutor, TableMap,
    UrlAssembler, service_schema,
};
use geofan_schema::validate_query;

use crate::cache::ResultCache;
use crate::tables::TableUpdateAggregator;

/// Sentinel value of the `table` parameter meaning "no lookup-table
/// shortcut requested".
const TABLE_NONE: &str = "none";

/// The response envelope handed back to the entry adapter. Structural
/// parameter errors are reported as payload content with success
/// status; only infrastructure failures escape as errors.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub status: u16,
    pub body: Value,
}

impl QueryResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

fn missing_parameter_payload() -> Value {
    json!({
        "message_en": "Mandatory '/?q= or table=' parameter not provided",
        "message_fr": "Paramètre obligatoire '/?q= or table=' non fourni"
    })
}

fn invalid_parameter_payload(detail: &str) -> Value {
    json!({
        "message_en": format!("Invalid parameter value(s) provided: {detail}"),
        "message_fr": format!("Valeur(s) de paramètre fournie(s) non valide(s): {detail}")
    })
}

/// A completed upstream call that signals failure in-band.
fn is_unsuccess(response: &Value) -> bool {
    response.get("key").and_then(Value::as_str) == Some("unsuccess")
}

/// Diagnostic record surfaced (in dev mode only) for a service whose
/// call never produced an in-band failure payload of its own.
fn diagnostic_record(service_id: &str, detail: &str) -> ResultItem {
    ResultItem::new(json!({
        "key": "unsuccess",
        "service": service_id,
        "detail": detail
    }))
}

fn data_source_error(e: ProviderError) -> CoreError {
    CoreError::data_source(e.to_string())
}

pub struct RequestOrchestrator {
    data_source: Arc<dyn GeoDataSource>,
    assembler: Arc<dyn UrlAssembler>,
    executor: Arc<dyn ServiceExecutor>,
    normalizer: Arc<dyn ItemNormalizer>,
    cache: Arc<ResultCache>,
    input_schema_id: String,
    output_schema_id: String,
}

pub struct RequestOrchestratorBuilder {
    data_source: Arc<dyn GeoDataSource>,
    assembler: Arc<dyn UrlAssembler>,
    executor: Arc<dyn ServiceExecutor>,
    normalizer: Arc<dyn ItemNormalizer>,
    cache: Arc<ResultCache>,
    input_schema_id: String,
    output_schema_id: String,
}

impl RequestOrchestratorBuilder {
    pub fn new(
        data_source: Arc<dyn GeoDataSource>,
        assembler: Arc<dyn UrlAssembler>,
        executor: Arc<dyn ServiceExecutor>,
        normalizer: Arc<dyn ItemNormalizer>,
    ) -> Self {
        Self {
            data_source,
            assembler,
            executor,
            normalizer,
            cache: Arc::new(ResultCache::default()),
            input_schema_id: "api-in".to_string(),
            output_schema_id: "api-out".to_string(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_schema_ids(
        mut self,
        input_schema_id: impl Into<String>,
        output_schema_id: impl Into<String>,
    ) -> Self {
        self.input_schema_id = input_schema_id.into();
        self.output_schema_id = output_schema_id.into();
        self
    }

    pub fn build(self) -> RequestOrchestrator {
        RequestOrchestrator {
            data_source: self.data_source,
            assembler: self.assembler,
            executor: self.executor,
            normalizer: self.normalizer,
            cache: self.cache,
            input_schema_id: self.input_schema_id,
            output_schema_id: self.output_schema_id,
        }
    }
}

impl RequestOrchestrator {
    /// Handles one raw query tree end to end.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures (data source unavailable, schema
    /// misconfiguration) surface as errors; parameter problems and
    /// per-service failures are folded into the response payload.
    pub async fn handle(&self, raw_tree: &Value) -> Result<QueryResponse, CoreError> {
        self.handle_at(raw_tree, now_utc()).await
    }

    /// Like [`Self::handle`] but at an explicit instant, which is what
    /// cache expiry is measured against.
    pub async fn handle_at(
        &self,
        raw_tree: &Value,
        now: Timestamp,
    ) -> Result<QueryResponse, CoreError> {
        let schemas = self.data_source.schemas().await.map_err(data_source_error)?;
        let input_schema = schemas.get(&self.input_schema_id).ok_or_else(|| {
            CoreError::schema(format!("input schema '{}' not loaded", self.input_schema_id))
        })?;
        let output_schema = schemas.get(&self.output_schema_id).ok_or_else(|| {
            CoreError::schema(format!(
                "output schema '{}' not loaded",
                self.output_schema_id
            ))
        })?;
        let output_item_schema = output_schema.items.as_deref().unwrap_or(output_schema);

        let mut params = match validate_query(raw_tree, input_schema) {
            Ok(params) => params,
            Err(CoreError::MissingParameter { detail }) => {
                tracing::debug!(detail, "request rejected: missing parameter");
                return Ok(QueryResponse::ok(missing_parameter_payload()));
            }
            Err(CoreError::InvalidParameterValue { detail }) => {
                tracing::debug!(detail, "request rejected: invalid parameter value");
                return Ok(QueryResponse::ok(invalid_parameter_payload(&detail)));
            }
            Err(other) => return Err(other),
        };

        // Reserved parameters. `keys`, `table` and `dev` are consumed
        // here and not forwarded to per-service adapters; `q` and
        // `lang` stay in the set.
        let q = params
            .get("q")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let lang = params
            .get("lang")
            .and_then(|v| v.as_str())
            .unwrap_or("en")
            .to_string();
        let keys: Vec<String> = params
            .shift_remove("keys")
            .map(|v| v.to_list())
            .unwrap_or_default();
        let table_parameter = params
            .shift_remove("table")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| TABLE_NONE.to_string());
        let dev = params
            .shift_remove("dev")
            .and_then(|v| v.as_str().map(str::to_string))
            .is_some_and(|v| v == "true");

        // Lookup-table mode bypasses caching, fan-out and persistence.
        if table_parameter != TABLE_NONE {
            let tables = self.data_source.tables().await.map_err(data_source_error)?;
            return Ok(match tables.get(&table_parameter) {
                Some(table) => QueryResponse::ok(Value::Object(table.clone())),
                None => {
                    tracing::warn!(table = table_parameter, "unknown lookup table requested");
                    QueryResponse::ok(invalid_parameter_payload(&format!("'{table_parameter}'")))
                }
            });
        }

        if let Some(loads) = self.cache.lookup(&q, &lang, &keys, dev, now) {
            tracing::debug!(q, lang, items = loads.len(), "cache hit");
            return Ok(QueryResponse::ok(serde_json::to_value(loads)?));
        }

        let (loads, response_ok, tables, aggregator) = self
            .fan_out(&schemas, &params, &keys, &lang, output_item_schema, dev)
            .await?;

        if response_ok {
            self.cache.store(&q, &lang, &keys, dev, now, &loads);
        }

        self.persist_table_updates(&tables, &aggregator).await;

        Ok(QueryResponse::ok(serde_json::to_value(loads)?))
    }

    /// Sequential fan-out over the requested services. Each service
    /// gets a fresh copy of the validated parameter set; table updates
    /// merge into the shared mapping immediately so later services in
    /// the same request can reference them.
    async fn fan_out(
        &self,
        schemas: &geofan_providers::SchemaMap,
        params: &ParamSet,
        keys: &[String],
        lang: &str,
        output_item_schema: &geofan_schema::SchemaNode,
        dev: bool,
    ) -> Result<(Vec<ResultItem>, bool, TableMap, TableUpdateAggregator), CoreError> {
        let mut tables = self.data_source.tables().await.map_err(data_source_error)?;
        let mut aggregator = TableUpdateAggregator::seeded(tables.keys());
        let mut dedup = DedupKeys::new();
        let mut loads: Vec<ResultItem> = Vec::new();
        let mut response_ok = true;

        for service_id in keys {
            let failure = match self
                .call_service(
                    schemas,
                    params.clone(),
                    service_id,
                    lang,
                    output_item_schema,
                    dev,
                    &mut tables,
                    &mut aggregator,
                    &mut dedup,
                    &mut loads,
                )
                .await
            {
                Ok(()) => continue,
                Err(failure) => failure,
            };

            // A failing service never aborts the fan-out; it disables
            // caching and, in dev mode only, prepends its diagnostic
            // record to the result list.
            response_ok = false;
            tracing::warn!(service.id = %service_id, "service call unsuccessful");
            if dev {
                loads.insert(0, failure);
            }
        }

        Ok((loads, response_ok, tables, aggregator))
    }

    /// Drives one service call; a returned error is the diagnostic
    /// record for that service.
    #[allow(clippy::too_many_arguments)]
    async fn call_service(
        &self,
        schemas: &geofan_providers::SchemaMap,
        params: ParamSet,
        service_id: &str,
        lang: &str,
        output_item_schema: &geofan_schema::SchemaNode,
        dev: bool,
        tables: &mut TableMap,
        aggregator: &mut TableUpdateAggregator,
        dedup: &mut DedupKeys,
        loads: &mut Vec<ResultItem>,
    ) -> Result<(), ResultItem> {
        let service_schema = service_schema(schemas, service_id)
            .map_err(|e| diagnostic_record(service_id, &e.to_string()))?;

        let request = self
            .assembler
            .assemble(service_schema, params)
            .map_err(|e| diagnostic_record(service_id, &e.to_string()))?;

        if let Some(updates) = &request.table_updates {
            merge_tables(tables, updates);
            aggregator.record_map(updates);
        }

        let response = match self.executor.execute(&request, service_id).await {
            Ok(response) if is_unsuccess(&response) => return Err(ResultItem::new(response)),
            Ok(response) => response,
            Err(e) => return Err(diagnostic_record(service_id, &e.to_string())),
        };

        let ctx = NormalizeContext { tables, lang };
        let batch = self
            .normalizer
            .normalize(
                service_id,
                &ctx,
                service_schema,
                output_item_schema,
                &response,
                dedup,
                dev,
            )
            .map_err(|e| diagnostic_record(service_id, &e.to_string()))?;

        merge_tables(tables, &batch.table_updates);
        aggregator.record_map(&batch.table_updates);
        loads.extend(batch.items);
        Ok(())
    }

    /// Persists every table namespace that accumulated updates during
    /// the request. Each dirty namespace gets exactly one whole-table
    /// write; write failures are logged and dropped.
    async fn persist_table_updates(&self, tables: &TableMap, aggregator: &TableUpdateAggregator) {
        for name in aggregator.dirty_tables() {
            let Some(snapshot) = tables.get(name) else {
                continue;
            };
            match self.data_source.write_table(name, snapshot).await {
                Ok(()) => {
                    let updates = aggregator.updates_for(name).map_or(0, |u| u.len());
                    tracing::info!(table = name, updates, "table updates persisted");
                }
                Err(e) => {
                    tracing::warn!(table = name, error = %e, "table persistence failed");
                }
            }
        }
    }
}

fn merge_tables(tables: &mut TableMap, updates: &TableMap) {
    for (name, codes) in updates {
        let table = tables.entry(name.clone()).or_default();
        for (code, value) in codes {
            table.insert(code.clone(), value.clone());
        }
    }
}
