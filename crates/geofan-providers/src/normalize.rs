//! Mapping-driven response normalization.
//!
//! A service schema's `out` object maps output field names to source
//! specs. A plain spec copies the record field of that name; a
//! `table|field` spec resolves the record field through the named
//! lookup table, and codes the table does not carry yet are reported
//! back as table updates so they can be persisted at end of request.

use geofan_core::{DedupKeys, ResultItem};
use geofan_schema::SchemaNode;
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::traits::ItemNormalizer;
use crate::types::{NormalizeContext, NormalizedBatch, Table};

#[derive(Debug, Default, Clone, Copy)]
pub struct MappingNormalizer;

impl MappingNormalizer {
    /// Extracts the record list from a raw response: a top-level
    /// array, an object's `items` array, or a single object treated as
    /// one record.
    fn records(response: &Value) -> Vec<&Map<String, Value>> {
        match response {
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
            Value::Object(map) => match map.get("items").and_then(Value::as_array) {
                Some(items) => items.iter().filter_map(Value::as_object).collect(),
                None => vec![map],
            },
            _ => Vec::new(),
        }
    }
}

impl ItemNormalizer for MappingNormalizer {
    fn normalize(
        &self,
        service_id: &str,
        ctx: &NormalizeContext<'_>,
        service_schema: &SchemaNode,
        output_item_schema: &SchemaNode,
        response: &Value,
        dedup: &mut DedupKeys,
        dev: bool,
    ) -> Result<NormalizedBatch, ProviderError> {
        let out_mapping = service_schema
            .out
            .as_ref()
            .ok_or_else(|| ProviderError::invalid_schema("service schema has no out mapping"))?;

        let mut batch = NormalizedBatch::default();
        for record in Self::records(response) {
            let mut item = Map::new();
            for (out_field, source_spec) in out_mapping {
                // Only emit fields the output item schema declares.
                if !output_item_schema.properties.is_empty()
                    && !output_item_schema.properties.contains_key(out_field)
                {
                    continue;
                }
                let value = match source_spec.split_once('|') {
                    Some((table_name, field)) => {
                        resolve_through_table(ctx, &mut batch.table_updates, table_name, record, field)
                    }
                    None => record.get(source_spec).cloned(),
                };
                if let Some(value) = value {
                    item.insert(out_field.clone(), value);
                }
            }

            if dev {
                item.insert("service".to_string(), Value::String(service_id.to_string()));
            }

            let item = ResultItem::new(Value::Object(item));
            if let Some(key) = item.dedup_key() {
                if !dedup.insert(key) {
                    continue;
                }
            }
            batch.items.push(item);
        }

        Ok(batch)
    }
}

/// Resolves `record[field]` through `tables[table_name]`. A code the
/// table does not carry resolves to itself and is recorded as a table
/// update.
fn resolve_through_table(
    ctx: &NormalizeContext<'_>,
    updates: &mut crate::types::TableMap,
    table_name: &str,
    record: &Map<String, Value>,
    field: &str,
) -> Option<Value> {
    let code = record.get(field)?.as_str()?.to_string();
    match ctx.tables.get(table_name).and_then(|t| t.get(&code)) {
        Some(resolved) => Some(resolved.clone()),
        None => {
            updates
                .entry(table_name.to_string())
                .or_insert_with(Table::new)
                .insert(code.clone(), Value::String(code.clone()));
            Some(Value::String(code))
        }
    }
}
