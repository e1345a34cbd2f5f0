//! Cascading validation of a raw query-parameter tree against a nested
//! schema.
//!
//! The entry adapter hands in the raw tree shaped as
//! `{"params": {"querystring": {...}}}`. Validation walks the schema
//! with the same required-set primitive at three successive depths,
//! fills declared defaults, then checks each leaf value against its
//! property schema. The whole pass is synchronous and deterministic.

use geofan_core::params::param_present;
use geofan_core::{CoreError, ParamSet, ParamValue, Result};
use indexmap::IndexMap;
use serde_json::Value;

use crate::node::{RequiredMode, SchemaNode};

/// Truthiness over a JSON value: null, false, zero, empty string,
/// empty array and empty object all count as absent.
fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Resolves the required set of one schema node against the matching
/// level of the raw tree. This is the descent primitive applied at
/// every schema depth.
///
/// In all-required mode every `required` name must be present with a
/// truthy value; the failure names every missing parameter. In
/// at-least-one mode the first present name satisfies the node and
/// short-circuits the scan.
///
/// On success returns the last matched name's value together with its
/// child schema, which is what the caller descends into next.
pub fn resolve_required<'v, 's>(
    node: &'s SchemaNode,
    tree: &'v Value,
) -> Result<(&'v Value, &'s SchemaNode)> {
    let mut found: Option<(&Value, &SchemaNode)> = None;
    let mut missing: Vec<String> = Vec::new();

    for name in &node.required {
        match tree.get(name).filter(|v| value_truthy(v)) {
            Some(value) => {
                let child = node.properties.get(name).ok_or_else(|| {
                    CoreError::schema(format!("no property schema for required parameter '{name}'"))
                })?;
                found = Some((value, child));
                if node.mode() == RequiredMode::AnyOne {
                    missing.clear();
                    break;
                }
            }
            None => missing.push(format!("inexistent parameter '{name}'")),
        }
    }

    match node.mode() {
        RequiredMode::All if !missing.is_empty() => {
            Err(CoreError::missing_parameter(missing.join(", ")))
        }
        RequiredMode::AnyOne if found.is_none() => {
            Err(CoreError::missing_parameter(missing.join(", ")))
        }
        _ => found.ok_or_else(|| {
            CoreError::schema("schema node declares no required parameters".to_string())
        }),
    }
}

/// Fills absent parameters from the property schemas. An absent
/// array-typed parameter defaults to the entire item enum (absence
/// means "all values"); an absent scalar takes its declared default;
/// otherwise the key stays absent. Present values are never touched.
pub fn apply_defaults(params: &mut ParamSet, properties: &IndexMap<String, SchemaNode>) {
    for (name, property) in properties {
        if param_present(params, name) {
            continue;
        }
        if property.is_array() {
            if let Some(item_enum) = property.item_enum() {
                params.insert(name.clone(), ParamValue::list(item_enum.clone()));
            }
        } else if let Some(default) = &property.default {
            params.insert(name.clone(), ParamValue::scalar(default.clone()));
        }
    }
}

/// Validates a single parameter value against its property schema.
///
/// String-typed properties with an enum require membership; without an
/// enum internal spaces become `+` (URL token form). Array-typed
/// properties comma-split scalar input and require every element to be
/// in the item enum; all offending elements are named in one failure.
pub fn validate_value(value: &ParamValue, property: &SchemaNode) -> Result<ParamValue> {
    if property.is_string() {
        let s = value.as_str().ok_or_else(|| {
            CoreError::invalid_parameter_value(format!("expected a single value, got {value:?}"))
        })?;
        if let Some(enum_values) = &property.enum_values {
            if !enum_values.iter().any(|v| v == s) {
                return Err(CoreError::invalid_parameter_value(format!("'{s}'")));
            }
            Ok(ParamValue::scalar(s))
        } else {
            Ok(ParamValue::scalar(s.replace(' ', "+")))
        }
    } else {
        let items = value.to_list();
        let item_enum = property
            .item_enum()
            .ok_or_else(|| CoreError::schema("array property without item enum".to_string()))?;
        let invalid: Vec<&str> = items
            .iter()
            .filter(|item| !item_enum.iter().any(|v| v == *item))
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            return Err(CoreError::invalid_parameter_value(format!(
                "'{}'",
                invalid.join("', '")
            )));
        }
        Ok(ParamValue::List(items))
    }
}

/// Converts the querystring-level JSON object into a flat `ParamSet`.
fn param_set_from_tree(tree: &Value) -> Result<ParamSet> {
    let object = tree
        .as_object()
        .ok_or_else(|| CoreError::schema("querystring level is not an object".to_string()))?;

    let mut params = ParamSet::new();
    for (name, value) in object {
        let param = match value {
            Value::String(s) => ParamValue::scalar(s.clone()),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => list.push(s.clone()),
                        other => list.push(other.to_string()),
                    }
                }
                ParamValue::List(list)
            }
            Value::Null => continue,
            other => ParamValue::scalar(other.to_string()),
        };
        params.insert(name.clone(), param);
    }
    Ok(params)
}

/// Validates and normalizes the raw parameter tree against the input
/// API schema, producing the flat, defaulted, enum-checked parameter
/// set consumed by the orchestrator.
///
/// Three applications of [`resolve_required`], one per schema depth:
/// top wrapper, querystring container, then the parameter level itself.
/// The third application only enforces the `q`-or-`table` alternative;
/// its descent value is discarded.
pub fn validate_query(raw_tree: &Value, api_schema: &SchemaNode) -> Result<ParamSet> {
    let (wrapper_value, wrapper_schema) = resolve_required(api_schema, raw_tree)?;
    let (query_value, query_schema) = resolve_required(wrapper_schema, wrapper_value)?;
    resolve_required(query_schema, query_value)?;

    let mut params = param_set_from_tree(query_value)?;
    apply_defaults(&mut params, &query_schema.properties);

    for (name, property) in &query_schema.properties {
        let Some(value) = params.get(name).filter(|v| v.is_present()).cloned() else {
            continue;
        };
        let validated = validate_value(&value, property)?;
        params.insert(name.clone(), validated);
    }

    Ok(params)
}
