//! Schema-driven URL assembly.

use geofan_core::{ParamSet, ParamValue};
use geofan_schema::SchemaNode;

use crate::error::ProviderError;
use crate::traits::UrlAssembler;
use crate::types::AssembledRequest;

/// Default [`UrlAssembler`]: takes the request URL from the service
/// schema and forwards every validated parameter the schema declares
/// as a property. List values are joined with commas. Services that
/// ship their own code tables provide their own assembler; this one
/// never reports table updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaUrlAssembler;

impl UrlAssembler for SchemaUrlAssembler {
    fn assemble(
        &self,
        service_schema: &SchemaNode,
        params: ParamSet,
    ) -> Result<AssembledRequest, ProviderError> {
        let url = service_schema
            .url
            .clone()
            .ok_or_else(|| ProviderError::invalid_schema("service schema has no url"))?;

        let mut request = AssembledRequest::new(url);
        for name in service_schema.properties.keys() {
            let Some(value) = params.get(name).filter(|v| v.is_present()) else {
                continue;
            };
            let rendered = match value {
                ParamValue::Scalar(s) => s.clone(),
                ParamValue::List(items) => items.join(","),
            };
            request.params.push((name.clone(), rendered));
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_schema() -> SchemaNode {
        serde_json::from_value(json!({
            "url": "https://geo.example/search",
            "properties": {
                "q": {"type": "string"},
                "lang": {"type": "string"},
                "types": {"type": "array", "items": {"enum": ["city", "province"]}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_assembles_declared_parameters_only() {
        let mut params = ParamSet::new();
        params.insert("q".to_string(), ParamValue::scalar("ottawa"));
        params.insert("lang".to_string(), ParamValue::scalar("en"));
        params.insert("dev".to_string(), ParamValue::scalar("true"));

        let request = SchemaUrlAssembler.assemble(&service_schema(), params).unwrap();
        assert_eq!(request.url, "https://geo.example/search");
        assert_eq!(
            request.params,
            vec![
                ("q".to_string(), "ottawa".to_string()),
                ("lang".to_string(), "en".to_string()),
            ]
        );
        assert!(request.table_updates.is_none());
    }

    #[test]
    fn test_list_values_join_on_commas() {
        let mut params = ParamSet::new();
        params.insert("types".to_string(), ParamValue::list(["city", "province"]));

        let request = SchemaUrlAssembler.assemble(&service_schema(), params).unwrap();
        assert_eq!(
            request.params,
            vec![("types".to_string(), "city,province".to_string())]
        );
    }

    #[test]
    fn test_schema_without_url_rejected() {
        let schema: SchemaNode = serde_json::from_value(json!({"properties": {}})).unwrap();
        let err = SchemaUrlAssembler.assemble(&schema, ParamSet::new()).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidSchema { .. }));
    }
}
