use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One level of a nested parameter schema, deserialized from the JSON
/// schema files served by the data source.
///
/// A branch node carries `properties` and `required`; a leaf node
/// additionally carries `type`, `enum`, `items` and `default`. Schema
/// trees are read-only for the duration of a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Child schema per parameter name, in declaration order.
    #[serde(default)]
    pub properties: IndexMap<String, SchemaNode>,

    /// Parameter names required at this level, in declaration order.
    #[serde(default)]
    pub required: Vec<String>,

    /// Marker flipping this node to at-least-one-required mode. The
    /// schema files spell it `requiredAll`; its presence (value
    /// ignored) means any single `required` name satisfies the node.
    #[serde(
        rename = "requiredAll",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub required_all_marker: Option<Value>,

    /// Declared value type, `"string"` or `"array"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    /// Legal values for a string-typed parameter.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    /// Item schema for an array-typed parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,

    /// Default value applied when a scalar parameter is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Upstream request URL, present on per-service schemas only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Output-field mapping applied by the normalization adapter,
    /// present on per-service schemas only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<IndexMap<String, String>>,
}

/// Required-ness mode of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredMode {
    /// Every name in `required` must be present.
    All,
    /// The first present name satisfies the node.
    AnyOne,
}

impl SchemaNode {
    pub fn mode(&self) -> RequiredMode {
        if self.required_all_marker.is_some() {
            RequiredMode::AnyOne
        } else {
            RequiredMode::All
        }
    }

    pub fn is_array(&self) -> bool {
        self.value_type.as_deref() == Some("array")
    }

    pub fn is_string(&self) -> bool {
        self.value_type.as_deref() == Some("string")
    }

    /// Enum of legal item values for an array-typed node.
    pub fn item_enum(&self) -> Option<&Vec<String>> {
        self.items.as_ref().and_then(|i| i.enum_values.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_branch_node_parses() {
        let node: SchemaNode = serde_json::from_value(json!({
            "properties": {"params": {"properties": {}, "required": []}},
            "required": ["params"]
        }))
        .unwrap();
        assert_eq!(node.required, vec!["params"]);
        assert_eq!(node.mode(), RequiredMode::All);
    }

    #[test]
    fn test_required_all_marker_flips_mode() {
        let node: SchemaNode = serde_json::from_value(json!({
            "required": ["q", "table"],
            "requiredAll": false
        }))
        .unwrap();
        assert_eq!(node.mode(), RequiredMode::AnyOne);
    }

    #[test]
    fn test_leaf_node_fields() {
        let node: SchemaNode = serde_json::from_value(json!({
            "type": "array",
            "items": {"type": "string", "enum": ["geonames", "nominatim"]}
        }))
        .unwrap();
        assert!(node.is_array());
        assert_eq!(
            node.item_enum().unwrap(),
            &vec!["geonames".to_string(), "nominatim".to_string()]
        );
    }

    #[test]
    fn test_scalar_default() {
        let node: SchemaNode = serde_json::from_value(json!({
            "type": "string",
            "enum": ["en", "fr"],
            "default": "en"
        }))
        .unwrap();
        assert!(node.is_string());
        assert_eq!(node.default.as_deref(), Some("en"));
    }
}
