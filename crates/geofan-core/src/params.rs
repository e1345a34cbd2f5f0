use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single query-parameter value: either a scalar string or an ordered
/// list of strings (array-typed parameters such as `keys`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// A value is present when it carries actual content. An empty
    /// scalar or an empty list counts as absent, matching query-string
    /// semantics where `?q=` supplies nothing.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Scalar(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// View the value as a list, splitting scalars on commas.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Scalar(s) => s.split(',').map(str::to_string).collect(),
            Self::List(items) => items.clone(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// The flat, defaulted, validated parameter set produced by schema
/// validation. Insertion order is preserved so per-service adapters see
/// parameters in a stable order.
pub type ParamSet = IndexMap<String, ParamValue>;

/// True when the named parameter is present with a truthy value.
pub fn param_present(params: &ParamSet, name: &str) -> bool {
    params.get(name).is_some_and(ParamValue::is_present)
}
