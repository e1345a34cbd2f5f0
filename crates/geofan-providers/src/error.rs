//! Error types for the collaborator adapters.

/// Errors that can occur inside a collaborator adapter.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A named schema is not known to the data source.
    #[error("Schema not found: {name}")]
    SchemaNotFound {
        /// The schema identifier that was requested.
        name: String,
    },

    /// A named lookup table is not known to the data source.
    #[error("Table not found: {name}")]
    TableNotFound {
        /// The table name that was requested.
        name: String,
    },

    /// A per-service schema is structurally unusable.
    #[error("Invalid service schema: {message}")]
    InvalidSchema {
        /// Description of the structural problem.
        message: String,
    },

    /// The upstream call failed at the transport level or returned a
    /// non-success status.
    #[error("Upstream call to '{service}' failed: {message}")]
    Upstream {
        /// The service identifier being called.
        service: String,
        /// Description of the failure.
        message: String,
    },

    /// Reading or writing data-source files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema or table file did not parse.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Creates a new `SchemaNotFound` error.
    #[must_use]
    pub fn schema_not_found(name: impl Into<String>) -> Self {
        Self::SchemaNotFound { name: name.into() }
    }

    /// Creates a new `TableNotFound` error.
    #[must_use]
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    /// Creates a new `InvalidSchema` error.
    #[must_use]
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a new `Upstream` error.
    #[must_use]
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }
}
