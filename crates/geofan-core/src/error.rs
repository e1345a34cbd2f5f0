use thiserror::Error;

/// Core error types for Geofan operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing mandatory parameter: {detail}")]
    MissingParameter { detail: String },

    #[error("invalid parameter value(s): {detail}")]
    InvalidParameterValue { detail: String },

    #[error("schema error: {message}")]
    Schema { message: String },

    #[error("data source error: {message}")]
    DataSource { message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Create a new MissingParameter error
    pub fn missing_parameter(detail: impl Into<String>) -> Self {
        Self::MissingParameter {
            detail: detail.into(),
        }
    }

    /// Create a new InvalidParameterValue error
    pub fn invalid_parameter_value(detail: impl Into<String>) -> Self {
        Self::InvalidParameterValue {
            detail: detail.into(),
        }
    }

    /// Create a new Schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a new DataSource error
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSource {
            message: message.into(),
        }
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this error is a client error (caller sent bad input)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::InvalidParameterValue { .. }
        )
    }

    /// Check if this error is a server-side error
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingParameter { .. } | Self::InvalidParameterValue { .. } => {
                ErrorCategory::Validation
            }
            Self::Schema { .. } => ErrorCategory::Schema,
            Self::DataSource { .. } => ErrorCategory::DataSource,
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Schema,
    DataSource,
    Serialization,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Schema => write!(f, "schema"),
            Self::DataSource => write!(f, "data_source"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
