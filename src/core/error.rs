use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Field '{field}' is not declared on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Lock error: {0}")]
    Lock(String),

    /// Raised by a storage driver; the message is the driver's own.
    #[error(transparent)]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

impl GatewayError {
    pub fn missing_metadata(entity_type: &str) -> Self {
        Self::Configuration(format!(
            "No metadata set for entity type '{}'",
            entity_type
        ))
    }

    pub fn storage<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Storage(err.into())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl<T> From<std::sync::PoisonError<T>> for GatewayError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
