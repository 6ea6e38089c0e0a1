use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Data file not found: {path}")]
    DataNotFound { path: String },

    #[error("Empty table: {0}")]
    EmptyTable(String),

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for MonitorError {
    fn from(e: serde_json::Error) -> Self {
        MonitorError::SerializationError(e.to_string())
    }
}

impl From<csv::Error> for MonitorError {
    fn from(e: csv::Error) -> Self {
        if !e.is_io_error() {
            return MonitorError::MalformedTable(e.to_string());
        }
        match e.into_kind() {
            csv::ErrorKind::Io(io) => MonitorError::Io(io),
            other => MonitorError::MalformedTable(format!("{other:?}")),
        }
    }
}
