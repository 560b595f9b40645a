use thiserror::Error;

/// Failures of the host key-value storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt event data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Reasons an event is refused before it reaches the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event id is empty")]
    EmptyId,

    #[error("malformed timestamp: {0}")]
    Timestamp(String),

    #[error("unknown tool: {0}")]
    Tool(String),

    #[error("unknown source: {0}")]
    Source(String),
}

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("Invalid event data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to save event: {0}")]
    Storage(#[from] StorageError),

    #[error("Unknown message type")]
    UnknownMessage,
}
