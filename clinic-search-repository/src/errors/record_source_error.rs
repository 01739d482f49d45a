use thiserror::Error;

/// Represents errors that can occur while reading records from the primary store.
#[derive(Debug, Error)]
pub enum RecordSourceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Failed to decode row {id}: {message}")]
    Decode { id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
