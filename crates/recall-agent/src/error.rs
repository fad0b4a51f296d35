//! Error types for recall-agent

use thiserror::Error;

/// Result type alias using recall-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the key-value store boundary
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading a key failed
    #[error("Failed to read '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Writing a key failed
    #[error("Failed to write '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Encoding the durable state failed
    #[error("Failed to serialize conversation: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub fn read(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Read {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that can occur during agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the completion service layer
    #[error(transparent)]
    Ai(#[from] recall_ai::Error),

    /// An error from the key-value store
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An error during compaction (string-based for flexibility)
    #[error("Compaction error: {0}")]
    Compaction(String),

    /// A generic agent error
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let e = StorageError::write("chat_summary", "disk full");
        assert_eq!(e.to_string(), "Failed to write 'chat_summary': disk full");
    }

    #[test]
    fn test_ai_error_is_transparent() {
        let e: Error = recall_ai::Error::api("quota exceeded").into();
        assert_eq!(e.to_string(), "API error: quota exceeded");
    }
}
