//! Errors raised while talking to the remote store.

/// Error type for remote store operations.
///
/// Every variant names the collection the failing query targeted.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request to `{collection}` failed: {source}")]
    Transport {
        collection: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{collection}` query failed with status {status}: {body}")]
    Status {
        collection: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode `{collection}` rows: {source}")]
    Decode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected exactly one row from `{collection}`, got {count}")]
    Cardinality { collection: String, count: usize },
    #[error("invalid query against `{collection}`: {reason}")]
    InvalidQuery { collection: String, reason: String },
}

impl StoreError {
    /// Name of the collection the failing query targeted.
    pub fn collection(&self) -> &str {
        match self {
            StoreError::Transport { collection, .. }
            | StoreError::Status { collection, .. }
            | StoreError::Decode { collection, .. }
            | StoreError::Cardinality { collection, .. }
            | StoreError::InvalidQuery { collection, .. } => collection,
        }
    }
}

/// Result type for remote store operations.
pub type StoreResult<T> = Result<T, StoreError>;
