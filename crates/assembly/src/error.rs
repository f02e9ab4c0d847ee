//! Errors raised while fetching and assembling domain objects.

use history_atlas_db::StoreError;

/// Error type for domain fetch operations.
///
/// Any failure aborts the whole batch; no partially assembled entity is
/// ever returned alongside one of these.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to fetch {related} for {parent} {parent_id}: {source}")]
    Related {
        parent: &'static str,
        parent_id: i64,
        related: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Result type for domain fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
