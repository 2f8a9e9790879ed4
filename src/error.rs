use std::error::Error as StdError;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the file store and its backing relation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A point-targeted operation addressed an id with no matching record.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Opaque passthrough of a backend fault: connectivity, constraint
    /// violation, malformed statement.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    /// Wrap any backend-level error into the opaque [`StoreError::Backend`] kind.
    pub fn backend<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinct_from_backend() {
        let nf = StoreError::NotFound("a/b".into());
        assert!(nf.is_not_found());
        assert_eq!(nf.to_string(), "file not found: a/b");

        let be = StoreError::backend(std::io::Error::other("boom"));
        assert!(!be.is_not_found());
        assert_eq!(be.to_string(), "backend error: boom");
    }
}
