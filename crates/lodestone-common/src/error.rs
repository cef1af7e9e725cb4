//! Error types for LodestoneDB.

use crate::page::PageId;
use thiserror::Error;

/// Result type alias using LodestoneError.
pub type Result<T> = std::result::Result<T, LodestoneError>;

/// Errors that can occur in LodestoneDB operations.
#[derive(Debug, Error)]
pub enum LodestoneError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid page id: {page_id}")]
    InvalidPageId { page_id: PageId },

    // Buffer pool errors
    #[error("buffer pool exhausted, every frame is pinned")]
    PoolExhausted,

    // Header page errors
    #[error("index name too long: {len} bytes (max {max})")]
    IndexNameTooLong { len: usize, max: usize },

    #[error("header page full, cannot register another index")]
    HeaderFull,

    // B+ tree errors
    #[error("invalid node type tag: {0}")]
    InvalidNodeType(u8),

    #[error("b+ tree corrupted: {0}")]
    TreeCorrupted(String),

    #[error("invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },

    #[error("parse error: {0}")]
    ParseError(String),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: LodestoneError = io_err.into();
        assert!(matches!(err, LodestoneError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_pool_exhausted_display() {
        let err = LodestoneError::PoolExhausted;
        assert_eq!(
            err.to_string(),
            "buffer pool exhausted, every frame is pinned"
        );
    }

    #[test]
    fn test_header_errors_display() {
        let err = LodestoneError::IndexNameTooLong { len: 40, max: 32 };
        assert_eq!(err.to_string(), "index name too long: 40 bytes (max 32)");

        let err = LodestoneError::HeaderFull;
        assert!(err.to_string().contains("header page full"));
    }

    #[test]
    fn test_tree_errors_display() {
        let err = LodestoneError::InvalidNodeType(9);
        assert_eq!(err.to_string(), "invalid node type tag: 9");

        let err = LodestoneError::TreeCorrupted("dangling child".to_string());
        assert_eq!(err.to_string(), "b+ tree corrupted: dangling child");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = LodestoneError::InvalidParameter {
            name: "leaf_max_size".to_string(),
            value: "1".to_string(),
        };
        assert_eq!(err.to_string(), "invalid parameter: leaf_max_size = 1");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }
        assert!(returns_ok().is_ok());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LodestoneError>();
    }
}
