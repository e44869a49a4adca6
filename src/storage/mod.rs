//! Remote storage endpoint boundary
//!
//! The write channel talks to the storage backend through exactly two
//! operations: opening a resumable upload session and uploading one chunk.
//! Everything behind those operations (transport, auth headers, wire format)
//! lives in an implementation of [`StorageTransport`]; the default HTTP
//! implementation is in [`http`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;

pub use http::HttpTransport;

/// Storage endpoint errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("storage endpoint returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("transport configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// Whether a session open that failed with this error may be retried.
    ///
    /// Socket-level faults and the usual transient HTTP statuses qualify;
    /// everything else is fatal. Retry policy itself (how often, when) is
    /// the caller's concern — this only classifies.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Connection(_) | StorageError::Timeout(_) => true,
            StorageError::Status { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Identity of the object an upload session writes to.
///
/// Either structured blob metadata (bucket + object name) or a pre-signed
/// upload URL obtained out of band. Part of the captured writer state, so
/// equality and serialization are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploadTarget {
    Blob {
        bucket: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
    SignedUrl { url: String },
}

impl UploadTarget {
    /// Target a bucket + object name.
    pub fn blob(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        UploadTarget::Blob {
            bucket: bucket.into(),
            name: name.into(),
            content_type: None,
        }
    }

    /// Target a bucket + object name with a content type.
    pub fn blob_with_content_type(
        bucket: impl Into<String>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        UploadTarget::Blob {
            bucket: bucket.into(),
            name: name.into(),
            content_type: Some(content_type.into()),
        }
    }

    /// Target a pre-signed upload URL.
    pub fn signed_url(url: impl Into<String>) -> Self {
        UploadTarget::SignedUrl { url: url.into() }
    }
}

/// The two storage operations the write channel depends on.
///
/// Both calls are synchronous round-trips; timeouts and cancellation are the
/// implementation's responsibility.
#[cfg_attr(test, mockall::automock)]
pub trait StorageTransport: Send + Sync {
    /// Open a resumable upload session for `target` and return the opaque
    /// session token every subsequent chunk upload must present.
    fn open(&self, target: &UploadTarget) -> Result<String, StorageError>;

    /// Upload one chunk. `chunk` covers exactly the valid byte range,
    /// `position` is the absolute offset of its first byte in the object,
    /// and `is_final` tells the backend no more bytes follow.
    fn upload_chunk(
        &self,
        session: &str,
        chunk: Bytes,
        position: u64,
        is_final: bool,
    ) -> Result<(), StorageError>;
}
