//! Blobwritr Library
//!
//! Buffered, chunked, resumable write channel for cloud object storage.
//!
//! # Features
//!
//! - **Chunked**: bytes are buffered and uploaded in protocol-aligned chunks
//! - **Resumable**: channel state can be captured and restored, even across
//!   processes
//! - **Two targets**: structured bucket + object name, or a pre-signed URL
//! - **Transient-fault tolerant**: a retryable session-open failure is
//!   retried once
//!
//! # Example
//!
//! ```no_run
//! use blobwritr::{config::Config, Client, UploadTarget};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let client = Client::new(&config)?;
//!
//!     let mut writer = client.writer(UploadTarget::blob("backups", "2026-08-04.tar"))?;
//!     writer.write(b"payload")?;
//!     writer.close()?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod storage;
pub mod writer;

// Re-export commonly used types
pub use client::Client;
pub use config::Config;
pub use storage::{HttpTransport, StorageError, StorageTransport, UploadTarget};
pub use writer::{WriteChannel, WriteError, WriterState, DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
