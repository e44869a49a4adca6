//! Client facade
//!
//! Ties configuration, transport, and write channels together. Production
//! code builds a [`Client`] from a [`Config`]; tests and alternative
//! backends inject any [`StorageTransport`] through [`Client::with_transport`].

use std::sync::Arc;

use crate::config::Config;
use crate::storage::{HttpTransport, StorageError, StorageTransport, UploadTarget};
use crate::writer::{WriteChannel, WriterState, DEFAULT_CHUNK_SIZE};

pub struct Client {
    transport: Arc<dyn StorageTransport>,
    chunk_size: usize,
}

impl Client {
    /// Build a client with the HTTP transport described by `config`.
    pub fn new(config: &Config) -> Result<Self, StorageError> {
        let transport =
            HttpTransport::new(config.endpoint.url.clone(), config.auth.token.clone())?;
        Ok(Self {
            transport: Arc::new(transport),
            chunk_size: config.upload.chunk_size,
        })
    }

    /// Build a client around an existing transport, using the default
    /// chunk size.
    pub fn with_transport(transport: Arc<dyn StorageTransport>) -> Self {
        Self {
            transport,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Open a resumable write channel for `target`. Blocks for the session
    /// open round-trip; a transient failure is retried once.
    pub fn writer(&self, target: UploadTarget) -> Result<WriteChannel, StorageError> {
        WriteChannel::open(Arc::clone(&self.transport), target, self.chunk_size)
    }

    /// Reconstruct a channel from a captured state without contacting the
    /// endpoint. See [`WriterState::restore`].
    pub fn restore(&self, state: &WriterState) -> WriteChannel {
        state.restore(Arc::clone(&self.transport))
    }
}
