//! Captured writer state
//!
//! A [`WriterState`] is an immutable value carrying everything needed to
//! reconstruct a [`WriteChannel`](super::WriteChannel) with identical future
//! behavior: target identity, session token, chunk size, a copy of the
//! unflushed bytes, the acknowledged position, and the open flag. Equality,
//! hashing, and the debug form are structural, and the value serializes with
//! serde so it can cross process boundaries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{StorageTransport, UploadTarget};
use crate::writer::WriteChannel;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WriterState {
    target: UploadTarget,
    session: String,
    chunk_size: usize,
    /// Unflushed bytes at capture time; `None` once the channel is closed.
    buffer: Option<Vec<u8>>,
    position: u64,
    open: bool,
}

impl WriterState {
    pub(crate) fn new(
        target: UploadTarget,
        session: String,
        chunk_size: usize,
        buffer: Option<Vec<u8>>,
        position: u64,
        open: bool,
    ) -> Self {
        Self {
            target,
            session,
            chunk_size,
            buffer,
            position,
            open,
        }
    }

    /// Reconstruct a live channel from this snapshot. The session token is
    /// reused as-is; no open call is made against the endpoint. A snapshot
    /// of a closed channel restores to a closed channel.
    pub fn restore(&self, transport: Arc<dyn StorageTransport>) -> WriteChannel {
        WriteChannel::from_state(transport, self)
    }

    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub(crate) fn buffered(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    /// Number of captured-but-unflushed bytes. A resuming caller continues
    /// its source at `position() + buffered_len()`.
    pub fn buffered_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for WriterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterState")
            .field("target", &self.target)
            .field("session", &self.session)
            .field("chunk_size", &self.chunk_size)
            .field("buffered", &self.buffer.as_ref().map(Vec::len))
            .field("position", &self.position)
            .field("open", &self.open)
            .finish()
    }
}
