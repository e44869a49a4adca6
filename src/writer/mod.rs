//! Chunked resumable write channel
//!
//! [`WriteChannel`] is a sequential, blocking write channel over one upload
//! session. Bytes are buffered until a full chunk is available, each full
//! chunk is uploaded as one transport call, and the remainder is flushed as
//! the final chunk on [`WriteChannel::close`]. The whole in-flight session
//! can be captured into a [`WriterState`] and reconstituted later, possibly
//! in a different process, continuing at the exact acknowledged offset.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::storage::{StorageError, StorageTransport, UploadTarget};

mod state;

pub use state::WriterState;

/// Chunk granularity the protocol mandates (256 KiB). Every chunk size must
/// be a positive multiple of this.
pub const MIN_CHUNK_SIZE: usize = 256 * 1024;

/// Default chunk size (15 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 60 * MIN_CHUNK_SIZE;

/// Write channel errors
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("write channel is closed")]
    Closed,

    #[error("chunk size must be a positive multiple of {MIN_CHUNK_SIZE} bytes, got {0}")]
    InvalidChunkSize(usize),

    #[error("chunk size cannot change after bytes have been written")]
    ChunkSizeLocked,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A buffered, chunked, resumable upload channel.
///
/// Exclusive single-threaded ownership: every mutating operation takes
/// `&mut self`, and the chunk buffer is never exposed by reference.
pub struct WriteChannel {
    transport: Arc<dyn StorageTransport>,
    target: UploadTarget,
    session: String,
    chunk_size: usize,
    buffer: Vec<u8>,
    position: u64,
    open: bool,
}

impl std::fmt::Debug for WriteChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteChannel")
            .field("target", &self.target)
            .field("session", &self.session)
            .field("chunk_size", &self.chunk_size)
            .field("buffer_len", &self.buffer.len())
            .field("position", &self.position)
            .field("open", &self.open)
            .finish()
    }
}

impl WriteChannel {
    /// Open an upload session for `target` and return a channel positioned
    /// at byte 0 with an empty buffer.
    ///
    /// A retryable open failure is retried exactly once; any other failure
    /// propagates and no channel is created.
    pub(crate) fn open(
        transport: Arc<dyn StorageTransport>,
        target: UploadTarget,
        chunk_size: usize,
    ) -> Result<Self, StorageError> {
        let session = match transport.open(&target) {
            Ok(session) => session,
            Err(err) if err.is_retryable() => {
                tracing::debug!(error = %err, "session open failed, retrying once");
                transport.open(&target)?
            }
            Err(err) => return Err(err),
        };

        tracing::info!(upload_target = ?target, "opened upload session");

        Ok(Self {
            transport,
            target,
            session,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size),
            position: 0,
            open: true,
        })
    }

    /// Reconstruct a channel from a captured state. Reuses the session
    /// token; the storage endpoint is not contacted.
    pub(crate) fn from_state(
        transport: Arc<dyn StorageTransport>,
        state: &WriterState,
    ) -> Self {
        Self {
            transport,
            target: state.target().clone(),
            session: state.session().to_string(),
            chunk_size: state.chunk_size(),
            buffer: state.buffered().map(<[u8]>::to_vec).unwrap_or_default(),
            position: state.position(),
            open: state.is_open(),
        }
    }

    /// Append `data` to the channel, uploading a chunk each time the buffer
    /// fills. Returns the number of bytes consumed, which is `data.len()`
    /// whenever no error occurs.
    ///
    /// If a chunk upload fails mid-call the error propagates, the position
    /// does not advance, and the already-buffered bytes stay buffered for
    /// the next attempt.
    pub fn write(&mut self, mut data: &[u8]) -> Result<usize, WriteError> {
        if !self.open {
            return Err(WriteError::Closed);
        }

        let total = data.len();
        while !data.is_empty() {
            let room = self.chunk_size - self.buffer.len();
            let take = room.min(data.len());
            self.buffer.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.buffer.len() == self.chunk_size {
                self.flush(false)?;
            }
        }
        Ok(total)
    }

    /// Flush the remainder (possibly zero bytes) as the final chunk and
    /// close the channel. A second `close` is a no-op; the final flush
    /// happens exactly once.
    pub fn close(&mut self) -> Result<(), WriteError> {
        if !self.open {
            return Ok(());
        }
        self.flush(true)?;
        self.open = false;
        tracing::info!(position = self.position, "closed upload channel");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Absolute offset of the next chunk: bytes acknowledged by the backend
    /// so far. Buffered bytes do not count until they are flushed.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Change the chunk size. Only allowed before the first byte is
    /// written; the value must be a positive multiple of [`MIN_CHUNK_SIZE`].
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<(), WriteError> {
        if !self.open {
            return Err(WriteError::Closed);
        }
        if self.position > 0 || !self.buffer.is_empty() {
            return Err(WriteError::ChunkSizeLocked);
        }
        if chunk_size == 0 || chunk_size % MIN_CHUNK_SIZE != 0 {
            return Err(WriteError::InvalidChunkSize(chunk_size));
        }
        self.chunk_size = chunk_size;
        self.buffer = Vec::with_capacity(chunk_size);
        Ok(())
    }

    /// Capture the channel's state into an immutable snapshot. Does not
    /// mutate the channel; capturing twice without intervening writes
    /// yields equal snapshots.
    pub fn capture(&self) -> WriterState {
        WriterState::new(
            self.target.clone(),
            self.session.clone(),
            self.chunk_size,
            self.open.then(|| self.buffer.clone()),
            self.position,
            self.open,
        )
    }

    /// Upload the buffered bytes as one chunk. Position and buffer are only
    /// touched after the transport acknowledges the call.
    fn flush(&mut self, is_final: bool) -> Result<(), WriteError> {
        let chunk = Bytes::copy_from_slice(&self.buffer);
        let len = chunk.len();
        tracing::debug!(
            position = self.position,
            len = len,
            is_final = is_final,
            "uploading chunk"
        );
        self.transport
            .upload_chunk(&self.session, chunk, self.position, is_final)?;
        self.position += len as u64;
        self.buffer.clear();
        Ok(())
    }
}
