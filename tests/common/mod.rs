//! Shared test transport
//!
//! A recording fake standing in for the remote storage endpoint: open
//! outcomes are scripted up front, chunk uploads are captured for later
//! inspection. Both integration suites drive real [`WriteChannel`]s
//! against it.
//!
//! [`WriteChannel`]: blobwritr::WriteChannel

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use blobwritr::{Client, StorageError, StorageTransport, UploadTarget};
use bytes::Bytes;
use rand::Rng;

pub const SESSION: &str = "https://storage.example.com/upload/session-1";

/// One recorded `upload_chunk` call.
#[derive(Debug, Clone)]
pub struct ChunkCall {
    pub session: String,
    pub bytes: Vec<u8>,
    pub position: u64,
    pub is_final: bool,
}

/// Scripted, recording implementation of [`StorageTransport`].
///
/// `open` pops a scripted outcome, falling back to `Ok(SESSION)` once the
/// script runs out; `upload_chunk` pops a scripted failure if one is queued,
/// otherwise records the call and succeeds.
#[derive(Default)]
pub struct RecordingTransport {
    open_results: Mutex<VecDeque<Result<String, StorageError>>>,
    open_targets: Mutex<Vec<UploadTarget>>,
    chunk_failures: Mutex<VecDeque<StorageError>>,
    chunks: Mutex<Vec<ChunkCall>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_open(&self, result: Result<String, StorageError>) {
        self.open_results.lock().unwrap().push_back(result);
    }

    pub fn fail_next_chunk(&self, err: StorageError) {
        self.chunk_failures.lock().unwrap().push_back(err);
    }

    pub fn open_count(&self) -> usize {
        self.open_targets.lock().unwrap().len()
    }

    pub fn open_targets(&self) -> Vec<UploadTarget> {
        self.open_targets.lock().unwrap().clone()
    }

    pub fn chunks(&self) -> Vec<ChunkCall> {
        self.chunks.lock().unwrap().clone()
    }
}

impl StorageTransport for RecordingTransport {
    fn open(&self, target: &UploadTarget) -> Result<String, StorageError> {
        self.open_targets.lock().unwrap().push(target.clone());
        match self.open_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(SESSION.to_string()),
        }
    }

    fn upload_chunk(
        &self,
        session: &str,
        chunk: Bytes,
        position: u64,
        is_final: bool,
    ) -> Result<(), StorageError> {
        if let Some(err) = self.chunk_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.chunks.lock().unwrap().push(ChunkCall {
            session: session.to_string(),
            bytes: chunk.to_vec(),
            position,
            is_final,
        });
        Ok(())
    }
}

pub fn client(transport: &Arc<RecordingTransport>) -> Client {
    Client::with_transport(Arc::clone(transport) as Arc<dyn StorageTransport>)
}

pub fn target() -> UploadTarget {
    UploadTarget::blob("b", "n")
}

pub fn random_buffer(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::rng().fill(buf.as_mut_slice());
    buf
}
