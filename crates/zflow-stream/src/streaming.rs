use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use zflow_engine::Engine;

use crate::adapter::StreamAdapter;
use crate::error::StreamError;

/// Default number of bytes read from the upstream reader per cycle.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Asynchronous transform stream: reads raw chunks from an `AsyncRead`
/// and yields the engine's output one cycle at a time.
///
/// The only suspension point is the read of the next upstream chunk.
/// Once a chunk is in hand its whole cycle, overflow retries included,
/// runs synchronously before the next `await`. Backpressure is natural:
/// nothing is read until the caller awaits the next item.
///
/// ```text
///   Reading ──chunk──▶ submit cycle ──▶ yield output (if non-empty)
///      │
///      └──EOF──▶ finish cycle ──▶ yield trailing (if non-empty) ──▶ Done
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use zflow_engine::ZstdEngine;
/// use zflow_stream::TransformStream;
/// use tokio::io::AsyncRead;
///
/// async fn compress_from(reader: impl AsyncRead + Unpin) {
///     let engine = ZstdEngine::encoder(None).unwrap();
///     let mut stream = TransformStream::new(reader, engine);
///     while let Some(_chunk) = stream.next().await.transpose().unwrap() {
///         // Forward each compressed chunk downstream...
///     }
/// }
/// ```
pub struct TransformStream<R, E> {
    reader: R,
    adapter: StreamAdapter<E>,
    state: StreamState,
    /// Read buffer, reused across chunks.
    buf: BytesMut,
    chunk_size: usize,
}

/// Internal state machine for the transform stream.
///
/// ```text
///   Reading → Done
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    Reading,
    Done,
}

impl<R: AsyncRead + Unpin, E: Engine> TransformStream<R, E> {
    #[must_use]
    pub fn new(reader: R, engine: E) -> Self {
        Self::from_adapter(reader, StreamAdapter::new(engine))
    }

    /// Use a pre-configured adapter (custom buffer sizing).
    #[must_use]
    pub fn from_adapter(reader: R, adapter: StreamAdapter<E>) -> Self {
        Self {
            reader,
            adapter,
            state: StreamState::Reading,
            buf: BytesMut::zeroed(DEFAULT_CHUNK_SIZE),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Read at most `chunk_size` bytes per cycle (minimum 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.buf = BytesMut::zeroed(self.chunk_size);
        self
    }

    /// Yield the next piece of transformed output.
    ///
    /// Returns `Some(Ok(bytes))` for each non-empty cycle output,
    /// `None` once the finish cycle has been emitted, or `Some(Err)` on
    /// an I/O or engine failure. After an error the stream is done.
    pub async fn next(&mut self) -> Option<Result<Bytes, StreamError>> {
        while self.state == StreamState::Reading {
            let result = self.step().await;
            match result {
                Ok(Some(out)) if !out.is_empty() => return Some(Ok(out)),
                Ok(_) => {}
                Err(e) => {
                    self.state = StreamState::Done;
                    return Some(Err(e));
                }
            }
        }
        None
    }

    /// Drain the whole stream into one buffer.
    ///
    /// # Errors
    ///
    /// The first I/O or engine failure encountered.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>, StreamError> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    pub fn adapter(&self) -> &StreamAdapter<E> {
        &self.adapter
    }

    /// One cycle: read a chunk and submit it, or finish at EOF.
    async fn step(&mut self) -> Result<Option<Bytes>, StreamError> {
        let n = self.reader.read(&mut self.buf[..self.chunk_size]).await?;
        if n == 0 {
            let trailing = self.adapter.finish()?;
            self.state = StreamState::Done;
            return Ok(Some(trailing));
        }
        Ok(Some(self.adapter.submit(&self.buf[..n])?))
    }
}
