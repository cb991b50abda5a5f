use bytes::Bytes;
use tracing::{debug, trace};
use zflow_engine::{Engine, EngineError, Flags, Status};

use crate::arena::OutputArena;
use crate::config::AdapterConfig;
use crate::error::StreamError;

/// Streaming adapter: turns a bounded-buffer [`Engine`] into a
/// chunk-in / chunk-out stream.
///
/// Each call runs one *cycle*: the engine is invoked into the arena's
/// output region until it stops reporting overflow, and everything it
/// produced is returned as one contiguous [`Bytes`].
///
/// ```text
///   CALLING ──Overflow(n)──▶ freeze n bytes, fresh region ──▶ CALLING
///      │
///      └──Done(n)──▶ concat segments + n bytes ──▶ emit, keep region
/// ```
///
/// Only the first engine call of a cycle carries input; retries pass no
/// input and the same flags. A cycle never yields midway, so the adapter
/// can sit behind an async reader and still only suspend between chunks.
///
/// Two surfaces drive the same cycle:
///
/// - combined: [`process`](Self::process) (and [`submit`](Self::submit) /
///   [`finish`](Self::finish) on top of it)
/// - split: [`feed`](Self::feed) any number of times, then
///   [`drain`](Self::drain)
///
/// # Example
///
/// ```rust
/// use zflow_engine::ZstdEngine;
/// use zflow_stream::StreamAdapter;
///
/// let mut compressor = StreamAdapter::new(ZstdEngine::encoder(None).unwrap());
/// let mut compressed = Vec::new();
/// for chunk in [b"hello, ".as_slice(), b"hello!".as_slice()] {
///     compressed.extend_from_slice(&compressor.submit(chunk).unwrap());
/// }
/// compressed.extend_from_slice(&compressor.finish().unwrap());
///
/// let mut decompressor = StreamAdapter::new(ZstdEngine::decoder().unwrap());
/// let mut plain = decompressor.submit(&compressed).unwrap().to_vec();
/// plain.extend_from_slice(&decompressor.finish().unwrap());
/// assert_eq!(plain, b"hello, hello!");
/// ```
#[derive(Debug)]
pub struct StreamAdapter<E> {
    engine: E,
    config: AdapterConfig,
    arena: OutputArena,
    /// Bytes fed through the split surface since the last drain, used to
    /// size the next region.
    fed: usize,
    state: StreamState,
}

/// Lifecycle of the adapter's stream.
///
/// ```text
///   Open ──finish / FINISH cycle──▶ Finished
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    Open,
    Finished,
}

impl<E: Engine> StreamAdapter<E> {
    /// Wrap `engine` with the default sizing policy.
    pub fn new(engine: E) -> Self {
        Self::build(engine, AdapterConfig::default())
    }

    /// Wrap `engine` with a custom sizing policy.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(engine: E, config: AdapterConfig) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self::build(engine, config))
    }

    fn build(engine: E, config: AdapterConfig) -> Self {
        Self {
            engine,
            arena: OutputArena::with_capacity(config.min_capacity),
            config,
            fed: 0,
            state: StreamState::Open,
        }
    }

    /// Push one input chunk and return the output it produced.
    ///
    /// The result may be empty; compressors in particular buffer small
    /// chunks internally.
    ///
    /// # Errors
    ///
    /// [`StreamError::Finished`] after [`finish`](Self::finish), or the
    /// engine's failure for this cycle.
    pub fn submit(&mut self, chunk: &[u8]) -> Result<Bytes, StreamError> {
        self.process(Some(chunk), Flags::NONE)
    }

    /// Signal end of input and return the stream's trailing output.
    ///
    /// # Errors
    ///
    /// [`StreamError::Finished`] if already finished, or the engine's
    /// failure (for a decoder, e.g. a truncated final frame).
    pub fn finish(&mut self) -> Result<Bytes, StreamError> {
        self.process(None, Flags::FINISH)
    }

    /// Combined surface: run one cycle with optional input and `flags`.
    ///
    /// A cycle with [`Flags::FINISH`] ends the stream.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub fn process(&mut self, input: Option<&[u8]>, flags: Flags) -> Result<Bytes, StreamError> {
        self.ensure_open()?;
        let estimate = if flags.is_finish() {
            self.config.max_capacity
        } else {
            self.fed + input.map_or(0, <[u8]>::len)
        };
        self.run_cycle(input, flags, estimate)
    }

    /// Split surface: queue input without running a cycle.
    ///
    /// Returns the number of input bytes the engine holds unconsumed.
    ///
    /// # Errors
    ///
    /// [`StreamError::Finished`] after the stream ended, or the engine's
    /// failure (e.g. [`EngineError::Closed`](zflow_engine::EngineError::Closed)).
    pub fn feed(&mut self, chunk: &[u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        let queued = self.engine.feed(chunk)?;
        self.fed += chunk.len();
        Ok(queued)
    }

    /// Split surface: run one cycle over everything fed so far.
    ///
    /// # Errors
    ///
    /// Same as [`process`](Self::process).
    pub fn drain(&mut self, flags: Flags) -> Result<Bytes, StreamError> {
        self.process(None, flags)
    }

    /// Close the underlying engine.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyClosed`](zflow_engine::EngineError::AlreadyClosed)
    /// on the second call. Later cycles fail with
    /// [`EngineError::Closed`](zflow_engine::EngineError::Closed).
    pub fn close(&mut self) -> Result<(), StreamError> {
        self.engine.close()?;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.state == StreamState::Finished
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Capacity of the output region the next cycle starts from.
    pub fn buffer_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Output regions allocated so far, including the initial one.
    pub fn buffer_allocations(&self) -> usize {
        self.arena.allocations()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        match self.state {
            StreamState::Open => Ok(()),
            StreamState::Finished => Err(StreamError::Finished),
        }
    }

    /// The single cycle implementation behind every surface.
    fn run_cycle(
        &mut self,
        mut input: Option<&[u8]>,
        flags: Flags,
        estimate: usize,
    ) -> Result<Bytes, StreamError> {
        self.arena.reserve(self.config.target_capacity(estimate));
        self.fed = 0;

        let mut calls = 0usize;
        loop {
            calls += 1;
            let status = match self.engine.process(input.take(), self.arena.region_mut(), flags) {
                Ok(status) => status,
                Err(e) => {
                    debug!(error = %e, calls, "cycle aborted, discarding partial output");
                    self.arena.discard();
                    return Err(e.into());
                }
            };

            match status {
                Status::Overflow(0) => {
                    debug!(calls, "engine overflowed without writing, aborting cycle");
                    self.arena.discard();
                    return Err(EngineError::Stalled { pending: 0 }.into());
                }
                Status::Overflow(written) => {
                    trace!(written, capacity = self.arena.capacity(), "output region exhausted");
                    self.arena.seal_overflow(written);
                }
                Status::Done(written) => {
                    let output = self.arena.assemble(written);
                    if flags.is_finish() {
                        self.state = StreamState::Finished;
                    }
                    if calls > 1 {
                        debug!(calls, len = output.len(), "cycle needed overflow retries");
                    }
                    trace!(len = output.len(), finish = flags.is_finish(), "cycle done");
                    return Ok(output);
                }
            }
        }
    }
}
