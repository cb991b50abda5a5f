//! `std::io::Write` adapters: push bytes in, get transformed bytes written
//! to an inner writer.
//!
//! Each `write` call is one adapter cycle; whatever the engine produced is
//! written through before `write` returns. [`finish`](Compressor::finish)
//! runs the finish cycle and hands the inner writer back. Dropping a writer
//! without finishing it loses the trailing output and logs a warning.

use std::io::{self, Write};

use tracing::warn;
use zflow_engine::{Engine, ZstdEngine};

use crate::adapter::StreamAdapter;
use crate::config::AdapterConfig;

/// A writer that runs every written chunk through an [`Engine`].
pub struct TransformWriter<W: Write, E: Engine> {
    /// `None` once finished.
    inner: Option<W>,
    adapter: StreamAdapter<E>,
}

impl<W: Write, E: Engine> TransformWriter<W, E> {
    pub fn new(inner: W, engine: E) -> Self {
        Self {
            inner: Some(inner),
            adapter: StreamAdapter::new(engine),
        }
    }

    /// # Errors
    ///
    /// [`io::ErrorKind::Other`] wrapping the config error if `config` is
    /// invalid.
    pub fn with_config(inner: W, engine: E, config: AdapterConfig) -> io::Result<Self> {
        Ok(Self {
            inner: Some(inner),
            adapter: StreamAdapter::with_config(engine, config)?,
        })
    }

    pub fn adapter(&self) -> &StreamAdapter<E> {
        &self.adapter
    }

    /// Run the finish cycle, write the trailing output and return the
    /// inner writer.
    ///
    /// # Errors
    ///
    /// The engine's failure (e.g. truncated input for a decoder) or the
    /// inner writer's I/O error.
    pub fn finish(mut self) -> io::Result<W> {
        self.finish_cycle()
    }

    /// The inner writer is released before the finish cycle runs, so a
    /// failed finish is not reported again as an abandoned writer.
    fn finish_cycle(&mut self) -> io::Result<W> {
        let mut inner = self.inner.take().ok_or_else(finished_error)?;
        let trailing = self.adapter.finish()?;
        inner.write_all(&trailing)?;
        inner.flush()?;
        Ok(inner)
    }

    fn is_abandoned(&self) -> bool {
        self.inner.is_some() && !self.adapter.is_finished()
    }

    fn inner_mut(&mut self) -> io::Result<&mut W> {
        self.inner.as_mut().ok_or_else(finished_error)
    }
}

impl<W: Write, E: Engine> Write for TransformWriter<W, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let produced = self.adapter.submit(buf)?;
        self.inner_mut()?.write_all(&produced)?;
        Ok(buf.len())
    }

    /// Flushes the inner writer only. Output the engine is still holding
    /// is emitted by [`finish`](Self::finish).
    fn flush(&mut self) -> io::Result<()> {
        self.inner_mut()?.flush()
    }
}

impl<W: Write, E: Engine> Drop for TransformWriter<W, E> {
    fn drop(&mut self) {
        if self.is_abandoned() {
            warn!("transform writer dropped without finish; trailing output lost");
        }
    }
}

fn finished_error() -> io::Error {
    io::Error::other("writer already finished")
}

/// Compresses everything written to it into the inner writer.
///
/// ```rust
/// use std::io::Write;
/// use zflow_stream::io::{Compressor, Decompressor};
///
/// let mut c = Compressor::new(Vec::new()).unwrap();
/// c.write_all(b"hello, hello!").unwrap();
/// let compressed = c.finish().unwrap();
///
/// let mut d = Decompressor::new(Vec::new()).unwrap();
/// d.write_all(&compressed).unwrap();
/// assert_eq!(d.finish().unwrap(), b"hello, hello!");
/// ```
pub struct Compressor<W: Write>(TransformWriter<W, ZstdEngine>);

impl<W: Write> Compressor<W> {
    /// Compressor at the engine's default preset.
    ///
    /// # Errors
    ///
    /// Engine construction failure.
    pub fn new(inner: W) -> io::Result<Self> {
        Self::with_preset(inner, None)
    }

    /// # Errors
    ///
    /// Invalid preset or engine construction failure.
    pub fn with_preset(inner: W, preset: Option<i32>) -> io::Result<Self> {
        let engine = ZstdEngine::encoder(preset).map_err(crate::StreamError::from)?;
        Ok(Self(TransformWriter::new(inner, engine)))
    }

    /// # Errors
    ///
    /// See [`TransformWriter::finish`].
    pub fn finish(self) -> io::Result<W> {
        self.0.finish()
    }
}

impl<W: Write> Write for Compressor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Decompresses everything written to it into the inner writer.
pub struct Decompressor<W: Write>(TransformWriter<W, ZstdEngine>);

impl<W: Write> Decompressor<W> {
    /// # Errors
    ///
    /// Engine construction failure.
    pub fn new(inner: W) -> io::Result<Self> {
        let engine = ZstdEngine::decoder().map_err(crate::StreamError::from)?;
        Ok(Self(TransformWriter::new(inner, engine)))
    }

    /// # Errors
    ///
    /// See [`TransformWriter::finish`]; a truncated final frame surfaces
    /// as [`io::ErrorKind::InvalidData`].
    pub fn finish(self) -> io::Result<W> {
        self.0.finish()
    }
}

impl<W: Write> Write for Decompressor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_writers() {
        let data = b"Hello, I'm Dr. Thaddeus Venture.";

        let mut c = Compressor::new(Vec::new()).unwrap();
        c.write_all(data).unwrap();
        let compressed = c.finish().unwrap();

        let mut d = Decompressor::new(Vec::new()).unwrap();
        d.write_all(&compressed).unwrap();
        assert_eq!(d.finish().unwrap(), data);
    }

    #[test]
    fn many_small_writes() {
        let data = "line of text that repeats\n".repeat(500);

        let mut c = Compressor::with_preset(Vec::new(), Some(9)).unwrap();
        for chunk in data.as_bytes().chunks(17) {
            c.write_all(chunk).unwrap();
        }
        let compressed = c.finish().unwrap();
        assert!(compressed.len() < data.len());

        let mut d = Decompressor::new(Vec::new()).unwrap();
        for chunk in compressed.chunks(5) {
            d.write_all(chunk).unwrap();
        }
        assert_eq!(d.finish().unwrap(), data.as_bytes());
    }

    #[test]
    fn truncated_input_is_invalid_data() {
        let mut c = Compressor::new(Vec::new()).unwrap();
        c.write_all(b"some data worth compressing").unwrap();
        let compressed = c.finish().unwrap();

        let mut d = Decompressor::new(Vec::new()).unwrap();
        d.write_all(&compressed[..compressed.len() - 3]).unwrap();
        let err = d.finish().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn failed_finish_is_not_an_abandoned_writer() {
        let compressed = crate::compress(b"some data worth compressing", None).unwrap();

        let mut w = TransformWriter::new(Vec::new(), ZstdEngine::decoder().unwrap());
        w.write_all(&compressed[..compressed.len() - 3]).unwrap();
        assert!(w.is_abandoned());

        let err = w.finish_cycle().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(!w.is_abandoned());
    }

    #[test]
    fn custom_config_writer_round_trips() {
        let data = "configured writer ".repeat(300);
        let config = AdapterConfig::default()
            .with_min_capacity(16)
            .with_max_capacity(64);

        let engine = ZstdEngine::encoder(None).unwrap();
        let mut c = TransformWriter::with_config(Vec::new(), engine, config).unwrap();
        c.write_all(data.as_bytes()).unwrap();
        assert_eq!(c.adapter().config().max_capacity, 64);
        let compressed = c.finish().unwrap();

        assert_eq!(crate::decompress(&compressed).unwrap(), data.as_bytes());
    }

    #[test]
    fn writer_rejects_invalid_config() {
        let config = AdapterConfig::default().with_min_capacity(0);
        let result = TransformWriter::with_config(Vec::new(), ZstdEngine::decoder().unwrap(), config);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_preset_is_rejected() {
        assert!(Compressor::with_preset(Vec::new(), Some(99)).is_err());
    }
}
