use zflow_engine::{EngineError, ZstdEngine};

use crate::adapter::StreamAdapter;
use crate::error::StreamError;

/// Bare encoder engine for callers that drive the engine contract
/// themselves. `None` selects the default preset.
///
/// # Errors
///
/// Invalid preset or context allocation failure.
pub fn compress_raw(preset: Option<i32>) -> Result<ZstdEngine, EngineError> {
    ZstdEngine::encoder(preset)
}

/// Bare decoder engine.
///
/// # Errors
///
/// Context allocation failure.
pub fn decompress_raw() -> Result<ZstdEngine, EngineError> {
    ZstdEngine::decoder()
}

/// Compress a byte slice in one submit + finish pass.
///
/// # Example
///
/// ```rust
/// use zflow_stream::{compress, decompress};
///
/// let data = "fn main() { }\n".repeat(100);
/// let compressed = compress(data.as_bytes(), None).unwrap();
/// assert!(compressed.len() < data.len());
/// assert_eq!(decompress(&compressed).unwrap(), data.as_bytes());
/// ```
///
/// # Errors
///
/// Invalid preset or an engine failure.
pub fn compress(data: &[u8], preset: Option<i32>) -> Result<Vec<u8>, StreamError> {
    run_to_end(StreamAdapter::new(compress_raw(preset)?), data)
}

/// Decompress a complete compressed stream (one or more frames).
///
/// # Errors
///
/// - [`EngineError::Codec`] if the input is not valid compressed data.
/// - [`EngineError::TruncatedStream`] if the last frame is incomplete.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, StreamError> {
    run_to_end(StreamAdapter::new(decompress_raw()?), data)
}

fn run_to_end(mut adapter: StreamAdapter<ZstdEngine>, data: &[u8]) -> Result<Vec<u8>, StreamError> {
    let mut out = adapter.submit(data)?.to_vec();
    out.extend_from_slice(&adapter.finish()?);
    adapter.close()?;
    Ok(out)
}
