/// Errors reported by a codec engine.
///
/// Lifecycle violations are reported synchronously to the caller that
/// committed them; codec failures abort the current drain and leave the
/// engine in whatever state the codec left it. Nothing here is retried
/// automatically.
///
/// Error hierarchy:
///
/// ```text
///   EngineError
///   ├── AlreadyClosed        ← close() called on a CLOSED handle
///   ├── Closed               ← feed/drain/process on a CLOSED handle
///   ├── Init                 ← codec context could not be created
///   ├── InvalidPreset        ← preset outside the codec's level range
///   ├── Codec                ← codec rejected the data (corrupt input, ...)
///   ├── TruncatedStream      ← FINISH requested inside an incomplete frame
///   ├── Stalled              ← no progress possible with input and space left
///   ├── WindowOutOfBounds    ← window exceeds the backing buffer
///   └── OverlappingWindows   ← input and output windows share bytes
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine has already been closed")]
    AlreadyClosed,

    /// Use after close. The handle stays CLOSED; open a new engine.
    #[error("engine is closed")]
    Closed,

    #[error("failed to initialise codec: {0}")]
    Init(String),

    #[error("preset {preset} outside supported range {min}..={max}")]
    InvalidPreset { preset: i32, min: i32, max: i32 },

    /// The codec reported a failure while encoding or decoding.
    ///
    /// The message is the codec's own description (for zstd, the text of
    /// `ZSTD_getErrorName`).
    #[error("codec failure: {0}")]
    Codec(String),

    /// FINISH was requested but the compressed input ended inside a frame.
    #[error("compressed stream ended before the frame was complete")]
    TruncatedStream,

    #[error("no progress is possible ({pending} input bytes pending)")]
    Stalled { pending: usize },

    #[error("window {offset}+{len} exceeds backing buffer of {capacity} bytes")]
    WindowOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("input and output windows overlap")]
    OverlappingWindows,
}
