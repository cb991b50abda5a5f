use zflow_engine::EngineError;

/// Errors that can occur while streaming data through an engine.
///
/// Engine failures end the current cycle: any segments already produced
/// for it are discarded and the error is returned as-is. The adapter never
/// retries or attempts to resynchronise the engine. Output-buffer
/// exhaustion is handled internally and never appears here.
///
/// Error hierarchy:
///
/// ```text
///   StreamError
///   ├── InvalidConfig        ← AdapterConfig failed validation
///   ├── Finished             ← submit/finish after the stream was finished
///   ├── Engine(EngineError)  ← from zflow-engine (codec, lifecycle, ...)
///   └── Io(std::io::Error)   ← from the reader/writer adapters
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid adapter configuration: {reason}")]
    InvalidConfig { reason: &'static str },

    /// The stream's finish cycle already ran; no more input is accepted.
    #[error("stream has already been finished")]
    Finished,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// True when the underlying engine handle is closed.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            StreamError::Engine(EngineError::Closed | EngineError::AlreadyClosed)
        )
    }
}

impl From<StreamError> for std::io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io(inner) => inner,
            StreamError::Engine(EngineError::Codec(_) | EngineError::TruncatedStream) => {
                std::io::Error::new(std::io::ErrorKind::InvalidData, e)
            }
            other => std::io::Error::other(other),
        }
    }
}
