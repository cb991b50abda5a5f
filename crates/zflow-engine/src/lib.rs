#![warn(clippy::pedantic)]

pub mod engine;
pub mod error;
pub mod flags;
pub mod status;
pub mod window;
pub mod zstd_engine;

pub use engine::{Engine, InputQueue, Mode};
pub use error::EngineError;
pub use flags::Flags;
pub use status::Status;
pub use window::{Window, process_window};
pub use zstd_engine::{DEFAULT_PRESET, ZstdEngine};
