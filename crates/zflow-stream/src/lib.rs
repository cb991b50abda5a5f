#![warn(clippy::pedantic)]

pub mod adapter;
pub mod arena;
pub mod config;
pub mod error;
pub mod io;
pub mod streaming;

mod oneshot;

pub use adapter::StreamAdapter;
pub use config::AdapterConfig;
pub use error::StreamError;
pub use oneshot::{compress, compress_raw, decompress, decompress_raw};
pub use streaming::TransformStream;
