//! In-place operation over a single caller-owned backing buffer.
//!
//! Input and output are expressed as `(offset, len)` views into the same
//! allocation, so a caller can compress or decompress into a pre-sized
//! buffer without any extra allocation on its side.
//!
//! ```text
//!   backing: [ ....... | input window | ..... | output window | ... ]
//!                      ^offset        ^offset+len
//! ```
//!
//! The two windows must not share bytes. Once a drain into the output
//! window reports `Done`, the window holds engine output; reusing it as a
//! later output target overwrites that output.

use crate::engine::Engine;
use crate::error::EngineError;
use crate::flags::Flags;
use crate::status::Status;

/// A `(offset, len)` view into a backing buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub len: usize,
}

impl Window {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last byte of the window, or `None` on overflow.
    pub fn end(self) -> Option<usize> {
        self.offset.checked_add(self.len)
    }

    /// True when the two windows share at least one byte.
    ///
    /// Empty windows never overlap anything.
    pub fn overlaps(self, other: Window) -> bool {
        if self.len == 0 || other.len == 0 {
            return false;
        }
        match (self.end(), other.end()) {
            (Some(a_end), Some(b_end)) => self.offset < b_end && other.offset < a_end,
            _ => true,
        }
    }

    fn check(self, capacity: usize) -> Result<(), EngineError> {
        match self.end() {
            Some(end) if end <= capacity => Ok(()),
            _ => Err(EngineError::WindowOutOfBounds {
                offset: self.offset,
                len: self.len,
                capacity,
            }),
        }
    }
}

/// Feed the input window (if any) and drain into the output window.
///
/// This is the windowed form of [`Engine::process`]: the same result-code
/// convention applies, with `Overflow(n)` meaning the first `n` bytes of
/// the output window were written and more output is pending.
///
/// # Errors
///
/// - [`EngineError::WindowOutOfBounds`] if either window extends past
///   `backing`.
/// - [`EngineError::OverlappingWindows`] if the windows share bytes.
/// - Any error from the engine itself.
pub fn process_window<E: Engine + ?Sized>(
    engine: &mut E,
    backing: &mut [u8],
    input: Option<Window>,
    output: Window,
    flags: Flags,
) -> Result<Status, EngineError> {
    let capacity = backing.len();
    output.check(capacity)?;

    if let Some(input) = input {
        input.check(capacity)?;
        if input.overlaps(output) {
            return Err(EngineError::OverlappingWindows);
        }
        engine.feed(&backing[input.offset..input.offset + input.len])?;
    }

    engine.drain(&mut backing[output.offset..output.offset + output.len], flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zstd_engine::ZstdEngine;

    #[test]
    fn overlap_detection() {
        assert!(Window::new(0, 10).overlaps(Window::new(9, 5)));
        assert!(!Window::new(0, 10).overlaps(Window::new(10, 5)));
        assert!(!Window::new(4, 0).overlaps(Window::new(0, 10)));
    }

    #[test]
    fn compresses_between_windows_of_one_buffer() {
        let payload = b"windowed windowed windowed windowed";
        let mut backing = vec![0u8; 256];
        backing[..payload.len()].copy_from_slice(payload);

        let mut engine = ZstdEngine::encoder(None).unwrap();
        let status = process_window(
            &mut engine,
            &mut backing,
            Some(Window::new(0, payload.len())),
            Window::new(64, 192),
            Flags::FINISH,
        )
        .unwrap();
        assert!(status.is_done());

        let compressed = backing[64..64 + status.written()].to_vec();
        let mut decoder = ZstdEngine::decoder().unwrap();
        let mut plain = vec![0u8; 128];
        let status = decoder.process(Some(&compressed), &mut plain, Flags::FINISH).unwrap();
        assert_eq!(&plain[..status.written()], payload);
    }

    #[test]
    fn rejects_overlapping_windows() {
        let mut backing = vec![0u8; 64];
        let mut engine = ZstdEngine::encoder(None).unwrap();
        let result = process_window(
            &mut engine,
            &mut backing,
            Some(Window::new(0, 32)),
            Window::new(16, 32),
            Flags::FINISH,
        );
        assert!(matches!(result, Err(EngineError::OverlappingWindows)));
    }

    #[test]
    fn rejects_window_past_end() {
        let mut backing = vec![0u8; 64];
        let mut engine = ZstdEngine::encoder(None).unwrap();
        let result = process_window(
            &mut engine,
            &mut backing,
            None,
            Window::new(60, 8),
            Flags::NONE,
        );
        assert!(matches!(
            result,
            Err(EngineError::WindowOutOfBounds { offset: 60, len: 8, capacity: 64 })
        ));
    }
}
