use crate::error::EngineError;
use crate::flags::Flags;
use crate::status::Status;

/// Direction an engine is constructed for.
///
/// The numeric values are the raw selectors accepted by [`Mode::from_raw`]
/// (`0` encode, `1` decode).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    #[default]
    Encode = 0,
    Decode = 1,
}

impl Mode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Mode::Encode),
            1 => Some(Mode::Decode),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// Bounded-buffer codec contract consumed by the streaming adapter.
///
/// An engine turns queued input into output written into caller-supplied
/// regions of arbitrary size. It never allocates output on the caller's
/// behalf; instead each [`drain`](Engine::drain) reports how much it wrote
/// and whether it still holds output (see [`Status`]).
///
/// ```text
///   feed(input)                 queue bytes for the next drain
///   drain(output, flags)        → Done(n) | Overflow(n)
///   process(input?, output, f)  feed + drain in one call
///   close()                     OPEN → CLOSED, exactly once
/// ```
///
/// Both surfaces share a single implementation: `process` is `feed`
/// followed by `drain`, and implementors only provide the split form.
///
/// Contract every implementation must honor:
///
/// - Output bytes appear in the order their input was fed.
/// - No input byte is represented twice in the output.
/// - Once a drain with [`Flags::FINISH`] reports `Done`, all fed input
///   has appeared in the output.
/// - `Overflow` is only reported when more output is actually pending;
///   filling the region exactly with nothing left is `Done(len)`.
/// - After [`close`](Engine::close), every operation fails with
///   [`EngineError::Closed`] and a second close fails with
///   [`EngineError::AlreadyClosed`].
pub trait Engine {
    /// Queue input for the next drain.
    ///
    /// The bytes are copied into engine-owned storage, so `input` only has
    /// to live for the duration of the call. Returns the number of queued
    /// bytes not yet consumed, including any left over from earlier feeds.
    ///
    /// # Errors
    ///
    /// [`EngineError::Closed`] if the engine has been closed.
    fn feed(&mut self, input: &[u8]) -> Result<usize, EngineError>;

    /// Write as much pending output as fits into `output`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Closed`] after close, or any codec failure.
    fn drain(&mut self, output: &mut [u8], flags: Flags) -> Result<Status, EngineError>;

    /// Combined form: feed `input` (when present), then drain.
    ///
    /// Retries after an overflow pass `None` and the same flags.
    ///
    /// # Errors
    ///
    /// Whatever [`feed`](Engine::feed) or [`drain`](Engine::drain) return.
    fn process(
        &mut self,
        input: Option<&[u8]>,
        output: &mut [u8],
        flags: Flags,
    ) -> Result<Status, EngineError> {
        if let Some(input) = input {
            self.feed(input)?;
        }
        self.drain(output, flags)
    }

    /// Release engine resources.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyClosed`] if called a second time.
    fn close(&mut self) -> Result<(), EngineError>;

    fn is_closed(&self) -> bool;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn feed(&mut self, input: &[u8]) -> Result<usize, EngineError> {
        (**self).feed(input)
    }

    fn drain(&mut self, output: &mut [u8], flags: Flags) -> Result<Status, EngineError> {
        (**self).drain(output, flags)
    }

    fn close(&mut self) -> Result<(), EngineError> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Engine-owned queue of fed input that has not been consumed yet.
///
/// Consumed bytes are compacted away lazily on the next push, so a queue
/// that is fully drained between feeds reuses its allocation without
/// copying.
#[derive(Debug, Default)]
pub struct InputQueue {
    buf: Vec<u8>,
    pos: usize,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `input` behind whatever is still unconsumed.
    pub fn push(&mut self, input: &[u8]) {
        if self.pos == self.buf.len() {
            self.buf.clear();
        } else if self.pos > 0 {
            self.buf.drain(..self.pos);
        }
        self.pos = 0;
        self.buf.extend_from_slice(input);
    }

    /// Unconsumed bytes, oldest first.
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Mark `n` bytes at the front as consumed.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`len`](Self::len).
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.len(), "consumed past end of input queue");
        self.pos += n;
    }

    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selectors_match_numeric_values() {
        assert_eq!(Mode::Encode.raw(), 0);
        assert_eq!(Mode::Decode.raw(), 1);
        assert_eq!(Mode::from_raw(1), Some(Mode::Decode));
        assert_eq!(Mode::from_raw(2), None);
    }

    #[test]
    fn queue_keeps_unconsumed_bytes_ahead_of_new_input() {
        let mut queue = InputQueue::new();
        queue.push(b"hello");
        queue.consume(3);
        queue.push(b", world");
        assert_eq!(queue.remaining(), b"lo, world");
        assert_eq!(queue.len(), 9);
    }

    #[test]
    fn queue_reuses_storage_when_fully_consumed() {
        let mut queue = InputQueue::new();
        queue.push(b"abc");
        queue.consume(3);
        assert!(queue.is_empty());
        queue.push(b"de");
        assert_eq!(queue.remaining(), b"de");
    }

    #[test]
    #[should_panic(expected = "consumed past end")]
    fn queue_rejects_overconsumption() {
        let mut queue = InputQueue::new();
        queue.push(b"ab");
        queue.consume(3);
    }
}
