use std::fmt;
use std::io;

use tracing::{debug, trace};
use zstd::stream::raw::{Decoder, Encoder, InBuffer, Operation, OutBuffer};

use crate::engine::{Engine, InputQueue, Mode};
use crate::error::EngineError;
use crate::flags::Flags;
use crate::status::Status;

/// Default zstd compression level (1–22 scale).
///
/// Level 3 is zstd's own default and a good speed/ratio balance for
/// streamed data.
pub const DEFAULT_PRESET: i32 = 3;

enum Context {
    Encode(Encoder<'static>),
    Decode(Decoder<'static>),
}

/// [`Engine`] backed by zstd's raw streaming contexts.
///
/// Encoding pushes input with `ZSTD_e_continue` and ends the frame only
/// when a drain carries [`Flags::FINISH`]. Decoding accepts any number of
/// concatenated frames.
///
/// The engine tracks whether it sits on a frame boundary:
///
/// ```text
///   Encode: boundary after end_stream reports 0 remaining; cleared
///           when new input is consumed. FINISH on a boundary is a no-op,
///           so repeated finish drains never emit extra empty frames.
///   Decode: boundary once a frame is fully decoded and flushed; cleared
///           when input of the next frame is consumed. FINISH off a
///           boundary is a truncated stream.
/// ```
///
/// A decode drain that fills its region exactly with no input left probes
/// the decoder for one more byte. If one comes out it is held back and
/// written first by the next drain, so `Overflow` is only reported when
/// output is really pending.
pub struct ZstdEngine {
    /// `None` once the engine has been closed.
    context: Option<Context>,
    mode: Mode,
    input: InputQueue,
    at_frame_boundary: bool,
    /// Decoded byte pulled out while checking for pending output.
    lookahead: Option<u8>,
}

impl ZstdEngine {
    /// Create an engine for `mode`.
    ///
    /// `preset` is the zstd level and only applies to [`Mode::Encode`];
    /// decoders ignore it. `None` selects [`DEFAULT_PRESET`].
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidPreset`] if the level is outside
    ///   `zstd::compression_level_range()`.
    /// - [`EngineError::Init`] if zstd cannot allocate a context.
    pub fn new(mode: Mode, preset: Option<i32>) -> Result<Self, EngineError> {
        let context = match mode {
            Mode::Encode => {
                let level = preset.unwrap_or(DEFAULT_PRESET);
                let range = zstd::compression_level_range();
                if !range.contains(&level) {
                    return Err(EngineError::InvalidPreset {
                        preset: level,
                        min: *range.start(),
                        max: *range.end(),
                    });
                }
                Context::Encode(Encoder::new(level).map_err(init_error)?)
            }
            Mode::Decode => Context::Decode(Decoder::new().map_err(init_error)?),
        };

        debug!(?mode, ?preset, "zstd engine opened");

        Ok(Self {
            context: Some(context),
            mode,
            input: InputQueue::new(),
            // A fresh encoder still owes a (possibly empty) frame; a fresh
            // decoder has not started one.
            at_frame_boundary: mode == Mode::Decode,
            lookahead: None,
        })
    }

    pub fn encoder(preset: Option<i32>) -> Result<Self, EngineError> {
        Self::new(Mode::Encode, preset)
    }

    pub fn decoder() -> Result<Self, EngineError> {
        Self::new(Mode::Decode, None)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Input bytes fed but not yet consumed by the codec.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl Engine for ZstdEngine {
    fn feed(&mut self, input: &[u8]) -> Result<usize, EngineError> {
        if self.context.is_none() {
            return Err(EngineError::Closed);
        }
        self.input.push(input);
        Ok(self.input.len())
    }

    fn drain(&mut self, output: &mut [u8], flags: Flags) -> Result<Status, EngineError> {
        let Self {
            context,
            input,
            at_frame_boundary,
            lookahead,
            ..
        } = &mut *self;
        let finish = flags.is_finish();

        let status = match context.as_mut().ok_or(EngineError::Closed)? {
            Context::Encode(encoder) => {
                encode_into(encoder, input, at_frame_boundary, output, finish)?
            }
            Context::Decode(decoder) => {
                decode_into(decoder, input, at_frame_boundary, lookahead, output, finish)?
            }
        };

        trace!(
            mode = ?self.mode,
            capacity = output.len(),
            code = status.code(),
            pending = self.input.len(),
            "zstd drain"
        );
        Ok(status)
    }

    fn close(&mut self) -> Result<(), EngineError> {
        if self.context.take().is_none() {
            return Err(EngineError::AlreadyClosed);
        }
        self.input.clear();
        self.lookahead = None;
        debug!(mode = ?self.mode, "zstd engine closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.context.is_none()
    }
}

impl fmt::Debug for ZstdEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZstdEngine")
            .field("mode", &self.mode)
            .field("closed", &self.is_closed())
            .field("pending_input", &self.input.len())
            .field("at_frame_boundary", &self.at_frame_boundary)
            .field("lookahead", &self.lookahead.is_some())
            .finish()
    }
}

fn encode_into(
    encoder: &mut Encoder<'static>,
    queue: &mut InputQueue,
    at_frame_boundary: &mut bool,
    output: &mut [u8],
    finish: bool,
) -> Result<Status, EngineError> {
    let capacity = output.len();
    let mut out = OutBuffer::around(output);

    while !queue.is_empty() {
        let before = out.pos();
        let mut src = InBuffer::around(queue.remaining());
        encoder.run(&mut src, &mut out).map_err(codec_error)?;
        let consumed = src.pos();
        queue.consume(consumed);

        if consumed > 0 {
            *at_frame_boundary = false;
        }
        if queue.is_empty() {
            break;
        }
        if out.pos() == capacity {
            return Ok(Status::Overflow(out.pos()));
        }
        if consumed == 0 && out.pos() == before {
            return Err(EngineError::Stalled {
                pending: queue.len(),
            });
        }
    }

    if finish && !*at_frame_boundary {
        let remaining = encoder.finish(&mut out, false).map_err(codec_error)?;
        if remaining > 0 {
            return Ok(Status::Overflow(out.pos()));
        }
        *at_frame_boundary = true;
    }

    Ok(Status::Done(out.pos()))
}

fn decode_into(
    decoder: &mut Decoder<'static>,
    queue: &mut InputQueue,
    at_frame_boundary: &mut bool,
    lookahead: &mut Option<u8>,
    output: &mut [u8],
    finish: bool,
) -> Result<Status, EngineError> {
    let mut prefix = 0;
    if let Some(byte) = *lookahead {
        let Some(first) = output.first_mut() else {
            return Ok(Status::Overflow(0));
        };
        *first = byte;
        *lookahead = None;
        prefix = 1;
    }

    let (_, rest) = output.split_at_mut(prefix);
    let capacity = rest.len();
    let mut out = OutBuffer::around(rest);

    loop {
        let before = out.pos();
        let mut src = InBuffer::around(queue.remaining());
        // 0 means the current frame is fully decoded and flushed.
        let hint = decoder.run(&mut src, &mut out).map_err(codec_error)?;
        let consumed = src.pos();
        queue.consume(consumed);

        if hint == 0 {
            *at_frame_boundary = true;
        } else if consumed > 0 {
            *at_frame_boundary = false;
        }

        if out.pos() == capacity {
            if !queue.is_empty() {
                return Ok(Status::Overflow(prefix + capacity));
            }
            if hint != 0 && peek_pending(decoder, at_frame_boundary, lookahead)? {
                return Ok(Status::Overflow(prefix + capacity));
            }
            break;
        }
        if queue.is_empty() {
            break;
        }
        if consumed == 0 && out.pos() == before {
            return Err(EngineError::Stalled {
                pending: queue.len(),
            });
        }
    }

    if finish && !*at_frame_boundary {
        return Err(EngineError::TruncatedStream);
    }
    Ok(Status::Done(prefix + out.pos()))
}

/// Ask the decoder for one more byte without new input.
///
/// Returns true (and stores the byte) when output was still pending.
fn peek_pending(
    decoder: &mut Decoder<'static>,
    at_frame_boundary: &mut bool,
    lookahead: &mut Option<u8>,
) -> Result<bool, EngineError> {
    let mut byte = [0u8; 1];
    let (hint, written) = {
        let mut out = OutBuffer::around(&mut byte[..]);
        let mut src = InBuffer::around(&[]);
        let hint = decoder.run(&mut src, &mut out).map_err(codec_error)?;
        (hint, out.pos())
    };
    if hint == 0 {
        *at_frame_boundary = true;
    }
    if written == 0 {
        return Ok(false);
    }
    *lookahead = Some(byte[0]);
    Ok(true)
}

fn init_error(e: io::Error) -> EngineError {
    EngineError::Init(e.to_string())
}

fn codec_error(e: io::Error) -> EngineError {
    EngineError::Codec(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &[u8] = b"hello, hello!";

    fn encode_single_shot(payload: &[u8], preset: i32) -> Vec<u8> {
        let mut engine = ZstdEngine::encoder(Some(preset)).unwrap();
        let mut buf = vec![0u8; 4096];
        let status = engine.process(Some(payload), &mut buf, Flags::FINISH).unwrap();
        assert!(status.is_done());
        buf.truncate(status.written());
        buf
    }

    #[test]
    fn encodes_all_at_once_with_finish() {
        let mut engine = ZstdEngine::encoder(Some(6)).unwrap();
        let mut buf = [0u8; 128];
        let status = engine.process(Some(HELLO), &mut buf, Flags::FINISH).unwrap();
        assert!(status.code() > 0);
        assert_eq!(&buf[..status.written()], encode_single_shot(HELLO, 6).as_slice());
    }

    #[test]
    fn encodes_in_steps() {
        let mut engine = ZstdEngine::encoder(Some(6)).unwrap();
        engine.feed(HELLO).unwrap();

        let mut b1 = [0u8; 128];
        let n1 = engine.drain(&mut b1, Flags::NONE).unwrap();
        assert!(n1.is_done());

        let mut b2 = [0u8; 128];
        let n2 = engine.drain(&mut b2, Flags::FINISH).unwrap();
        assert!(n2.is_done());

        let mut stepped = b1[..n1.written()].to_vec();
        stepped.extend_from_slice(&b2[..n2.written()]);
        assert_eq!(stepped, encode_single_shot(HELLO, 6));
    }

    #[test]
    fn copes_with_insufficient_space() {
        let full = encode_single_shot(HELLO, 6);
        assert!(full.len() > 16, "frame shorter than test buffer");

        let mut engine = ZstdEngine::encoder(Some(6)).unwrap();
        engine.feed(HELLO).unwrap();

        let mut first = [0u8; 16];
        let status = engine.drain(&mut first, Flags::FINISH).unwrap();
        assert_eq!(status.code(), -16);

        let mut collected = first.to_vec();
        loop {
            let mut next = [0u8; 16];
            let status = engine.drain(&mut next, Flags::FINISH).unwrap();
            collected.extend_from_slice(&next[..status.written()]);
            if status.is_done() {
                break;
            }
        }
        assert_eq!(collected, full);
    }

    #[test]
    fn exact_fit_reports_done() {
        let full = encode_single_shot(HELLO, 6);

        let mut engine = ZstdEngine::encoder(Some(6)).unwrap();
        let mut exact = vec![0u8; full.len()];
        let status = engine.process(Some(HELLO), &mut exact, Flags::FINISH).unwrap();
        assert_eq!(status.code(), full.len() as isize);
        assert_eq!(exact, full);
    }

    #[test]
    fn repeated_finish_does_not_emit_another_frame() {
        let mut engine = ZstdEngine::encoder(None).unwrap();
        let mut buf = [0u8; 128];
        engine.process(Some(HELLO), &mut buf, Flags::FINISH).unwrap();
        let again = engine.drain(&mut buf, Flags::FINISH).unwrap();
        assert_eq!(again, Status::Done(0));
    }

    #[test]
    fn can_decode_what_it_encodes() {
        let encoded = encode_single_shot(HELLO, 6);

        let mut reader = ZstdEngine::decoder().unwrap();
        reader.feed(&encoded).unwrap();
        let mut out = [0u8; 128];
        let status = reader.drain(&mut out, Flags::NONE).unwrap();
        assert_eq!(&out[..status.written()], HELLO);
    }

    #[test]
    fn decode_overflow_then_done() {
        let payload = b"abcdefgh".repeat(64);
        let encoded = encode_single_shot(&payload, 3);

        let mut reader = ZstdEngine::decoder().unwrap();
        reader.feed(&encoded).unwrap();

        let mut decoded = Vec::new();
        loop {
            let mut out = [0u8; 100];
            let status = reader.drain(&mut out, Flags::FINISH).unwrap();
            decoded.extend_from_slice(&out[..status.written()]);
            if status.is_done() {
                break;
            }
            assert_eq!(status.code(), -100);
        }
        assert_eq!(decoded, payload);
    }

    fn noise(len: usize) -> Vec<u8> {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                state.to_le_bytes()[0]
            })
            .collect()
    }

    #[test]
    fn decode_exact_fit_reports_done() {
        let encoded = encode_single_shot(HELLO, 6);
        let mut reader = ZstdEngine::decoder().unwrap();
        let mut exact = [0u8; 13];
        let status = reader.process(Some(&encoded), &mut exact, Flags::FINISH).unwrap();
        assert_eq!(status, Status::Done(HELLO.len()));
        assert_eq!(&exact, HELLO);
    }

    #[test]
    fn decode_exact_fit_inside_a_frame_reports_done() {
        let payload = noise(1000);
        let encoded = encode_single_shot(&payload, 1);
        let partial = &encoded[..encoded.len() - 100];

        let mut roomy = ZstdEngine::decoder().unwrap();
        let mut big = vec![0u8; 4096];
        let available = roomy.process(Some(partial), &mut big, Flags::NONE).unwrap();
        assert!(available.is_done());
        let n = available.written();
        assert!(n > 0);

        let mut reader = ZstdEngine::decoder().unwrap();
        let mut exact = vec![0u8; n];
        let status = reader.process(Some(partial), &mut exact, Flags::NONE).unwrap();
        assert_eq!(status, Status::Done(n));
        assert_eq!(exact, big[..n]);
    }

    #[test]
    fn held_back_byte_leads_the_next_drain() {
        let payload = b"abcdefgh".repeat(64);
        let encoded = encode_single_shot(&payload, 3);

        let mut reader = ZstdEngine::decoder().unwrap();
        let mut first = [0u8; 256];
        let status = reader.process(Some(&encoded), &mut first, Flags::NONE).unwrap();
        assert_eq!(status, Status::Overflow(256));

        let mut second = [0u8; 256];
        let status = reader.drain(&mut second, Flags::FINISH).unwrap();
        assert_eq!(status, Status::Done(256));

        let mut decoded = first.to_vec();
        decoded.extend_from_slice(&second);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn pending_input_tracks_the_queue() {
        let mut engine = ZstdEngine::encoder(None).unwrap();
        engine.feed(HELLO).unwrap();
        assert_eq!(engine.pending_input(), HELLO.len());

        let mut buf = [0u8; 128];
        engine.drain(&mut buf, Flags::NONE).unwrap();
        assert_eq!(engine.pending_input(), 0);
    }

    #[test]
    fn decode_finish_inside_frame_is_truncated() {
        let encoded = encode_single_shot(HELLO, 6);
        let mut reader = ZstdEngine::decoder().unwrap();
        reader.feed(&encoded[..encoded.len() - 2]).unwrap();
        let mut out = [0u8; 128];
        let result = reader.drain(&mut out, Flags::FINISH);
        assert!(matches!(result, Err(EngineError::TruncatedStream)));
    }

    #[test]
    fn decode_rejects_garbage() {
        let mut reader = ZstdEngine::decoder().unwrap();
        reader.feed(b"this is not zstd data").unwrap();
        let mut out = [0u8; 128];
        let result = reader.drain(&mut out, Flags::FINISH);
        assert!(matches!(result, Err(EngineError::Codec(_))));
    }

    #[test]
    fn can_be_closed_exactly_once() {
        let mut engine = ZstdEngine::encoder(Some(6)).unwrap();
        engine.close().unwrap();
        assert!(matches!(engine.close(), Err(EngineError::AlreadyClosed)));
    }

    #[test]
    fn operations_after_close_fail() {
        let mut engine = ZstdEngine::decoder().unwrap();
        engine.close().unwrap();
        assert!(engine.is_closed());
        assert!(matches!(engine.feed(b"x"), Err(EngineError::Closed)));
        let mut out = [0u8; 8];
        assert!(matches!(
            engine.drain(&mut out, Flags::FINISH),
            Err(EngineError::Closed)
        ));
    }

    #[test]
    fn rejects_out_of_range_preset() {
        let result = ZstdEngine::encoder(Some(1000));
        assert!(matches!(result, Err(EngineError::InvalidPreset { preset: 1000, .. })));
    }

    #[test]
    fn decoder_ignores_preset() {
        let engine = ZstdEngine::new(Mode::Decode, Some(1000)).unwrap();
        assert_eq!(engine.mode(), Mode::Decode);
    }
}
