/// Outcome of a single engine drain.
///
/// Every engine call writes some number of bytes into the caller's output
/// region and reports whether it still holds output for the current input
/// (or flush). At a raw boundary this is a signed integer; `Status` is
/// the typed form of that code.
///
/// ```text
///   code >= 0  →  Done(code)        nothing pending, cycle complete
///   code <  0  →  Overflow(-code)   output region exhausted, call again
///                                   with a fresh region and no new input
/// ```
///
/// The sign encodes "more pending", not "buffer full": a drain that fills
/// the region exactly and has nothing left reports `Done(len)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// All output for the current input has been written.
    Done(usize),

    /// The output region was consumed and more output is pending.
    Overflow(usize),
}

impl Status {
    /// Number of bytes written into the output region by this call.
    pub fn written(self) -> usize {
        match self {
            Status::Done(n) | Status::Overflow(n) => n,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Status::Done(_))
    }

    /// The signed result code: `+n` when done, `-n` on overflow.
    #[allow(clippy::cast_possible_wrap)]
    pub fn code(self) -> isize {
        match self {
            Status::Done(n) => n as isize,
            Status::Overflow(n) => -(n as isize),
        }
    }

    /// Interpret a signed result code.
    ///
    /// `0` is always `Done(0)`; an overflow that wrote nothing cannot be
    /// expressed in the signed form.
    pub fn from_code(code: isize) -> Self {
        if code >= 0 {
            Status::Done(code.unsigned_abs())
        } else {
            Status::Overflow(code.unsigned_abs())
        }
    }
}
