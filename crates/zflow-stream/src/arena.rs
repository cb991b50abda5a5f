use bytes::{Bytes, BytesMut};
use tracing::debug;

/// Reusable output buffer plus the segments frozen out of it.
///
/// The arena owns one writable region at a time. When an engine call
/// overflows, the filled prefix of that region is moved into the segment
/// list as immutable [`Bytes`] and a brand new region of the same capacity
/// replaces it. A region is therefore never writable and emitted at once:
///
/// ```text
///   region ──fill──▶ Overflow ──mem::replace──▶ segments: [frozen, ...]
///      ▲                                          region: fresh alloc
///      └───────────── Done: copy prefix after segments, keep region
/// ```
///
/// On `Done` the final prefix is copied into the cycle's output, so the
/// region stays with the arena and is reused by later cycles as long as
/// it is large enough.
#[derive(Debug)]
pub struct OutputArena {
    region: BytesMut,
    segments: Vec<Bytes>,
    allocations: usize,
}

impl OutputArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            region: BytesMut::zeroed(capacity),
            segments: Vec::new(),
            allocations: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Number of regions allocated over the arena's lifetime.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Segments frozen during the current cycle.
    pub fn pending_segments(&self) -> usize {
        self.segments.len()
    }

    /// Make sure the region holds at least `target` bytes.
    ///
    /// Only allocates when the current region is smaller; a larger region
    /// is kept as-is.
    pub fn reserve(&mut self, target: usize) {
        if self.region.len() < target {
            debug!(from = self.region.len(), to = target, "growing output region");
            self.replace_region(target);
        }
    }

    /// The writable region for the next engine call.
    pub fn region_mut(&mut self) -> &mut [u8] {
        &mut self.region[..]
    }

    /// Freeze the first `written` bytes of the region into the segment
    /// list and swap in a fresh region of the same capacity.
    pub fn seal_overflow(&mut self, written: usize) {
        debug_assert!(written <= self.region.len(), "engine overran its region");
        let capacity = self.region.len();
        let mut filled = self.replace_region(capacity);
        filled.truncate(written);
        self.segments.push(filled.freeze());
    }

    /// Concatenate the frozen segments and the first `written` bytes of
    /// the region into the cycle's output, resetting the segment list.
    pub fn assemble(&mut self, written: usize) -> Bytes {
        let tail = &self.region[..written];
        if self.segments.is_empty() {
            return Bytes::copy_from_slice(tail);
        }

        let total = self.segments.iter().map(Bytes::len).sum::<usize>() + written;
        let mut out = BytesMut::with_capacity(total);
        for segment in self.segments.drain(..) {
            out.extend_from_slice(&segment);
        }
        out.extend_from_slice(tail);
        out.freeze()
    }

    /// Drop the segments of an aborted cycle.
    pub fn discard(&mut self) {
        self.segments.clear();
    }

    fn replace_region(&mut self, capacity: usize) -> BytesMut {
        self.allocations += 1;
        std::mem::replace(&mut self.region, BytesMut::zeroed(capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_reuses_large_enough_region() {
        let mut arena = OutputArena::with_capacity(1024);
        arena.reserve(512);
        arena.reserve(1024);
        assert_eq!(arena.capacity(), 1024);
        assert_eq!(arena.allocations(), 1);

        arena.reserve(2048);
        assert_eq!(arena.capacity(), 2048);
        assert_eq!(arena.allocations(), 2);
    }

    #[test]
    fn overflow_freezes_region_and_allocates_fresh_one() {
        let mut arena = OutputArena::with_capacity(4);
        arena.region_mut().copy_from_slice(b"abcd");
        arena.seal_overflow(4);

        assert_eq!(arena.allocations(), 2);
        assert_eq!(arena.capacity(), 4);
        // The fresh region must not alias the frozen one.
        arena.region_mut().copy_from_slice(b"zzzz");
        arena.region_mut()[..2].copy_from_slice(b"ef");
        assert_eq!(arena.assemble(2), Bytes::from_static(b"abcdef"));
        assert_eq!(arena.pending_segments(), 0);
    }

    #[test]
    fn assembled_output_survives_region_reuse() {
        let mut arena = OutputArena::with_capacity(8);
        arena.region_mut()[..3].copy_from_slice(b"one");
        let first = arena.assemble(3);

        arena.region_mut()[..3].copy_from_slice(b"two");
        let second = arena.assemble(3);

        assert_eq!(first, Bytes::from_static(b"one"));
        assert_eq!(second, Bytes::from_static(b"two"));
        assert_eq!(arena.allocations(), 1);
    }

    #[test]
    fn discard_drops_partial_segments() {
        let mut arena = OutputArena::with_capacity(2);
        arena.region_mut().copy_from_slice(b"xx");
        arena.seal_overflow(2);
        arena.discard();
        assert_eq!(arena.pending_segments(), 0);
        assert_eq!(arena.assemble(0), Bytes::new());
    }
}
