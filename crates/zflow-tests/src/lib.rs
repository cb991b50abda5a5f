//! Shared fixtures for the zflow integration tests and benchmarks.

/// Payload from the engine scenarios: short enough that the whole frame
/// fits a 128-byte buffer, long enough to overflow a 16-byte one.
pub const HELLO: &[u8] = b"hello, hello!";

/// Repetitive text that compresses well.
pub fn text_payload(len: usize) -> Vec<u8> {
    const LINE: &[u8] = b"fn placeholder() { let x = compute(42); }\n";
    LINE.iter().copied().cycle().take(len).collect()
}

/// Deterministic pseudo-random bytes (xorshift), effectively incompressible.
pub fn noise_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state.to_le_bytes()[0]
        })
        .collect()
}

/// Split `data` into chunks of the given sizes, cycling through them.
pub fn chunked<'a>(data: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    assert!(sizes.iter().all(|&s| s > 0), "chunk sizes must be positive");
    let mut chunks = Vec::new();
    let mut rest = data;
    for &size in sizes.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(size.min(rest.len()));
        chunks.push(head);
        rest = tail;
    }
    chunks
}
