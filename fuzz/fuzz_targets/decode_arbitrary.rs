#![no_main]

use libfuzzer_sys::fuzz_target;
use zflow_engine::ZstdEngine;
use zflow_stream::{AdapterConfig, StreamAdapter};

// Fuzz target: streaming decoder over arbitrary input bytes.
//
// Feeds the input in two chunks through tiny output regions so that
// every cycle goes through the overflow path. Catches bugs in:
// - Overflow retry loop termination
// - Segment assembly after repeated region replacement
// - Frame boundary tracking on finish
// - Error propagation from malformed frames
fuzz_target!(|data: &[u8]| {
    let config = AdapterConfig::default()
        .with_min_capacity(1)
        .with_max_capacity(7);
    let Ok(engine) = ZstdEngine::decoder() else {
        return;
    };
    let Ok(mut adapter) = StreamAdapter::with_config(engine, config) else {
        return;
    };

    let (head, tail) = data.split_at(data.len() / 2);
    if adapter.submit(head).is_err() || adapter.submit(tail).is_err() {
        return;
    }
    let _ = adapter.finish();
});
