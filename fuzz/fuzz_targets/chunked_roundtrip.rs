#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zflow_engine::ZstdEngine;
use zflow_stream::{AdapterConfig, StreamAdapter};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    payload: Vec<u8>,
    chunk_sizes: Vec<u8>,
    preset: u8,
    max_capacity: u8,
}

fn run(adapter: &mut StreamAdapter<ZstdEngine>, data: &[u8], sizes: &[usize]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = data;
    for &size in sizes.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(size.min(rest.len()));
        out.extend_from_slice(&adapter.submit(head).expect("submit failed"));
        rest = tail;
    }
    out.extend_from_slice(&adapter.finish().expect("finish failed"));
    out
}

// Fuzz target: chunked encode -> chunked decode roundtrip.
//
// Arbitrary chunking on both sides and arbitrary output region sizes.
// The decoded bytes must equal the payload exactly.
fuzz_target!(|input: FuzzInput| {
    let sizes: Vec<usize> = input
        .chunk_sizes
        .iter()
        .map(|&s| usize::from(s).max(1))
        .chain(std::iter::once(64))
        .collect();
    let config = AdapterConfig::default()
        .with_min_capacity(1)
        .with_max_capacity(usize::from(input.max_capacity).max(1));
    let preset = i32::from(input.preset % 19) + 1;

    let engine = ZstdEngine::encoder(Some(preset)).expect("encoder");
    let mut enc = StreamAdapter::with_config(engine, config).expect("config");
    let compressed = run(&mut enc, &input.payload, &sizes);

    let engine = ZstdEngine::decoder().expect("decoder");
    let mut dec = StreamAdapter::with_config(engine, config).expect("config");
    let plain = run(&mut dec, &compressed, &sizes);

    assert_eq!(plain, input.payload);
});
