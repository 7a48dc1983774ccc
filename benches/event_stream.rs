use std::hint::black_box;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Deserialize;

const CHUNK_SIZE: usize = 128;

/// Chop slice into [CHUNK_SIZE]-byte `Bytes` chunks, ignoring line boundaries
pub fn load_chunks(bytes: &[u8]) -> Vec<Bytes> {
    bytes
        .chunks(CHUNK_SIZE)
        .map(Bytes::copy_from_slice)
        .collect()
}

/// Split on `\n` boundaries - each chunk is one complete line (including the `\n`)
pub fn load_line_aligned_chunks(bytes: &[u8]) -> Vec<Bytes> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while let Some(pos) = memchr::memchr(b'\n', &bytes[start..]) {
        let end = start + pos + 1;
        chunks.push(Bytes::copy_from_slice(&bytes[start..end]));
        start = end;
    }
    if start < bytes.len() {
        chunks.push(Bytes::copy_from_slice(&bytes[start..]));
    }
    chunks
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

pub fn run_events(chunks: &[Bytes]) {
    runtime().block_on(async {
        let s = stream::iter(chunks.iter().cloned().map(Ok::<_, ()>));
        let mut es = memvault::EventStream::new(s);
        while let Some(item) = es.next().await {
            let _ = black_box(item);
        }
    });
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct Delta {
    delta: Option<String>,
}

pub fn run_json(chunks: &[Bytes]) {
    runtime().block_on(async {
        let s = stream::iter(chunks.iter().cloned().map(Ok::<_, ()>));
        let mut js = memvault::JsonStream::<Delta, _>::new(memvault::EventStream::new(s));
        while let Some(item) = js.next().await {
            let _ = black_box(item);
        }
    });
}
