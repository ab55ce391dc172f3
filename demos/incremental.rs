//! Decoding zipson text that arrives in pieces.
//!
//! Run with: cargo run --example incremental

use serde_zipson::{decode, encode, zipson, Decoder};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let value = zipson!({
        "stream": "sensor-7",
        "samples": [
            { "t": 1000, "v": 0.5 },
            { "t": 1001, "v": 0.75 },
            { "t": 1002, "v": 0.75 }
        ],
        "flags": [true, true, true, true, true, true, true]
    });
    let text = encode(&value)?;
    println!("encoded: {}\n", text);

    // Cut on byte offsets that may land inside a token, but never inside a character.
    let mut decoder = Decoder::new();
    let mut rest = text.as_str();
    while !rest.is_empty() {
        let mut cut = rest.len().min(5);
        while !rest.is_char_boundary(cut) {
            cut += 1;
        }
        let (chunk, tail) = rest.split_at(cut);
        println!("feeding {:?}", chunk);
        decoder.push(chunk)?;
        rest = tail;
    }

    let streamed = decoder.finish()?;
    assert_eq!(streamed, decode(&text)?);
    assert_eq!(streamed, value);
    println!("\n✓ Chunked decode matches: {}", streamed);

    Ok(())
}
