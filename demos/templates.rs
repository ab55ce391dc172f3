//! How templates, back-references and run-length encoding shrink output.
//!
//! Run with: cargo run --example templates

use serde_zipson::{decode, encode, encode_with_options, zipson, CompressOptions, Value};
use std::error::Error;

fn show(label: &str, value: &Value) -> Result<(), Box<dyn Error>> {
    let text = encode(value)?;
    let json = serde_json::to_string(value)?;
    println!("{}:", label);
    println!("  JSON   ({:>3} bytes) {}", json.len(), json);
    println!("  zipson ({:>3} bytes) {}", text.len(), text);
    assert_eq!(&decode(&text)?, value);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    show(
        "Shared key layout",
        &zipson!([
            { "a": 1, "b": "x" },
            { "a": 2, "b": "y" },
            { "a": 3, "b": "y" }
        ]),
    )?;

    show(
        "Nested layout, broken by a different shape",
        &zipson!([
            { "id": 1, "pos": { "x": 10, "y": 20 } },
            { "id": 2, "pos": { "x": 11, "y": 21 } },
            { "name": "outlier" }
        ]),
    )?;

    show(
        "Repeated strings and numbers",
        &zipson!(["alpha", 1000, "alpha", 1000, "beta", "alpha"]),
    )?;

    show("A run of fifty", &Value::Sequence(vec![Value::Bool(true); 50]))?;

    let stamped = zipson!(["2017-07-14T02:40:00.000Z", "2017-07-14T02:40:00.000Z"]);
    let options = CompressOptions::new().with_detect_utc_timestamps(true);
    let text = encode_with_options(&stamped, options)?;
    println!("Timestamps stored as dates:\n  {}\n  decodes to {}", text, decode(&text)?);

    Ok(())
}
