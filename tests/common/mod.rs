#![allow(dead_code)]

use std::sync::Arc;

use reqwest::Url;
use run_outputs::{
    fetch::{MemoryFetcher, Remote},
    run::RunOutputs,
};

pub const DESCRIPTION: &str = "mem://server/runs/42/outputs.json";

/// Deterministic contents for a value of `n` bytes.
pub fn bytes(n: usize, seed: u8) -> Vec<u8> {
    (0..n).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
}

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("test URL")
}

/// Full URL of a relative output path under the test run.
pub fn out(path: &str) -> String {
    url(DESCRIPTION).join(path).expect("join").to_string()
}

/// Ports of a small run:
/// - `single`: depth 0, 100 bytes;
/// - `grid`: depth 2, [[A, B], [C, D]];
/// - `mixed`: depth 1, [value 10 bytes, error, value 5 bytes];
/// - `empty`: depth 0, zero-byte value.
pub const DOCUMENT: &str = r#"{
  "ports": [
    { "name": "single", "depth": 0,
      "value": { "kind": "value", "href": "out/single", "contentType": "application/octet-stream", "contentByteLength": 100 } },
    { "name": "grid", "depth": 2,
      "value": { "kind": "list", "children": [
        { "kind": "list", "children": [
          { "kind": "value", "href": "out/grid/0/0", "contentType": "text/plain", "contentByteLength": 1 },
          { "kind": "value", "href": "out/grid/0/1", "contentType": "text/plain", "contentByteLength": 2 } ] },
        { "kind": "list", "children": [
          { "kind": "value", "href": "out/grid/1/0", "contentType": "text/plain", "contentByteLength": 3 },
          { "kind": "value", "href": "out/grid/1/1", "contentType": "text/plain", "contentByteLength": 4 } ] } ] } },
    { "name": "mixed", "depth": 1,
      "value": { "kind": "list", "children": [
        { "kind": "value", "href": "out/mixed/0", "contentType": "text/plain", "contentByteLength": 10 },
        { "kind": "error", "href": "out/mixed/1.error" },
        { "kind": "value", "href": "out/mixed/2", "contentType": "text/plain", "contentByteLength": 5 } ] } },
    { "name": "empty", "depth": 0,
      "value": { "kind": "value", "href": "out/empty", "contentType": "application/x-empty", "contentByteLength": 0 } }
  ]
}"#;

/// A fetcher serving the description and every value it names.
pub fn fetcher() -> Arc<MemoryFetcher> {
    let f = MemoryFetcher::new()
        .with(DESCRIPTION, DOCUMENT)
        .with(&out("out/single"), bytes(100, 1))
        .with(&out("out/grid/0/0"), "A")
        .with(&out("out/grid/0/1"), "BB")
        .with(&out("out/grid/1/0"), "CCC")
        .with(&out("out/grid/1/1"), "DDDD")
        .with(&out("out/mixed/0"), "0123456789")
        .with(&out("out/mixed/1.error"), "step align failed: exit status 1")
        .with(&out("out/mixed/2"), "hello");
    Arc::new(f)
}

pub fn outputs(fetcher: &Arc<MemoryFetcher>) -> RunOutputs {
    RunOutputs::new(Remote::anonymous(fetcher.clone()), url(DESCRIPTION))
}
