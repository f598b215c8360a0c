//! Client-side model of the outputs of a remote workflow run.
//!
//! A run's output ports are trees of remote values of fixed, per-port depth.
//! Data values are fetched on demand, optionally by byte range, through a
//! [`RangeFetcher`](fetch::RangeFetcher); each value keeps a single growing
//! cached interval so repeated and overlapping reads fetch as little as the
//! contiguity of that interval allows.
//!
//! ```no_run
//! use std::sync::Arc;
//! use run_outputs::{fetch::{HttpFetcher, Remote}, run::RunOutputs};
//!
//! # fn main() -> run_outputs::Result<()> {
//! let fetcher = HttpFetcher::new(std::time::Duration::from_secs(60))?;
//! let remote = Remote::anonymous(Arc::new(fetcher));
//! let url = "https://example.org/runs/42/outputs.json".parse().unwrap();
//! let outputs = RunOutputs::new(remote, url);
//! let head = outputs.port("result")?.get_value(&[0, 1])?.read(0, 1023)?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod run;

pub use error::{Error, Result};
