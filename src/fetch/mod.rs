//! Byte-range fetching from the server holding run outputs.
//!
//! [`RangeFetcher`] is the only place network I/O happens. Everything above it
//! (caches, output trees, ports) is in-memory bookkeeping.

mod http;
mod memory;

pub use http::HttpFetcher;
pub use memory::{FetchCall, MemoryFetcher};

use std::{
    fmt,
    io::{Cursor, Read},
    sync::Arc,
};

use reqwest::Url;

use crate::error::Result;

/// Inclusive byte range `lo..=hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub lo: u64,
    pub hi: u64,
}

impl ByteRange {
    pub fn new(lo: u64, hi: u64) -> Self {
        debug_assert!(lo <= hi, "empty byte range {lo}-{hi}");
        Self { lo, hi }
    }

    pub fn len(&self) -> u64 {
        self.hi - self.lo + 1
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.lo <= offset && offset <= self.hi
    }

    /// Value for an HTTP `Range` header.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.lo, self.hi)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// HTTP Basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Synchronous access to remote bytes.
pub trait RangeFetcher: Send + Sync {
    /// Read `range` of `reference`, or the whole resource when `range` is `None`.
    ///
    /// A ranged read must return exactly `range.len()` bytes on success.
    fn read(
        &self,
        reference: &Url,
        range: Option<ByteRange>,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<u8>>;

    /// Open the whole resource as a stream.
    fn open(
        &self,
        reference: &Url,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn Read + Send>> {
        let data = self.read(reference, None, credentials)?;
        Ok(Box::new(Cursor::new(data)))
    }
}

/// A fetcher paired with the credentials to use with it.
///
/// Every leaf of an output tree holds one; cloning only bumps reference counts.
#[derive(Clone)]
pub struct Remote {
    fetcher: Arc<dyn RangeFetcher>,
    credentials: Option<Arc<Credentials>>,
}

impl Remote {
    pub fn new(fetcher: Arc<dyn RangeFetcher>, credentials: Option<Credentials>) -> Self {
        Self { fetcher, credentials: credentials.map(Arc::new) }
    }

    pub fn anonymous(fetcher: Arc<dyn RangeFetcher>) -> Self {
        Self::new(fetcher, None)
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_deref()
    }

    pub fn read(&self, reference: &Url, range: Option<ByteRange>) -> Result<Vec<u8>> {
        self.fetcher.read(reference, range, self.credentials())
    }

    pub fn open(&self, reference: &Url) -> Result<Box<dyn Read + Send>> {
        self.fetcher.open(reference, self.credentials())
    }
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
