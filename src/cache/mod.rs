//! Per-value byte cache for partially fetched remote data.
//!
//! A [`ValueCache`] tracks exactly one contiguous span of a remote value. A read
//! outside that span fetches whatever is needed to grow the span into the
//! smallest interval covering both the old span and the request, including any
//! gap between them. The span therefore only ever grows, and a reader always sees
//! a consistent prefix/suffix-extended view of the same bytes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    fetch::ByteRange,
};

#[derive(Debug, Default)]
struct CacheState {
    interval: Option<ByteRange>,
    buffer: Vec<u8>,
}

/// Growing single-interval cache over a value of fixed declared size.
#[derive(Debug)]
pub struct ValueCache {
    size: u64,
    state: Mutex<CacheState>,
}

impl ValueCache {
    pub fn new(size: u64) -> Self {
        Self { size, state: Mutex::new(CacheState::default()) }
    }

    /// A cache for a zero-byte value; it never fetches.
    pub fn empty() -> Self {
        Self::new(0)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn cached_interval(&self) -> Option<ByteRange> {
        self.lock().interval
    }

    pub fn cached_len(&self) -> u64 {
        self.lock().interval.map_or(0, |i| i.len())
    }

    /// Copy of the cached bytes, in order.
    pub fn cached_bytes(&self) -> Vec<u8> {
        self.lock().buffer.clone()
    }

    /// True once every byte of the value is held locally.
    pub fn is_complete(&self) -> bool {
        self.size == 0 || self.lock().interval == Some(ByteRange::new(0, self.size - 1))
    }

    /// Read bytes `lo..=hi`, clamped to the declared size, using `fetch` for
    /// whatever the cache does not yet hold.
    ///
    /// The cache is locked for the whole call, so concurrent reads of the same
    /// value are serialised. If any fetch fails the cache is left untouched.
    pub fn read_with<F>(&self, lo: u64, hi: u64, mut fetch: F) -> Result<Vec<u8>>
    where
        F: FnMut(ByteRange) -> Result<Vec<u8>>,
    {
        if self.size == 0 {
            return Ok(Vec::new());
        }
        let hi = hi.min(self.size - 1);
        if lo > hi {
            return Ok(Vec::new());
        }
        let want = ByteRange::new(lo, hi);

        let mut state = self.lock();
        let needed = plan(state.interval, want);
        if needed.is_empty() {
            trace!(%want, "cache hit");
        }

        let mut parts = Vec::with_capacity(needed.len());
        for range in needed {
            debug!(%range, %want, "fetching");
            let bytes = fetch(range)?;
            if bytes.len() as u64 != range.len() {
                return Err(Error::UnexpectedResponse(format!(
                    "expected {} bytes for {}, got {}",
                    range.len(),
                    range,
                    bytes.len()
                )));
            }
            parts.push((range, bytes));
        }

        merge(&mut state, want, parts);
        Ok(slice(&state, want))
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panicking reader never leaves a half-merged state behind.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sub-ranges to fetch so that `got` grows to cover `want`.
fn plan(got: Option<ByteRange>, want: ByteRange) -> Vec<ByteRange> {
    let Some(got) = got else {
        return vec![want];
    };

    let has_lo = got.contains(want.lo);
    let has_hi = got.contains(want.hi);

    if has_lo && has_hi {
        Vec::new()
    } else if has_lo {
        vec![ByteRange::new(got.hi + 1, want.hi)]
    } else if has_hi {
        vec![ByteRange::new(want.lo, got.lo - 1)]
    } else if want.hi < got.lo {
        // Bridge the gap up to the cached span as well.
        vec![ByteRange::new(want.lo, got.lo - 1)]
    } else if want.lo > got.hi {
        vec![ByteRange::new(got.hi + 1, want.hi)]
    } else {
        vec![
            ByteRange::new(want.lo, got.lo - 1),
            ByteRange::new(got.hi + 1, want.hi),
        ]
    }
}

fn merge(state: &mut CacheState, want: ByteRange, parts: Vec<(ByteRange, Vec<u8>)>) {
    let Some(got) = state.interval else {
        if let Some((range, bytes)) = parts.into_iter().next() {
            state.interval = Some(range);
            state.buffer = bytes;
        }
        return;
    };
    if parts.is_empty() {
        return;
    }

    let mut front = Vec::new();
    let mut back = Vec::new();
    for (range, bytes) in parts {
        if range.hi < got.lo {
            front = bytes;
        } else {
            back = bytes;
        }
    }

    if front.is_empty() {
        state.buffer.extend_from_slice(&back);
    } else {
        let mut buffer = Vec::with_capacity(front.len() + state.buffer.len() + back.len());
        buffer.extend_from_slice(&front);
        buffer.extend_from_slice(&state.buffer);
        buffer.extend_from_slice(&back);
        state.buffer = buffer;
    }
    state.interval = Some(ByteRange::new(got.lo.min(want.lo), got.hi.max(want.hi)));
}

fn slice(state: &CacheState, want: ByteRange) -> Vec<u8> {
    let Some(got) = state.interval else {
        return Vec::new();
    };
    let start = (want.lo - got.lo) as usize;
    let end = (want.hi - got.lo) as usize;
    state.buffer[start..=end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(n: u64) -> Vec<u8> {
        (0..n).map(|i| (i % 251) as u8).collect()
    }

    /// Serves `source` and logs every requested range.
    fn fetcher<'a>(
        source: &'a [u8],
        log: &'a mut Vec<ByteRange>,
    ) -> impl FnMut(ByteRange) -> Result<Vec<u8>> + 'a {
        move |r| {
            log.push(r);
            Ok(source[r.lo as usize..=r.hi as usize].to_vec())
        }
    }

    fn r(lo: u64, hi: u64) -> ByteRange {
        ByteRange::new(lo, hi)
    }

    #[test]
    fn test_plan_cases() {
        assert_eq!(plan(None, r(5, 9)), vec![r(5, 9)]);
        assert_eq!(plan(Some(r(0, 50)), r(10, 20)), Vec::<ByteRange>::new());
        assert_eq!(plan(Some(r(0, 10)), r(5, 20)), vec![r(11, 20)]);
        assert_eq!(plan(Some(r(10, 20)), r(5, 15)), vec![r(5, 9)]);
        assert_eq!(plan(Some(r(50, 60)), r(0, 10)), vec![r(0, 49)]);
        assert_eq!(plan(Some(r(0, 10)), r(50, 60)), vec![r(11, 60)]);
        assert_eq!(plan(Some(r(20, 30)), r(0, 50)), vec![r(0, 19), r(31, 50)]);
    }

    #[test]
    fn test_plan_adjacent_spans() {
        assert_eq!(plan(Some(r(0, 10)), r(11, 12)), vec![r(11, 12)]);
        assert_eq!(plan(Some(r(11, 20)), r(5, 10)), vec![r(5, 10)]);
    }

    #[test]
    fn test_bridging_read() {
        let source = data(100);
        let cache = ValueCache::new(100);
        let mut log = Vec::new();

        let first = cache.read_with(0, 10, fetcher(&source, &mut log)).unwrap();
        assert_eq!(first, &source[0..=10]);
        let second = cache.read_with(50, 60, fetcher(&source, &mut log)).unwrap();
        assert_eq!(second, &source[50..=60]);

        assert_eq!(log, vec![r(0, 10), r(11, 60)]);
        assert_eq!(cache.cached_interval(), Some(r(0, 60)));
        assert_eq!(cache.cached_bytes(), &source[0..=60]);
    }

    #[test]
    fn test_read_before_cached_span_prepends() {
        let source = data(100);
        let cache = ValueCache::new(100);
        let mut log = Vec::new();

        cache.read_with(50, 60, fetcher(&source, &mut log)).unwrap();
        let bytes = cache.read_with(0, 10, fetcher(&source, &mut log)).unwrap();

        assert_eq!(bytes, &source[0..=10]);
        assert_eq!(log, vec![r(50, 60), r(0, 49)]);
        assert_eq!(cache.cached_interval(), Some(r(0, 60)));
        assert_eq!(cache.cached_bytes(), &source[0..=60]);
    }

    #[test]
    fn test_straddling_read() {
        let source = data(100);
        let cache = ValueCache::new(100);
        let mut log = Vec::new();

        cache.read_with(20, 30, fetcher(&source, &mut log)).unwrap();
        let bytes = cache.read_with(0, 50, fetcher(&source, &mut log)).unwrap();

        assert_eq!(bytes, &source[0..=50]);
        assert_eq!(log, vec![r(20, 30), r(0, 19), r(31, 50)]);
        assert_eq!(cache.cached_interval(), Some(r(0, 50)));
    }

    #[test]
    fn test_repeated_and_contained_reads_hit_cache() {
        let source = data(100);
        let cache = ValueCache::new(100);
        let mut log = Vec::new();

        cache.read_with(10, 40, fetcher(&source, &mut log)).unwrap();
        cache.read_with(10, 40, fetcher(&source, &mut log)).unwrap();
        let inner = cache.read_with(15, 35, fetcher(&source, &mut log)).unwrap();

        assert_eq!(inner, &source[15..=35]);
        assert_eq!(log, vec![r(10, 40)]);
    }

    #[test]
    fn test_request_is_clamped_to_declared_size() {
        let source = data(20);
        let cache = ValueCache::new(20);
        let mut log = Vec::new();

        let bytes = cache.read_with(15, 1_000, fetcher(&source, &mut log)).unwrap();
        assert_eq!(bytes, &source[15..=19]);
        assert_eq!(log, vec![r(15, 19)]);

        let beyond = cache.read_with(25, 30, fetcher(&source, &mut log)).unwrap();
        assert!(beyond.is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_empty_value_never_fetches() {
        let cache = ValueCache::empty();
        let bytes = cache
            .read_with(0, u64::MAX, |_| panic!("zero-size values must not fetch"))
            .unwrap();
        assert!(bytes.is_empty());
        assert!(cache.is_complete());
    }

    #[test]
    fn test_failed_fetch_leaves_cache_untouched() {
        let source = data(100);
        let cache = ValueCache::new(100);
        let mut log = Vec::new();
        cache.read_with(20, 30, fetcher(&source, &mut log)).unwrap();
        let before = (cache.cached_interval(), cache.cached_bytes());

        // First half of the straddle succeeds, second half fails.
        let mut calls = 0;
        let result = cache.read_with(0, 50, |range| {
            calls += 1;
            if calls == 2 {
                Err(Error::InternalServerError("boom".into()))
            } else {
                Ok(source[range.lo as usize..=range.hi as usize].to_vec())
            }
        });

        assert!(matches!(result, Err(Error::InternalServerError(_))));
        assert_eq!((cache.cached_interval(), cache.cached_bytes()), before);
    }

    #[test]
    fn test_short_fetch_is_rejected() {
        let cache = ValueCache::new(10);
        let result = cache.read_with(0, 9, |_| Ok(vec![0u8; 3]));
        assert!(matches!(result, Err(Error::UnexpectedResponse(_))));
        assert_eq!(cache.cached_interval(), None);
    }

    #[test]
    fn test_complete_after_full_read() {
        let source = data(8);
        let cache = ValueCache::new(8);
        let mut log = Vec::new();
        assert!(!cache.is_complete());
        cache.read_with(0, 7, fetcher(&source, &mut log)).unwrap();
        assert!(cache.is_complete());
        assert_eq!(cache.cached_len(), 8);
    }
}
