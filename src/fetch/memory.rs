//! In-memory `RangeFetcher` with a call log.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError, RwLock},
};

use reqwest::Url;

use super::{ByteRange, Credentials, RangeFetcher};
use crate::error::{Error, Result};

/// One recorded call to [`MemoryFetcher::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub reference: String,
    pub range: Option<ByteRange>,
}

/// Serves resources from a map; useful offline and in tests.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    resources: RwLock<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    required: Option<Credentials>,
    calls: Mutex<Vec<FetchCall>>,
}

fn relock<'a, T>(
    r: std::result::Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>,
) -> MutexGuard<'a, T> {
    r.unwrap_or_else(PoisonError::into_inner)
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every read whose credentials differ from `credentials`.
    pub fn requiring(credentials: Credentials) -> Self {
        Self { required: Some(credentials), ..Self::default() }
    }

    pub fn with(self, reference: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(reference, data);
        self
    }

    pub fn insert(&self, reference: &str, data: impl Into<Vec<u8>>) {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.to_string(), data.into());
    }

    /// Make reads of `reference` fail with an internal server error until [`recover`](Self::recover).
    pub fn fail(&self, reference: &str) {
        relock(self.failing.lock()).insert(reference.to_string());
    }

    pub fn recover(&self, reference: &str) {
        relock(self.failing.lock()).remove(reference);
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        relock(self.calls.lock()).clone()
    }

    /// Calls made for one reference, in order.
    pub fn calls_for(&self, reference: &str) -> Vec<Option<ByteRange>> {
        relock(self.calls.lock())
            .iter()
            .filter(|c| c.reference == reference)
            .map(|c| c.range)
            .collect()
    }

    pub fn clear_calls(&self) {
        relock(self.calls.lock()).clear();
    }
}

impl RangeFetcher for MemoryFetcher {
    fn read(
        &self,
        reference: &Url,
        range: Option<ByteRange>,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<u8>> {
        let key = reference.as_str();
        relock(self.calls.lock()).push(FetchCall { reference: key.to_string(), range });

        if let Some(required) = &self.required {
            if credentials != Some(required) {
                return Err(Error::Unauthorized);
            }
        }
        if relock(self.failing.lock()).contains(key) {
            return Err(Error::InternalServerError(format!("injected failure for '{}'", key)));
        }

        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        let data = resources.get(key).ok_or_else(|| Error::NotFound(key.to_string()))?;
        match range {
            None => Ok(data.clone()),
            Some(r) if r.hi < data.len() as u64 => Ok(data[r.lo as usize..=r.hi as usize].to_vec()),
            Some(r) => Err(Error::UnexpectedResponse(format!(
                "416 Range Not Satisfiable while accessing '{}' - {} of {} bytes",
                key,
                r,
                data.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranged_and_whole_reads() {
        let url = Url::parse("mem://data/a").unwrap();
        let f = MemoryFetcher::new().with(url.as_str(), "hello world");
        assert_eq!(f.read(&url, None, None).unwrap(), b"hello world");
        assert_eq!(f.read(&url, Some(ByteRange::new(6, 10)), None).unwrap(), b"world");
        assert!(f.read(&url, Some(ByteRange::new(6, 11)), None).is_err());
        assert_eq!(f.calls_for(url.as_str()).len(), 3);
    }

    #[test]
    fn test_required_credentials() {
        let url = Url::parse("mem://data/a").unwrap();
        let creds = Credentials::new("u", "p");
        let f = MemoryFetcher::requiring(creds.clone()).with(url.as_str(), "x");
        assert!(matches!(f.read(&url, None, None), Err(Error::Unauthorized)));
        assert_eq!(f.read(&url, None, Some(&creds)).unwrap(), b"x");
    }
}
