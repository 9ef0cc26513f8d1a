//! Storage for CRLs keyed by the distribution point they were retrieved from

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use log::{debug, error};

use crate::RevocationList;

/// The `RevocationCache` trait defines the interface used by
/// [`CrlRevocationChecker`](crate::CrlRevocationChecker) to save and retrieve CRLs. Keys are
/// normalized distribution point URLs. Eviction, if any, is the responsibility of the implementation.
pub trait RevocationCache: Send + Sync {
    /// Retrieves the CRL most recently saved for the given URL, if any.
    fn get(&self, url: &str) -> Option<Arc<RevocationList>>;
    /// Saves a CRL for the given URL, replacing any previous entry.
    fn put(&self, url: &str, crl: Arc<RevocationList>);
}

/// `InMemoryRevocationCache` provides a process-wide, unbounded [`RevocationCache`]. Concurrent writes
/// for the same key are last writer wins.
#[derive(Default)]
pub struct InMemoryRevocationCache {
    crls: Mutex<BTreeMap<String, Arc<RevocationList>>>,
}

impl InMemoryRevocationCache {
    /// Creates a new, empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached CRLs
    pub fn len(&self) -> usize {
        match self.crls.lock() {
            Ok(g) => g.len(),
            Err(_) => 0,
        }
    }

    /// Returns true if no CRLs are cached
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }
}

impl RevocationCache for InMemoryRevocationCache {
    fn get(&self, url: &str) -> Option<Arc<RevocationList>> {
        let crls = match self.crls.lock() {
            Ok(g) => g,
            Err(_) => {
                error!("CRL cache lock is poisoned; treating {} as a cache miss", url);
                return None;
            }
        };
        crls.get(url).cloned()
    }

    fn put(&self, url: &str, crl: Arc<RevocationList>) {
        let mut crls = match self.crls.lock() {
            Ok(g) => g,
            Err(_) => {
                error!("CRL cache lock is poisoned; CRL from {} not cached", url);
                return;
            }
        };
        if crls.insert(url.to_string(), crl).is_some() {
            debug!("Replaced cached CRL for {}", url);
        } else {
            debug!("Added CRL for {} to cache", url);
        }
    }
}
