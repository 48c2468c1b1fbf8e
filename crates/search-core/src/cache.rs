//! Shared in-flight collection cache.
//!
//! Memoizes expensive ID collections behind a TTL + capacity bound. The
//! stored value is the future itself, inserted before it settles, so
//! concurrent identical requests share a single underlying collection.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use lru::LruCache;

use crate::error::SearchError;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
/// Default entry capacity; the least recently used entry is evicted beyond
/// this.
pub const DEFAULT_CAPACITY: usize = 200;

/// Cache key for a full-text query collection.
pub fn query_key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Cache key for a size-scoped collection: trimmed size and query joined
/// with a fixed separator.
pub fn size_query_key(size: &str, query: &str) -> String {
    format!("{}::{}", size.trim(), query.trim())
}

/// Time source, injectable so tests control expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

type FlightResult<T> = Result<Arc<T>, SearchError>;
type Flight<T> = Shared<BoxFuture<'static, FlightResult<T>>>;

struct Entry<T> {
    flight: Flight<T>,
    inserted_at: Instant,
}

/// Size- and TTL-bounded memoization of in-flight collections.
///
/// The map is only touched synchronously between awaits, so a plain mutex
/// held for the lookup-or-insert step is enough; the shared future is
/// awaited outside the lock.
pub struct FlightCache<T> {
    entries: Mutex<LruCache<String, Entry<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Send + Sync + 'static> FlightCache<T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock,
        }
    }

    /// Return the live entry for `key`, or store the future produced by
    /// `make` (before it settles) and return that.
    ///
    /// Entries expire by TTL, are evicted least-recently-used at capacity,
    /// and an entry that already resolved to an error is dropped so the
    /// next request retries instead of replaying the failure.
    pub async fn get_or_create<F, Fut>(&self, key: &str, make: F) -> FlightResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SearchError>> + Send + 'static,
    {
        let flight = {
            let mut entries = self.entries.lock().expect("flight cache lock poisoned");
            let now = self.clock.now();

            let live = entries
                .get(key)
                .filter(|entry| now.duration_since(entry.inserted_at) < self.ttl)
                .filter(|entry| !matches!(entry.flight.peek(), Some(Err(_))))
                .map(|entry| entry.flight.clone());

            match live {
                Some(flight) => flight,
                None => {
                    let flight = make()
                        .map(|result| result.map(Arc::new))
                        .boxed()
                        .shared();
                    entries.put(
                        key.to_owned(),
                        Entry {
                            flight: flight.clone(),
                            inserted_at: now,
                        },
                    );
                    flight
                }
            }
        };
        flight.await
    }

    /// Number of stored entries (live or not).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("flight cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
