//! Time-rotating duplicate suppression.
//!
//! Fingerprints live in a bounded deque of buckets, newest first. Inserts
//! always go to the newest bucket; membership is checked across all live
//! buckets. A background task prepends a fresh bucket every rotation
//! interval and truncates to the configured count, so a fingerprint is
//! remembered for `buckets × interval` at most and `(buckets-1) × interval`
//! at least. Memory stays bounded without tracking per-entry timestamps.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use squall_core::Fingerprint;

struct Buckets {
    live: VecDeque<HashSet<Fingerprint>>,
    cap: usize,
}

impl Buckets {
    /// Membership check and insert as one step. Returns true on duplicate.
    fn check_and_record(&mut self, fp: Fingerprint) -> bool {
        if self.live.iter().any(|b| b.contains(&fp)) {
            return true;
        }
        // front is always the current bucket
        self.live[0].insert(fp);
        false
    }

    fn rotate(&mut self) {
        self.live.push_front(HashSet::new());
        self.live.truncate(self.cap);
    }
}

/// Shared handle to the dedup cache. Cloning is cheap; all clones see the
/// same buckets.
#[derive(Clone)]
pub struct DedupCache {
    inner: Arc<Mutex<Buckets>>,
}

impl DedupCache {
    /// Create a cache with one empty bucket and start its rotation task.
    /// The task exits on its own once every handle is dropped.
    pub fn new(interval: Duration, bucket_count: usize) -> Self {
        assert!(bucket_count >= 1, "dedup cache needs at least one bucket");
        let inner = Arc::new(Mutex::new(Buckets {
            live: VecDeque::from([HashSet::new()]),
            cap: bucket_count,
        }));

        let weak: Weak<Mutex<Buckets>> = Arc::downgrade(&inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(buckets) => buckets.lock().unwrap_or_else(|e| e.into_inner()).rotate(),
                    None => return,
                }
            }
        });

        Self { inner }
    }

    /// Returns true if the fingerprint was seen within the live horizon.
    /// Otherwise records it in the current bucket and returns false.
    ///
    /// Check and insert are a single critical section shared with rotation:
    /// a rotation can never interleave between them, and two concurrent
    /// calls for the same fingerprint cannot both see "absent".
    pub fn check_and_record(&self, fp: Fingerprint) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .check_and_record(fp)
    }

    /// Live bucket count, newest first.
    pub fn bucket_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .live
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squall_core::fingerprint;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn duplicate_within_horizon() {
        let cache = DedupCache::new(MINUTE, 10);
        let fp = fingerprint(b"abc");

        assert!(!cache.check_and_record(fp), "first sighting is not a dupe");
        assert!(cache.check_and_record(fp), "immediate recheck is a dupe");

        // five rotations later, still inside the ten-minute horizon
        tokio::time::sleep(5 * MINUTE + Duration::from_millis(5)).await;
        assert!(cache.check_and_record(fp));
    }

    #[tokio::test(start_paused = true)]
    async fn forgotten_past_horizon() {
        let cache = DedupCache::new(MINUTE, 10);
        let fp = fingerprint(b"abc");
        assert!(!cache.check_and_record(fp));

        // eleven minutes: the original bucket has been truncated away
        tokio::time::sleep(11 * MINUTE).await;
        assert!(!cache.check_and_record(fp), "horizon passed, seen as new");
    }

    #[tokio::test(start_paused = true)]
    async fn bucket_count_stays_bounded() {
        let cache = DedupCache::new(MINUTE, 3);
        tokio::time::sleep(10 * MINUTE).await;
        assert_eq!(cache.bucket_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reinsert_after_eviction_starts_a_new_horizon() {
        let cache = DedupCache::new(MINUTE, 2);
        let fp = fingerprint(b"xyz");
        assert!(!cache.check_and_record(fp));

        tokio::time::sleep(3 * MINUTE).await;
        assert!(!cache.check_and_record(fp), "evicted");
        assert!(cache.check_and_record(fp), "recorded again");
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_fingerprints_do_not_collide() {
        let cache = DedupCache::new(MINUTE, 10);
        assert!(!cache.check_and_record(fingerprint(b"one")));
        assert!(!cache.check_and_record(fingerprint(b"two")));
        assert!(cache.check_and_record(fingerprint(b"one")));
    }
}
