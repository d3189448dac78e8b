use super::key::CacheKey;
use super::record::CachedRecord;
use dashmap::{DashMap, Entry};
use hickory_proto::rr::{DNSClass, Record, RecordType};
use rustc_hash::FxBuildHasher;
use std::time::Instant;
use tracing::debug;

/// Shared response cache: canonical `(name, class, type)` → TTL-stamped
/// record.
///
/// Reads and writes go through the sharded map; admission is atomic per
/// key, so the cache never holds more than one record per triple.
pub struct ResponseCache {
    records: DashMap<CacheKey, CachedRecord, FxBuildHasher>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            records: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Returns the still-valid records matching the question.
    pub fn lookup(&self, name: &str, class: DNSClass, rtype: RecordType) -> Vec<Record> {
        let now = Instant::now();
        let key = CacheKey::new(name, class, rtype);

        self.records
            .get(&key)
            .filter(|cached| cached.is_valid_at(now))
            .map(|cached| vec![cached.record().clone()])
            .unwrap_or_default()
    }

    /// Admits records. The first record admitted for a `(name, class, type)`
    /// triple wins, whether or not it is still valid; records with TTL 0
    /// are never admitted.
    pub fn admit<'a, I>(&self, records: I)
    where
        I: IntoIterator<Item = &'a Record>,
    {
        for record in records {
            if record.ttl() == 0 {
                continue;
            }

            match self.records.entry(CacheKey::for_record(record)) {
                Entry::Occupied(_) => {}
                Entry::Vacant(entry) => {
                    debug!(record = %record, "caching resource record");
                    entry.insert(CachedRecord::new(record.clone()));
                }
            }
        }
    }

    /// Drops expired records; returns how many were evicted.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, cached| cached.is_valid_at(now));
        before.saturating_sub(self.records.len())
    }

    /// Number of records currently held, expired or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&self) {
        self.records.clear();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
