use hickory_proto::rr::Record;
use std::time::{Duration, Instant};

/// A resource record held by the cache, stamped with its admission time.
#[derive(Debug, Clone)]
pub struct CachedRecord {
    record: Record,
    admitted: Instant,
}

impl CachedRecord {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            admitted: Instant::now(),
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Valid while the admission time plus the record TTL lies in the future.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.admitted + Duration::from_secs(u64::from(self.record.ttl()))
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Instant::now())
    }
}
