use hickory_proto::rr::{DNSClass, Record, RecordType};

/// Cache index key: canonical question name plus class and type.
///
/// Names are lowercased and dot-terminated, so lookups are case-insensitive
/// and tolerate a missing trailing dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: String,
    class: DNSClass,
    rtype: RecordType,
}

impl CacheKey {
    pub fn new(name: &str, class: DNSClass, rtype: RecordType) -> Self {
        let mut name = name.to_ascii_lowercase();
        if !name.ends_with('.') {
            name.push('.');
        }

        Self { name, class, rtype }
    }

    pub fn for_record(record: &Record) -> Self {
        Self::new(
            &record.name().to_string(),
            record.dns_class(),
            record.record_type(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> DNSClass {
        self.class
    }

    pub fn record_type(&self) -> RecordType {
        self.rtype
    }
}
