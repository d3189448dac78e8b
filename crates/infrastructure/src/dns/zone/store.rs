use hickory_proto::rr::{DNSClass, Name, Record, RecordType};
use hickory_proto::serialize::txt::Parser;
use palisade_dns_domain::ConfigError;
use std::path::Path;

/// An authoritative DNS zone: an origin name and its resource records.
#[derive(Debug, Clone)]
pub struct Zone {
    origin: Name,
    records: Vec<Record>,
}

impl Zone {
    pub fn new(origin: Name, records: Vec<Record>) -> Self {
        Self { origin, records }
    }

    pub fn origin(&self) -> &Name {
        &self.origin
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Parses a zone in master-file syntax with an explicit origin.
    pub fn parse(source: &str, origin: &str, file: &str) -> Result<Self, ConfigError> {
        let origin_name = Name::from_utf8(origin).map_err(|e| ConfigError::InvalidZone {
            file: file.to_string(),
            message: format!("invalid origin '{origin}': {e}"),
        })?;

        let (origin_name, record_sets) = Parser::new(source, None, Some(origin_name))
            .parse()
            .map_err(|e| ConfigError::InvalidZone {
                file: file.to_string(),
                message: e.to_string(),
            })?;

        let records = record_sets
            .into_values()
            .flat_map(|set| set.records_without_rrsigs().cloned().collect::<Vec<_>>())
            .collect();

        Ok(Self::new(origin_name, records))
    }

    /// Loads a zone file from disk.
    pub fn load(path: &Path, origin: &str) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::parse(&source, origin, &path.display().to_string())
    }

    /// True when this zone owns `name` (equal to or below the origin).
    pub fn owns(&self, name: &Name) -> bool {
        self.origin.zone_of(name)
    }

    /// Records matching the question exactly.
    pub fn lookup(&self, class: DNSClass, rtype: RecordType, name: &Name) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| {
                record.record_type() == rtype
                    && record.dns_class() == class
                    && record.name() == name
            })
            .cloned()
            .collect()
    }
}
