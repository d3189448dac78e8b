use palisade_dns_domain::ConfigError;
use std::path::Path;
use std::sync::Arc;

use super::rule::Rule;

/// Parses rules from text, one expression per line. Blank lines and `#`
/// comments are ignored; a parse failure names the offending line.
pub fn parse_rules(source: &str, origin: &str) -> Result<Vec<Arc<Rule>>, ConfigError> {
    let mut rules = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let rule = Rule::new(line).map_err(|e| ConfigError::InvalidRule {
            file: origin.to_string(),
            line: index + 1,
            message: e.to_string(),
        })?;
        rules.push(Arc::new(rule));
    }

    Ok(rules)
}

/// Reads a rule file from disk.
pub fn read_rules(path: &Path) -> Result<Vec<Arc<Rule>>, ConfigError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
    parse_rules(&source, &path.display().to_string())
}
