//! Ordered case-id pattern table for deterministic extraction.
//!
//! The table is explicitly constructed and immutable; each linker instance
//! owns its own copy. There is no process-wide pattern registry.

use regex::Regex;
use tracelink_core::{CorrelationError, TracelinkResult};

/// Built-in patterns, evaluated in order (first match wins). All are
/// case-insensitive; the extracted id is normalized to uppercase.
const DEFAULT_PATTERNS: [&str; 4] = [
    // ITSM-numeric codes: INC0012345, CHG0001234, SCTASK0000042, ...
    r"(?i)\b(?:INC|CHG|REQ|TASK|PRB|SCTASK)\d{7,10}\b",
    // Short project keys: PROJ-999, AB-1
    r"(?i)\b[A-Z]{2,10}-\d{1,6}\b",
    // Hash-prefixed numeric ids, captured without the hash: #12345
    r"#(\d{4,8})\b",
    // Generic prefixed ids: CASE-12345, TICKET-001
    r"(?i)\b(?:CASE|TICKET|INCIDENT|CHANGE|REQUEST)-\d{3,8}\b",
];

/// An immutable, ordered list of compiled case-id patterns.
///
/// A pattern with a capture group yields group 1 as the id (used to strip
/// prefixes like `#`); otherwise the whole match is the id.
#[derive(Debug, Clone)]
pub struct PatternTable {
    patterns: Vec<Regex>,
}

impl PatternTable {
    /// Compile a custom ordered pattern list.
    pub fn from_patterns(patterns: &[&str]) -> TracelinkResult<Self> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| CorrelationError::InvalidPattern {
                    pattern: (*p).to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns: compiled })
    }

    /// First match across the ordered pattern list, uppercased; `None` when
    /// no pattern matches. Pure and deterministic.
    pub fn extract(&self, text: &str) -> Option<String> {
        for pattern in &self.patterns {
            if let Some(caps) = pattern.captures(text) {
                let matched = caps
                    .get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str())?;
                return Some(matched.to_uppercase());
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::from_patterns(&DEFAULT_PATTERNS).expect("built-in patterns compile")
    }
}
