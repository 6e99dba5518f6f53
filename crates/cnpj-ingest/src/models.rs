//! Core data types shared by the ingestion pipeline

use serde::{Deserialize, Serialize};

/// A single normalized field value ready to be bound to the store.
///
/// Parsing produces canonical typed values, so the accumulator and the
/// writer never see raw text that still needs locale fixups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Plain text field
    Text(String),
    /// Numeric field (dot-decimal)
    Real(f64),
    /// Integer field (normalized boolean flags land here as 0/1)
    Integer(i64),
    /// Absent value (e.g. an empty date string)
    Null,
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Real(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Null => write!(f, ""),
        }
    }
}

/// One parsed row, in the entity's column order
pub type Record = Vec<FieldValue>;

/// Result of ingesting one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows accepted into committed transactions
    pub committed: u64,
    /// Rows dropped before parsing (blank lines, too few fields)
    pub skipped: u64,
    /// Rows rejected by a per-row constraint violation and dropped
    pub rejected: u64,
    /// Batches committed, including the final partial one
    pub batches: u64,
}

impl IngestReport {
    /// Fold another file's report into this one
    pub fn absorb(&mut self, other: &IngestReport) {
        self.committed += other.committed;
        self.skipped += other.skipped;
        self.rejected += other.rejected;
        self.batches += other.batches;
    }

    /// Get a summary message
    pub fn summary(&self) -> String {
        format!(
            "{} rows committed in {} batches ({} skipped, {} rejected)",
            self.committed, self.batches, self.skipped, self.rejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Text("abc".to_string()).to_string(), "abc");
        assert_eq!(FieldValue::Real(1234.56).to_string(), "1234.56");
        assert_eq!(FieldValue::Integer(1).to_string(), "1");
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    #[test]
    fn test_report_absorb() {
        let mut total = IngestReport {
            committed: 10,
            skipped: 1,
            rejected: 0,
            batches: 2,
        };
        total.absorb(&IngestReport {
            committed: 5,
            skipped: 0,
            rejected: 2,
            batches: 1,
        });

        assert_eq!(total.committed, 15);
        assert_eq!(total.skipped, 1);
        assert_eq!(total.rejected, 2);
        assert_eq!(total.batches, 3);
    }

    #[test]
    fn test_report_summary() {
        let report = IngestReport {
            committed: 42,
            skipped: 3,
            rejected: 1,
            batches: 2,
        };
        assert_eq!(
            report.summary(),
            "42 rows committed in 2 batches (3 skipped, 1 rejected)"
        );
    }
}
