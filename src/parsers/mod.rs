pub mod cobertura;
pub mod lcov;
pub mod summary_json;

use crate::error::Result;
use crate::model::{CoverageRecord, RawEntry, SkippedEntry};

/// Every format parser implements this trait.
pub trait Parser {
    /// Parse the input bytes into raw, unvalidated report entries.
    fn parse(&self, input: &[u8]) -> Result<Vec<RawEntry>>;
}

/// Result of parsing plus per-entry screening: the records that survived
/// and the entries that were rejected, in input order.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub records: Vec<CoverageRecord>,
    pub skipped: Vec<SkippedEntry>,
}

/// Run a parser and screen each raw entry individually. One bad entry is
/// recorded and skipped; it never aborts the rest of the report.
pub fn parse_report(parser: &dyn Parser, input: &[u8]) -> Result<ParseOutcome> {
    let mut outcome = ParseOutcome::default();
    for entry in parser.parse(input)? {
        match entry.screen() {
            Ok(record) => outcome.records.push(record),
            Err(skipped) => {
                log::warn!("skipping entry '{}': {}", skipped.filename, skipped.reason);
                outcome.skipped.push(skipped);
            }
        }
    }
    Ok(outcome)
}
