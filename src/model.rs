//! Uniform in-memory representation of per-file coverage measurements,
//! independent of the report format that produced them. Parsers emit
//! `RawEntry` values which are screened into immutable `CoverageRecord`s;
//! entries that fail screening become `SkippedEntry` diagnostics.

/// Compute a coverage percentage over integer counts.
///
/// A zero denominator means nothing was required, which counts as fully
/// covered rather than a division error.
#[must_use]
pub fn percent(covered: u64, valid: u64) -> f64 {
    if valid == 0 {
        100.0
    } else {
        covered as f64 * 100.0 / valid as f64
    }
}

/// Branch counts for one file. The two counts travel together; a file
/// without branch data has no `BranchCounts` at all, which is not the same
/// as zero branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchCounts {
    pub valid: u64,
    pub covered: u64,
}

/// One measured source file. Constructed once by `RawEntry::screen` and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageRecord {
    /// Path as reported by the instrumentation tool. Not necessarily a real
    /// filesystem path after source-prefix rewriting.
    pub path: String,
    pub lines_valid: u64,
    pub lines_covered: u64,
    pub branches: Option<BranchCounts>,
}

/// A parsed but not yet validated report entry. Counts stay optional and
/// signed so a single screening step can reject missing fields, negative
/// counts and covered > valid individually.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub filename: String,
    pub lines_valid: Option<i64>,
    pub lines_covered: Option<i64>,
    pub branches_valid: Option<i64>,
    pub branches_covered: Option<i64>,
}

/// A report entry the parser rejected, with the reason it was skipped.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SkippedEntry {
    pub filename: String,
    pub reason: String,
}

impl RawEntry {
    /// Validate into a `CoverageRecord`, or reject with the reason.
    pub fn screen(self) -> std::result::Result<CoverageRecord, SkippedEntry> {
        match self.check() {
            Ok(record) => Ok(record),
            Err(reason) => Err(SkippedEntry {
                filename: if self.filename.is_empty() {
                    "<unknown>".to_string()
                } else {
                    self.filename
                },
                reason,
            }),
        }
    }

    fn check(&self) -> std::result::Result<CoverageRecord, String> {
        if self.filename.is_empty() {
            return Err("missing filename".to_string());
        }

        let lines_valid = count_field(self.lines_valid, "lines_valid")?;
        let lines_covered = count_field(self.lines_covered, "lines_covered")?;
        if lines_covered > lines_valid {
            return Err(format!(
                "lines_covered {lines_covered} exceeds lines_valid {lines_valid}"
            ));
        }

        let branches = match (self.branches_valid, self.branches_covered) {
            (None, None) => None,
            (Some(v), Some(c)) => {
                let valid = count_field(Some(v), "branches_valid")?;
                let covered = count_field(Some(c), "branches_covered")?;
                if covered > valid {
                    return Err(format!(
                        "branches_covered {covered} exceeds branches_valid {valid}"
                    ));
                }
                Some(BranchCounts { valid, covered })
            }
            _ => {
                return Err(
                    "branch counts must be given together (missing or non-numeric partner)"
                        .to_string(),
                )
            }
        };

        Ok(CoverageRecord {
            path: self.filename.clone(),
            lines_valid,
            lines_covered,
            branches,
        })
    }
}

fn count_field(value: Option<i64>, field: &str) -> std::result::Result<u64, String> {
    match value {
        None => Err(format!("missing or non-numeric {field}")),
        Some(v) if v < 0 => Err(format!("negative {field}: {v}")),
        Some(v) => Ok(v as u64),
    }
}
