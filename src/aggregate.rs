//! Folds classified coverage records into per-component and overall
//! totals. The fold is plain integer addition per counter, so it is
//! associative and commutative: partial totals from parallel workers merge
//! into the same result for any input ordering. Percentages are computed
//! only when a finalized view is read, never averaged across files.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::classify::Classifier;
use crate::model::{percent, BranchCounts, CoverageRecord};

/// Running totals for one component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentAggregate {
    pub lines_valid: u64,
    pub lines_covered: u64,
    pub branches_valid: u64,
    pub branches_covered: u64,
    /// Number of records that carried branch data. Zero means the branch
    /// percentage is "no data", not 0%.
    pub branch_records: u64,
    pub matched_file_count: u64,
}

impl ComponentAggregate {
    pub fn add(&mut self, record: &CoverageRecord) {
        self.lines_valid += record.lines_valid;
        self.lines_covered += record.lines_covered;
        if let Some(BranchCounts { valid, covered }) = record.branches {
            self.branches_valid += valid;
            self.branches_covered += covered;
            self.branch_records += 1;
        }
        self.matched_file_count += 1;
    }

    pub fn merge(&mut self, other: &ComponentAggregate) {
        self.lines_valid += other.lines_valid;
        self.lines_covered += other.lines_covered;
        self.branches_valid += other.branches_valid;
        self.branches_covered += other.branches_covered;
        self.branch_records += other.branch_records;
        self.matched_file_count += other.matched_file_count;
    }

    #[must_use]
    pub fn line_percent(&self) -> f64 {
        percent(self.lines_covered, self.lines_valid)
    }

    /// Branch percentage, or `None` when no record carried branch data.
    #[must_use]
    pub fn branch_percent(&self) -> Option<f64> {
        (self.branch_records > 0).then(|| percent(self.branches_covered, self.branches_valid))
    }
}

/// Per-component totals plus the overall total that sums every record
/// regardless of classification.
#[derive(Debug, Clone, Default)]
pub struct Totals {
    pub components: BTreeMap<String, ComponentAggregate>,
    pub overall: ComponentAggregate,
}

impl Totals {
    pub fn add(&mut self, component: &str, record: &CoverageRecord) {
        self.components
            .entry(component.to_string())
            .or_default()
            .add(record);
        self.overall.add(record);
    }

    /// Merge two partial totals. Associative, so reduction order across
    /// workers never changes the result.
    #[must_use]
    pub fn merge(mut self, other: Totals) -> Totals {
        for (name, aggregate) in other.components {
            self.components.entry(name).or_default().merge(&aggregate);
        }
        self.overall.merge(&other.overall);
        self
    }
}

/// Classify and fold records into totals across worker threads.
#[must_use]
pub fn aggregate(records: &[CoverageRecord], classifier: &Classifier) -> Totals {
    records
        .par_iter()
        .fold(Totals::default, |mut totals, record| {
            totals.add(classifier.classify(&record.path), record);
            totals
        })
        .reduce(Totals::default, Totals::merge)
}
