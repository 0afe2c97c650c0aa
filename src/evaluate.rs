//! End-to-end evaluation: read a report, classify, aggregate, gate. One
//! invocation is a pure function from (report, rules, thresholds) to a
//! `Verdict`; nothing is shared across runs.

use std::path::Path;

use crate::aggregate;
use crate::classify::Classifier;
use crate::config::GateConfig;
use crate::detect::{detect_format, Format};
use crate::error::{CovgateError, Result};
use crate::parsers::cobertura::CoberturaParser;
use crate::parsers::lcov::LcovParser;
use crate::parsers::summary_json::SummaryJsonParser;
use crate::parsers::{self, ParseOutcome, Parser};
use crate::policy::{self, TierPolicy};
use crate::verdict::Verdict;

/// Read a coverage report, auto-detect its format (or use the override),
/// parse it, and screen every entry.
pub fn load_report(path: &Path, format_override: Option<&str>) -> Result<(ParseOutcome, Format)> {
    let content = std::fs::read(path)?;

    let format = if let Some(fmt_str) = format_override {
        fmt_str.parse::<Format>()?
    } else {
        detect_format(path, &content).ok_or(CovgateError::UnknownFormat)?
    };

    let outcome = parsers::parse_report(parser_for(format).as_ref(), &content)?;
    log::debug!(
        "parsed {} records ({} skipped) from {} report {}",
        outcome.records.len(),
        outcome.skipped.len(),
        format,
        path.display()
    );
    Ok((outcome, format))
}

fn parser_for(format: Format) -> Box<dyn Parser> {
    match format {
        Format::Cobertura => Box::new(CoberturaParser),
        Format::Lcov => Box::new(LcovParser),
        Format::SummaryJson => Box::new(SummaryJsonParser),
    }
}

/// Run the classification → aggregation → policy pipeline over parsed
/// records and assemble the verdict.
///
/// Configuration problems abort before any aggregation; a report with zero
/// valid records is an `EmptyReport` error since no verdict can be
/// meaningfully computed from it.
pub fn evaluate(outcome: ParseOutcome, config: &GateConfig) -> Result<Verdict> {
    let classifier = Classifier::new(&config.components)?;

    if outcome.records.is_empty() {
        return Err(CovgateError::EmptyReport);
    }

    let totals = aggregate::aggregate(&outcome.records, &classifier);
    let policy_outcome = policy::evaluate(&totals, &classifier, &TierPolicy::from_config(config));
    Ok(Verdict::new(policy_outcome, outcome.skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawEntry;
    use crate::verdict::Status;

    fn outcome_from(entries: Vec<RawEntry>) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        for entry in entries {
            match entry.screen() {
                Ok(record) => outcome.records.push(record),
                Err(skipped) => outcome.skipped.push(skipped),
            }
        }
        outcome
    }

    fn entry(filename: &str, valid: i64, covered: i64) -> RawEntry {
        RawEntry {
            filename: filename.to_string(),
            lines_valid: Some(valid),
            lines_covered: Some(covered),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_report_is_an_error() {
        let result = evaluate(ParseOutcome::default(), &GateConfig::default());
        assert!(matches!(result, Err(CovgateError::EmptyReport)));
    }

    #[test]
    fn test_all_entries_malformed_is_an_error() {
        let outcome = outcome_from(vec![entry("bad.rs", 2, 5)]);
        let result = evaluate(outcome, &GateConfig::default());
        assert!(matches!(result, Err(CovgateError::EmptyReport)));
    }

    #[test]
    fn test_config_error_aborts_before_aggregation() {
        let config = crate::config::parse(
            r#"
            [[components]]
            name = "dup"
            pattern = "a"
            tier = "standard"
            priority = 1

            [[components]]
            name = "dup"
            pattern = "b"
            tier = "standard"
            priority = 1
            "#,
        )
        .unwrap();

        let outcome = outcome_from(vec![entry("src/a.rs", 10, 10)]);
        let result = evaluate(outcome, &config);
        assert!(matches!(result, Err(CovgateError::InvalidRuleConfig(_))));
    }

    #[test]
    fn test_skipped_entries_flow_into_verdict() {
        let outcome = outcome_from(vec![entry("good.rs", 10, 10), entry("bad.rs", 2, 5)]);
        let verdict = evaluate(outcome, &GateConfig::default()).unwrap();
        assert_eq!(verdict.overall_status, Status::Pass);
        assert_eq!(verdict.skipped_entries.len(), 1);
        assert_eq!(verdict.skipped_entries[0].filename, "bad.rs");
    }
}
