//! Command handler functions for the covgate CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::aggregate;
use crate::classify::Classifier;
use crate::config;
use crate::evaluate;
use crate::render::{MarkdownFormatter, TextFormatter, VerdictFormatter};
use crate::verdict::Verdict;

/// Output style for the `check` command.
#[derive(Clone, ValueEnum)]
pub enum Style {
    Text,
    Markdown,
    Json,
}

/// Run the full gate: load config and report, evaluate, render. The caller
/// maps the verdict to the process exit code.
pub fn cmd_check(
    report: &Path,
    format: Option<&str>,
    config_path: &Path,
    style: &Style,
) -> Result<(String, Verdict)> {
    let config = config::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let (outcome, _format) = evaluate::load_report(report, format)
        .with_context(|| format!("Failed to read report {}", report.display()))?;
    let verdict = evaluate::evaluate(outcome, &config)?;

    let output = match style {
        Style::Text => TextFormatter.format(&verdict),
        Style::Markdown => MarkdownFormatter.format(&verdict),
        Style::Json => {
            let mut json = serde_json::to_string_pretty(&verdict)?;
            json.push('\n');
            json
        }
    };
    Ok((output, verdict))
}

/// Print the per-component aggregation table without gating.
pub fn cmd_components(
    report: &Path,
    format: Option<&str>,
    config_path: &Path,
    sort_by_coverage: bool,
) -> Result<String> {
    let config = config::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let classifier = Classifier::new(&config.components)?;
    let (outcome, _format) = evaluate::load_report(report, format)
        .with_context(|| format!("Failed to read report {}", report.display()))?;

    let totals = aggregate::aggregate(&outcome.records, &classifier);

    let mut rows: Vec<_> = totals.components.iter().collect();
    if sort_by_coverage {
        rows.sort_by(|a, b| a.1.line_percent().total_cmp(&b.1.line_percent()));
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:<24} {:<13} {:>6} {:>8} {:>8} {:>8}",
        "COMPONENT", "TIER", "FILES", "COVERED", "VALID", "RATE"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(74)).unwrap();
    for (name, aggregate) in &rows {
        writeln!(
            out,
            "{:<24} {:<13} {:>6} {:>8} {:>8} {:>7.1}%",
            name,
            classifier.component_tier(name),
            aggregate.matched_file_count,
            aggregate.lines_covered,
            aggregate.lines_valid,
            aggregate.line_percent()
        )
        .unwrap();
    }

    writeln!(
        out,
        "\nOverall: {}/{} lines ({:.1}%) across {} files",
        totals.overall.lines_covered,
        totals.overall.lines_valid,
        totals.overall.line_percent(),
        totals.overall.matched_file_count
    )
    .unwrap();
    if !outcome.skipped.is_empty() {
        writeln!(out, "Skipped {} malformed entries", outcome.skipped.len()).unwrap();
    }

    Ok(out)
}

/// Load and validate the configuration, printing the compiled rule table
/// and thresholds.
pub fn cmd_rules(config_path: &Path) -> Result<String> {
    let config = config::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    // Compile to surface rule errors even when only printing.
    Classifier::new(&config.components)?;

    let mut rules = config.components.clone();
    rules.sort_by_key(|r| r.priority);

    let mut out = String::new();
    writeln!(
        out,
        "{:>8}  {:<24} {:<13} PATTERN",
        "PRIORITY", "NAME", "TIER"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(70)).unwrap();
    for rule in &rules {
        writeln!(
            out,
            "{:>8}  {:<24} {:<13} {}",
            rule.priority, rule.name, rule.tier, rule.pattern
        )
        .unwrap();
    }

    writeln!(
        out,
        "\nThresholds: critical {:.1}%, standard {:.1}%, experimental {:.1}%, overall floor {:.1}%",
        config.tiers.critical,
        config.tiers.standard,
        config.tiers.experimental,
        config.overall_min
    )
    .unwrap();

    Ok(out)
}
