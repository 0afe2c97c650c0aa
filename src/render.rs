//! Output formatting for verdicts. Formatters are pure presentation over
//! the finalized verdict; none of them recompute coverage numbers, so
//! display and gating can never disagree.

use std::fmt::Write;

use crate::verdict::{ComponentVerdict, Status, Verdict};

/// Trait for rendering a verdict to a displayable string.
pub trait VerdictFormatter {
    fn format(&self, verdict: &Verdict) -> String;
}

/// Plain text formatter for terminal output.
pub struct TextFormatter;

impl VerdictFormatter for TextFormatter {
    fn format(&self, verdict: &Verdict) -> String {
        let mut out = String::new();

        writeln!(
            out,
            "Coverage gate: {}",
            verdict.overall_status.as_str().to_uppercase()
        )
        .unwrap();
        writeln!(
            out,
            "Overall:       {}/{} lines ({:.1}%), floor {:.1}%: {}",
            verdict.overall_lines_covered,
            verdict.overall_lines_valid,
            verdict.overall_percent,
            verdict.overall_min,
            verdict.floor_status
        )
        .unwrap();
        if let Some(branch_percent) = verdict.overall_branch_percent {
            writeln!(out, "Branches:      {:.1}%", branch_percent).unwrap();
        }
        out.push('\n');

        writeln!(
            out,
            "{:<24} {:<13} {:>6} {:>8} {:>8} {:>8} {:>9}  STATUS",
            "COMPONENT", "TIER", "FILES", "COVERED", "VALID", "RATE", "REQUIRED"
        )
        .unwrap();
        writeln!(out, "{}", "-".repeat(90)).unwrap();
        for c in &verdict.components {
            writeln!(
                out,
                "{:<24} {:<13} {:>6} {:>8} {:>8} {:>7.1}% {:>8.1}%  {}",
                c.name, c.tier, c.files, c.lines_covered, c.lines_valid, c.percent, c.threshold, c.status
            )
            .unwrap();
            if let (Some(measured), Some(required), Some(status)) =
                (c.branch_percent, c.branch_threshold, c.branch_status)
            {
                writeln!(
                    out,
                    "{:<24} {:<13} {:>24.1}% {:>8.1}%  {}",
                    "", "  branches", measured, required, status
                )
                .unwrap();
            }
        }

        if !verdict.recommendations.is_empty() {
            out.push('\n');
            writeln!(out, "Needs attention (worst first):").unwrap();
            for name in &verdict.recommendations {
                if let Some(c) = component(verdict, name) {
                    writeln!(
                        out,
                        "  {}  {:.1}% (required {:.1}%)",
                        c.name, c.percent, c.threshold
                    )
                    .unwrap();
                }
            }
        }

        if !verdict.skipped_entries.is_empty() {
            out.push('\n');
            writeln!(
                out,
                "Skipped {} malformed report entries:",
                verdict.skipped_entries.len()
            )
            .unwrap();
            for skipped in &verdict.skipped_entries {
                writeln!(out, "  {}: {}", skipped.filename, skipped.reason).unwrap();
            }
        }

        out
    }
}

/// Markdown formatter, suitable for a CI summary comment.
pub struct MarkdownFormatter;

impl VerdictFormatter for MarkdownFormatter {
    fn format(&self, verdict: &Verdict) -> String {
        let mut md = String::new();

        let pct = verdict.overall_percent;
        writeln!(
            md,
            "### Coverage Gate: {} ({pct:.1}%)\n",
            verdict.overall_status.as_str().to_uppercase()
        )
        .unwrap();
        writeln!(
            md,
            "Overall floor {:.1}%: **{}**",
            verdict.overall_min, verdict.floor_status
        )
        .unwrap();

        md.push_str("\n| Component | Tier | Coverage | Required | Status |\n");
        md.push_str("|:----------|:-----|---------:|---------:|:-------|\n");
        for c in &verdict.components {
            let mark = match c.status {
                Status::Pass => "✅",
                Status::Fail => "❌",
            };
            writeln!(
                md,
                "| {} | {} | {:.1}% ({}/{}) | {:.1}% | {} {} |",
                c.name, c.tier, c.percent, c.lines_covered, c.lines_valid, c.threshold, mark, c.status
            )
            .unwrap();
        }

        if !verdict.recommendations.is_empty() {
            md.push_str("\nNeeds attention (worst first): ");
            md.push_str(&verdict.recommendations.join(", "));
            md.push('\n');
        }

        if !verdict.skipped_entries.is_empty() {
            writeln!(
                md,
                "\n{} malformed report entries were skipped.",
                verdict.skipped_entries.len()
            )
            .unwrap();
        }

        md
    }
}

fn component<'a>(verdict: &'a Verdict, name: &str) -> Option<&'a ComponentVerdict> {
    verdict.components.iter().find(|c| c.name == name)
}
