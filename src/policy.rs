//! Evaluates finalized component percentages against tier thresholds and
//! the project-wide floor. A threshold breach is a business outcome
//! carried in the result, never an error value.

use crate::aggregate::Totals;
use crate::classify::Classifier;
use crate::config::{BranchThresholds, GateConfig, Tier, TierThresholds};

/// Threshold registry: required line coverage per tier, optional branch
/// gates, and the project-wide minimum.
#[derive(Debug, Clone)]
pub struct TierPolicy {
    pub tiers: TierThresholds,
    pub branch_tiers: BranchThresholds,
    pub overall_min: f64,
}

impl TierPolicy {
    #[must_use]
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            tiers: config.tiers,
            branch_tiers: config.branch_tiers,
            overall_min: config.overall_min,
        }
    }
}

/// Pass/fail for one evaluated component.
#[derive(Debug, Clone)]
pub struct ComponentOutcome {
    pub name: String,
    pub tier: Tier,
    pub percent: f64,
    pub threshold: f64,
    pub branch_percent: Option<f64>,
    pub branch_threshold: Option<f64>,
    /// Branch gate result; `None` when the component has no branch data or
    /// no branch threshold is configured for its tier.
    pub branches_passed: Option<bool>,
    pub lines_valid: u64,
    pub lines_covered: u64,
    pub matched_file_count: u64,
    pub passed: bool,
}

/// The policy engine's full result. The floor check and the per-component
/// checks are evaluated and reported independently; either failing fails
/// the gate.
#[derive(Debug, Clone)]
pub struct PolicyOutcome {
    pub components: Vec<ComponentOutcome>,
    pub overall_percent: f64,
    pub overall_branch_percent: Option<f64>,
    pub overall_lines_valid: u64,
    pub overall_lines_covered: u64,
    pub overall_min: f64,
    pub floor_passed: bool,
    pub components_passed: bool,
}

impl PolicyOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.floor_passed && self.components_passed
    }
}

/// Apply the tier policy to finalized totals. Component tiers come from
/// the same rules that classified their records; the unclassified sentinel
/// is held to the standard tier.
#[must_use]
pub fn evaluate(totals: &Totals, classifier: &Classifier, policy: &TierPolicy) -> PolicyOutcome {
    let mut components = Vec::with_capacity(totals.components.len());

    for (name, aggregate) in &totals.components {
        let tier = classifier.component_tier(name);
        let threshold = policy.tiers.for_tier(tier);
        let percent = aggregate.line_percent();
        let branch_percent = aggregate.branch_percent();
        let branch_threshold = policy.branch_tiers.for_tier(tier);

        let lines_ok = percent >= threshold;
        // A component without branch data is excluded from branch gating
        // but still gated on lines.
        let branches_passed = match (branch_percent, branch_threshold) {
            (Some(measured), Some(required)) => Some(measured >= required),
            _ => None,
        };

        components.push(ComponentOutcome {
            name: name.clone(),
            tier,
            percent,
            threshold,
            branch_percent,
            branch_threshold,
            branches_passed,
            lines_valid: aggregate.lines_valid,
            lines_covered: aggregate.lines_covered,
            matched_file_count: aggregate.matched_file_count,
            passed: lines_ok && branches_passed.unwrap_or(true),
        });
    }

    let overall_percent = totals.overall.line_percent();
    PolicyOutcome {
        overall_percent,
        overall_branch_percent: totals.overall.branch_percent(),
        overall_lines_valid: totals.overall.lines_valid,
        overall_lines_covered: totals.overall.lines_covered,
        overall_min: policy.overall_min,
        floor_passed: overall_percent >= policy.overall_min,
        components_passed: components.iter().all(|c| c.passed),
        components,
    }
}
