//! The final structured result of one evaluation run: serializable,
//! read-only, and the single source for both display and the process exit
//! code so the two can never disagree.

use serde::Serialize;

use crate::config::Tier;
use crate::model::SkippedEntry;
use crate::policy::PolicyOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    #[must_use]
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Status::Pass
        } else {
            Status::Fail
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One component's gate result.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentVerdict {
    pub name: String,
    pub tier: Tier,
    pub percent: f64,
    pub threshold: f64,
    pub status: Status,
    pub lines_covered: u64,
    pub lines_valid: u64,
    pub files: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_status: Option<Status>,
}

/// The verdict document for one evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub overall_percent: f64,
    pub overall_lines_covered: u64,
    pub overall_lines_valid: u64,
    /// Combined gate status: fails if any component fails or the overall
    /// aggregate is below the floor.
    pub overall_status: Status,
    /// The aggregate-vs-floor check on its own, so a caller can tell a
    /// dropped floor apart from a failing component.
    pub floor_status: Status,
    pub overall_min: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_branch_percent: Option<f64>,
    pub components: Vec<ComponentVerdict>,
    /// Names of components below their bar, worst line coverage first,
    /// ties broken by name.
    pub recommendations: Vec<String>,
    pub skipped_entries: Vec<SkippedEntry>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl Verdict {
    /// Assemble the verdict from the policy result and parser diagnostics.
    /// Pure mapping and ordering; no coverage numbers are recomputed here.
    #[must_use]
    pub fn new(outcome: PolicyOutcome, skipped_entries: Vec<SkippedEntry>) -> Self {
        let mut failing: Vec<(f64, String)> = outcome
            .components
            .iter()
            .filter(|c| !c.passed)
            .map(|c| (c.percent, c.name.clone()))
            .collect();
        failing.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        let recommendations = failing.into_iter().map(|(_, name)| name).collect();

        let components = outcome
            .components
            .into_iter()
            .map(|c| ComponentVerdict {
                name: c.name,
                tier: c.tier,
                percent: c.percent,
                threshold: c.threshold,
                status: Status::from_passed(c.passed),
                lines_covered: c.lines_covered,
                lines_valid: c.lines_valid,
                files: c.matched_file_count,
                branch_percent: c.branch_percent,
                branch_threshold: c.branch_threshold,
                branch_status: c.branches_passed.map(Status::from_passed),
            })
            .collect();

        Self {
            overall_percent: outcome.overall_percent,
            overall_lines_covered: outcome.overall_lines_covered,
            overall_lines_valid: outcome.overall_lines_valid,
            overall_status: Status::from_passed(
                outcome.floor_passed && outcome.components_passed,
            ),
            floor_status: Status::from_passed(outcome.floor_passed),
            overall_min: outcome.overall_min,
            overall_branch_percent: outcome.overall_branch_percent,
            components,
            recommendations,
            skipped_entries,
            generated_at: chrono::Utc::now(),
        }
    }

    /// Process exit code for CI gating: 0 on pass, 1 on fail. Internal
    /// errors never reach a verdict and exit 2 at the CLI boundary.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self.overall_status {
            Status::Pass => 0,
            Status::Fail => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ComponentOutcome;

    fn outcome(name: &str, percent: f64, passed: bool) -> ComponentOutcome {
        ComponentOutcome {
            name: name.to_string(),
            tier: Tier::Standard,
            percent,
            threshold: 80.0,
            branch_percent: None,
            branch_threshold: None,
            branches_passed: None,
            lines_valid: 100,
            lines_covered: percent as u64,
            matched_file_count: 1,
            passed,
        }
    }

    fn policy_outcome(components: Vec<ComponentOutcome>) -> PolicyOutcome {
        let components_passed = components.iter().all(|c| c.passed);
        PolicyOutcome {
            components,
            overall_percent: 90.0,
            overall_branch_percent: None,
            overall_lines_valid: 100,
            overall_lines_covered: 90,
            overall_min: 80.0,
            floor_passed: true,
            components_passed,
        }
    }

    #[test]
    fn test_recommendations_worst_first() {
        let verdict = Verdict::new(
            policy_outcome(vec![
                outcome("alpha", 60.0, false),
                outcome("beta", 40.0, false),
                outcome("gamma", 95.0, true),
            ]),
            vec![],
        );
        assert_eq!(verdict.recommendations, vec!["beta", "alpha"]);
    }

    #[test]
    fn test_recommendation_ties_broken_by_name() {
        let verdict = Verdict::new(
            policy_outcome(vec![
                outcome("zeta", 50.0, false),
                outcome("alpha", 50.0, false),
            ]),
            vec![],
        );
        assert_eq!(verdict.recommendations, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_exit_codes() {
        let pass = Verdict::new(policy_outcome(vec![outcome("a", 90.0, true)]), vec![]);
        assert_eq!(pass.overall_status, Status::Pass);
        assert_eq!(pass.exit_code(), 0);

        let fail = Verdict::new(policy_outcome(vec![outcome("a", 10.0, false)]), vec![]);
        assert_eq!(fail.overall_status, Status::Fail);
        assert_eq!(fail.exit_code(), 1);
    }

    #[test]
    fn test_floor_failure_fails_combined_status() {
        let mut po = policy_outcome(vec![outcome("a", 90.0, true)]);
        po.floor_passed = false;
        let verdict = Verdict::new(po, vec![]);
        assert_eq!(verdict.overall_status, Status::Fail);
        assert_eq!(verdict.floor_status, Status::Fail);
        // No component is below its own bar.
        assert!(verdict.recommendations.is_empty());
    }

    #[test]
    fn test_serializes_to_json() {
        let verdict = Verdict::new(policy_outcome(vec![outcome("a", 90.0, true)]), vec![]);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["overall_status"], "pass");
        assert_eq!(json["components"][0]["tier"], "standard");
        // Absent branch data is omitted, not serialized as null.
        assert!(json["components"][0].get("branch_percent").is_none());
    }
}
