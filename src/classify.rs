//! Maps coverage record paths to named components via ordered pattern
//! rules. Rules are evaluated in ascending priority order and the first
//! match wins; overlap between patterns is resolved by the explicit
//! priority, never inferred from pattern specificity.

use std::collections::HashSet;

use crate::config::{ComponentRule, Tier};
use crate::error::{CovgateError, Result};

/// Component that collects every path no rule matches, so overall totals
/// stay path-complete even when the component taxonomy is incomplete.
pub const UNCLASSIFIED: &str = "unclassified";

/// A pattern is a glob when it contains glob metacharacters, otherwise a
/// plain substring match over the reported path.
#[derive(Debug)]
enum Matcher {
    Substring(String),
    Glob(glob::Pattern),
}

impl Matcher {
    fn compile(rule_name: &str, pattern: &str) -> Result<Matcher> {
        if pattern.contains(['*', '?', '[']) {
            let compiled = glob::Pattern::new(pattern).map_err(|e| {
                CovgateError::InvalidRuleConfig(format!(
                    "rule '{rule_name}' has invalid glob pattern '{pattern}': {e}"
                ))
            })?;
            Ok(Matcher::Glob(compiled))
        } else {
            Ok(Matcher::Substring(pattern.to_string()))
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Substring(needle) => path.contains(needle.as_str()),
            Matcher::Glob(pattern) => pattern.matches(path),
        }
    }
}

#[derive(Debug)]
struct CompiledRule {
    name: String,
    tier: Tier,
    priority: u32,
    matcher: Matcher,
}

/// Compiled, priority-ordered rule table.
#[derive(Debug)]
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Classifier {
    /// Compile and validate a rule set. Duplicate `(name, priority)` pairs,
    /// empty names or patterns and invalid globs are configuration errors;
    /// the run aborts before any aggregation.
    pub fn new(rules: &[ComponentRule]) -> Result<Self> {
        let mut seen: HashSet<(&str, u32)> = HashSet::new();
        let mut compiled = Vec::with_capacity(rules.len());

        for rule in rules {
            if rule.name.is_empty() {
                return Err(CovgateError::InvalidRuleConfig(
                    "rule with empty name".to_string(),
                ));
            }
            if rule.pattern.is_empty() {
                return Err(CovgateError::InvalidRuleConfig(format!(
                    "rule '{}' has an empty pattern",
                    rule.name
                )));
            }
            if !seen.insert((rule.name.as_str(), rule.priority)) {
                return Err(CovgateError::InvalidRuleConfig(format!(
                    "duplicate rule '{}' with priority {}",
                    rule.name, rule.priority
                )));
            }
            compiled.push(CompiledRule {
                name: rule.name.clone(),
                tier: rule.tier,
                priority: rule.priority,
                matcher: Matcher::compile(&rule.name, &rule.pattern)?,
            });
        }

        // Stable sort: rules with equal priority keep their config order.
        compiled.sort_by_key(|r| r.priority);
        Ok(Self { rules: compiled })
    }

    /// The component a path belongs to. First matching rule in priority
    /// order wins; unmatched paths fall into the `unclassified` sentinel.
    #[must_use]
    pub fn classify(&self, path: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map_or(UNCLASSIFIED, |rule| rule.name.as_str())
    }

    /// The tier a component is held to: the tier of its first rule in
    /// priority order. The `unclassified` sentinel (and any name without a
    /// rule) is held to the standard tier.
    #[must_use]
    pub fn component_tier(&self, component: &str) -> Tier {
        self.rules
            .iter()
            .find(|rule| rule.name == component)
            .map_or(Tier::Standard, |rule| rule.tier)
    }
}
