//! Gate configuration: component classification rules and tier thresholds,
//! loaded once per run from a TOML file.
//!
//! ```toml
//! overall_min = 80.0
//!
//! [tiers]
//! critical = 85.0
//! standard = 80.0
//! experimental = 70.0
//!
//! [[components]]
//! name = "bitcoin"
//! pattern = "bitcoin"
//! tier = "critical"
//! priority = 1
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CovgateError, Result};

/// Strictness bucket for a component. Unknown names are rejected when the
/// config is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Critical,
    Standard,
    Experimental,
}

impl Tier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::Standard => "standard",
            Tier::Experimental => "experimental",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification rule. Lower `priority` is evaluated first; overlap
/// between patterns is resolved by priority alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRule {
    pub name: String,
    pub pattern: String,
    pub tier: Tier,
    pub priority: u32,
}

/// Required line-coverage percentage per tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_critical")]
    pub critical: f64,
    #[serde(default = "default_standard")]
    pub standard: f64,
    #[serde(default = "default_experimental")]
    pub experimental: f64,
}

fn default_critical() -> f64 {
    85.0
}

fn default_standard() -> f64 {
    80.0
}

fn default_experimental() -> f64 {
    70.0
}

fn default_overall_min() -> f64 {
    80.0
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            critical: default_critical(),
            standard: default_standard(),
            experimental: default_experimental(),
        }
    }
}

impl TierThresholds {
    #[must_use]
    pub fn for_tier(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Critical => self.critical,
            Tier::Standard => self.standard,
            Tier::Experimental => self.experimental,
        }
    }
}

/// Optional branch-coverage gates per tier. A tier without an entry is not
/// branch-gated at all.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BranchThresholds {
    pub critical: Option<f64>,
    pub standard: Option<f64>,
    pub experimental: Option<f64>,
}

impl BranchThresholds {
    #[must_use]
    pub fn for_tier(&self, tier: Tier) -> Option<f64> {
        match tier {
            Tier::Critical => self.critical,
            Tier::Standard => self.standard,
            Tier::Experimental => self.experimental,
        }
    }
}

/// The full gate configuration as loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Project-wide minimum line coverage, checked against the overall
    /// aggregate independently of the per-component gates.
    #[serde(default = "default_overall_min")]
    pub overall_min: f64,

    #[serde(default)]
    pub tiers: TierThresholds,

    #[serde(default)]
    pub branch_tiers: BranchThresholds,

    #[serde(default)]
    pub components: Vec<ComponentRule>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            overall_min: default_overall_min(),
            tiers: TierThresholds::default(),
            branch_tiers: BranchThresholds::default(),
            components: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Check that every configured threshold is a sane percentage. Rule
    /// validation (duplicate priorities, empty patterns) happens when the
    /// classifier is built, before any aggregation.
    pub fn validate(&self) -> Result<()> {
        check_percent("overall_min", self.overall_min)?;
        check_percent("tiers.critical", self.tiers.critical)?;
        check_percent("tiers.standard", self.tiers.standard)?;
        check_percent("tiers.experimental", self.tiers.experimental)?;

        let branch_entries = [
            ("branch_tiers.critical", self.branch_tiers.critical),
            ("branch_tiers.standard", self.branch_tiers.standard),
            ("branch_tiers.experimental", self.branch_tiers.experimental),
        ];
        for (field, value) in branch_entries {
            if let Some(value) = value {
                check_percent(field, value)?;
            }
        }
        Ok(())
    }
}

fn check_percent(field: &str, value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(CovgateError::InvalidRuleConfig(format!(
            "{field} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

/// Parse and validate a TOML configuration string.
pub fn parse(contents: &str) -> Result<GateConfig> {
    let config: GateConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the gate configuration from a file.
pub fn load(path: &Path) -> Result<GateConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config = parse(&contents)?;
    log::debug!(
        "loaded {} component rules from {}",
        config.components.len(),
        path.display()
    );
    Ok(config)
}
