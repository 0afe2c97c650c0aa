/// Auto-detection of coverage report formats.
///
/// Strategy:
///   1. Check file extension for strong hints
///   2. Peek at the first bytes of the file content
///   3. Fall back to the CLI --format override (handled by caller)
use std::path::Path;

use crate::error::CovgateError;

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Cobertura,
    Lcov,
    SummaryJson,
}

impl Format {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cobertura => "cobertura",
            Format::Lcov => "lcov",
            Format::SummaryJson => "summary-json",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovgateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cobertura" => Ok(Format::Cobertura),
            "lcov" => Ok(Format::Lcov),
            "summary-json" | "json" => Ok(Format::SummaryJson),
            _ => Err(CovgateError::Parse(format!(
                "Unknown format: '{}'. Supported: cobertura, lcov, summary-json",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the report format from filename and file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    // 1. Try extension-based detection
    if let Some(fmt) = detect_by_extension(path) {
        return Some(fmt);
    }

    // 2. Content-based detection
    detect_by_content(content)
}

fn detect_by_extension(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "info" | "lcov" => Some(Format::Lcov),
        "json" => Some(Format::SummaryJson),
        "xml" => None, // Could be Cobertura or another XML schema; inspect content
        _ => None,
    }
}

fn detect_by_content(content: &[u8]) -> Option<Format> {
    // We only need to look at the first few KB
    let head_len = content.len().min(4096);
    let head = String::from_utf8_lossy(&content[..head_len]);

    // LCOV: lines start with SF:, DA:, etc. Check that lines actually start
    // with these tags to avoid false positives on files that merely contain
    // the strings.
    let has_sf = head.lines().any(|l| l.starts_with("SF:"));
    let has_da_or_fn = head
        .lines()
        .any(|l| l.starts_with("DA:") || l.starts_with("FN:"));
    if has_sf && has_da_or_fn {
        return Some(Format::Lcov);
    }

    let trimmed = head.trim_start();

    // Cobertura: XML with a <coverage> root element.
    if (head.contains("<?xml") || trimmed.starts_with('<')) && head.contains("<coverage") {
        return Some(Format::Cobertura);
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(Format::SummaryJson);
    }

    None
}
