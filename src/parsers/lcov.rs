/// Parser for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   SF:<path to source file>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>   ("-" means not taken)
///   end_of_record
///
/// Each `SF` record becomes one raw entry: `DA` lines are deduplicated by
/// line number (max execution count wins), negative counts mark
/// non-instrumentable lines and are dropped, and `BRDA` arms accumulate
/// into branch totals. Summary records (LF/LH/BRF/BRH) are ignored; the
/// counts are derived from the data lines themselves.
use std::collections::HashMap;
use std::str;

use crate::error::{CovgateError, Result};
use crate::model::RawEntry;
use crate::parsers::Parser;

pub struct LcovParser;

impl Parser for LcovParser {
    fn parse(&self, input: &[u8]) -> Result<Vec<RawEntry>> {
        parse_lcov(input)
    }
}

/// Per-file accumulation state between `SF` and `end_of_record`.
struct FileState {
    filename: String,
    line_hits: HashMap<u32, u64>,
    branch_total: u64,
    branch_covered: u64,
}

impl FileState {
    fn new(filename: String) -> Self {
        Self {
            filename,
            line_hits: HashMap::new(),
            branch_total: 0,
            branch_covered: 0,
        }
    }

    fn into_entry(self) -> RawEntry {
        let lines_valid = self.line_hits.len() as i64;
        let lines_covered = self.line_hits.values().filter(|hits| **hits > 0).count() as i64;
        let (branches_valid, branches_covered) = if self.branch_total > 0 {
            (Some(self.branch_total as i64), Some(self.branch_covered as i64))
        } else {
            (None, None)
        };
        RawEntry {
            filename: self.filename,
            lines_valid: Some(lines_valid),
            lines_covered: Some(lines_covered),
            branches_valid,
            branches_covered,
        }
    }
}

fn parse_lcov(input: &[u8]) -> Result<Vec<RawEntry>> {
    let text = str::from_utf8(input)
        .map_err(|_| CovgateError::Parse("invalid UTF-8 in LCOV data".to_string()))?;

    let mut entries = Vec::new();
    let mut current: Option<FileState> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(state) = current.take() {
                entries.push(state.into_entry());
            }
            continue;
        }

        // Split on first ':'
        let Some((tag, value)) = line.split_once(':') else {
            continue; // Skip lines we don't understand
        };

        match tag {
            "SF" => {
                // A new SF before end_of_record implicitly closes the
                // previous file.
                if let Some(state) = current.take() {
                    entries.push(state.into_entry());
                }
                current = Some(FileState::new(value.to_string()));
            }
            "DA" => {
                // DA:<line_number>,<execution_count>[,<checksum>]
                if let Some(state) = current.as_mut() {
                    let mut parts = value.splitn(3, ',');
                    let line_number = parts.next().and_then(|p| p.parse::<u32>().ok());
                    let count = parts.next().and_then(|p| p.parse::<i64>().ok());
                    if let (Some(line_number), Some(count)) = (line_number, count) {
                        // Negative counts mark non-instrumentable lines.
                        if count >= 0 {
                            let slot = state.line_hits.entry(line_number).or_insert(0);
                            if count as u64 > *slot {
                                *slot = count as u64;
                            }
                        }
                    }
                }
            }
            "BRDA" => {
                // BRDA:<line>,<block>,<branch>,<taken>, "-" meaning 0.
                if let Some(state) = current.as_mut() {
                    let parts: Vec<&str> = value.splitn(4, ',').collect();
                    if parts.len() == 4 {
                        state.branch_total += 1;
                        let taken = if parts[3] == "-" {
                            0
                        } else {
                            parts[3].parse::<u64>().unwrap_or(0)
                        };
                        if taken > 0 {
                            state.branch_covered += 1;
                        }
                    }
                }
            }
            // TN, FN, FNDA, LF, LH, FNF, FNH, BRF, BRH: ignored; counts
            // are derived from the data lines.
            _ => {}
        }
    }

    // Handle input that ends without end_of_record
    if let Some(state) = current.take() {
        entries.push(state.into_entry());
    }

    Ok(entries)
}
