/// Parser for the summary JSON format: per-file entries carrying counts
/// already totalled by the instrumentation tool.
///
///   {"files": [{"filename": "src/lib.rs",
///               "lines_valid": 10, "lines_covered": 8,
///               "branches_valid": 4, "branches_covered": 2}]}
///
/// A bare top-level array of entries is also accepted. Field-level
/// problems (missing filename, non-numeric counts) stay in the raw entry
/// so the screening step can reject each entry individually; only an
/// undecodable document is a fatal error.
use serde_json::Value;

use crate::error::{CovgateError, Result};
use crate::model::RawEntry;
use crate::parsers::Parser;

pub struct SummaryJsonParser;

impl Parser for SummaryJsonParser {
    fn parse(&self, input: &[u8]) -> Result<Vec<RawEntry>> {
        parse_summary(input)
    }
}

fn parse_summary(input: &[u8]) -> Result<Vec<RawEntry>> {
    let doc: Value = serde_json::from_slice(input)?;

    let files = match &doc {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("files") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => {
                return Err(CovgateError::Parse(
                    "summary JSON must contain a 'files' array".to_string(),
                ))
            }
        },
        _ => {
            return Err(CovgateError::Parse(
                "summary JSON must be an object or an array".to_string(),
            ))
        }
    };

    Ok(files.iter().map(entry_from_value).collect())
}

fn entry_from_value(value: &Value) -> RawEntry {
    RawEntry {
        filename: value
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        lines_valid: int_field(value, "lines_valid"),
        lines_covered: int_field(value, "lines_covered"),
        branches_valid: int_field(value, "branches_valid"),
        branches_covered: int_field(value, "branches_covered"),
    }
}

fn int_field(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}
