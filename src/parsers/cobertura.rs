/// Parser for Cobertura XML coverage reports.
///
/// Cobertura XML structure:
///   <coverage>
///     <sources><source>...</source></sources>
///     <packages>
///       <package name="...">
///         <classes>
///           <class name="..." filename="...">
///             <lines>
///               <line number="..." hits="..." branch="true|false"
///                     condition-coverage="50% (1/2)" />
///             </lines>
///           </class>
///         </classes>
///       </package>
///     </packages>
///   </coverage>
///
/// Each `<class>` becomes one raw entry: line counts are derived from the
/// distinct `<line>` elements (a line listed twice keeps the max hit
/// count), branch counts from `condition-coverage` attributes.
use std::collections::HashMap;
use std::str;
use std::sync::LazyLock;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;

use crate::error::{CovgateError, Result};
use crate::model::RawEntry;
use crate::parsers::Parser;

/// Pre-compiled regex for condition-coverage attributes like "75% (3/4)".
static BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)/(\d+)\)").unwrap());

pub struct CoberturaParser;

impl Parser for CoberturaParser {
    fn parse(&self, input: &[u8]) -> Result<Vec<RawEntry>> {
        parse_cobertura(input)
    }
}

/// Per-class accumulation state while walking the XML.
struct ClassState {
    filename: String,
    line_hits: HashMap<u32, u64>,
    /// line number -> (covered arms, total arms); first encounter wins so a
    /// line repeated under both <method> and <class> blocks is not counted
    /// twice.
    branch_lines: HashMap<u32, (u64, u64)>,
}

impl ClassState {
    fn new(filename: String) -> Self {
        Self {
            filename,
            line_hits: HashMap::new(),
            branch_lines: HashMap::new(),
        }
    }

    fn into_entry(self) -> RawEntry {
        let lines_valid = self.line_hits.len() as i64;
        let lines_covered = self.line_hits.values().filter(|hits| **hits > 0).count() as i64;

        let (branches_valid, branches_covered) = if self.branch_lines.is_empty() {
            (None, None)
        } else {
            let total: u64 = self.branch_lines.values().map(|(_, t)| t).sum();
            let covered: u64 = self.branch_lines.values().map(|(c, _)| c).sum();
            (Some(total as i64), Some(covered as i64))
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

fn parse_cobertura(input: &[u8]) -> Result<Vec<RawEntry>> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current: Option<ClassState> = None;

    // Source prefix from <source> elements
    let mut sources: Vec<String> = Vec::new();
    let mut in_source = false;

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(e) => return Err(CovgateError::Xml(e)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let local_name = e.name();
                let local = local_name.as_ref().to_vec();

                match local.as_slice() {
                    b"source" => {
                        // Only set in_source for Start events; self-closing
                        // <source/> has no text content and no End event, so
                        // setting the flag would capture the next unrelated
                        // Text event.
                        if is_start_event {
                            in_source = true;
                        }
                    }
                    b"class" => {
                        let attrs = attr_map(e);
                        if let Some(filename) = attrs.get("filename") {
                            let path = resolve_source_path(filename, &sources);
                            current = Some(ClassState::new(path));
                        }
                    }
                    b"line" => {
                        let attrs = attr_map(e);
                        if let Some(class) = current.as_mut() {
                            record_line(class, &attrs);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_source {
                    if let Ok(text) = e.unescape() {
                        sources.push(text.to_string());
                    }
                    in_source = false;
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name = e.name();
                let local = local_name.as_ref().to_vec();
                match local.as_slice() {
                    b"source" => {
                        in_source = false;
                    }
                    b"class" => {
                        if let Some(class) = current.take() {
                            entries.push(class.into_entry());
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }

    // Handle unclosed class
    if let Some(class) = current.take() {
        entries.push(class.into_entry());
    }

    Ok(entries)
}

fn record_line(class: &mut ClassState, attrs: &HashMap<String, String>) {
    let Some(line_number) = attrs.get("number").and_then(|n| n.parse::<u32>().ok()) else {
        return;
    };
    let hit_count = attrs
        .get("hits")
        .and_then(|h| h.parse::<u64>().ok())
        .unwrap_or(0);

    // Lines may appear both under <method><lines> and <class><lines>;
    // keep the max hit count per line number.
    let slot = class.line_hits.entry(line_number).or_insert(0);
    if hit_count > *slot {
        *slot = hit_count;
    }

    let is_branch = attrs
        .get("branch")
        .map(|v| v == "true")
        .unwrap_or(false);
    if is_branch && !class.branch_lines.contains_key(&line_number) {
        if let Some(cond) = attrs.get("condition-coverage") {
            if let Some(caps) = BRANCH_RE.captures(cond) {
                let covered: u64 = caps[1].parse().unwrap_or(0);
                let total: u64 = caps[2].parse().unwrap_or(0);
                class.branch_lines.insert(line_number, (covered, total));
            }
        }
    }
}

/// Resolve a filename against the list of `<source>` prefixes.
///
/// - If the filename is already absolute, return it as-is.
/// - Otherwise, prepend the first non-empty source prefix.
/// - If no non-empty sources exist, return the filename unchanged.
fn resolve_source_path(filename: &str, sources: &[String]) -> String {
    if filename.starts_with('/') {
        return filename.to_string();
    }
    for source in sources {
        let base = source.trim_end_matches('/');
        if !base.is_empty() {
            return format!("{}/{}", base, filename);
        }
    }
    filename.to_string()
}

/// Extract attributes from an XML element into a HashMap.
fn attr_map(e: &quick_xml::events::BytesStart) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| {
            let attr = a.ok()?;
            let key = str::from_utf8(attr.key.local_name().into_inner())
                .ok()?
                .to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cobertura() {
        let input = include_bytes!("../../tests/fixtures/coverage.xml");
        let entries = CoberturaParser.parse(input).unwrap();

        assert_eq!(entries.len(), 2);

        let bitcoin = &entries[0];
        assert_eq!(
            bitcoin.filename,
            "/home/ci/project/core/router/adapters/bitcoin_adapter.rs"
        );
        assert_eq!(bitcoin.lines_valid, Some(4));
        assert_eq!(bitcoin.lines_covered, Some(3));
        // Branch on line 8: 50% (1/2)
        assert_eq!(bitcoin.branches_valid, Some(2));
        assert_eq!(bitcoin.branches_covered, Some(1));

        let translator = &entries[1];
        assert_eq!(
            translator.filename,
            "/home/ci/project/core/router/intent_translator.rs"
        );
        assert_eq!(translator.lines_valid, Some(2));
        assert_eq!(translator.lines_covered, Some(1));
        assert_eq!(translator.branches_valid, None);
        assert_eq!(translator.branches_covered, None);
    }

    #[test]
    fn test_duplicate_lines_counted_once() {
        // The same line listed under <method><lines> and <class><lines>
        // must count once, keeping the max hit count.
        let input = br#"<?xml version="1.0"?>
<coverage>
  <packages><package name="p"><classes>
    <class name="c" filename="src/f.rs">
      <methods><method name="m">
        <lines>
          <line number="3" hits="0" branch="true" condition-coverage="50% (1/2)"/>
        </lines>
      </method></methods>
      <lines>
        <line number="3" hits="2" branch="true" condition-coverage="50% (1/2)"/>
        <line number="4" hits="1"/>
      </lines>
    </class>
  </classes></package></packages>
</coverage>"#;

        let entries = CoberturaParser.parse(input).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.lines_valid, Some(2));
        assert_eq!(entry.lines_covered, Some(2));
        // Branch arms for line 3 counted once, not twice.
        assert_eq!(entry.branches_valid, Some(2));
        assert_eq!(entry.branches_covered, Some(1));
    }

    #[test]
    fn test_no_sources_keeps_relative_path() {
        let input = br#"<?xml version="1.0"?>
<coverage>
  <packages><package name="p"><classes>
    <class name="c" filename="src/f.rs">
      <lines><line number="1" hits="1"/></lines>
    </class>
  </classes></package></packages>
</coverage>"#;

        let entries = CoberturaParser.parse(input).unwrap();
        assert_eq!(entries[0].filename, "src/f.rs");
    }

    #[test]
    fn test_first_non_empty_source_wins() {
        let input = br#"<?xml version="1.0"?>
<coverage>
  <sources>
    <source></source>
    <source>/home/ci/project</source>
  </sources>
  <packages><package name="p"><classes>
    <class name="c" filename="src/app.rs">
      <lines><line number="1" hits="1"/></lines>
    </class>
  </classes></package></packages>
</coverage>"#;

        let entries = CoberturaParser.parse(input).unwrap();
        assert_eq!(entries[0].filename, "/home/ci/project/src/app.rs");
    }

    #[test]
    fn test_truncated_xml_fabricates_no_entries() {
        let result = CoberturaParser.parse(b"<coverage><packages>");
        // Depending on reader strictness the truncated document is either
        // an error or an empty parse; it must never invent entries.
        if let Ok(entries) = result {
            assert!(entries.is_empty());
        }
    }
}
