// src/report.rs
// =============================================================================
// Everything that happens to the records after the crawl.
//
// - Ignore file: one regular expression per line; a record whose whole
//   rendered line matches any of them is dropped
// - Sorting: errors first, then by file, then by message
// - Rendering: one line per record, or JSON
// - Exit code: 1 if any error survived, unless errors are ignored
// =============================================================================

use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::checker::ValidationRecord;
use crate::error::ReportError;

/// Printed when nothing is left to report.
pub const ALL_CLEAR: &str = "Congratulations! No errors or warnings!";

/// Patterns for records the user chose to ignore.
#[derive(Debug, Default)]
pub struct Suppressions {
    patterns: Vec<Regex>,
}

impl Suppressions {
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    // Blank lines are skipped. Every pattern must match the whole line.
    pub fn parse(text: &str) -> Result<Self, ReportError> {
        let mut patterns = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let pattern = Regex::new(&format!("^(?:{})$", line)).map_err(|source| {
                ReportError::Pattern {
                    line: index + 1,
                    source,
                }
            })?;
            patterns.push(pattern);
        }
        debug!(count = patterns.len(), "loaded ignore patterns");
        Ok(Self { patterns })
    }

    pub fn is_suppressed(&self, record: &ValidationRecord) -> bool {
        let line = record.to_string();
        self.patterns.iter().any(|p| p.is_match(&line))
    }
}

// Errors first, then by file path, then by message
pub fn sort_records(records: &mut [ValidationRecord]) {
    records.sort_by(|a, b| {
        b.severe
            .cmp(&a.severe)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.message.cmp(&b.message))
    });
}

// Sorts the records and drops the suppressed ones
pub fn prepare(
    mut records: Vec<ValidationRecord>,
    suppressions: &Suppressions,
) -> Vec<ValidationRecord> {
    sort_records(&mut records);
    records.retain(|r| !suppressions.is_suppressed(r));
    records
}

pub fn render_text(records: &[ValidationRecord]) -> String {
    if records.is_empty() {
        return ALL_CLEAR.to_string();
    }
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json(records: &[ValidationRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

// 0 = nothing severe (or errors ignored), 1 = at least one error
pub fn exit_code(records: &[ValidationRecord], ignore_errors: bool) -> i32 {
    if !ignore_errors && records.iter().any(|r| r.severe) {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ValidationRecord> {
        vec![
            ValidationRecord::warning("Link 'http://x/b' returned code 503", "/site/b.html"),
            ValidationRecord::error("Link 'http://x/z' returned code 404", "/site/b.html"),
            ValidationRecord::error("Link 'http://x/a' returned code 404", "/site/b.html"),
            ValidationRecord::error("Link 'http://x/a' returned code 404", "/site/a.html"),
        ]
    }

    #[test]
    fn test_sort_order() {
        let mut records = sample();
        sort_records(&mut records);

        let order: Vec<_> = records
            .iter()
            .map(|r| (r.severe, r.file.to_str().unwrap(), r.message.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (true, "/site/a.html", "Link 'http://x/a' returned code 404"),
                (true, "/site/b.html", "Link 'http://x/a' returned code 404"),
                (true, "/site/b.html", "Link 'http://x/z' returned code 404"),
                (false, "/site/b.html", "Link 'http://x/b' returned code 503"),
            ]
        );
    }

    #[test]
    fn test_suppression_matches_whole_line() {
        let suppressions = Suppressions::parse("Error: .*'http://x/a'.*\n\n").unwrap();
        let records = prepare(sample(), &suppressions);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.message.contains("http://x/a")));

        // A partial match is not enough
        let suppressions = Suppressions::parse("returned code 404").unwrap();
        assert_eq!(prepare(sample(), &suppressions).len(), 4);
    }

    #[test]
    fn test_invalid_pattern_reports_line() {
        let err = Suppressions::parse("ok.*\n(unclosed").unwrap_err();
        assert!(matches!(err, ReportError::Pattern { line: 2, .. }));
    }

    #[test]
    fn test_missing_ignore_file() {
        let err = Suppressions::load(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ReportError::Read { .. }));
    }

    #[test]
    fn test_exit_code() {
        let records = sample();
        assert_eq!(exit_code(&records, false), 1);
        assert_eq!(exit_code(&records, true), 0);

        let warnings = vec![ValidationRecord::warning("w", "/site/a.html")];
        assert_eq!(exit_code(&warnings, false), 0);
        assert_eq!(exit_code(&[], false), 0);
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render_text(&[]), ALL_CLEAR);

        let records = vec![ValidationRecord::error("broken", "/site/a.html")];
        assert_eq!(
            render_text(&records),
            "Error: File '/site/a.html' had issues: broken"
        );
    }

    #[test]
    fn test_render_json() {
        let records = vec![ValidationRecord::warning("moved", "/site/a.html")];
        let json = render_json(&records).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["severe"], false);
        assert_eq!(value[0]["message"], "moved");
        assert_eq!(value[0]["file"], "/site/a.html");
    }
}
