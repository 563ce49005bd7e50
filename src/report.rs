//! The aggregate produced by one parse: filename → [`FileCoverage`].

use std::collections::btree_map::{self, BTreeMap};

use regex::Regex;

use crate::error::Result;
use crate::model::{percent, FileCoverage, Summary};

/// All files from a single coverage report, keyed by filename.
///
/// Iteration is ordered by filename so output is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any earlier record with the same filename.
    pub fn insert(&mut self, file: FileCoverage) {
        if let Some(previous) = self.files.insert(file.filename.clone(), file) {
            tracing::debug!(filename = %previous.filename, "replacing earlier record for file");
        }
    }

    pub fn get(&self, filename: &str) -> Option<&FileCoverage> {
        self.files.get(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files in filename order.
    pub fn files(&self) -> btree_map::Values<'_, String, FileCoverage> {
        self.files.values()
    }

    /// Overall line coverage across every retained file.
    #[must_use]
    pub fn get_summary(&self) -> Summary {
        let lines_covered: u64 = self.files.values().map(|f| f.lines_covered).sum();
        let lines_total: u64 = self.files.values().map(|f| f.lines_total).sum();
        if lines_total == 0 {
            return Summary::default();
        }
        Summary {
            overall_coverage: percent(lines_covered, lines_total),
            lines_covered,
            lines_total,
        }
    }

    /// Drop every file whose name matches `pattern` anywhere (regex search,
    /// not a full match). Returns how many files were removed.
    ///
    /// `None` or an empty pattern leaves the report untouched. An invalid
    /// pattern is an error and also leaves it untouched.
    pub fn filter_files(&mut self, pattern: Option<&str>) -> Result<usize> {
        let pattern = match pattern {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(0),
        };
        let re = Regex::new(pattern)?;

        let before = self.files.len();
        self.files.retain(|name, _| !re.is_match(name));
        let removed = before - self.files.len();
        tracing::info!(pattern, removed, remaining = self.files.len(), "applied exclude pattern");
        Ok(removed)
    }
}

impl FromIterator<FileCoverage> for CoverageReport {
    fn from_iter<I: IntoIterator<Item = FileCoverage>>(iter: I) -> Self {
        let mut report = Self::new();
        for file in iter {
            report.insert(file);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> CoverageReport {
        [
            FileCoverage::from_counts("src/app.py", 8, 10),
            FileCoverage::from_counts("tests/test_app.py", 5, 5),
            FileCoverage::from_counts("src/test_utils.py", 0, 5),
            FileCoverage::from_counts("src/util.py", 1, 4),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_summary_empty() {
        let summary = CoverageReport::new().get_summary();
        assert_eq!(summary.overall_coverage, 0.0);
        assert_eq!(summary.lines_covered, 0);
        assert_eq!(summary.lines_total, 0);
    }

    #[test]
    fn test_summary_zero_total() {
        let r: CoverageReport = [FileCoverage::from_counts("a.c", 0, 0)].into_iter().collect();
        assert_eq!(r.get_summary(), Summary::default());
    }

    #[test]
    fn test_summary_totals() {
        let summary = report().get_summary();
        assert_eq!(summary.lines_covered, 14);
        assert_eq!(summary.lines_total, 24);
        assert!((summary.overall_coverage - 14.0 / 24.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_last_write_wins() {
        let mut r = CoverageReport::new();
        r.insert(FileCoverage::from_counts("a.c", 1, 2));
        r.insert(FileCoverage::from_counts("a.c", 2, 2));
        assert_eq!(r.len(), 1);
        assert_eq!(r.get("a.c").unwrap().lines_covered, 2);
    }

    #[test]
    fn test_filter_files_search_semantics() {
        let mut r = report();
        let removed = r.filter_files(Some("test_")).unwrap();
        assert_eq!(removed, 2);
        assert!(!r.contains("tests/test_app.py"));
        assert!(!r.contains("src/test_utils.py"));
        assert!(r.contains("src/app.py"));
        assert!(r.contains("src/util.py"));
        for file in r.files() {
            assert_eq!(file, report().get(&file.filename).unwrap());
        }
    }

    #[test]
    fn test_filter_files_none_is_noop() {
        let mut r = report();
        assert_eq!(r.filter_files(None).unwrap(), 0);
        assert_eq!(r.filter_files(Some("")).unwrap(), 0);
        assert_eq!(r, report());
    }

    #[test]
    fn test_filter_files_idempotent() {
        let mut r = report();
        r.filter_files(Some(r"\.py$")).unwrap();
        assert!(r.is_empty());
        assert_eq!(r.filter_files(Some(r"\.py$")).unwrap(), 0);
    }

    #[test]
    fn test_filter_files_invalid_pattern() {
        let mut r = report();
        assert!(r.filter_files(Some("(unclosed")).is_err());
        assert_eq!(r.len(), 4);
    }
}
