//! Uniform in-memory representation of coverage data, independent of any
//! specific format. Every parser converges on `FileCoverage`.

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Same as [`rate`], scaled to a percentage.
#[must_use]
pub fn percent(covered: u64, total: u64) -> f64 {
    rate(covered, total) * 100.0
}

/// Coverage facts for a single source file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCoverage {
    pub filename: String,
    /// Line coverage percentage in [0, 100].
    pub line_coverage: f64,
    /// `None` means the source format carried no branch data, which is
    /// not the same as 0%.
    pub branch_coverage: Option<f64>,
    /// No supported format populates this yet.
    pub function_coverage: Option<f64>,
    pub lines_covered: u64,
    pub lines_total: u64,
}

impl FileCoverage {
    /// Build a record whose line coverage is derived from the counts.
    pub fn from_counts(filename: impl Into<String>, lines_covered: u64, lines_total: u64) -> Self {
        Self {
            filename: filename.into(),
            line_coverage: percent(lines_covered, lines_total),
            branch_coverage: None,
            function_coverage: None,
            lines_covered,
            lines_total,
        }
    }

    #[must_use]
    pub fn with_branch_coverage(mut self, branch_coverage: Option<f64>) -> Self {
        self.branch_coverage = branch_coverage;
        self
    }
}

/// Overall totals across every retained file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub overall_coverage: f64,
    pub lines_covered: u64,
    pub lines_total: u64,
}
