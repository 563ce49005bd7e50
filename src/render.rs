//! Derived metrics and output formatting for a [`CoverageReport`].
//!
//! Everything here reads the aggregate through its public API. Presentation
//! settings arrive as a [`RenderOptions`] value so the report itself stays
//! free of display state.

use std::fmt::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::model::FileCoverage;
use crate::report::CoverageReport;

/// Order in which files are listed in the text output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Filename, ascending.
    File,
    /// Line coverage, ascending (worst files first).
    #[default]
    Coverage,
    /// Total lines, descending (largest files first).
    Lines,
}

/// Output shape selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn formatter(&self) -> &'static dyn ReportFormatter {
        match self {
            OutputFormat::Text => &TextFormatter,
            OutputFormat::Json => &JsonFormatter,
            OutputFormat::Csv => &CsvFormatter,
        }
    }
}

/// Presentation settings passed into every formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Overall coverage below this triggers a warning line.
    pub threshold: f64,
    /// Files with line coverage below this are marked.
    pub min_line_coverage: f64,
    pub sort: SortKey,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            threshold: 80.0,
            min_line_coverage: 70.0,
            sort: SortKey::Coverage,
        }
    }
}

/// Coverage distribution bucket. Ranges are half-open except `Excellent`,
/// which also takes everything at or above 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Excellent, Bucket::Good, Bucket::Fair, Bucket::Poor];

    #[must_use]
    pub fn classify(line_coverage: f64) -> Self {
        if line_coverage >= 90.0 {
            Bucket::Excellent
        } else if line_coverage >= 80.0 {
            Bucket::Good
        } else if line_coverage >= 70.0 {
            Bucket::Fair
        } else {
            Bucket::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Excellent => "Excellent (90-100%)",
            Bucket::Good => "Good (80-90%)",
            Bucket::Fair => "Fair (70-80%)",
            Bucket::Poor => "Poor (<70%)",
        }
    }
}

/// Count of files per bucket, in [`Bucket::ALL`] order.
#[must_use]
pub fn distribution(report: &CoverageReport) -> [(Bucket, usize); 4] {
    let mut counts = Bucket::ALL.map(|b| (b, 0));
    for file in report.files() {
        let bucket = Bucket::classify(file.line_coverage);
        if let Some(slot) = counts.iter_mut().find(|(b, _)| *b == bucket) {
            slot.1 += 1;
        }
    }
    counts
}

/// Files of the report in the requested order.
#[must_use]
pub fn sorted_files(report: &CoverageReport, key: SortKey) -> Vec<&FileCoverage> {
    // The report iterates by filename, so every stable sort below breaks
    // ties by name.
    let mut files: Vec<&FileCoverage> = report.files().collect();
    match key {
        SortKey::File => {}
        SortKey::Coverage => files.sort_by(|a, b| a.line_coverage.total_cmp(&b.line_coverage)),
        SortKey::Lines => files.sort_by(|a, b| b.lines_total.cmp(&a.lines_total)),
    }
    files
}

#[must_use]
pub fn is_low_coverage(file: &FileCoverage, min_line_coverage: f64) -> bool {
    file.line_coverage < min_line_coverage
}

/// Round to two decimal places for machine-readable output.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Trait for formatting coverage reports.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &CoverageReport, options: &RenderOptions) -> String;
}

const RULE_WIDTH: usize = 80;
const NAME_WIDTH: usize = 50;
const WARNING_MARKER: &str = "⚠️";

/// Human-readable table.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &CoverageReport, options: &RenderOptions) -> String {
        let mut out = String::new();
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(out, "{heavy}").unwrap();
        writeln!(out, "COVERAGE ANALYSIS REPORT").unwrap();
        writeln!(out, "{heavy}").unwrap();
        out.push('\n');

        let summary = report.get_summary();
        writeln!(
            out,
            "Overall Coverage: {:.2}% ({}/{} lines)",
            summary.overall_coverage, summary.lines_covered, summary.lines_total
        )
        .unwrap();
        if summary.overall_coverage < options.threshold {
            writeln!(
                out,
                "{WARNING_MARKER}  WARNING: Coverage below threshold of {}%",
                options.threshold
            )
            .unwrap();
        }

        out.push('\n');
        writeln!(out, "{light}").unwrap();
        writeln!(out, "{:<50} {:<12} {:<15}", "File", "Coverage", "Lines").unwrap();
        writeln!(out, "{light}").unwrap();

        for file in sorted_files(report, options.sort) {
            let coverage = format!("{:.1}%", file.line_coverage);
            let lines = format!("{}/{}", file.lines_covered, file.lines_total);
            let marker = if is_low_coverage(file, options.min_line_coverage) {
                format!(" {WARNING_MARKER}")
            } else {
                String::new()
            };
            let name = shorten_filename(&file.filename);
            writeln!(out, "{name:<50} {coverage:<12} {lines:<15}{marker}").unwrap();
        }
        writeln!(out, "{light}").unwrap();

        out.push('\n');
        writeln!(out, "Coverage Distribution:").unwrap();
        for (bucket, count) in distribution(report) {
            writeln!(out, "  {:<25} {count} files", bucket.label()).unwrap();
        }

        out
    }
}

/// Keep the tail of long paths, which is the distinguishing part.
fn shorten_filename(filename: &str) -> String {
    let len = filename.chars().count();
    if len <= NAME_WIDTH {
        return filename.to_string();
    }
    let tail: String = filename.chars().skip(len - (NAME_WIDTH - 3)).collect();
    format!("...{tail}")
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    summary: JsonSummary,
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
struct JsonSummary {
    overall_coverage: f64,
    lines_covered: u64,
    lines_total: u64,
    num_files: usize,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    filename: &'a str,
    line_coverage: f64,
    lines_covered: u64,
    lines_total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch_coverage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_coverage: Option<f64>,
}

/// Machine-readable JSON document, files sorted by name.
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &CoverageReport, _options: &RenderOptions) -> String {
        let summary = report.get_summary();
        let doc = JsonDocument {
            summary: JsonSummary {
                overall_coverage: round2(summary.overall_coverage),
                lines_covered: summary.lines_covered,
                lines_total: summary.lines_total,
                num_files: report.len(),
            },
            files: sorted_files(report, SortKey::File)
                .into_iter()
                .map(|f| JsonFile {
                    filename: &f.filename,
                    line_coverage: round2(f.line_coverage),
                    lines_covered: f.lines_covered,
                    lines_total: f.lines_total,
                    branch_coverage: f.branch_coverage.map(round2),
                    function_coverage: f.function_coverage.map(round2),
                })
                .collect(),
        };
        // Plain structs of strings and numbers always serialize.
        let mut out = serde_json::to_string_pretty(&doc).unwrap();
        out.push('\n');
        out
    }
}

pub const CSV_HEADER: &str =
    "Filename,Line Coverage %,Lines Covered,Lines Total,Branch Coverage %,Function Coverage %";

/// One row per file, sorted by name.
pub struct CsvFormatter;

impl ReportFormatter for CsvFormatter {
    fn format(&self, report: &CoverageReport, _options: &RenderOptions) -> String {
        let mut out = String::new();
        writeln!(out, "{CSV_HEADER}").unwrap();
        for f in sorted_files(report, SortKey::File) {
            writeln!(
                out,
                "\"{}\",{:.2},{},{},{},{}",
                f.filename.replace('"', "\"\""),
                f.line_coverage,
                f.lines_covered,
                f.lines_total,
                optional_percent(f.branch_coverage),
                optional_percent(f.function_coverage),
            )
            .unwrap();
        }
        out
    }
}

fn optional_percent(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> CoverageReport {
        let mut report = CoverageReport::new();
        report.insert(FileCoverage::from_counts("src/b.rs", 9, 10));
        report.insert(FileCoverage::from_counts("src/a.rs", 1, 4).with_branch_coverage(Some(50.0)));
        report.insert(FileCoverage::from_counts("src/c.rs", 41, 50));
        report
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(Bucket::classify(100.0), Bucket::Excellent);
        assert_eq!(Bucket::classify(90.0), Bucket::Excellent);
        assert_eq!(Bucket::classify(89.99), Bucket::Good);
        assert_eq!(Bucket::classify(80.0), Bucket::Good);
        assert_eq!(Bucket::classify(79.999), Bucket::Fair);
        assert_eq!(Bucket::classify(70.0), Bucket::Fair);
        assert_eq!(Bucket::classify(69.9), Bucket::Poor);
        assert_eq!(Bucket::classify(0.0), Bucket::Poor);
    }

    #[test]
    fn test_distribution_partitions_files() {
        let report = sample_report();
        let dist = distribution(&report);
        let total: usize = dist.iter().map(|(_, n)| n).sum();
        assert_eq!(total, report.len());
        assert_eq!(dist[0], (Bucket::Excellent, 1));
        assert_eq!(dist[1], (Bucket::Good, 1));
        assert_eq!(dist[2], (Bucket::Fair, 0));
        assert_eq!(dist[3], (Bucket::Poor, 1));
    }

    #[test]
    fn test_sorted_files() {
        let report = sample_report();
        let names = |key| -> Vec<String> {
            sorted_files(&report, key)
                .iter()
                .map(|f| f.filename.clone())
                .collect()
        };
        assert_eq!(names(SortKey::File), ["src/a.rs", "src/b.rs", "src/c.rs"]);
        assert_eq!(names(SortKey::Coverage), ["src/a.rs", "src/c.rs", "src/b.rs"]);
        assert_eq!(names(SortKey::Lines), ["src/c.rs", "src/b.rs", "src/a.rs"]);
    }

    #[test]
    fn test_text_output() {
        let report = sample_report();
        let out = TextFormatter.format(&report, &RenderOptions::default());
        // 51 / 64 = 79.6875%
        assert!(out.contains("Overall Coverage: 79.69% (51/64 lines)"), "{out}");
        assert!(out.contains("WARNING: Coverage below threshold of 80%"));
        let a_row = out.lines().find(|l| l.starts_with("src/a.rs")).unwrap();
        assert!(a_row.contains("25.0%"));
        assert!(a_row.contains("1/4"));
        assert!(a_row.ends_with(WARNING_MARKER));
        let b_row = out.lines().find(|l| l.starts_with("src/b.rs")).unwrap();
        assert!(!b_row.contains(WARNING_MARKER));
        assert!(out.contains("Excellent (90-100%)       1 files"));
        assert!(out.contains("Poor (<70%)               1 files"));
    }

    #[test]
    fn test_text_output_above_threshold() {
        let mut report = CoverageReport::new();
        report.insert(FileCoverage::from_counts("ok.rs", 10, 10));
        let out = TextFormatter.format(&report, &RenderOptions::default());
        assert!(!out.contains("WARNING"));
    }

    #[test]
    fn test_shorten_filename() {
        let long = format!("{}/tail.rs", "x".repeat(60));
        let short = shorten_filename(&long);
        assert_eq!(short.chars().count(), NAME_WIDTH);
        assert!(short.starts_with("..."));
        assert!(short.ends_with("/tail.rs"));
        assert_eq!(shorten_filename("src/lib.rs"), "src/lib.rs");
    }

    #[test]
    fn test_json_output() {
        let report = sample_report();
        let out = JsonFormatter.format(&report, &RenderOptions::default());
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["summary"]["overall_coverage"], 79.69);
        assert_eq!(doc["summary"]["num_files"], 3);
        let files = doc["files"].as_array().unwrap();
        assert_eq!(files[0]["filename"], "src/a.rs");
        assert_eq!(files[0]["branch_coverage"], 50.0);
        assert!(files[1].get("branch_coverage").is_none());
        assert!(files[1].get("function_coverage").is_none());
    }

    #[test]
    fn test_csv_output() {
        let mut report = sample_report();
        report.insert(FileCoverage::from_counts("say \"hi\".rs", 1, 3));
        let out = CsvFormatter.format(&report, &RenderOptions::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "\"say \"\"hi\"\".rs\",33.33,1,3,,");
        assert_eq!(lines[2], "\"src/a.rs\",25.00,1,4,50.00,");
        assert_eq!(lines[3], "\"src/b.rs\",90.00,9,10,,");
        assert_eq!(lines.len(), 5);
    }
}
