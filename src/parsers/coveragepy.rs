/// Parser for the coverage.py JSON report (`coverage json`).
///
/// Reference: https://coverage.readthedocs.io/en/latest/cmd.html#cmd-json
///
/// The format is a JSON object whose `files` member is keyed by file path.
/// Each value carries a `summary`:
///   - `num_statements`:   countable lines
///   - `covered_lines`:    executed lines
///   - `num_branches`:     branch arms (only with `--branch`)
///   - `covered_branches`: executed branch arms
///
/// Partial summaries are tolerated: anything missing counts as 0.
use std::io::BufRead;

use serde_json::Value;

use super::CoverageParser;
use crate::detect::Format;
use crate::error::{CovsumError, Result};
use crate::model::{percent, FileCoverage};
use crate::report::CoverageReport;

/// coverage.py JSON parser.
pub struct CoveragePyParser;

impl CoverageParser for CoveragePyParser {
    fn format(&self) -> Format {
        Format::CoveragePy
    }

    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<CoverageReport> {
        let doc: Value = serde_json::from_reader(reader)?;
        parse_document(&doc)
    }
}

fn parse_document(doc: &Value) -> Result<CoverageReport> {
    if !doc.is_object() {
        return Err(CovsumError::Parse(
            "coverage.py JSON must be an object at the top level".to_string(),
        ));
    }

    let mut report = CoverageReport::new();
    let files = match doc.get("files").and_then(Value::as_object) {
        Some(files) => files,
        None => {
            tracing::debug!("coverage.py JSON has no files object");
            return Ok(report);
        }
    };

    for (filename, entry) in files {
        report.insert(parse_file_entry(filename, entry));
    }

    tracing::info!(files = report.len(), "parsed coverage.py report");
    Ok(report)
}

/// Parse a single `files` entry.
fn parse_file_entry(filename: &str, entry: &Value) -> FileCoverage {
    let summary = entry.get("summary");
    let count = |key: &str| -> u64 {
        summary
            .and_then(|s| s.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };

    let lines_total = count("num_statements");
    let lines_covered = count("covered_lines");

    // Zero branches means the file has no branch data, not 0% coverage.
    let num_branches = count("num_branches");
    let branch_coverage =
        (num_branches > 0).then(|| percent(count("covered_branches"), num_branches));

    FileCoverage::from_counts(filename, lines_covered, lines_total)
        .with_branch_coverage(branch_coverage)
}
