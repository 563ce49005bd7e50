/// Parser for the LCOV tracefile format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<path to source file>
///   FN:<line>,<function name>
///   FNDA:<execution count>,<function name>
///   FNF:<number of functions found>
///   FNH:<number of functions hit>
///   DA:<line number>,<execution count>
///   LF:<lines found>
///   LH:<lines hit>
///   end_of_record
///
/// Only line data is normalized. `LF`/`LH`, when present, take precedence
/// over the counts accumulated from `DA` regardless of record order. `DA`
/// records without exactly two fields are skipped.
use std::io::BufRead;

use super::CoverageParser;
use crate::detect::Format;
use crate::error::{CovsumError, Result};
use crate::model::FileCoverage;
use crate::report::CoverageReport;

/// LCOV format parser.
pub struct LcovParser;

impl CoverageParser for LcovParser {
    fn format(&self) -> Format {
        Format::Lcov
    }

    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<CoverageReport> {
        parse_lcov(reader)
    }
}

/// Per-block accumulators, reset after every `end_of_record`.
#[derive(Default)]
struct Block {
    filename: Option<String>,
    found: u64,
    hit: u64,
    lines_found: Option<u64>,
    lines_hit: Option<u64>,
}

impl Block {
    fn finish(&mut self) -> Option<FileCoverage> {
        let block = std::mem::take(self);
        let found = block.lines_found.unwrap_or(block.found);
        let hit = block.lines_hit.unwrap_or(block.hit);
        match block.filename {
            Some(filename) if !filename.is_empty() && found > 0 => {
                Some(FileCoverage::from_counts(filename, hit, found))
            }
            Some(filename) => {
                tracing::debug!(%filename, "dropping lcov record with no instrumented lines");
                None
            }
            None => None,
        }
    }
}

/// Reads line-by-line so the full input need not be in memory at once.
fn parse_lcov(reader: &mut dyn BufRead) -> Result<CoverageReport> {
    let mut report = CoverageReport::new();
    let mut block = Block::default();

    let mut raw_line = String::new();
    let mut line_no = 0usize;
    loop {
        raw_line.clear();
        let n = reader.read_line(&mut raw_line)?;
        if n == 0 {
            break; // EOF
        }
        line_no += 1;

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(file) = block.finish() {
                report.insert(file);
            }
            continue;
        }

        let (tag, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };

        match tag {
            "SF" => {
                block.filename = Some(value.to_string());
            }
            "DA" => {
                // DA:<line_number>,<execution_count>; the line number is not used.
                let parts: Vec<&str> = value.split(',').collect();
                if parts.len() != 2 {
                    tracing::debug!(line_no, "skipping DA record without exactly two fields");
                    continue;
                }
                let count = parse_int::<i64>(parts[1], line_no, "DA execution count")?;
                block.found += 1;
                if count > 0 {
                    block.hit += 1;
                }
            }
            "LF" => block.lines_found = Some(parse_int(value, line_no, "LF")?),
            "LH" => block.lines_hit = Some(parse_int(value, line_no, "LH")?),
            // TN, FN, FNDA, FNF, FNH, BRDA, BRF, BRH and unknown tags carry
            // nothing for the line-coverage model.
            _ => {}
        }
    }

    if block.filename.is_some() {
        tracing::debug!("discarding trailing lcov record without end_of_record");
    }

    tracing::info!(files = report.len(), "parsed lcov report");
    Ok(report)
}

fn parse_int<T: std::str::FromStr>(value: &str, line_no: usize, what: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        CovsumError::Parse(format!("line {line_no}: invalid {what} value '{value}'"))
    })
}
