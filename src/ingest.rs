use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::detect::{detect_format, needs_content, Format};
use crate::error::Result;
use crate::parsers::parser_for;
use crate::report::CoverageReport;

/// Read a coverage file, auto-detect its format (or use the override),
/// parse it, and drop files matching `exclude`.
/// Returns (report, format).
pub fn ingest(
    file_path: &Path,
    format_override: Option<Format>,
    exclude: Option<&str>,
) -> Result<(CoverageReport, Format)> {
    let (mut report, format) = match format_override {
        Some(format) => (parse_file(file_path, format)?, format),
        None if needs_content(file_path) => {
            // Ambiguous extension: detect from the bytes, then parse those same bytes.
            let content = std::fs::read(file_path)?;
            let format = detect_format(file_path, &content);
            (parser_for(format).parse(&content)?, format)
        }
        None => {
            let format = detect_format(file_path, b"");
            (parse_file(file_path, format)?, format)
        }
    };
    tracing::debug!(path = %file_path.display(), %format, "parsed coverage report");

    report.filter_files(exclude)?;
    Ok((report, format))
}

/// Parse a file with the given format. The file handle is released when
/// this returns, on success or error.
pub fn parse_file(file_path: &Path, format: Format) -> Result<CoverageReport> {
    let file = File::open(file_path)?;
    let mut reader = BufReader::new(file);
    parser_for(format).parse_reader(&mut reader)
}
