//! Command handler for the covsum CLI.
//!
//! `cmd_analyze` returns its output as a `String`, making it easy to test
//! without capturing stdout.

use std::path::Path;

use anyhow::{Context, Result};

use crate::detect::parse_selector;
use crate::ingest::ingest;
use crate::render::{OutputFormat, RenderOptions};

pub fn cmd_analyze(
    file: &Path,
    format: &str,
    exclude: Option<&str>,
    output: OutputFormat,
    options: &RenderOptions,
) -> Result<String> {
    // Reject a bad selector before touching the file.
    let format_override = parse_selector(format)?;

    if !file.exists() {
        anyhow::bail!("Coverage report not found: {}", file.display());
    }

    let (report, detected) = ingest(file, format_override, exclude)
        .with_context(|| format!("Error parsing coverage report {}", file.display()))?;
    tracing::info!(
        format = %detected,
        files = report.len(),
        "analyzed coverage report"
    );

    Ok(output.formatter().format(&report, options))
}
