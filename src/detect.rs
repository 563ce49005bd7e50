/// Auto-detection of coverage file formats.
///
/// Strategy:
///   1. Check the file extension
///   2. For `.json`, peek at the document shape
///   3. Anything unrecognized is treated as LCOV
///
/// An explicit `--format` selector bypasses detection (handled by caller).
use std::path::Path;

use serde_json::Value;

use crate::error::CovsumError;

/// Supported coverage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Lcov,
    CoveragePy,
    Cobertura,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Lcov => "lcov",
            Format::CoveragePy => "coverage-py",
            Format::Cobertura => "cobertura",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovsumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lcov" => Ok(Format::Lcov),
            "coverage-py" => Ok(Format::CoveragePy),
            "cobertura" => Ok(Format::Cobertura),
            _ => Err(CovsumError::UnknownFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a format selector. `auto` yields `None`, meaning "detect".
pub fn parse_selector(s: &str) -> Result<Option<Format>, CovsumError> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    s.parse().map(Some)
}

/// Whether the extension alone is not enough to pick a format.
pub fn needs_content(path: &Path) -> bool {
    extension(path).as_deref() == Some("json")
}

/// Detect the coverage format from filename and, for `.json`, file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Format {
    let detected = match extension(path).as_deref() {
        Some("lcov") => Some(Format::Lcov),
        Some("xml") | Some("coverage") => Some(Format::Cobertura),
        Some("json") if looks_like_coveragepy(content) => Some(Format::CoveragePy),
        _ => None,
    };
    detected.unwrap_or_else(|| {
        tracing::debug!(path = %path.display(), "no format matched, falling back to lcov");
        Format::Lcov
    })
}

fn extension(path: &Path) -> Option<String> {
    Some(path.extension()?.to_str()?.to_lowercase())
}

/// A JSON object with a top-level `files` object.
fn looks_like_coveragepy(content: &[u8]) -> bool {
    match serde_json::from_slice::<Value>(content) {
        Ok(doc) => doc.get("files").is_some_and(Value::is_object),
        Err(e) => {
            tracing::debug!(error = %e, "json content did not parse");
            false
        }
    }
}
