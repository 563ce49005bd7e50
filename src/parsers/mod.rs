pub mod cobertura;
pub mod coveragepy;
pub mod lcov;

use std::io::BufRead;

use crate::detect::Format;
use crate::error::Result;
use crate::report::CoverageReport;

/// Every format parser implements this trait.
///
/// Each parser applies its own rules for which fields are authoritative;
/// they share only the output model.
pub trait CoverageParser {
    /// The format this parser handles.
    fn format(&self) -> Format;

    /// Parse a whole report from a buffered reader.
    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<CoverageReport>;

    /// Parse the input bytes into our uniform coverage model.
    fn parse(&self, input: &[u8]) -> Result<CoverageReport> {
        self.parse_reader(&mut &*input)
    }
}

/// The parser for a given format.
pub fn parser_for(format: Format) -> &'static dyn CoverageParser {
    match format {
        Format::Lcov => &lcov::LcovParser,
        Format::CoveragePy => &coveragepy::CoveragePyParser,
        Format::Cobertura => &cobertura::CoberturaParser,
    }
}
