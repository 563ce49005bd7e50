/// Parser for Cobertura XML coverage reports.
///
/// Cobertura XML structure:
///   <coverage>
///     <sources><source>...</source></sources>
///     <packages>
///       <package name="...">
///         <classes>
///           <class name="..." filename="..." line-rate="..." branch-rate="..." complexity="...">
///             <methods>
///               <method name="..." ... line-rate="...">
///                 <lines><line number="..." hits="..." .../></lines>
///               </method>
///             </methods>
///             <lines>
///               <line number="..." hits="..." branch="true|false"
///                     condition-coverage="50% (1/2)" />
///             </lines>
///           </class>
///         </classes>
///       </package>
///     </packages>
///   </coverage>
///
/// Each class carries two signals. The `line-rate` attribute is taken as the
/// file's line coverage; the nested `<line>` elements give the counts.
use std::collections::HashMap;
use std::io::BufRead;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::CoverageParser;
use crate::detect::Format;
use crate::error::{CovsumError, Result};
use crate::model::FileCoverage;
use crate::report::CoverageReport;

pub struct CoberturaParser;

impl CoverageParser for CoberturaParser {
    fn format(&self) -> Format {
        Format::Cobertura
    }

    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<CoverageReport> {
        parse_cobertura(reader)
    }
}

/// A `<class>` element being read.
struct ClassState {
    filename: String,
    line_rate: f64,
    branch_rate: f64,
    complexity: Option<String>,
    /// Max hits per line number. Lines repeated under `<method>` and
    /// `<class>` are counted once.
    hits_by_number: HashMap<u32, u64>,
    /// `<line>` elements without a usable `number`.
    unnumbered_total: u64,
    unnumbered_covered: u64,
}

impl ClassState {
    fn open(e: &BytesStart) -> Result<Self> {
        let attrs = attr_map(e);
        let filename = attrs.get("filename").cloned().unwrap_or_default();
        let line_rate = parse_rate(&attrs, "line-rate", &filename)?;
        let branch_rate = parse_rate(&attrs, "branch-rate", &filename)?;
        Ok(Self {
            complexity: attrs.get("complexity").cloned(),
            filename,
            line_rate,
            branch_rate,
            hits_by_number: HashMap::new(),
            unnumbered_total: 0,
            unnumbered_covered: 0,
        })
    }

    fn add_line(&mut self, e: &BytesStart) -> Result<()> {
        let attrs = attr_map(e);
        let hits = match attrs.get("hits") {
            Some(h) => h.trim().parse::<i64>().map_err(|_| {
                CovsumError::Parse(format!(
                    "invalid hits value '{h}' in class '{}'",
                    self.filename
                ))
            })?,
            None => 0,
        };
        let hits = hits.max(0) as u64;

        match attrs.get("number").and_then(|n| n.trim().parse::<u32>().ok()) {
            Some(number) => {
                let entry = self.hits_by_number.entry(number).or_insert(0);
                *entry = (*entry).max(hits);
            }
            None => {
                self.unnumbered_total += 1;
                if hits > 0 {
                    self.unnumbered_covered += 1;
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<FileCoverage> {
        let counted = self.hits_by_number.len() as u64 + self.unnumbered_total;
        let lines_covered = self.hits_by_number.values().filter(|&&h| h > 0).count() as u64
            + self.unnumbered_covered;

        let lines_total = if counted > 0 {
            counted
        } else {
            // No <line> children: use `complexity` as a stand-in total so
            // the file never reports an undefined line count.
            match self.complexity.as_deref() {
                Some(c) => parse_complexity(c, &self.filename)?,
                None => 1,
            }
        };

        let branch_coverage = (self.branch_rate > 0.0).then(|| self.branch_rate * 100.0);

        Ok(FileCoverage {
            filename: self.filename,
            line_coverage: self.line_rate * 100.0,
            branch_coverage,
            function_coverage: None,
            lines_covered,
            lines_total,
        })
    }
}

fn parse_cobertura(input: &mut dyn BufRead) -> Result<CoverageReport> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut report = CoverageReport::new();
    let mut buf = Vec::new();

    // State tracking
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut package_depth = 0usize;
    let mut current_class: Option<ClassState> = None;

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(e) => {
                return Err(CovsumError::Xml {
                    source: e,
                    position: reader.buffer_position(),
                })
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                saw_root = true;
                if is_start_event {
                    depth += 1;
                }

                match e.local_name().as_ref() {
                    b"package" => {
                        if is_start_event {
                            package_depth += 1;
                        }
                    }
                    b"class" if package_depth > 0 => {
                        let class = ClassState::open(e)?;
                        if is_start_event {
                            current_class = Some(class);
                        } else {
                            // Self-closing <class/> has no lines and no End event.
                            insert_class(&mut report, class)?;
                        }
                    }
                    b"line" => {
                        if let Some(class) = current_class.as_mut() {
                            class.add_line(e)?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"package" => {
                        package_depth = package_depth.saturating_sub(1);
                    }
                    b"class" => {
                        if let Some(class) = current_class.take() {
                            insert_class(&mut report, class)?;
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(CovsumError::Parse(
            "Cobertura XML has no root element".to_string(),
        ));
    }
    if depth > 0 {
        return Err(CovsumError::Parse(format!(
            "Cobertura XML ended with {depth} unclosed element(s)"
        )));
    }

    tracing::info!(files = report.len(), "parsed cobertura report");
    Ok(report)
}

fn insert_class(report: &mut CoverageReport, class: ClassState) -> Result<()> {
    let file = class.finish()?;
    tracing::debug!(
        filename = %file.filename,
        lines_total = file.lines_total,
        lines_covered = file.lines_covered,
        "read cobertura class"
    );
    report.insert(file);
    Ok(())
}

/// `line-rate` / `branch-rate` as a fraction; absent means 0.
fn parse_rate(attrs: &HashMap<String, String>, key: &str, filename: &str) -> Result<f64> {
    match attrs.get(key) {
        Some(v) => v.trim().parse::<f64>().map_err(|_| {
            CovsumError::Parse(format!("invalid {key} '{v}' in class '{filename}'"))
        }),
        None => Ok(0.0),
    }
}

/// Integral part of a non-negative `complexity` attribute.
fn parse_complexity(value: &str, filename: &str) -> Result<u64> {
    match value.trim().parse::<f64>() {
        Ok(c) if c.is_finite() && c >= 0.0 => Ok(c.trunc() as u64),
        _ => Err(CovsumError::Parse(format!(
            "invalid complexity '{value}' in class '{filename}'"
        ))),
    }
}

/// Extract attributes from an XML element into a HashMap.
fn attr_map(e: &BytesStart) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| {
            let attr = a.ok()?;
            let key = str::from_utf8(attr.key.local_name().into_inner())
                .ok()?
                .to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}
