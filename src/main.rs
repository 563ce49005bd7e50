use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use covsum::cli::cmd_analyze;
use covsum::logging::init_tracing;
use covsum::render::{OutputFormat, RenderOptions, SortKey};

/// covsum — Parse and summarize LCOV, coverage.py JSON and Cobertura reports.
#[derive(Parser)]
#[command(name = "covsum", version, about)]
struct Cli {
    /// Path to the coverage report file.
    report_file: PathBuf,

    /// Report format: auto, lcov, coverage-py, cobertura.
    #[arg(long, default_value = "auto")]
    format: String,

    /// Warn when overall coverage is below this percentage.
    #[arg(long, default_value_t = 80.0)]
    threshold: f64,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Mark files whose line coverage is below this percentage.
    #[arg(long, default_value_t = 70.0)]
    min_line_coverage: f64,

    /// Exclude files whose name matches this regex.
    #[arg(long)]
    exclude_pattern: Option<String>,

    /// Sort files in the text output.
    #[arg(long, value_enum, default_value_t = SortKey::Coverage)]
    sort: SortKey,

    /// Log more to stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = RenderOptions {
        threshold: cli.threshold,
        min_line_coverage: cli.min_line_coverage,
        sort: cli.sort,
    };
    let out = cmd_analyze(
        &cli.report_file,
        &cli.format,
        cli.exclude_pattern.as_deref(),
        cli.output,
        &options,
    )?;
    print!("{out}");
    Ok(())
}
