use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pdf_table_stitch::{
    EdgeStrategy, ExtractOptions, ExtractionReport, HeadingMarkers, MarkerPolicy, PageSelection,
    StitchOptions, TableExtractor, TableMap, TableSettings, render_summary, render_table,
    write_tables_to_dir,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "tablestitch",
    version,
    about = "Stitch tables split across PDF pages and export one CSV per table"
)]
struct Cli {
    /// Input PDF path.
    input: PathBuf,

    /// Directory receiving one <table>.csv per extracted table.
    output_dir: Option<PathBuf>,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<PageSelection>,

    /// How extracted tables are printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Header label of the numbering column that identifies target tables.
    /// Repeat to accept several spellings; replaces the preset labels.
    #[arg(long)]
    sequence_column: Vec<String>,

    /// Text opening the heading block above a table.
    #[arg(long)]
    heading_start: Option<String>,

    /// Text closing the heading block above a table.
    #[arg(long)]
    heading_end: Option<String>,

    /// First-column value of the first data row of a new table.
    #[arg(long, default_value = MarkerPolicy::DEFAULT_NEW_TABLE_MARKER)]
    new_table_marker: String,

    /// Rows dropped from the top of every continuation fragment.
    #[arg(long, default_value_t = 1)]
    continuation_header_rows: usize,

    /// Ruling lines used to find table borders (lines or lines-strict).
    #[arg(long, default_value = "lines")]
    strategy: EdgeStrategy,

    /// Distance within which parallel ruling lines are merged.
    #[arg(long, default_value_t = 3.0)]
    snap_tolerance: f64,

    /// Gap within which collinear ruling segments are joined.
    #[arg(long, default_value_t = 3.0)]
    join_tolerance: f64,

    /// Shortest ruling line considered a table border.
    #[arg(long, default_value_t = 50.0)]
    edge_min_length: f64,

    /// Enable debug logging and detailed warnings.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_policy(cli: &Cli) -> MarkerPolicy {
    let preset = MarkerPolicy::juzgados();
    MarkerPolicy {
        sequence_columns: if cli.sequence_column.is_empty() {
            preset.sequence_columns
        } else {
            cli.sequence_column.clone()
        },
        new_table_marker: cli.new_table_marker.clone(),
        heading: HeadingMarkers::new(
            cli.heading_start.clone().unwrap_or(preset.heading.start),
            cli.heading_end.clone().unwrap_or(preset.heading.end),
        ),
    }
}

fn parse_options(cli: &Cli) -> Result<ExtractOptions> {
    if !cli.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    Ok(ExtractOptions {
        pages: cli.pages.clone(),
        settings: TableSettings {
            vertical_strategy: cli.strategy,
            horizontal_strategy: cli.strategy,
            snap_tolerance: cli.snap_tolerance,
            join_tolerance: cli.join_tolerance,
            edge_min_length: cli.edge_min_length,
            ..TableSettings::default()
        },
        stitch: StitchOptions {
            continuation_header_rows: cli.continuation_header_rows,
        },
        delimiter: cli.delimiter as u8,
    })
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?}: {}",
                warning.code, warning.page, warning.message
            );
        }
    }
}

fn print_tables(tables: &TableMap, report: &ExtractionReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "tables": tables, "report": report });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).context("failed to encode JSON output")?
            );
        }
        OutputFormat::Text => {
            for records in tables {
                println!("{}", render_table(records));
            }
            print!("{}", render_summary(tables));
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<ExtractionReport> {
    let options = parse_options(cli)?;
    let delimiter = options.delimiter;
    let extractor = TableExtractor::new(parse_policy(cli)).with_options(options);
    let (tables, report) = extractor
        .extract_records(&cli.input)
        .with_context(|| format!("failed to extract tables from '{}'", cli.input.display()))?;

    if let Some(dir) = &cli.output_dir {
        let written = write_tables_to_dir(dir, &tables, delimiter)
            .with_context(|| format!("failed to write CSV files to '{}'", dir.display()))?;
        tracing::info!(files = written.len(), dir = %dir.display(), "wrote table csv files");
    }

    print_tables(&tables, &report, cli.format)?;
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pdf_table_stitch=debug,tablestitch=debug"
    } else {
        "pdf_table_stitch=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run(&cli) {
        Ok(report) => {
            log_report(&report, cli.verbose);
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
