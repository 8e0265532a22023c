mod csv_out;
mod error;
mod extractor;
mod heading;
mod layout;
mod materialize;
mod model;
mod options;
mod stitcher;
mod summary;
mod validator;
mod warning;

use serde::Serialize;

pub use csv_out::{write_table_csv, write_table_csv_to_string, write_tables_to_dir};
pub use error::ExtractError;
pub use extractor::TableExtractor;
pub use heading::{HeadingMarkers, extract_heading, heading_from_text};
pub use layout::{PageLayout, PdfDocument, PdfPage, TableRegion};
pub use materialize::{
    HEADING_COLUMN, TableMap, TableRecords, TableTransform, materialize, materialize_table,
};
pub use model::{BoundingBox, LogicalTable, RawCell, RawRow, RawTableGrid, Row, TableGrid};
pub use options::{EdgeStrategy, ExtractOptions, PageSelection, StitchOptions, TableSettings};
pub use stitcher::{StitchOutcome, TableStitcher, normalize_grid, stitch};
pub use summary::{render_grid, render_summary, render_table};
pub use validator::{MarkerPolicy, TableValidator};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub page_count: usize,
    pub table_count: usize,
    pub row_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

/// Extracts and materializes every table of a PDF with the given policy.
pub fn extract_pdf_tables(
    input_pdf: &std::path::Path,
    policy: MarkerPolicy,
    options: ExtractOptions,
) -> Result<(TableMap, ExtractionReport), ExtractError> {
    TableExtractor::new(policy)
        .with_options(options)
        .extract_records(input_pdf)
}

/// Extracts tables from PDF bytes and writes one CSV per table into
/// `output_dir`.
pub fn extract_pdf_bytes_to_csv_dir(
    input_pdf: &[u8],
    output_dir: &std::path::Path,
    policy: MarkerPolicy,
    options: ExtractOptions,
) -> Result<(TableMap, ExtractionReport), ExtractError> {
    let delimiter = options.delimiter;
    let (tables, report) = TableExtractor::new(policy)
        .with_options(options)
        .extract_records_from_bytes(input_pdf)?;
    write_tables_to_dir(output_dir, &tables, delimiter)?;
    Ok((tables, report))
}

/// Pretty JSON object mapping table keys to their records.
pub fn tables_to_json(tables: &TableMap) -> Result<String, ExtractError> {
    Ok(serde_json::to_string_pretty(tables)?)
}
