use std::path::Path;

use tracing::{info, warn};

use crate::ExtractionReport;
use crate::error::ExtractError;
use crate::layout::{PageLayout, PdfDocument};
use crate::materialize::{TableMap, TableRecords, TableTransform, materialize};
use crate::model::LogicalTable;
use crate::options::ExtractOptions;
use crate::stitcher::{StitchOutcome, TableStitcher};
use crate::validator::TableValidator;
use crate::warning::{ExtractWarning, WarningCode};

/// Runs pages through table detection, the validator and the stitcher.
pub struct TableExtractor<V> {
    validator: V,
    options: ExtractOptions,
    transform: Option<TableTransform>,
}

impl<V: TableValidator> TableExtractor<V> {
    pub fn new(validator: V) -> Self {
        Self {
            validator,
            options: ExtractOptions::default(),
            transform: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Rewrites every table after materialization, e.g. to coerce or prune
    /// columns.
    #[must_use]
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(TableRecords) -> TableRecords + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn extract_tables(
        &self,
        input_pdf: &Path,
    ) -> Result<(Vec<LogicalTable>, ExtractionReport), ExtractError> {
        let document = PdfDocument::open(input_pdf)?;
        self.extract_tables_from_document(&document)
    }

    pub fn extract_tables_from_bytes(
        &self,
        input_pdf: &[u8],
    ) -> Result<(Vec<LogicalTable>, ExtractionReport), ExtractError> {
        let document = PdfDocument::from_bytes(input_pdf)?;
        self.extract_tables_from_document(&document)
    }

    pub fn extract_tables_from_document(
        &self,
        document: &PdfDocument,
    ) -> Result<(Vec<LogicalTable>, ExtractionReport), ExtractError> {
        let selection = self.options.pages.as_ref();
        if document.selected_page_count(selection) == 0 {
            return Err(ExtractError::NoPagesSelected);
        }

        let settings = &self.options.settings;
        let pages = document.pages(selection).map(|page| {
            page.map(|page| {
                page.with_text_tolerance(settings.text_x_tolerance, settings.text_y_tolerance)
            })
        });
        self.extract_tables_from_pages(pages)
    }

    /// Stitches tables from any page source. Pages are consumed in order and
    /// the first page error stops extraction.
    pub fn extract_tables_from_pages<P, I>(
        &self,
        pages: I,
    ) -> Result<(Vec<LogicalTable>, ExtractionReport), ExtractError>
    where
        P: PageLayout,
        I: IntoIterator<Item = Result<P, ExtractError>>,
    {
        self.options
            .settings
            .validate()
            .map_err(ExtractError::InvalidOption)?;

        let mut stitcher =
            TableStitcher::with_options(&self.validator, self.options.stitch.clone());
        let mut warnings = Vec::new();
        let mut page_count = 0;
        let mut detection_count = 0;

        for page in pages {
            let page = page?;
            page_count += 1;
            for region in page.find_tables(&self.options.settings) {
                detection_count += 1;
                if stitcher.push_region(&page, &region) == StitchOutcome::Orphaned {
                    let number = page.page_number();
                    let rows = region.extract().len();
                    warn!(page = number, rows, "dropping continuation fragment with no open table");
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::OrphanContinuation,
                            format!(
                                "continuation fragment of {rows} row(s) appeared before any \
                                 table start; dropped rather than exported as table 0"
                            ),
                        )
                        .with_page(number),
                    );
                }
            }
        }

        let tables = stitcher.finish();
        if tables.is_empty() {
            warnings.push(ExtractWarning::new(
                WarningCode::NoTablesDetected,
                "no tables were detected in the selected pages",
            ));
        }

        let report = ExtractionReport {
            page_count,
            table_count: tables.len(),
            row_count: tables.iter().map(|table| table.body().len()).sum(),
            warnings,
        };
        info!(
            pages = report.page_count,
            detections = detection_count,
            tables = report.table_count,
            rows = report.row_count,
            "extraction finished"
        );
        Ok((tables, report))
    }

    #[must_use]
    pub fn materialize(&self, tables: &[LogicalTable]) -> TableMap {
        materialize(tables, self.transform.as_ref())
    }

    pub fn extract_records(
        &self,
        input_pdf: &Path,
    ) -> Result<(TableMap, ExtractionReport), ExtractError> {
        let (tables, report) = self.extract_tables(input_pdf)?;
        Ok((self.materialize(&tables), report))
    }

    pub fn extract_records_from_bytes(
        &self,
        input_pdf: &[u8],
    ) -> Result<(TableMap, ExtractionReport), ExtractError> {
        let (tables, report) = self.extract_tables_from_bytes(input_pdf)?;
        Ok((self.materialize(&tables), report))
    }
}
