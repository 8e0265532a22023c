//! Merges per-page table detections into logical tables.
//!
//! Detections must be pushed in page order, and in region order within a
//! page: whether a fragment continues a table depends on the fragment before
//! it.

use tracing::debug;

use crate::layout::{PageLayout, TableRegion};
use crate::model::{LogicalTable, RawTableGrid, TableGrid};
use crate::options::StitchOptions;
use crate::validator::TableValidator;

/// What the stitcher did with one detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchOutcome {
    /// Empty or rejected by the validator.
    Skipped,
    /// Opened the table with this id, sealing the previous one.
    Started(u32),
    /// Rows were appended to the open table with this id.
    Continued(u32),
    /// A continuation arrived before any table was opened and was dropped.
    Orphaned,
}

/// Replaces line breaks inside cells with spaces and absent cells with `""`.
#[must_use]
pub fn normalize_grid(grid: &RawTableGrid) -> TableGrid {
    grid.iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_deref().unwrap_or_default().replace('\n', " "))
                .collect()
        })
        .collect()
}

pub struct TableStitcher<V> {
    validator: V,
    options: StitchOptions,
    finished: Vec<LogicalTable>,
    current: Option<LogicalTable>,
    last_id: u32,
}

impl<V: TableValidator> TableStitcher<V> {
    pub fn new(validator: V) -> Self {
        Self::with_options(validator, StitchOptions::default())
    }

    pub fn with_options(validator: V, options: StitchOptions) -> Self {
        Self {
            validator,
            options,
            finished: Vec::new(),
            current: None,
            last_id: 0,
        }
    }

    /// Feeds one detection whose heading is already known.
    pub fn push(&mut self, grid: &RawTableGrid, heading: &str) -> StitchOutcome {
        self.accept(normalize_grid(grid), |_| heading.to_string())
    }

    /// Feeds one detected region, reading its heading from the page only
    /// when the region opens a new table.
    pub fn push_region(&mut self, page: &dyn PageLayout, region: &TableRegion) -> StitchOutcome {
        self.accept(normalize_grid(region.extract()), |validator| {
            validator.extract_table_heading(page, &region.bbox)
        })
    }

    fn accept<H>(&mut self, grid: TableGrid, heading: H) -> StitchOutcome
    where
        H: FnOnce(&V) -> String,
    {
        if grid.is_empty() || !self.validator.is_valid_table(&grid) {
            debug!(rows = grid.len(), "skipping detection that is not a target table");
            return StitchOutcome::Skipped;
        }

        if self.validator.is_new_table(&grid) {
            let heading = heading(&self.validator);
            self.seal_current();
            self.last_id += 1;
            debug!(id = self.last_id, rows = grid.len(), heading = %heading, "starting table");
            self.current = Some(LogicalTable {
                id: self.last_id,
                heading,
                rows: grid,
            });
            return StitchOutcome::Started(self.last_id);
        }

        let Some(current) = self.current.as_mut() else {
            debug!(rows = grid.len(), "continuation fragment without an open table");
            return StitchOutcome::Orphaned;
        };
        let before = current.rows.len();
        current
            .rows
            .extend(grid.into_iter().skip(self.options.continuation_header_rows));
        debug!(
            id = current.id,
            appended = current.rows.len() - before,
            "continuing table"
        );
        StitchOutcome::Continued(current.id)
    }

    fn seal_current(&mut self) {
        if let Some(table) = self.current.take() {
            debug!(id = table.id, rows = table.rows.len(), "sealing table");
            self.finished.push(table);
        }
    }

    /// Tables sealed so far, excluding the one still open.
    #[must_use]
    pub fn finished(&self) -> &[LogicalTable] {
        &self.finished
    }

    #[must_use]
    pub fn current(&self) -> Option<&LogicalTable> {
        self.current.as_ref()
    }

    /// Seals the open table and returns every table in start order.
    pub fn finish(mut self) -> Vec<LogicalTable> {
        self.seal_current();
        self.finished
    }
}

/// Stitches an in-memory sequence of `(grid, heading)` detections.
pub fn stitch<V, I>(validator: V, options: StitchOptions, detections: I) -> Vec<LogicalTable>
where
    V: TableValidator,
    I: IntoIterator<Item = (RawTableGrid, String)>,
{
    let mut stitcher = TableStitcher::with_options(validator, options);
    for (grid, heading) in detections {
        stitcher.push(&grid, &heading);
    }
    stitcher.finish()
}
