//! Per-document-family rules deciding which detections are tables and where
//! a new logical table begins.

use crate::heading::{HeadingMarkers, extract_heading};
use crate::layout::PageLayout;
use crate::model::{BoundingBox, TableGrid};

/// Policy consulted by the stitcher for every detection.
pub trait TableValidator {
    /// Whether a normalized grid is a target table at all.
    fn is_valid_table(&self, grid: &TableGrid) -> bool;

    /// Whether a valid grid opens a new logical table rather than continuing
    /// the current one.
    fn is_new_table(&self, grid: &TableGrid) -> bool;

    fn extract_table_heading(&self, page: &dyn PageLayout, bbox: &BoundingBox) -> String;
}

impl<V> TableValidator for &V
where
    V: TableValidator + ?Sized,
{
    fn is_valid_table(&self, grid: &TableGrid) -> bool {
        (**self).is_valid_table(grid)
    }

    fn is_new_table(&self, grid: &TableGrid) -> bool {
        (**self).is_new_table(grid)
    }

    fn extract_table_heading(&self, page: &dyn PageLayout, bbox: &BoundingBox) -> String {
        (**self).extract_table_heading(page, bbox)
    }
}

/// Marker-driven validator for listings whose first column numbers the
/// records of each table from 1.
///
/// A grid is valid when its header cell equals one of `sequence_columns` or
/// its first data row is numbered `new_table_marker`. A valid grid whose first data row
/// carries the marker starts a new table; any other valid grid continues the
/// current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPolicy {
    /// Accepted spellings of the numbering column's header label.
    pub sequence_columns: Vec<String>,
    pub new_table_marker: String,
    pub heading: HeadingMarkers,
}

impl MarkerPolicy {
    pub const DEFAULT_NEW_TABLE_MARKER: &'static str = "1";

    #[must_use]
    pub fn new(sequence_column: impl Into<String>, heading: HeadingMarkers) -> Self {
        Self {
            sequence_columns: vec![sequence_column.into()],
            new_table_marker: Self::DEFAULT_NEW_TABLE_MARKER.to_string(),
            heading,
        }
    }

    /// Accepts another spelling of the header label, e.g. the mis-decoded
    /// form a document's text layer actually carries.
    #[must_use]
    pub fn with_sequence_column(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !self.sequence_columns.contains(&label) {
            self.sequence_columns.push(label);
        }
        self
    }

    #[must_use]
    pub fn with_new_table_marker(mut self, marker: impl Into<String>) -> Self {
        self.new_table_marker = marker.into();
        self
    }

    /// Listings of people eligible for the 2024-2025 extraordinary judicial
    /// election, one table per court. Their text layer often spells the
    /// numbering header `NÃºm.` (UTF-8 read as Latin-1), so both forms count.
    #[must_use]
    pub fn juzgados() -> Self {
        Self::new(
            "Núm.",
            HeadingMarkers::new(
                "LISTADO DE PERSONAS ELEGIBLES PARA",
                "SUJETOS AL PROCESO ELECTORAL EXTRAORDINARIO 2024-2025",
            ),
        )
        .with_sequence_column("NÃºm.")
    }

    fn first_data_row_is_marked(&self, grid: &TableGrid) -> bool {
        grid.get(1)
            .and_then(|row| row.first())
            .is_some_and(|cell| *cell == self.new_table_marker)
    }
}

impl TableValidator for MarkerPolicy {
    fn is_valid_table(&self, grid: &TableGrid) -> bool {
        let Some(first_cell) = grid.first().and_then(|header| header.first()) else {
            return false;
        };
        self.sequence_columns.contains(first_cell) || self.first_data_row_is_marked(grid)
    }

    fn is_new_table(&self, grid: &TableGrid) -> bool {
        self.first_data_row_is_marked(grid)
    }

    fn extract_table_heading(&self, page: &dyn PageLayout, bbox: &BoundingBox) -> String {
        extract_heading(page, bbox, &self.heading)
    }
}
