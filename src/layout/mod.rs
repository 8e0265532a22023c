//! The page-geometry boundary: where tables sit on a page and what text
//! surrounds them.

mod cmap;
mod content;
mod decode;
mod lattice;
mod pdf;
mod text;

pub use pdf::{PdfDocument, PdfPage};

use crate::model::{BoundingBox, RawTableGrid};
use crate::options::TableSettings;

/// A single page as seen by the stitcher.
pub trait PageLayout {
    /// 1-based position of the page in its document.
    fn page_number(&self) -> u32;

    fn bbox(&self) -> BoundingBox;

    /// Table regions on the page, top to bottom then left to right.
    fn find_tables(&self, settings: &TableSettings) -> Vec<TableRegion>;

    /// Text inside `bbox`, lines top to bottom joined with `\n`.
    fn crop_text(&self, bbox: &BoundingBox) -> String;
}

/// One table detected on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRegion {
    pub bbox: BoundingBox,
    grid: RawTableGrid,
}

impl TableRegion {
    #[must_use]
    pub fn new(bbox: BoundingBox, grid: RawTableGrid) -> Self {
        Self { bbox, grid }
    }

    #[must_use]
    pub fn extract(&self) -> &RawTableGrid {
        &self.grid
    }

    #[must_use]
    pub fn into_grid(self) -> RawTableGrid {
        self.grid
    }
}
