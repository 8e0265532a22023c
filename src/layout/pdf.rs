use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ExtractError;
use crate::layout::content::{PageOrigin, interpret_content, page_fonts};
use crate::layout::lattice::{Edge, find_cell_groups};
use crate::layout::text::{Char, chars_within, layout_text};
use crate::layout::{PageLayout, TableRegion};
use crate::model::BoundingBox;
use crate::options::{PageSelection, TableSettings};

const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A PDF opened for table extraction.
pub struct PdfDocument {
    document: Document,
}

impl PdfDocument {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        Ok(Self {
            document: Document::load(path)?,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        Ok(Self {
            document: Document::load_mem(bytes)?,
        })
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Number of pages that `pages(selection)` will yield.
    #[must_use]
    pub fn selected_page_count(&self, selection: Option<&PageSelection>) -> usize {
        self.page_ids(selection).len()
    }

    /// Selected pages in document order. Each page is interpreted only when
    /// the iterator reaches it.
    pub fn pages<'a>(
        &'a self,
        selection: Option<&'a PageSelection>,
    ) -> impl Iterator<Item = Result<PdfPage, ExtractError>> + 'a {
        self.page_ids(selection)
            .into_iter()
            .map(move |(number, id)| self.load_page(number, id))
    }

    fn page_ids(&self, selection: Option<&PageSelection>) -> Vec<(u32, ObjectId)> {
        self.document
            .get_pages()
            .into_iter()
            .filter(|(number, _)| selection.is_none_or(|pages| pages.contains(*number)))
            .collect()
    }

    fn load_page(&self, number: u32, id: ObjectId) -> Result<PdfPage, ExtractError> {
        let [x0, y0, x1, y1] = self.media_box(id);
        let origin = PageOrigin {
            left: x0.min(x1),
            top: y0.max(y1),
        };

        let content =
            self.document
                .get_page_content(id)
                .map_err(|error| ExtractError::PdfContent {
                    page: number,
                    message: error.to_string(),
                })?;
        let fonts = page_fonts(&self.document, id);
        let objects = interpret_content(&content, &fonts, origin, number)?;
        debug!(
            page = number,
            chars = objects.chars.len(),
            edges = objects.edges.len(),
            "interpreted page content"
        );

        let settings = TableSettings::default();
        Ok(PdfPage {
            number,
            bbox: BoundingBox::new(0.0, 0.0, (x1 - x0).abs(), (y1 - y0).abs()),
            chars: objects.chars,
            edges: objects.edges,
            text_x_tolerance: settings.text_x_tolerance,
            text_y_tolerance: settings.text_y_tolerance,
        })
    }

    /// The page's `MediaBox`, inherited through the page tree when the page
    /// does not carry its own.
    fn media_box(&self, page_id: ObjectId) -> [f64; 4] {
        let mut current = Some(page_id);
        while let Some(id) = current {
            let Ok(node) = self.document.get_dictionary(id) else {
                break;
            };
            if let Some(rect) = node
                .get(b"MediaBox")
                .ok()
                .and_then(|object| self.rectangle(object))
            {
                return rect;
            }
            current = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
        LETTER
    }

    fn rectangle(&self, object: &Object) -> Option<[f64; 4]> {
        let (_, object) = self.document.dereference(object).ok()?;
        let values = object
            .as_array()
            .ok()?
            .iter()
            .map(|value| value.as_float().ok().map(f64::from))
            .collect::<Option<Vec<_>>>()?;
        values.try_into().ok()
    }
}

/// An interpreted PDF page: its glyphs and ruling lines in top-left page
/// coordinates.
#[derive(Debug, Clone)]
pub struct PdfPage {
    number: u32,
    bbox: BoundingBox,
    chars: Vec<Char>,
    edges: Vec<Edge>,
    text_x_tolerance: f64,
    text_y_tolerance: f64,
}

impl PdfPage {
    /// Tolerances used to group characters into words and lines when
    /// reading cell and heading text.
    #[must_use]
    pub fn with_text_tolerance(mut self, x_tolerance: f64, y_tolerance: f64) -> Self {
        self.text_x_tolerance = x_tolerance;
        self.text_y_tolerance = y_tolerance;
        self
    }

    /// All text on the page.
    #[must_use]
    pub fn text(&self) -> String {
        self.crop_text(&self.bbox)
    }
}

impl PageLayout for PdfPage {
    fn page_number(&self) -> u32 {
        self.number
    }

    fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    fn find_tables(&self, settings: &TableSettings) -> Vec<TableRegion> {
        find_cell_groups(&self.edges, settings)
            .into_iter()
            .map(|group| {
                let grid = group
                    .grid()
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|cell| {
                                cell.map(|bbox| {
                                    layout_text(
                                        &chars_within(&self.chars, &bbox),
                                        settings.text_x_tolerance,
                                        settings.text_y_tolerance,
                                    )
                                })
                            })
                            .collect()
                    })
                    .collect();
                TableRegion::new(group.bbox, grid)
            })
            .collect()
    }

    fn crop_text(&self, bbox: &BoundingBox) -> String {
        layout_text(
            &chars_within(&self.chars, bbox),
            self.text_x_tolerance,
            self.text_y_tolerance,
        )
    }
}
