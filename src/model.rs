use serde::Serialize;

/// A cell as reported by the layout engine. `None` means no cell exists at
/// that grid position, `Some("")` means a cell without text.
pub type RawCell = Option<String>;
pub type RawRow = Vec<RawCell>;
pub type RawTableGrid = Vec<RawRow>;

pub type Row = Vec<String>;
pub type TableGrid = Vec<Row>;

/// Rectangle in page space with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// The band between the top of the page and this box, spanning the same
    /// horizontal extent. Headings are searched for in this region.
    #[must_use]
    pub fn region_above(&self) -> Self {
        Self::new(self.left, 0.0, self.right, self.top)
    }
}

/// A table after all of its page fragments have been merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalTable {
    pub id: u32,
    pub heading: String,
    pub rows: TableGrid,
}

impl LogicalTable {
    #[must_use]
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    #[must_use]
    pub fn body(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or_default()
    }

    #[must_use]
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundingBox, LogicalTable};

    #[test]
    fn region_above_spans_from_page_top() {
        let bbox = BoundingBox::new(40.0, 120.0, 400.0, 300.0);
        assert_eq!(bbox.region_above(), BoundingBox::new(40.0, 0.0, 400.0, 120.0));
    }

    #[test]
    fn union_covers_both_boxes() {
        let a = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let b = BoundingBox::new(5.0, 25.0, 35.0, 45.0);
        assert_eq!(a.union(&b), BoundingBox::new(5.0, 20.0, 35.0, 45.0));
    }

    #[test]
    fn body_excludes_header_row() {
        let table = LogicalTable {
            id: 3,
            heading: String::new(),
            rows: vec![vec!["No".into()], vec!["1".into()], vec!["2".into()]],
        };
        assert_eq!(table.header(), Some(&vec!["No".to_string()]));
        assert_eq!(table.body().len(), 2);
        assert_eq!(table.key(), "3");
    }

    #[test]
    fn body_of_empty_table_is_empty() {
        let table = LogicalTable {
            id: 1,
            heading: String::new(),
            rows: Vec::new(),
        };
        assert!(table.header().is_none());
        assert!(table.body().is_empty());
    }
}
