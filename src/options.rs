use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ExtractError;

/// Which ruling lines may bound a table along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeStrategy {
    /// Stroked lines and the sides of drawn rectangles.
    #[default]
    Lines,
    /// Stroked lines only.
    LinesStrict,
}

impl FromStr for EdgeStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lines" => Ok(Self::Lines),
            "lines_strict" => Ok(Self::LinesStrict),
            other => Err(format!(
                "unknown edge strategy '{other}', expected lines or lines_strict"
            )),
        }
    }
}

/// Knobs handed unchanged to the layout engine when it looks for tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSettings {
    pub vertical_strategy: EdgeStrategy,
    pub horizontal_strategy: EdgeStrategy,
    pub snap_tolerance: f64,
    pub join_tolerance: f64,
    /// Minimum length of a ruling after snapping and joining.
    pub edge_min_length: f64,
    /// Minimum length of a raw segment before snapping and joining. Tables
    /// drawn cell by cell are made of segments shorter than `edge_min_length`.
    pub edge_min_length_prefilter: f64,
    pub intersection_tolerance: f64,
    pub text_x_tolerance: f64,
    pub text_y_tolerance: f64,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            vertical_strategy: EdgeStrategy::Lines,
            horizontal_strategy: EdgeStrategy::Lines,
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length: 50.0,
            edge_min_length_prefilter: 1.0,
            intersection_tolerance: 3.0,
            text_x_tolerance: 3.0,
            text_y_tolerance: 3.0,
        }
    }
}

impl TableSettings {
    pub(crate) fn validate(&self) -> Result<(), String> {
        let tolerances = [
            ("snap_tolerance", self.snap_tolerance),
            ("join_tolerance", self.join_tolerance),
            ("edge_min_length", self.edge_min_length),
            ("edge_min_length_prefilter", self.edge_min_length_prefilter),
            ("intersection_tolerance", self.intersection_tolerance),
            ("text_x_tolerance", self.text_x_tolerance),
            ("text_y_tolerance", self.text_y_tolerance),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchOptions {
    /// Rows dropped from the top of every continuation fragment. Layout
    /// engines re-detect the header row on each page, so the default is 1.
    pub continuation_header_rows: usize,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            continuation_header_rows: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    pub fn parse(value: &str) -> Result<Self, ExtractError> {
        value.parse().map_err(ExtractError::InvalidPageSelection)
    }

    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start = parse_page_number(start)?;
                let end = parse_page_number(end)?;
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                pages.insert(parse_page_number(token)?);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

fn parse_page_number(token: &str) -> Result<u32, String> {
    let page: u32 = token
        .trim()
        .parse()
        .map_err(|_| format!("invalid page number: '{}'", token.trim()))?;
    if page == 0 {
        return Err("pages are 1-based".to_string());
    }
    Ok(page)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub settings: TableSettings,
    pub stitch: StitchOptions,
    pub delimiter: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            settings: TableSettings::default(),
            stitch: StitchOptions::default(),
            delimiter: b',',
        }
    }
}
