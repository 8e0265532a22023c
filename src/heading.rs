//! Heading lookup in the text printed above a table.

use crate::layout::PageLayout;
use crate::model::BoundingBox;

/// Text that opens and closes a heading block above a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMarkers {
    pub start: String,
    pub end: String,
}

impl HeadingMarkers {
    #[must_use]
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Returns the heading printed between the top of the page and `table_bbox`,
/// horizontally bounded by the table's left and right edges.
pub fn extract_heading<P>(page: &P, table_bbox: &BoundingBox, markers: &HeadingMarkers) -> String
where
    P: PageLayout + ?Sized,
{
    let above = page.crop_text(&table_bbox.region_above());
    heading_from_text(&above, markers)
}

/// Captures lines from the first one starting with the start marker up to and
/// including the first one containing the end marker, then strips both markers.
///
/// A line containing the end marker stops the scan even before capturing has
/// begun, in which case the heading is empty. While capturing, a line that is
/// the tail of an end marker wrapped over several lines stops it too. An empty
/// start marker captures from the first line; an empty end marker captures to
/// the end of the text.
#[must_use]
pub fn heading_from_text(text: &str, markers: &HeadingMarkers) -> String {
    let mut captured = Vec::new();
    let mut capturing = false;

    for line in text.split('\n') {
        if line.starts_with(markers.start.as_str()) {
            capturing = true;
        }
        if capturing {
            captured.push(line.trim());
        }
        if !markers.end.is_empty() && line.contains(markers.end.as_str()) {
            break;
        }
        if capturing && ends_wrapped_marker(line.trim(), &markers.end) {
            break;
        }
    }

    let joined = captured.join(" ");
    let mut heading = joined.as_str();
    if let Some(rest) = heading.strip_prefix(markers.start.as_str()) {
        heading = rest.trim_start();
    }
    if !markers.end.is_empty()
        && let Some(rest) = heading.strip_suffix(markers.end.as_str())
    {
        heading = rest.trim_end();
    }

    heading.replace('\n', " ").trim().to_string()
}

fn ends_wrapped_marker(line: &str, end: &str) -> bool {
    !line.is_empty() && line.len() < end.len() && end.ends_with(line)
}

#[cfg(test)]
mod tests {
    use super::{HeadingMarkers, heading_from_text};

    fn markers() -> HeadingMarkers {
        HeadingMarkers::new("START", "END")
    }

    #[test]
    fn extracts_single_line_heading_between_markers() {
        let text = "noise\nSTART full heading text END\ntrailer";
        assert_eq!(heading_from_text(text, &markers()), "full heading text");
    }

    #[test]
    fn joins_wrapped_heading_lines_with_spaces() {
        let text = "Page 3\nSTART JUZGADOS DE\n  DISTRITO EN MATERIA PENAL  \nEND\nfooter";
        assert_eq!(
            heading_from_text(text, &markers()),
            "JUZGADOS DE DISTRITO EN MATERIA PENAL"
        );
    }

    #[test]
    fn missing_start_marker_yields_empty_heading() {
        let text = "some text\nmore text";
        assert_eq!(heading_from_text(text, &markers()), "");
    }

    #[test]
    fn missing_end_marker_captures_to_end_of_region() {
        let text = "START first\nsecond\nthird";
        assert_eq!(heading_from_text(text, &markers()), "first second third");
    }

    #[test]
    fn end_marker_before_start_stops_scan() {
        let text = "previous block END\nSTART late heading END";
        assert_eq!(heading_from_text(text, &markers()), "");
    }

    #[test]
    fn end_marker_wrapped_over_two_lines_stops_capture() {
        let markers = HeadingMarkers::new(
            "LISTADO DE PERSONAS ELEGIBLES PARA",
            "SUJETOS AL PROCESO ELECTORAL EXTRAORDINARIO 2024-2025",
        );
        let text = "LISTADO DE PERSONAS ELEGIBLES PARA\n\
                    JUZGADO CUARTO DE DISTRITO\n\
                    SUJETOS AL PROCESO ELECTORAL\n\
                    EXTRAORDINARIO 2024-2025\n\
                    Relación de aspirantes";
        assert_eq!(heading_from_text(text, &markers), "JUZGADO CUARTO DE DISTRITO");
    }

    #[test]
    fn marker_tail_before_start_does_not_stop_scan() {
        let text = "ND\nSTART heading END";
        assert_eq!(heading_from_text(text, &markers()), "heading");
    }

    #[test]
    fn only_first_heading_block_is_used() {
        let text = "START one END\nSTART two END";
        assert_eq!(heading_from_text(text, &markers()), "one");
    }

    #[test]
    fn empty_text_yields_empty_heading() {
        assert_eq!(heading_from_text("", &markers()), "");
    }
}
