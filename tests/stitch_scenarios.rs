mod common;

use common::FakePage;
use pdf_table_stitch::{
    BoundingBox, ExtractError, HeadingMarkers, MarkerPolicy, PageLayout, TableExtractor,
    TableGrid, TableValidator, heading_from_text,
};
use pretty_assertions::assert_eq;

fn policy() -> MarkerPolicy {
    MarkerPolicy::new("No", HeadingMarkers::new("START", "END"))
}

fn pages(pages: Vec<FakePage>) -> Vec<Result<FakePage, ExtractError>> {
    pages.into_iter().map(Ok).collect()
}

#[test]
fn continuation_merges_and_new_start_splits() {
    let input = pages(vec![
        FakePage::new(1, "START H1 END", &[&[&["No", "Name"], &["1", "Alice"]]]),
        FakePage::new(2, "", &[&[&["No", "Name"], &["2", "Bob"]]]),
        FakePage::new(3, "START H2 END", &[&[&["No", "Name"], &["1", "Carol"]]]),
    ]);
    let extractor = TableExtractor::new(policy());
    let (tables, _) = extractor
        .extract_tables_from_pages(input)
        .expect("extraction should succeed");

    let summary = tables
        .iter()
        .map(|table| (table.id, table.heading.as_str(), table.body().len()))
        .collect::<Vec<_>>();
    assert_eq!(summary, vec![(1, "H1", 2), (2, "H2", 1)]);

    let records = extractor.materialize(&tables);
    let first = records.get("1").expect("table 1 should exist");
    assert_eq!(first.headers, vec!["No", "Name", "heading"]);
    assert_eq!(
        first.rows,
        vec![vec!["1", "Alice", "H1"], vec!["2", "Bob", "H1"]]
    );
}

#[test]
fn continuation_with_mis_decoded_header_still_merges() {
    let heading = format!(
        "{}\nJUZGADO TERCERO\n{}",
        common::HEADING_START,
        common::HEADING_END
    );
    let input = pages(vec![
        FakePage::new(1, &heading, &[&[&["NÃºm.", "Nombre"], &["1", "Ana"]]]),
        FakePage::new(2, "", &[&[&["NÃºm.", "Nombre"], &["2", "Luis"]]]),
        FakePage::new(3, "", &[&[&["Núm.", "Nombre"], &["3", "Eva"]]]),
    ]);
    let (tables, report) = TableExtractor::new(MarkerPolicy::juzgados())
        .extract_tables_from_pages(input)
        .expect("extraction should succeed");

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].heading, "JUZGADO TERCERO");
    assert_eq!(
        tables[0].body(),
        [
            vec!["1".to_string(), "Ana".to_string()],
            vec!["2".to_string(), "Luis".to_string()],
            vec!["3".to_string(), "Eva".to_string()],
        ]
    );
    assert!(report.warnings.is_empty());
}

#[test]
fn empty_detection_before_start_leaves_no_trace() {
    let input = pages(vec![
        FakePage::new(1, "START ghost END", &[&[]]),
        FakePage::new(2, "START Real END", &[&[&["No", "Name"], &["1", "Alice"]]]),
    ]);
    let (tables, report) = TableExtractor::new(policy())
        .extract_tables_from_pages(input)
        .expect("extraction should succeed");

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].heading, "Real");
    assert!(report.warnings.is_empty());
}

#[test]
fn document_without_detections_yields_empty_mapping() {
    let input = pages(vec![FakePage::new(1, "just prose", &[])]);
    let extractor = TableExtractor::new(policy());
    let (tables, report) = extractor
        .extract_tables_from_pages(input)
        .expect("extraction should succeed");

    assert!(tables.is_empty());
    assert!(extractor.materialize(&tables).is_empty());
    assert_eq!(report.table_count, 0);
}

#[test]
fn several_regions_on_one_page_keep_region_order() {
    let input = pages(vec![FakePage::new(
        1,
        "START Same END",
        &[
            &[&["No", "Name"], &["1", "A"]],
            &[&["No", "Name"], &["2", "B"]],
            &[&["No", "Name"], &["1", "C"]],
        ],
    )]);
    let (tables, _) = TableExtractor::new(policy())
        .extract_tables_from_pages(input)
        .expect("extraction should succeed");

    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].body().len(), 2);
    assert_eq!(tables[1].body()[0][1], "C");
}

#[test]
fn heading_between_markers() {
    let text = ["noise", "START full heading text END", "trailer"].join("\n");
    let heading = heading_from_text(&text, &HeadingMarkers::new("START", "END"));
    assert_eq!(heading, "full heading text");
}

/// Tables whose first data row is flagged with a leading `*`.
struct StarredRows;

impl TableValidator for StarredRows {
    fn is_valid_table(&self, grid: &TableGrid) -> bool {
        grid.len() > 1
    }

    fn is_new_table(&self, grid: &TableGrid) -> bool {
        grid.get(1)
            .and_then(|row| row.first())
            .is_some_and(|cell| cell.starts_with('*'))
    }

    fn extract_table_heading(&self, page: &dyn PageLayout, bbox: &BoundingBox) -> String {
        page.crop_text(&bbox.region_above()).trim().to_string()
    }
}

#[test]
fn any_validator_can_drive_stitching() {
    let input = pages(vec![
        FakePage::new(1, " Section A ", &[&[&["Code", "Item"], &["*a1", "x"]]]),
        FakePage::new(2, "Section A (cont.)", &[&[&["Code", "Item"], &["a2", "y"]]]),
        FakePage::new(3, "Section B", &[&[&["Code", "Item"], &["*b1", "z"]]]),
    ]);
    let (tables, _) = TableExtractor::new(StarredRows)
        .extract_tables_from_pages(input)
        .expect("extraction should succeed");

    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].heading, "Section A");
    assert_eq!(tables[0].body().len(), 2);
    assert_eq!(tables[1].heading, "Section B");
}
