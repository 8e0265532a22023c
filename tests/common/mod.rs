#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use pdf_table_stitch::{BoundingBox, PageLayout, TableRegion, TableSettings};

pub const HEADING_START: &str = "LISTADO DE PERSONAS ELEGIBLES PARA";
pub const HEADING_END: &str = "SUJETOS AL PROCESO ELECTORAL EXTRAORDINARIO 2024-2025";

const TABLE_LEFT: i64 = 50;
const TABLE_WIDTH: i64 = 500;
const TABLE_TOP: i64 = 740;
const ROW_HEIGHT: i64 = 30;
const FONT_SIZE: i64 = 10;

/// One page: heading lines printed above an optional ruled table.
pub struct FixturePage {
    pub heading: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn page(heading: &[&str], rows: &[&[&str]]) -> FixturePage {
    FixturePage {
        heading: heading.iter().map(ToString::to_string).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect(),
    }
}

/// Heading block in the form used by the judicial listings.
pub fn listing_heading(court: &str) -> Vec<String> {
    vec![
        HEADING_START.to_string(),
        court.to_string(),
        HEADING_END.to_string(),
    ]
}

fn int(value: i64) -> Object {
    Object::Integer(value)
}

/// How fixture text is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFont {
    /// Courier with `WinAnsiEncoding`.
    WinAnsi,
    /// A Type0 font with `Identity-H` codes numbered in order of first use, so
    /// text is only readable through its `/ToUnicode` map.
    Identity,
}

/// Turns fixture strings into string operands for the chosen font.
struct TextEncoder {
    glyphs: Option<BTreeMap<char, u16>>,
}

impl TextEncoder {
    fn new(font: FixtureFont, pages: &[FixturePage]) -> Self {
        if font == FixtureFont::WinAnsi {
            return Self { glyphs: None };
        }
        let mut glyphs = BTreeMap::new();
        let lines = pages
            .iter()
            .flat_map(|page| page.heading.iter().chain(page.rows.iter().flatten()));
        for ch in lines.flat_map(|line| line.chars()) {
            let next = u16::try_from(glyphs.len() + 1).unwrap_or(u16::MAX);
            glyphs.entry(ch).or_insert(next);
        }
        Self {
            glyphs: Some(glyphs),
        }
    }

    fn encode(&self, value: &str) -> Object {
        match &self.glyphs {
            None => {
                let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(value);
                Object::String(bytes.into_owned(), StringFormat::Literal)
            }
            Some(glyphs) => {
                let bytes = value
                    .chars()
                    .flat_map(|ch| glyphs.get(&ch).copied().unwrap_or(0).to_be_bytes())
                    .collect();
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }

    fn to_unicode_cmap(&self) -> Option<Vec<u8>> {
        let glyphs = self.glyphs.as_ref()?;
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
             /CMapName /Adobe-Identity-UCS def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        let _ = writeln!(cmap, "{} beginbfchar", glyphs.len());
        for (ch, code) in glyphs {
            let _ = writeln!(cmap, "<{code:04X}> <{:04X}>", u32::from(*ch));
        }
        cmap.push_str("endbfchar\nendcmap\nend\nend\n");
        Some(cmap.into_bytes())
    }
}

fn show_line(
    operations: &mut Vec<Operation>,
    encoder: &TextEncoder,
    (x, y): (i64, i64),
    value: &str,
) {
    operations.extend([
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), int(FONT_SIZE)]),
        Operation::new("Td", vec![int(x), int(y)]),
        Operation::new("Tj", vec![encoder.encode(value)]),
        Operation::new("ET", vec![]),
    ]);
}

fn stroke(operations: &mut Vec<Operation>, from: (i64, i64), to: (i64, i64)) {
    operations.extend([
        Operation::new("m", vec![int(from.0), int(from.1)]),
        Operation::new("l", vec![int(to.0), int(to.1)]),
        Operation::new("S", vec![]),
    ]);
}

fn page_operations(page: &FixturePage, encoder: &TextEncoder) -> Vec<Operation> {
    let mut operations = Vec::new();

    for (index, line) in (0_i64..).zip(&page.heading) {
        show_line(&mut operations, encoder, (TABLE_LEFT + 10, 800 - index * 14), line);
    }

    let columns = page.rows.iter().map(Vec::len).max().unwrap_or(0);
    if page.rows.is_empty() || columns == 0 {
        return operations;
    }
    let columns = i64::try_from(columns).unwrap_or(1);
    let row_count = i64::try_from(page.rows.len()).unwrap_or(1);
    let column_width = TABLE_WIDTH / columns;
    let right = TABLE_LEFT + column_width * columns;
    let bottom = TABLE_TOP - ROW_HEIGHT * row_count;

    for row in 0..=row_count {
        let y = TABLE_TOP - ROW_HEIGHT * row;
        stroke(&mut operations, (TABLE_LEFT, y), (right, y));
    }
    for column in 0..=columns {
        let x = TABLE_LEFT + column_width * column;
        stroke(&mut operations, (x, TABLE_TOP), (x, bottom));
    }

    for (row_index, row) in (0_i64..).zip(&page.rows) {
        for (column_index, cell) in (0_i64..).zip(row) {
            if cell.is_empty() {
                continue;
            }
            show_line(
                &mut operations,
                encoder,
                (
                    TABLE_LEFT + column_width * column_index + 4,
                    TABLE_TOP - ROW_HEIGHT * row_index - 20,
                ),
                cell,
            );
        }
    }

    operations
}

fn build_document(
    pages: &[FixturePage],
    font: FixtureFont,
) -> Result<Document, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");
    let encoder = TextEncoder::new(font, pages);

    let pages_id = doc.new_object_id();
    let font_id = match encoder.to_unicode_cmap() {
        None => doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        }),
        Some(cmap) => {
            let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, cmap));
            let cid_font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "CIDFontType2",
                "BaseFont" => "ABCDEF+LiberationMono",
                "DW" => int(600),
                "CIDToGIDMap" => "Identity",
            });
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "ABCDEF+LiberationMono",
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::Reference(cid_font_id)],
                "ToUnicode" => to_unicode_id,
            })
        }
    };
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for page in pages {
        let content = Content {
            operations: page_operations(page, &encoder),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

pub fn create_ruled_pdf(
    path: &Path,
    pages: &[FixturePage],
) -> Result<(), Box<dyn std::error::Error>> {
    build_document(pages, FixtureFont::WinAnsi)?.save(path)?;
    Ok(())
}

pub fn ruled_pdf_bytes(pages: &[FixturePage]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    ruled_pdf_bytes_with_font(pages, FixtureFont::WinAnsi)
}

pub fn ruled_pdf_bytes_with_font(
    pages: &[FixturePage],
    font: FixtureFont,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut bytes = Vec::new();
    build_document(pages, font)?.save_to(&mut bytes)?;
    Ok(bytes)
}

/// A three-page listing: one court spanning two pages, then a second court.
pub fn two_court_listing() -> Vec<FixturePage> {
    vec![
        FixturePage {
            heading: listing_heading("JUZGADO PRIMERO DE DISTRITO"),
            ..page(
                &[],
                &[&["Núm.", "Nombre"], &["1", "Ana Ruiz"], &["2", "Luis Soto"]],
            )
        },
        page(&["Continuación"], &[&["Núm.", "Nombre"], &["3", "Eva Paz"]]),
        FixturePage {
            heading: listing_heading("JUZGADO SEGUNDO DE DISTRITO"),
            ..page(&[], &[&["Núm.", "Nombre"], &["1", "Mar Gil"]])
        },
    ]
}

/// In-memory page with fixed detections and fixed text above every table.
pub struct FakePage {
    pub number: u32,
    pub text_above: String,
    pub grids: Vec<Vec<Vec<Option<String>>>>,
}

impl FakePage {
    pub fn new(number: u32, text_above: &str, grids: &[&[&[&str]]]) -> Self {
        Self {
            number,
            text_above: text_above.to_string(),
            grids: grids
                .iter()
                .map(|grid| {
                    grid.iter()
                        .map(|row| row.iter().map(|cell| Some((*cell).to_string())).collect())
                        .collect()
                })
                .collect(),
        }
    }
}

impl PageLayout for FakePage {
    fn page_number(&self) -> u32 {
        self.number
    }

    fn bbox(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 595.0, 842.0)
    }

    fn find_tables(&self, _settings: &TableSettings) -> Vec<TableRegion> {
        self.grids
            .iter()
            .map(|grid| TableRegion::new(BoundingBox::new(50.0, 100.0, 550.0, 400.0), grid.clone()))
            .collect()
    }

    fn crop_text(&self, _bbox: &BoundingBox) -> String {
        self.text_above.clone()
    }
}
