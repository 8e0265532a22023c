//! Content stream interpretation: positioned characters and ruling edges.
//!
//! Only what table finding needs is tracked: the current transformation
//! matrix, the text state, and path construction/painting. Colours, clipping,
//! images and form XObjects are ignored.

use std::collections::{BTreeMap, HashMap};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::ExtractError;
use crate::layout::cmap::ToUnicodeMap;
use crate::layout::decode::{decode_pdf_bytes, is_two_byte_encoding};
use crate::layout::lattice::{Edge, EdgeSource};
use crate::layout::text::Char;
use crate::model::BoundingBox;

const ASCENT: f64 = 0.8;
const DESCENT: f64 = -0.2;
const AXIS_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(values: &[f64]) -> Option<Self> {
        match *values {
            [a, b, c, d, e, f] => Some(Self { a, b, c, d, e, f }),
            _ => None,
        }
    }

    /// `self` applied first, then `other`.
    fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FontInfo {
    encoding: String,
    two_byte: bool,
    /// Glyph widths by character code, in thousandths of the font size.
    widths: HashMap<u32, f64>,
    default_width: f64,
    to_unicode: Option<ToUnicodeMap>,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            encoding: "StandardEncoding".to_string(),
            two_byte: false,
            widths: HashMap::new(),
            default_width: 500.0,
            to_unicode: None,
        }
    }
}

fn number(document: &Document, object: &Object) -> Option<f64> {
    document
        .dereference(object)
        .and_then(|(_, object)| object.as_float())
        .ok()
        .map(f64::from)
}

fn array<'a>(document: &'a Document, dictionary: &'a Dictionary, key: &[u8]) -> &'a [Object] {
    dictionary
        .get(key)
        .and_then(|object| document.dereference(object))
        .and_then(|(_, object)| object.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Widths of a simple font: `/Widths` indexed from `/FirstChar`.
fn simple_widths(document: &Document, font: &Dictionary) -> HashMap<u32, f64> {
    let first_char = font
        .get(b"FirstChar")
        .and_then(Object::as_i64)
        .ok()
        .and_then(|first| u32::try_from(first).ok())
        .unwrap_or(0);
    (first_char..)
        .zip(array(document, font, b"Widths"))
        .filter_map(|(code, width)| number(document, width).map(|width| (code, width)))
        .collect()
}

/// Widths of a CID font's `/W` array: `c [w1 w2 ...]` and `c_first c_last w`.
fn cid_widths(document: &Document, objects: &[Object]) -> HashMap<u32, f64> {
    let code = |object: &Object| number(document, object).and_then(value_to_code);
    let mut widths = HashMap::new();
    let mut index = 0;
    while index + 1 < objects.len() {
        let Some(first) = code(&objects[index]) else {
            index += 1;
            continue;
        };
        let next = document
            .dereference(&objects[index + 1])
            .map_or(&objects[index + 1], |(_, object)| object);
        if let Ok(list) = next.as_array() {
            for (cid, width) in (first..).zip(list) {
                if let Some(width) = number(document, width) {
                    widths.insert(cid, width);
                }
            }
            index += 2;
        } else if let (Some(last), Some(width)) = (
            code(next),
            objects.get(index + 2).and_then(|width| number(document, width)),
        ) {
            widths.extend((first..=last).map(|cid| (cid, width)));
            index += 3;
        } else {
            index += 1;
        }
    }
    widths
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn value_to_code(value: f64) -> Option<u32> {
    ((0.0..=f64::from(u32::MAX)).contains(&value) && value.fract() == 0.0).then(|| value as u32)
}

impl FontInfo {
    fn from_dictionary(document: &Document, font: &Dictionary) -> Self {
        let encoding = font.get_font_encoding().to_string();
        let base_font = font
            .get(b"BaseFont")
            .and_then(Object::as_name_str)
            .unwrap_or_default();
        let descendant = array(document, font, b"DescendantFonts")
            .first()
            .and_then(|object| document.dereference(object).ok())
            .and_then(|(_, object)| object.as_dict().ok());

        let (widths, default_width) = match descendant {
            Some(cid_font) => (
                cid_widths(document, array(document, cid_font, b"W")),
                cid_font
                    .get(b"DW")
                    .ok()
                    .and_then(|width| number(document, width))
                    .unwrap_or(1000.0),
            ),
            None => (
                simple_widths(document, font),
                if base_font.contains("Courier") {
                    600.0
                } else {
                    500.0
                },
            ),
        };

        Self {
            two_byte: descendant.is_some() || is_two_byte_encoding(&encoding),
            encoding,
            widths,
            default_width,
            to_unicode: ToUnicodeMap::from_font(document, font),
        }
    }

    /// Glyph width in thousandths of the font size.
    fn width(&self, code: u32) -> f64 {
        self.widths
            .get(&code)
            .copied()
            .filter(|width| *width > 0.0)
            .unwrap_or(self.default_width)
    }

    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0_u32, |acc, byte| (acc << 8) | u32::from(*byte)))
                .collect()
        } else {
            bytes.iter().map(|byte| u32::from(*byte)).collect()
        }
    }

    /// Text of one code from the `/ToUnicode` map, falling back to the
    /// font's encoding.
    fn code_text(&self, map: &ToUnicodeMap, code: u32) -> String {
        if let Some(text) = map.lookup(code) {
            return text.to_string();
        }
        match u8::try_from(code) {
            Ok(byte) if !self.two_byte => decode_pdf_bytes(Some(&self.encoding), &[byte]),
            _ => char::from_u32(code).map(String::from).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
struct TextParams {
    char_spacing: f64,
    word_spacing: f64,
    h_scaling: f64,
    leading: f64,
    font: Option<Vec<u8>>,
    font_size: f64,
    rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 1.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextParams,
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Line((f64, f64), (f64, f64)),
    Rect([(f64, f64); 4]),
}

/// Page space origin: the media box's left edge and top edge in PDF units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageOrigin {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Default)]
pub(crate) struct PageObjects {
    pub chars: Vec<Char>,
    pub edges: Vec<Edge>,
}

struct Interpreter<'a> {
    fonts: &'a BTreeMap<Vec<u8>, FontInfo>,
    fallback_font: FontInfo,
    origin: PageOrigin,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: Vec<Segment>,
    current_point: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
    objects: PageObjects,
}

/// The `index`-th of `count` equal slices of `0..total`.
#[allow(clippy::cast_precision_loss)]
fn proportional_span(total: f64, index: usize, count: usize) -> (f64, f64) {
    let (position, count) = (index as f64, count.max(1) as f64);
    (total * position / count, total * (position + 1.0) / count)
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands
        .iter()
        .filter_map(|operand| operand.as_float().ok().map(f64::from))
        .collect()
}

impl<'a> Interpreter<'a> {
    fn new(fonts: &'a BTreeMap<Vec<u8>, FontInfo>, origin: PageOrigin) -> Self {
        Self {
            fonts,
            fallback_font: FontInfo::default(),
            origin,
            state: GraphicsState {
                ctm: Matrix::IDENTITY,
                text: TextParams::default(),
            },
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            path: Vec::new(),
            current_point: None,
            subpath_start: None,
            objects: PageObjects::default(),
        }
    }

    fn run(mut self, operations: &[Operation]) -> PageObjects {
        for operation in operations {
            self.execute(operation);
        }
        self.objects
    }

    fn execute(&mut self, operation: &Operation) {
        let operands = operation.operands.as_slice();
        let values = numbers(operands);

        match operation.operator.as_str() {
            "q" => self.saved.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(&values) {
                    self.state.ctm = matrix.then(&self.state.ctm);
                }
            }

            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if let Some(name) = operands.first().and_then(|name| name.as_name().ok()) {
                    self.state.text.font = Some(name.to_vec());
                }
                if let Some(size) = operands.get(1).and_then(|size| size.as_float().ok()) {
                    self.state.text.font_size = f64::from(size);
                }
            }
            "Tc" => self.set_text_param(&values, |text, value| text.char_spacing = value),
            "Tw" => self.set_text_param(&values, |text, value| text.word_spacing = value),
            "Tz" => self.set_text_param(&values, |text, value| text.h_scaling = value / 100.0),
            "TL" => self.set_text_param(&values, |text, value| text.leading = value),
            "Ts" => self.set_text_param(&values, |text, value| text.rise = value),
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(&values) {
                    self.text_matrix = matrix;
                    self.line_matrix = matrix;
                }
            }
            "Td" => {
                if let [tx, ty] = values[..] {
                    self.move_text_line(tx, ty);
                }
            }
            "TD" => {
                if let [tx, ty] = values[..] {
                    self.state.text.leading = -ty;
                    self.move_text_line(tx, ty);
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(|text| text.as_str().ok()) {
                    self.show_text(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(bytes) = operands.first().and_then(|text| text.as_str().ok()) {
                    self.show_text(bytes);
                }
            }
            "\"" => {
                if let [word_spacing, char_spacing, ..] = values[..] {
                    self.state.text.word_spacing = word_spacing;
                    self.state.text.char_spacing = char_spacing;
                }
                self.next_line();
                if let Some(bytes) = operands.get(2).and_then(|text| text.as_str().ok()) {
                    self.show_text(bytes);
                }
            }
            "TJ" => {
                if let Some(items) = operands.first().and_then(|array| array.as_array().ok()) {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show_text(bytes),
                            other => {
                                if let Ok(adjustment) = other.as_float() {
                                    let text = &self.state.text;
                                    let tx = -f64::from(adjustment) / 1000.0
                                        * text.font_size
                                        * text.h_scaling;
                                    self.text_matrix =
                                        Matrix::translate(tx, 0.0).then(&self.text_matrix);
                                }
                            }
                        }
                    }
                }
            }

            "m" => {
                if let [x, y] = values[..] {
                    let point = self.state.ctm.apply(x, y);
                    self.current_point = Some(point);
                    self.subpath_start = Some(point);
                }
            }
            "l" => {
                if let [x, y] = values[..] {
                    let point = self.state.ctm.apply(x, y);
                    if let Some(from) = self.current_point {
                        self.path.push(Segment::Line(from, point));
                    }
                    self.current_point = Some(point);
                }
            }
            "c" | "v" | "y" => {
                if let [.., x, y] = values[..] {
                    self.current_point = Some(self.state.ctm.apply(x, y));
                }
            }
            "re" => {
                if let [x, y, width, height] = values[..] {
                    let ctm = self.state.ctm;
                    self.path.push(Segment::Rect([
                        ctm.apply(x, y),
                        ctm.apply(x + width, y),
                        ctm.apply(x + width, y + height),
                        ctm.apply(x, y + height),
                    ]));
                    let start = ctm.apply(x, y);
                    self.current_point = Some(start);
                    self.subpath_start = Some(start);
                }
            }
            "h" => self.close_subpath(),
            "S" | "f" | "F" | "f*" | "B" | "B*" => self.paint_path(),
            "s" | "b" | "b*" => {
                self.close_subpath();
                self.paint_path();
            }
            "n" => self.discard_path(),
            _ => {}
        }
    }

    fn set_text_param(&mut self, values: &[f64], set: impl FnOnce(&mut TextParams, f64)) {
        if let Some(value) = values.first() {
            set(&mut self.state.text, *value);
        }
    }

    fn move_text_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_text_line(0.0, -leading);
    }

    fn show_text(&mut self, bytes: &[u8]) {
        let font = self
            .state
            .text
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback_font);
        let text = &self.state.text;
        let font_size = text.font_size;
        let scale = text.h_scaling;

        let codes = font.codes(bytes);
        let mut spans = Vec::with_capacity(codes.len());
        let mut advance = 0.0;
        for code in &codes {
            let glyph = font.width(*code) / 1000.0 * font_size;
            let word_spacing = if !font.two_byte && *code == 32 {
                text.word_spacing
            } else {
                0.0
            };
            spans.push((advance, advance + glyph * scale));
            advance += (glyph + text.char_spacing + word_spacing) * scale;
        }

        let pieces = match &font.to_unicode {
            Some(map) => codes
                .iter()
                .zip(&spans)
                .map(|(code, span)| (*span, font.code_text(map, *code)))
                .collect::<Vec<_>>(),
            None => {
                let decoded = decode_pdf_bytes(Some(&font.encoding), bytes);
                let count = decoded.chars().count();
                decoded
                    .chars()
                    .enumerate()
                    .map(|(index, ch)| {
                        let span = if count == spans.len() {
                            spans[index]
                        } else {
                            proportional_span(advance, index, count)
                        };
                        (span, ch.to_string())
                    })
                    .collect()
            }
        };

        let rendering = self.text_matrix.then(&self.state.ctm);
        let glyph_bottom = text.rise + DESCENT * font_size;
        let glyph_top = text.rise + ASCENT * font_size;
        for ((start, end), piece) in pieces {
            // Ligatures map one glyph to several characters, which split its box.
            let count = piece.chars().count();
            for (index, ch) in piece.chars().enumerate() {
                if ch.is_control() {
                    continue;
                }
                let (left, right) = proportional_span(end - start, index, count);
                let corners = [
                    rendering.apply(start + left, glyph_bottom),
                    rendering.apply(start + right, glyph_bottom),
                    rendering.apply(start + right, glyph_top),
                    rendering.apply(start + left, glyph_top),
                ];
                let bbox = self.page_box(&corners);
                self.objects.chars.push(Char { text: ch, bbox });
            }
        }

        self.text_matrix = Matrix::translate(advance, 0.0).then(&self.text_matrix);
    }

    fn page_point(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (x - self.origin.left, self.origin.top - y)
    }

    fn page_box(&self, corners: &[(f64, f64)]) -> BoundingBox {
        let points = corners
            .iter()
            .map(|point| self.page_point(*point))
            .collect::<Vec<_>>();
        let (mut left, mut top) = points[0];
        let (mut right, mut bottom) = points[0];
        for (x, y) in points.iter().skip(1) {
            left = left.min(*x);
            right = right.max(*x);
            top = top.min(*y);
            bottom = bottom.max(*y);
        }
        BoundingBox::new(left, top, right, bottom)
    }

    fn close_subpath(&mut self) {
        if let (Some(from), Some(start)) = (self.current_point, self.subpath_start)
            && from != start
        {
            self.path.push(Segment::Line(from, start));
        }
        self.current_point = self.subpath_start;
    }

    fn paint_path(&mut self) {
        let segments = std::mem::take(&mut self.path);
        for segment in segments {
            match segment {
                Segment::Line(from, to) => {
                    let (x0, y0) = self.page_point(from);
                    let (x1, y1) = self.page_point(to);
                    if (y0 - y1).abs() < AXIS_TOLERANCE {
                        self.objects
                            .edges
                            .push(Edge::horizontal(x0, x1, y0, EdgeSource::Line));
                    } else if (x0 - x1).abs() < AXIS_TOLERANCE {
                        self.objects
                            .edges
                            .push(Edge::vertical(x0, y0, y1, EdgeSource::Line));
                    }
                }
                Segment::Rect(corners) => {
                    let bbox = self.page_box(&corners);
                    self.objects.edges.extend([
                        Edge::horizontal(bbox.left, bbox.right, bbox.top, EdgeSource::Rect),
                        Edge::horizontal(bbox.left, bbox.right, bbox.bottom, EdgeSource::Rect),
                        Edge::vertical(bbox.left, bbox.top, bbox.bottom, EdgeSource::Rect),
                        Edge::vertical(bbox.right, bbox.top, bbox.bottom, EdgeSource::Rect),
                    ]);
                }
            }
        }
        self.current_point = None;
        self.subpath_start = None;
    }

    fn discard_path(&mut self) {
        self.path.clear();
        self.current_point = None;
        self.subpath_start = None;
    }
}

pub(crate) fn page_fonts(document: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, FontInfo> {
    document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, FontInfo::from_dictionary(document, font)))
        .collect()
}

pub(crate) fn interpret_content(
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, FontInfo>,
    origin: PageOrigin,
    page: u32,
) -> Result<PageObjects, ExtractError> {
    let content = Content::decode(content).map_err(|error| ExtractError::PdfContent {
        page,
        message: error.to_string(),
    })?;
    Ok(Interpreter::new(fonts, origin).run(&content.operations))
}
