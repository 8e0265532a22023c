use std::cmp::Ordering;

use crate::model::BoundingBox;

/// One glyph placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Char {
    pub text: char,
    pub bbox: BoundingBox,
}

impl Char {
    fn center(&self) -> (f64, f64) {
        (
            (self.bbox.left + self.bbox.right) / 2.0,
            (self.bbox.top + self.bbox.bottom) / 2.0,
        )
    }
}

pub(crate) fn chars_within<'a>(chars: &'a [Char], bbox: &BoundingBox) -> Vec<&'a Char> {
    chars
        .iter()
        .filter(|ch| {
            let (x, y) = ch.center();
            bbox.contains_point(x, y)
        })
        .collect()
}

/// Lays characters out as text: lines ordered top to bottom and joined with
/// `\n`, words within a line separated by a single space.
pub(crate) fn layout_text(chars: &[&Char], x_tolerance: f64, y_tolerance: f64) -> String {
    let mut sorted = chars.to_vec();
    sorted.sort_by(|a, b| {
        a.bbox
            .top
            .partial_cmp(&b.bbox.top)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.bbox
                    .left
                    .partial_cmp(&b.bbox.left)
                    .unwrap_or(Ordering::Equal)
            })
    });

    let mut lines: Vec<Vec<&Char>> = Vec::new();
    for ch in sorted {
        match lines.last_mut() {
            Some(line) if (ch.bbox.top - line[0].bbox.top).abs() <= y_tolerance => line.push(ch),
            _ => lines.push(vec![ch]),
        }
    }

    lines
        .into_iter()
        .map(|line| line_text(line, x_tolerance))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn line_text(mut line: Vec<&Char>, x_tolerance: f64) -> String {
    line.sort_by(|a, b| {
        a.bbox
            .left
            .partial_cmp(&b.bbox.left)
            .unwrap_or(Ordering::Equal)
    });

    let mut text = String::new();
    let mut pending_space = false;
    let mut previous_right: Option<f64> = None;

    for ch in line {
        if ch.text.is_whitespace() {
            pending_space = true;
            previous_right = Some(ch.bbox.right);
            continue;
        }

        let gap = previous_right.map_or(0.0, |right| ch.bbox.left - right);
        if !text.is_empty() && (pending_space || gap > x_tolerance) {
            text.push(' ');
        }
        text.push(ch.text);
        pending_space = false;
        previous_right = Some(ch.bbox.right);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::{Char, chars_within, layout_text};
    use crate::model::BoundingBox;

    fn word(text: &str, left: f64, top: f64) -> Vec<Char> {
        text.chars()
            .enumerate()
            .map(|(index, ch)| {
                let x = left + index as f64 * 6.0;
                Char {
                    text: ch,
                    bbox: BoundingBox::new(x, top, x + 6.0, top + 10.0),
                }
            })
            .collect()
    }

    #[test]
    fn groups_chars_into_lines_and_words() {
        let mut chars = word("Bob", 10.0, 40.0);
        chars.extend(word("Name", 10.0, 20.0));
        chars.extend(word("Smith", 40.0, 40.5));
        let refs = chars.iter().collect::<Vec<_>>();
        assert_eq!(layout_text(&refs, 3.0, 3.0), "Name\nBob Smith");
    }

    #[test]
    fn explicit_space_glyph_separates_words() {
        let chars = word("Ana Ruiz", 0.0, 0.0);
        let refs = chars.iter().collect::<Vec<_>>();
        assert_eq!(layout_text(&refs, 3.0, 3.0), "Ana Ruiz");
    }

    #[test]
    fn crop_keeps_chars_centred_inside_box() {
        let mut chars = word("in", 10.0, 10.0);
        chars.extend(word("out", 10.0, 200.0));
        let inside = chars_within(&chars, &BoundingBox::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(layout_text(&inside, 3.0, 3.0), "in");
    }
}
