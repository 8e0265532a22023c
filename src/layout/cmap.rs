//! `/ToUnicode` CMaps: character code to text lookups for fonts whose codes
//! are not plain encodings, such as subset Type0 fonts with `Identity-H`.

use std::collections::HashMap;

use lopdf::{Dictionary, Document};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ToUnicodeMap {
    mappings: HashMap<u32, String>,
}

impl ToUnicodeMap {
    /// Reads the font's `/ToUnicode` stream. Missing, unreadable or empty
    /// maps yield `None` so the font falls back to its encoding.
    pub(crate) fn from_font(document: &Document, font: &Dictionary) -> Option<Self> {
        let stream = font
            .get(b"ToUnicode")
            .and_then(|object| document.dereference(object))
            .and_then(|(_, object)| object.as_stream())
            .ok()?;
        let data = if stream.dict.has(b"Filter") {
            stream.decompressed_content().ok()?
        } else {
            stream.content.clone()
        };
        Some(Self::parse(&data)).filter(|map| !map.is_empty())
    }

    /// Parses `bfchar` and `bfrange` sections. Malformed entries are skipped.
    pub(crate) fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let mut mappings = HashMap::new();
        for section in sections(&text, "beginbfchar", "endbfchar") {
            parse_bfchar(section, &mut mappings);
        }
        for section in sections(&text, "beginbfrange", "endbfrange") {
            parse_bfrange(section, &mut mappings);
        }
        Self { mappings }
    }

    pub(crate) fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn sections<'a>(text: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(begin) {
        let body = &rest[start + begin.len()..];
        let Some(stop) = body.find(end) else {
            break;
        };
        found.push(&body[..stop]);
        rest = &body[stop + end.len()..];
    }
    found
}

fn hex_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start + 1..].find('>') else {
            break;
        };
        tokens.push(rest[start + 1..start + 1 + len].trim());
        rest = &rest[start + 1 + len + 1..];
    }
    tokens
}

fn hex_code(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex, 16).ok()
}

/// Destination strings are UTF-16BE; two-digit values are single bytes.
fn utf16_hex(hex: &str) -> Option<String> {
    if hex.len() == 2 {
        return hex_code(hex).and_then(char::from_u32).map(String::from);
    }
    if hex.is_empty() || hex.len() % 4 != 0 {
        return None;
    }
    let units = hex
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            std::str::from_utf8(chunk)
                .ok()
                .and_then(|chunk| u16::from_str_radix(chunk, 16).ok())
        })
        .collect::<Option<Vec<_>>>()?;
    String::from_utf16(&units).ok()
}

fn parse_bfchar(section: &str, mappings: &mut HashMap<u32, String>) {
    for line in section.lines() {
        if let [source, target, ..] = hex_tokens(line)[..]
            && let (Some(code), Some(text)) = (hex_code(source), utf16_hex(target))
        {
            mappings.insert(code, text);
        }
    }
}

fn parse_bfrange(section: &str, mappings: &mut HashMap<u32, String>) {
    for line in section.lines() {
        if let Some(bracket) = line.find('[') {
            let (Some(low), Some(high)) = range_bounds(&line[..bracket]) else {
                continue;
            };
            let close = line.rfind(']').unwrap_or(line.len());
            for (code, target) in (low..=high).zip(hex_tokens(&line[bracket + 1..close])) {
                if let Some(text) = utf16_hex(target) {
                    mappings.insert(code, text);
                }
            }
            continue;
        }

        let tokens = hex_tokens(line);
        let [low, high, start, ..] = tokens[..] else {
            continue;
        };
        let (Some(low), Some(high), Some(start)) = (hex_code(low), hex_code(high), hex_code(start))
        else {
            continue;
        };
        if high < low {
            continue;
        }
        for offset in 0..=high - low {
            if let Some(ch) = char::from_u32(start + offset) {
                mappings.insert(low + offset, ch.to_string());
            }
        }
    }
}

fn range_bounds(text: &str) -> (Option<u32>, Option<u32>) {
    match hex_tokens(text)[..] {
        [low, high, ..] => (hex_code(low), hex_code(high)),
        _ => (None, None),
    }
}
