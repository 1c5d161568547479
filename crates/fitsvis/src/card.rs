//! FITS header cards and their typed values.
//!
//! A card is one 80-byte keyword record. Only the value types that image
//! headers carry are modeled: logical, integer, float, and string.

use alloc::string::{String, ToString};
use core::str;

use crate::codec::CARD_SIZE;
use crate::error::{Error, Result};

// ── Values ──

/// A parsed FITS header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string (content between single quotes).
    String(String),
}

impl Value {
    /// Numeric view: integers are promoted to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }
}

// ── Cards ──

/// A parsed FITS header card (one 80-byte keyword record).
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The 8-byte keyword name, ASCII, left-justified, space-padded.
    pub keyword: [u8; 8],
    /// The parsed value, if this card has a value indicator (`= ` in bytes 8..10).
    pub value: Option<Value>,
    /// An optional comment string.
    pub comment: Option<String>,
}

impl Card {
    /// Build a value card from a keyword name (truncated to 8 bytes).
    pub fn new(keyword: &str, value: Value) -> Card {
        Card {
            keyword: pad_keyword(keyword),
            value: Some(value),
            comment: None,
        }
    }

    /// Return the keyword as a trimmed UTF-8 string.
    pub fn keyword_str(&self) -> &str {
        let end = self
            .keyword
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        str::from_utf8(&self.keyword[..end]).unwrap_or("")
    }

    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        &self.keyword == b"END     "
    }

    /// Returns `true` if this card carries a commentary keyword
    /// (COMMENT, HISTORY, or blank).
    pub fn is_commentary(&self) -> bool {
        matches!(&self.keyword, b"COMMENT " | b"HISTORY " | b"        ")
    }
}

/// Pad a short keyword name to 8 bytes with trailing ASCII spaces.
pub const fn pad_keyword_bytes(name: &[u8]) -> [u8; 8] {
    let mut buf = [b' '; 8];
    let mut i = 0;
    while i < name.len() && i < 8 {
        buf[i] = name[i];
        i += 1;
    }
    buf
}

/// Pad a keyword string to the fixed 8-byte form.
pub fn pad_keyword(name: &str) -> [u8; 8] {
    pad_keyword_bytes(name.as_bytes())
}

// ── Parsing ──

/// Parse a single 80-byte FITS header card.
pub fn parse_card(card_bytes: &[u8; CARD_SIZE]) -> Result<Card> {
    let mut keyword = [b' '; 8];
    keyword.copy_from_slice(&card_bytes[..8]);

    for &b in &keyword {
        match b {
            b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_' => {}
            _ => return Err(Error::InvalidKeyword),
        }
    }

    let card = Card {
        keyword,
        value: None,
        comment: None,
    };

    if card.is_end() {
        return Ok(card);
    }

    if card.is_commentary() {
        let text = str::from_utf8(&card_bytes[8..])
            .map_err(|_| Error::InvalidHeader("non-ASCII commentary card"))?
            .trim_end();
        return Ok(Card {
            comment: (!text.is_empty()).then(|| text.to_string()),
            ..card
        });
    }

    if card_bytes[8] == b'=' && card_bytes[9] == b' ' {
        let field = &card_bytes[10..CARD_SIZE];
        if let Some((value, comment)) = parse_value(field) {
            return Ok(Card {
                value: Some(value),
                comment: comment.map(String::from),
                ..card
            });
        }
        // Undefined value: keep any trailing comment.
        let comment = split_comment(field).1.map(String::from);
        return Ok(Card { comment, ..card });
    }

    // No value indicator: bytes 8..80 are free-form text.
    let text = str::from_utf8(&card_bytes[8..])
        .map_err(|_| Error::InvalidHeader("non-ASCII card text"))?
        .trim_end();
    Ok(Card {
        comment: (!text.is_empty()).then(|| text.to_string()),
        ..card
    })
}

/// Split a non-string value field at the ` /` comment separator.
///
/// The standard writes ` / ` but files produced by IDL and friends omit the
/// trailing space, so only ` /` is required.
fn split_comment(field: &[u8]) -> (&[u8], Option<&str>) {
    let len = field.len();
    let mut i = 0;
    while i + 1 < len {
        if field[i] == b' ' && field[i + 1] == b'/' {
            let mut comment_start = i + 2;
            if comment_start < len && field[comment_start] == b' ' {
                comment_start += 1;
            }
            let comment = str::from_utf8(&field[comment_start..])
                .ok()
                .map(|s| s.trim_end());
            return (&field[..i], comment.filter(|s| !s.is_empty()));
        }
        i += 1;
    }
    (field, None)
}

/// Parse a quoted string value; doubled single-quotes escape a literal quote.
fn parse_string(field: &[u8]) -> Option<(Value, Option<&str>)> {
    if field.first() != Some(&b'\'') {
        return None;
    }

    let mut value = String::new();
    let mut i = 1;
    let len = field.len();

    loop {
        if i >= len {
            break; // unterminated string: accept what we have
        }
        if field[i] == b'\'' {
            if i + 1 < len && field[i + 1] == b'\'' {
                value.push('\'');
                i += 2;
            } else {
                i += 1;
                break;
            }
        } else {
            value.push(field[i] as char);
            i += 1;
        }
    }

    // FITS pads string values with trailing spaces; they are not significant.
    let trimmed = value.trim_end().to_string();
    let (_, comment) = split_comment(&field[i..]);
    Some((Value::String(trimmed), comment))
}

/// Parse a float string, handling FITS `D` exponent notation.
fn parse_float_str(s: &str) -> Option<f64> {
    let normalized = s.replace(['D', 'd'], "E");
    normalized.parse::<f64>().ok()
}

/// Parse a FITS header value from the 70-byte value portion of a card
/// (bytes 10..80). Returns the parsed [`Value`] and an optional comment.
pub fn parse_value(field: &[u8]) -> Option<(Value, Option<&str>)> {
    if field.is_empty() {
        return None;
    }

    if field[0] == b'\'' {
        return parse_string(field);
    }

    let (val_part, comment) = split_comment(field);
    let text = str::from_utf8(val_part).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    match text {
        "T" => return Some((Value::Logical(true), comment)),
        "F" => return Some((Value::Logical(false), comment)),
        _ => {}
    }

    // Integer: no decimal point or exponent characters.
    if !text.contains(['.', 'E', 'e', 'D', 'd']) {
        if let Ok(n) = text.parse::<i64>() {
            return Some((Value::Integer(n), comment));
        }
    }

    parse_float_str(text).map(|f| (Value::Float(f), comment))
}

// ── Writing ──

/// Serialize a [`Card`] into an 80-byte FITS card image.
pub fn format_card(card: &Card) -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..8].copy_from_slice(&card.keyword);

    if let Some(ref value) = card.value {
        buf[8] = b'=';
        buf[9] = b' ';

        let mut field = format_value(value);
        if let Some(ref comment) = card.comment {
            append_comment(&mut field, value, comment);
        }
        buf[10..80].copy_from_slice(&field);
    } else if !card.keyword.iter().all(|&b| b == b' ') || card.comment.is_some() {
        if let Some(ref comment) = card.comment {
            let bytes = comment.as_bytes();
            let len = bytes.len().min(72);
            buf[8..8 + len].copy_from_slice(&bytes[..len]);
        }
    }

    buf
}

/// Serialize a [`Value`] into a 70-byte field for bytes 10..80 of a card.
///
/// Numeric and logical values are right-justified in the first 20 bytes
/// (columns 11-30 of the card); strings start at byte 0 with a quote.
pub fn format_value(value: &Value) -> [u8; 70] {
    let mut buf = [b' '; 70];

    match value {
        Value::Logical(b) => {
            buf[19] = if *b { b'T' } else { b'F' };
        }
        Value::Integer(n) => {
            right_justify(alloc::format!("{n}").as_bytes(), &mut buf[..20]);
        }
        Value::Float(f) => {
            right_justify(format_float(*f).as_bytes(), &mut buf[..20]);
        }
        Value::String(s) => {
            write_string(s, &mut buf);
        }
    }

    buf
}

/// Right-justify `src` within `dest`, padding the left with spaces.
fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest[start..start + len].copy_from_slice(&src[..len]);
}

/// Format a float into at most 20 characters, reducing precision as needed.
fn format_float(f: f64) -> String {
    if f == 0.0 {
        return String::from("0.0");
    }
    let mut precision = 15usize;
    loop {
        let s = alloc::format!("{f:.precision$E}");
        if s.len() <= 20 || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

fn write_string(s: &str, buf: &mut [u8; 70]) {
    let mut pos = 0;
    buf[pos] = b'\'';
    pos += 1;

    for ch in s.bytes() {
        if pos >= 69 {
            break; // leave room for the closing quote
        }
        if ch == b'\'' {
            if pos + 1 >= 69 {
                break;
            }
            buf[pos] = b'\'';
            buf[pos + 1] = b'\'';
            pos += 2;
        } else {
            buf[pos] = ch;
            pos += 1;
        }
    }

    // Minimum 8 characters between the quotes.
    while pos < 9 {
        buf[pos] = b' ';
        pos += 1;
    }
    buf[pos] = b'\'';
}

/// Append a ` / comment` to an already-formatted 70-byte value field.
fn append_comment(field: &mut [u8; 70], value: &Value, comment: &str) {
    let content_end = match value {
        Value::String(_) => field
            .iter()
            .rposition(|&b| b == b'\'')
            .map(|i| i + 1)
            .unwrap_or(20),
        _ => 20,
    };

    let sep = content_end + 1;
    if sep + 3 >= 70 {
        return;
    }
    field[sep] = b'/';
    field[sep + 1] = b' ';

    let start = sep + 2;
    let bytes = comment.as_bytes();
    let len = bytes.len().min(70 - start);
    field[start..start + len].copy_from_slice(&bytes[..len]);
}

/// Create the standard FITS END card.
pub fn format_end_card() -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..3].copy_from_slice(b"END");
    buf
}

// ── Tests ──
