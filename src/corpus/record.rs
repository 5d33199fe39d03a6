//! Record parsing
//!
//! A record is a front matter header followed by free text. The header is
//! YAML between `---` lines or TOML between `+++` lines:
//!
//! ```text
//! ---
//! number: 1
//! title: Use Markdown
//! date: 2021-05-03
//! status: accepted
//! ---
//! We decided to use Markdown for records.
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;

use crate::corpus::constants::{TOML_DELIMITER, UTF8_BOM, YAML_DELIMITER};
use crate::corpus::types::Document;
use crate::error::ParseError;
use crate::util::{deserialize_optional_date, deserialize_string_from_scalar};

/// Typed view of the metadata header
#[derive(Debug, Deserialize)]
struct RecordHeader {
    number: i64,
    #[serde(deserialize_with = "deserialize_string_from_scalar")]
    title: String,
    #[serde(deserialize_with = "deserialize_string_from_scalar")]
    status: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderFormat {
    Yaml,
    Toml,
}

impl HeaderFormat {
    fn from_delimiter(line: &str) -> Option<Self> {
        match line.trim_end() {
            YAML_DELIMITER => Some(HeaderFormat::Yaml),
            TOML_DELIMITER => Some(HeaderFormat::Toml),
            _ => None,
        }
    }

    fn delimiter(self) -> &'static str {
        match self {
            HeaderFormat::Yaml => YAML_DELIMITER,
            HeaderFormat::Toml => TOML_DELIMITER,
        }
    }
}

/// Parse a record from raw bytes.
///
/// The returned document has an empty identifier; the caller knows where the
/// bytes came from and attaches it.
pub fn parse_record(bytes: &[u8]) -> Result<Document, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    parse_record_str(text)
}

/// Read a whole stream and parse it as a record
pub fn read_record<R: Read>(mut reader: R) -> std::io::Result<Result<Document, ParseError>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(parse_record(&bytes))
}

/// Parse a record that is already known to be valid UTF-8
pub fn parse_record_str(text: &str) -> Result<Document, ParseError> {
    let (format, header, body) = split_front_matter(text)?;
    let header = decode_header(format, header)?;

    Ok(Document {
        number: header.number,
        title: header.title,
        date: header.date,
        status: header.status,
        body: body.to_string(),
        ..Document::default()
    })
}

fn next_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => (text, ""),
    }
}

/// Split `text` into header format, raw header and body
fn split_front_matter(text: &str) -> Result<(HeaderFormat, &str, &str), ParseError> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text).trim_start();

    let (first, rest) = next_line(text);
    let format = HeaderFormat::from_delimiter(first).ok_or(ParseError::MissingHeader)?;

    let mut remaining = rest;
    let mut consumed = 0;
    while !remaining.is_empty() {
        let (line, after) = next_line(remaining);
        if line.trim_end() == format.delimiter() {
            return Ok((format, &rest[..consumed], after));
        }
        consumed += remaining.len() - after.len();
        remaining = after;
    }

    Err(ParseError::UnterminatedHeader {
        delimiter: format.delimiter(),
    })
}

fn decode_header(format: HeaderFormat, header: &str) -> Result<RecordHeader, ParseError> {
    match format {
        HeaderFormat::Yaml => {
            serde_yaml::from_str(header).map_err(|e| ParseError::InvalidHeader(e.to_string()))
        }
        HeaderFormat::Toml => {
            let mut table: toml::Table =
                toml::from_str(header).map_err(|e| ParseError::InvalidHeader(e.to_string()))?;
            // Native TOML dates go through the same string parser as YAML ones
            for (_, value) in table.iter_mut() {
                if let toml::Value::Datetime(dt) = value {
                    *value = toml::Value::String(dt.to_string());
                }
            }
            toml::Value::Table(table)
                .try_into()
                .map_err(|e| ParseError::InvalidHeader(e.to_string()))
        }
    }
}
