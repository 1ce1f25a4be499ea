use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Framing of records in the aggregate: what goes before, between and after them.
pub trait RecordFormatter: Send + Sync {
    fn open(&self) -> &'static str;

    /// Text written before the record at `index` (0-based).
    fn before(&self, index: usize) -> &'static str;

    /// Text written after the record at `index`.
    fn after(&self, index: usize) -> &'static str;

    fn close(&self) -> &'static str;
}

/// How array output separates records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayStyle {
    /// A comma after every record, including the last. Strict JSON parsers reject the
    /// result, but existing consumers of the artifact expect exactly these bytes.
    #[default]
    TrailingComma,
    /// Commas only between records; valid JSON.
    Strict,
}

/// `[` payload `,` payload `,` `]`
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayFormatter {
    pub style: ArrayStyle,
}

impl RecordFormatter for ArrayFormatter {
    fn open(&self) -> &'static str { "[" }

    fn before(&self, index: usize) -> &'static str {
        match self.style {
            ArrayStyle::Strict if index > 0 => ",",
            _ => "",
        }
    }

    fn after(&self, _index: usize) -> &'static str {
        match self.style {
            ArrayStyle::TrailingComma => ",",
            ArrayStyle::Strict => "",
        }
    }

    fn close(&self) -> &'static str { "]" }
}

/// Newline-delimited JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinesFormatter;

impl RecordFormatter for LinesFormatter {
    fn open(&self) -> &'static str { "" }

    fn before(&self, _index: usize) -> &'static str { "" }

    fn after(&self, _index: usize) -> &'static str { "\n" }

    fn close(&self) -> &'static str { "" }
}

/// Output shape selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Array,
    Lines,
}

impl Format {
    pub fn formatter(self, style: ArrayStyle) -> Box<dyn RecordFormatter> {
        match self {
            Format::Array => Box::new(ArrayFormatter { style }),
            Format::Lines => Box::new(LinesFormatter),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Array => f.write_str("array"),
            Format::Lines => f.write_str("lines"),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "array" | "jsonArray" => Ok(Format::Array),
            "lines" | "jsonLines" => Ok(Format::Lines),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}
