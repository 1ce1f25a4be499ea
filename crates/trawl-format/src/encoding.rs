use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use encoding_rs::Encoding;

use crate::{Error, Result};

/// Windows code page numbers and the encoding labels they correspond to.
const CODE_PAGES: &[(u16, &str)] = &[
    (866, "ibm866"),
    (874, "windows-874"),
    (932, "shift_jis"),
    (936, "gbk"),
    (949, "euc-kr"),
    (950, "big5"),
    (1250, "windows-1250"),
    (1251, "windows-1251"),
    (1252, "windows-1252"),
    (1253, "windows-1253"),
    (1254, "windows-1254"),
    (1255, "windows-1255"),
    (1256, "windows-1256"),
    (1257, "windows-1257"),
    (1258, "windows-1258"),
    (10000, "macintosh"),
    (10007, "x-mac-cyrillic"),
    (20866, "koi8-r"),
    (20932, "euc-jp"),
    (21866, "koi8-u"),
    (20127, "us-ascii"),
    (28591, "iso-8859-1"),
    (28592, "iso-8859-2"),
    (28593, "iso-8859-3"),
    (28594, "iso-8859-4"),
    (28595, "iso-8859-5"),
    (28596, "iso-8859-6"),
    (28597, "iso-8859-7"),
    (28598, "iso-8859-8"),
    (28603, "iso-8859-13"),
    (28605, "iso-8859-15"),
    (38598, "iso-8859-8-i"),
    (50220, "iso-2022-jp"),
    (51932, "euc-jp"),
    (51949, "euc-kr"),
    (54936, "gb18030"),
    (65001, "utf-8"),
    // UTF-16 is recognised so it can be refused explicitly
    (1200, "utf-16le"),
    (1201, "utf-16be"),
];

// WHATWG folds these into windows-1252, which differs from them in 0x80..=0x9F
const LATIN1_LABELS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso88591",
    "iso_8859-1",
    "iso_8859-1:1987",
    "latin1",
    "l1",
    "cp819",
    "ibm819",
    "iso-ir-100",
    "csisolatin1",
];

const ASCII_LABELS: &[&str] = &[
    "us-ascii",
    "ascii",
    "ansi_x3.4-1968",
    "iso-ir-6",
    "iso646-us",
    "cp367",
    "ibm367",
    "csascii",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Target {
    Whatwg(&'static Encoding),
    /// Every char up to `limit` is written as the byte of the same value.
    Identity { name: &'static str, limit: char },
}

const LATIN1: Target = Target::Identity {
    name:  "ISO-8859-1",
    limit: '\u{ff}',
};

const ASCII: Target = Target::Identity {
    name:  "US-ASCII",
    limit: '\u{7f}',
};

/// Target text encoding of the aggregate artifact.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OutputEncoding(Target);

impl OutputEncoding {
    pub fn utf8() -> Self { Self(Target::Whatwg(encoding_rs::UTF_8)) }

    /// Resolve a label such as `windows-1252`, `utf-8` or `latin1`.
    pub fn from_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        if LATIN1_LABELS.iter().any(|l| l.eq_ignore_ascii_case(trimmed)) {
            return Ok(Self(LATIN1));
        }
        if ASCII_LABELS.iter().any(|l| l.eq_ignore_ascii_case(trimmed)) {
            return Ok(Self(ASCII));
        }
        let encoding =
            Encoding::for_label(trimmed.as_bytes()).ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;
        Self::from_encoding(encoding)
    }

    /// Resolve a Windows code page number such as `1252`.
    pub fn from_code_page(code_page: u16) -> Result<Self> {
        let label = CODE_PAGES
            .iter()
            .find(|(cp, _)| *cp == code_page)
            .map(|(_, label)| *label)
            .ok_or_else(|| Error::UnknownEncoding(code_page.to_string()))?;
        Self::from_label(label)
    }

    fn from_encoding(encoding: &'static Encoding) -> Result<Self> {
        // encoders for UTF-16 and "replacement" silently emit UTF-8
        if encoding.output_encoding() != encoding {
            return Err(Error::UnsupportedEncoding(encoding.name().to_string()));
        }
        Ok(Self(Target::Whatwg(encoding)))
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            Target::Whatwg(encoding) => encoding.name(),
            Target::Identity { name, .. } => name,
        }
    }

    pub fn is_utf8(&self) -> bool { self.0 == Target::Whatwg(encoding_rs::UTF_8) }

    /// Encode `text`, refusing to substitute characters the target cannot represent.
    pub fn encode<'a>(&self, text: &'a str, context: impl FnOnce() -> String) -> Result<Cow<'a, [u8]>> {
        let unmappable = || Error::Unmappable {
            context:  context(),
            encoding: self.name(),
        };
        match self.0 {
            Target::Whatwg(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                if had_errors {
                    return Err(unmappable());
                }
                Ok(bytes)
            }
            Target::Identity { .. } if text.is_ascii() => Ok(Cow::Borrowed(text.as_bytes())),
            Target::Identity { limit, .. } => {
                let mut bytes = Vec::with_capacity(text.len());
                for c in text.chars() {
                    if c > limit {
                        return Err(unmappable());
                    }
                    bytes.push(c as u32 as u8);
                }
                Ok(Cow::Owned(bytes))
            }
        }
    }

    /// Decode bytes known to be UTF-8 without any replacement.
    pub fn decode_utf8(bytes: &[u8]) -> Option<Cow<'_, str>> {
        encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
    }
}

impl Default for OutputEncoding {
    fn default() -> Self { Self::utf8() }
}

impl fmt::Debug for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_tuple("OutputEncoding").field(&self.name()).finish() }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Accepts either a numeric code page (`1252`) or a label (`windows-1252`).
impl FromStr for OutputEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            let code_page = s.parse::<u16>().map_err(|_| Error::UnknownEncoding(s.to_string()))?;
            return Self::from_code_page(code_page);
        }
        Self::from_label(s)
    }
}
