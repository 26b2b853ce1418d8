//! Text encoding profile shared by the indexer, the sorter and the writer.
//!
//! The engine never guesses an encoding: callers build a profile up front
//! (or sniff one from the file's BOM with [`EncodingProfile::sniff`]) and the
//! same profile is used to split, compare and re-emit lines.
use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::Path;

pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
pub const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
pub const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Byte-order mark written by this encoding when a BOM is requested.
    pub fn bom(self) -> &'static [u8] {
        match self {
            TextEncoding::Utf8 => UTF8_BOM,
            TextEncoding::Utf16Le => UTF16LE_BOM,
            TextEncoding::Utf16Be => UTF16BE_BOM,
        }
    }
}

/// Line terminator, before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
}

impl Newline {
    /// The platform's native terminator: CRLF on Windows, LF elsewhere.
    pub fn native() -> Self {
        if cfg!(windows) {
            Newline::CrLf
        } else {
            Newline::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
        }
    }
}

/// Reusable decode targets for ordinal comparison of non-UTF-8 text.
#[derive(Debug, Default)]
pub struct DecodeScratch {
    left: String,
    right: String,
}

impl DecodeScratch {
    pub fn with_capacity(bytes: usize) -> Self {
        DecodeScratch {
            left: String::with_capacity(bytes),
            right: String::with_capacity(bytes),
        }
    }

    pub fn capacity(&self) -> usize {
        self.left.capacity() + self.right.capacity()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingProfile {
    encoding: TextEncoding,
    bom: Vec<u8>,
    newline: Vec<u8>,
}

impl Default for EncodingProfile {
    /// UTF-8 without BOM, native newline.
    fn default() -> Self {
        EncodingProfile::new(TextEncoding::Utf8, Newline::native(), false)
    }
}

impl EncodingProfile {
    pub fn new(encoding: TextEncoding, newline: Newline, with_bom: bool) -> Self {
        let bom = if with_bom {
            encoding.bom().to_vec()
        } else {
            Vec::new()
        };
        let mut profile = EncodingProfile {
            encoding,
            bom,
            newline: Vec::new(),
        };
        let mut nl = Vec::with_capacity(8);
        profile.encode(newline.as_str(), &mut nl);
        profile.newline = nl;
        profile
    }

    pub fn utf8(newline: Newline) -> Self {
        EncodingProfile::new(TextEncoding::Utf8, newline, false)
    }

    #[inline]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// BOM bytes; empty when the profile carries no marker.
    #[inline]
    pub fn bom(&self) -> &[u8] {
        &self.bom
    }

    /// Encoded newline sequence.
    #[inline]
    pub fn newline(&self) -> &[u8] {
        &self.newline
    }

    /// Decode `bytes` and append the text to `out`.
    /// Malformed sequences become U+FFFD.
    pub fn decode(&self, bytes: &[u8], out: &mut String) {
        match self.encoding {
            TextEncoding::Utf8 => out.push_str(&String::from_utf8_lossy(bytes)),
            TextEncoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes, out),
            TextEncoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes, out),
        }
    }

    /// Encode `text` and append the bytes to `out`. Never writes a BOM.
    pub fn encode(&self, text: &str, out: &mut Vec<u8>) {
        match self.encoding {
            TextEncoding::Utf8 => out.extend_from_slice(text.as_bytes()),
            TextEncoding::Utf16Le => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            TextEncoding::Utf16Be => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
    }

    /// Ordinal (code point) comparison of two encoded lines.
    ///
    /// UTF-16 is ordered by code point, not by code unit, so U+1F600 sorts
    /// after U+FF5E even though its leading surrogate unit is smaller.
    ///
    /// UTF-8 byte order is code point order, so UTF-8 input is compared
    /// without decoding; this also gives invalid UTF-8 a total order.
    pub fn compare(&self, a: &[u8], b: &[u8], scratch: &mut DecodeScratch) -> Ordering {
        match self.encoding {
            TextEncoding::Utf8 => a.cmp(b),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                scratch.left.clear();
                scratch.right.clear();
                self.decode(a, &mut scratch.left);
                self.decode(b, &mut scratch.right);
                scratch.left.cmp(&scratch.right)
            }
        }
    }

    /// Pick a profile from the leading bytes of a file.
    /// Falls back to UTF-8 without BOM.
    pub fn sniff_bytes(head: &[u8], newline: Newline) -> Self {
        if head.starts_with(UTF8_BOM) {
            EncodingProfile::new(TextEncoding::Utf8, newline, true)
        } else if head.starts_with(UTF16LE_BOM) {
            EncodingProfile::new(TextEncoding::Utf16Le, newline, true)
        } else if head.starts_with(UTF16BE_BOM) {
            EncodingProfile::new(TextEncoding::Utf16Be, newline, true)
        } else {
            EncodingProfile::utf8(newline)
        }
    }

    pub fn sniff(path: &Path, newline: Newline) -> io::Result<Self> {
        let mut head = [0u8; 3];
        let file = File::open(path)?;
        let n = crate::common::io::read_full(&mut &file, &mut head)?;
        Ok(EncodingProfile::sniff_bytes(&head[..n], newline))
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16, out: &mut String) {
    let chunks = bytes.chunks_exact(2);
    let odd = !chunks.remainder().is_empty();
    let units = chunks.map(|c| unit([c[0], c[1]]));
    out.extend(char::decode_utf16(units).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)));
    if odd {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}
