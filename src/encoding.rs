//! Encoding detection from the first bytes of an XML document.
//!
//! A byte order mark wins over everything else. Without one, the encoding
//! attribute of the XML declaration (`<?xml ... encoding="..."?>`) is used if
//! it can be read completely from the buffer. Anything else is UTF-8.

use std::borrow::Cow;

/// Name reported when no BOM or declared encoding is found.
pub const UTF_8: &str = "UTF-8";

/// Byte order marks and the encodings they signal.
///
/// UTF-32 marks come first: `FF FE 00 00` starts with the UTF-16LE mark
/// `FF FE`, and `00 00 FE FF` ends with the UTF-16BE one.
pub static BOMS: &[(&[u8], &str)] = &[
    (b"\xFF\xFE\x00\x00", "UTF-32LE"),
    (b"\x00\x00\xFE\xFF", "UTF-32BE"),
    (b"\xEF\xBB\xBF", UTF_8),
    (b"\xFF\xFE", "UTF-16LE"),
    (b"\xFE\xFF", "UTF-16BE"),
];

const XML_DECL: &[u8] = b"<?xml";
const ENCODING_ATTR: &[u8] = b"encoding=\"";

/// Detects the encoding of `buf`.
///
/// Returns the encoding name and the length of the BOM to skip. The BOM
/// length is 0 unless the encoding came from a byte order mark.
///
/// Never fails: short, empty or unrecognized input is reported as
/// `("UTF-8", 0)`, as is a declared encoding whose closing quote lies beyond
/// the end of `buf`. A declared name that is not UTF-8 is returned with
/// invalid bytes replaced by U+FFFD; no registry knows it.
///
/// ```
/// use xml_utf8::detect;
///
/// let (name, bom_len) = detect(b"\xFF\xFEt\x00");
/// assert_eq!((&*name, bom_len), ("UTF-16LE", 2));
/// let (name, bom_len) = detect(b"<?xml version=\"1.0\" encoding=\"KOI8-R\"?>");
/// assert_eq!((&*name, bom_len), ("KOI8-R", 0));
/// assert_eq!(detect(b"<root/>").0, "UTF-8");
/// ```
pub fn detect(buf: &[u8]) -> (Cow<'_, str>, usize) {
    if let Some((bom, name)) = BOMS.iter().find(|(bom, _)| buf.starts_with(bom)) {
        return (Cow::Borrowed(*name), bom.len());
    }

    match declared_encoding(buf) {
        Some(name) => (name, 0),
        None => (Cow::Borrowed(UTF_8), 0),
    }
}

/// Reads the value of `encoding="..."` from an XML declaration at the start
/// of `buf`.
fn declared_encoding(buf: &[u8]) -> Option<Cow<'_, str>> {
    if buf.len() < XML_DECL.len() + 1 || !buf.starts_with(XML_DECL) {
        return None;
    }
    let start = find(buf, ENCODING_ATTR)? + ENCODING_ATTR.len();
    let len = buf[start..].iter().position(|&b| b == b'"')?;
    match len {
        0 => None,
        _ => Some(String::from_utf8_lossy(&buf[start..start + len])),
    }
}

#[cfg(feature = "jetscii")]
#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    jetscii::ByteSubstring::new(needle).find(haystack)
}

#[cfg(not(feature = "jetscii"))]
#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
