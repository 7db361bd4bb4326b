//! [`quick_xml`] on top of [`Utf8Reader`].
//!
//! quick-xml is built here without its own `encoding` feature, so it takes
//! its input as UTF-8 and never transcodes a second time.

use std::io::Read;

use quick_xml::Reader;

use crate::transcoder::{Config, Utf8Reader};

/// Builds a quick-xml reader over `source` in whatever encoding it declares.
///
/// Unsupported encodings are logged and the bytes handed to the tokenizer
/// untransformed, like [`Config::open_lenient`] does.
///
/// ```
/// use quick_xml::events::Event;
///
/// let src = &b"<?xml encoding=\"ISO-8859-2\"?><name>\xBElt\xFD</name>"[..];
/// let mut reader = xml_utf8::xml::reader(src);
/// let mut buf = Vec::new();
/// let mut text = String::new();
/// loop {
///     match reader.read_event_into(&mut buf).unwrap() {
///         Event::Text(t) => text.push_str(&t.unescape().unwrap()),
///         Event::Eof => break,
///         _ => (),
///     }
///     buf.clear();
/// }
/// assert_eq!(text, "žlutý");
/// ```
pub fn reader<R: Read>(source: R) -> Reader<Utf8Reader<R>> {
    reader_with(&Config::default(), source)
}

pub fn reader_with<R: Read>(config: &Config, source: R) -> Reader<Utf8Reader<R>> {
    Reader::from_reader(config.open_lenient(source))
}
