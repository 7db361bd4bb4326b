//! Encoding detection and UTF-8 transcoding for XML byte streams.
//!
//! XML documents announce their encoding with a byte order mark or with the
//! `encoding` attribute of the XML declaration. [`Utf8Reader`] looks at the
//! first bytes of a stream once, picks the encoding, and then hands out the
//! document as UTF-8, so that tokenizers which only understand UTF-8 can
//! read documents in UTF-16, Windows-1251, ISO-8859-2 and so on.
//!
//! ```
//! use std::io::Read;
//! use xml_utf8::Utf8Reader;
//!
//! let src = &b"<?xml encoding=\"Windows-1251\"?>\xC1\xF3\xEB\xE3\xE0\xEA\xEE\xE2"[..];
//! let mut xml = String::new();
//! Utf8Reader::new(src)?.read_to_string(&mut xml)?;
//! assert_eq!(xml, "<?xml encoding=\"Windows-1251\"?>Булгаков");
//! # Ok::<(), xml_utf8::Error>(())
//! ```
//!
//! Detection alone is available through [`detect`].
//!
//! # Features
//!
//! - `jetscii` (default): faster search for the encoding attribute.
//! - `quick-xml`: the [`xml`] module, building a `quick_xml::Reader` on top
//!   of [`Utf8Reader`].

mod charset;
mod encoding;
mod errors;
mod transcoder;
#[cfg(feature = "quick-xml")]
pub mod xml;

pub use crate::charset::{
    CharsetDecoder, CharsetRegistry, DecodeStatus, DefaultRegistry, Utf32Decoder,
};
pub use crate::encoding::{detect, BOMS, UTF_8};
pub use crate::errors::{Error, Result, Unsupported};
pub use crate::transcoder::{Config, Trap, Utf8Reader, DEFAULT_CAPACITY, DEFAULT_LOOKAHEAD};
