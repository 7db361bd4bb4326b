//! Charset lookup by name.
//!
//! The transcoder only learns the encoding name after looking at the data, so
//! decoders are picked at runtime through a [`CharsetRegistry`].

use encoding_rs::{DecoderResult, Encoding};

use crate::errors::{Error, Result};

/// Outcome of a single [`CharsetDecoder::decode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// All of `src` was consumed.
    InputEmpty,
    /// `dst` has no room for the next character.
    OutputFull,
    /// An invalid sequence ended right before `src[read]`.
    Malformed,
}

/// Streaming conversion from some encoding into UTF-8.
///
/// Incomplete sequences at the end of `src` are kept by the decoder and
/// completed by the next call. `last` marks the end of the stream; no calls
/// follow a call with `last == true` that returned `InputEmpty`.
pub trait CharsetDecoder {
    /// Decodes `src` into `dst`, returning the status plus the number of
    /// bytes read and written.
    fn decode(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
        last: bool,
    ) -> (DecodeStatus, usize, usize);

    /// Name used in error reports.
    fn name(&self) -> &str;
}

impl CharsetDecoder for encoding_rs::Decoder {
    fn decode(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
        last: bool,
    ) -> (DecodeStatus, usize, usize) {
        let (result, read, written) = self.decode_to_utf8_without_replacement(src, dst, last);
        let status = match result {
            DecoderResult::InputEmpty => DecodeStatus::InputEmpty,
            DecoderResult::OutputFull => DecodeStatus::OutputFull,
            DecoderResult::Malformed(_, _) => DecodeStatus::Malformed,
        };
        (status, read, written)
    }

    fn name(&self) -> &str {
        self.encoding().name()
    }
}

/// Maps encoding names to decoders.
pub trait CharsetRegistry {
    fn resolve(&self, name: &str) -> Result<Box<dyn CharsetDecoder>>;
}

impl<F> CharsetRegistry for F
where
    F: Fn(&str) -> Option<Box<dyn CharsetDecoder>>,
{
    fn resolve(&self, name: &str) -> Result<Box<dyn CharsetDecoder>> {
        self(name).ok_or_else(|| Error::UnsupportedCharset(name.to_owned()))
    }
}

/// Registry backed by the WHATWG labels known to `encoding_rs`, plus UTF-32.
///
/// Labels are matched case-insensitively, so `ISO-8859-1`, `latin1` and
/// `Windows-1251` all resolve. Decoders are created without BOM sniffing
/// since the BOM is gone by the time decoding starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRegistry;

impl CharsetRegistry for DefaultRegistry {
    fn resolve(&self, name: &str) -> Result<Box<dyn CharsetDecoder>> {
        if let Some(decoder) = Utf32Decoder::for_label(name) {
            return Ok(Box::new(decoder));
        }
        match Encoding::for_label(name.as_bytes()) {
            Some(encoding) => Ok(Box::new(encoding.new_decoder_without_bom_handling())),
            None => Err(Error::UnsupportedCharset(name.to_owned())),
        }
    }
}

/// UTF-32 decoder, which `encoding_rs` does not provide.
#[derive(Debug)]
pub struct Utf32Decoder {
    big_endian: bool,
    pending: [u8; 4],
    pending_len: usize,
}

impl Utf32Decoder {
    pub fn new(big_endian: bool) -> Self {
        Utf32Decoder {
            big_endian,
            pending: [0; 4],
            pending_len: 0,
        }
    }

    fn for_label(label: &str) -> Option<Self> {
        let label = label.trim_matches(|c: char| c.is_ascii_whitespace());
        if label.eq_ignore_ascii_case("UTF-32LE") {
            Some(Utf32Decoder::new(false))
        } else if label.eq_ignore_ascii_case("UTF-32BE") || label.eq_ignore_ascii_case("UTF-32") {
            Some(Utf32Decoder::new(true))
        } else {
            None
        }
    }

    fn unit(&self) -> u32 {
        if self.big_endian {
            u32::from_be_bytes(self.pending)
        } else {
            u32::from_le_bytes(self.pending)
        }
    }
}

impl CharsetDecoder for Utf32Decoder {
    fn decode(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
        last: bool,
    ) -> (DecodeStatus, usize, usize) {
        let mut read = 0;
        let mut written = 0;
        loop {
            let take = (4 - self.pending_len).min(src.len() - read);
            self.pending[self.pending_len..self.pending_len + take]
                .copy_from_slice(&src[read..read + take]);
            self.pending_len += take;
            read += take;

            if self.pending_len < 4 {
                if last && self.pending_len > 0 {
                    self.pending_len = 0;
                    return (DecodeStatus::Malformed, read, written);
                }
                return (DecodeStatus::InputEmpty, read, written);
            }

            let c = match char::from_u32(self.unit()) {
                Some(c) => c,
                None => {
                    self.pending_len = 0;
                    return (DecodeStatus::Malformed, read, written);
                }
            };
            if dst.len() - written < c.len_utf8() {
                // the complete unit stays pending for the next call
                return (DecodeStatus::OutputFull, read, written);
            }
            c.encode_utf8(&mut dst[written..]);
            written += c.len_utf8();
            self.pending_len = 0;
        }
    }

    fn name(&self) -> &str {
        if self.big_endian {
            "UTF-32BE"
        } else {
            "UTF-32LE"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut dyn CharsetDecoder, src: &[u8]) -> (String, bool) {
        let mut out = [0u8; 64];
        let (status, read, written) = decoder.decode(src, &mut out, true);
        assert_eq!(read, src.len());
        let text = String::from_utf8(out[..written].to_vec()).unwrap();
        (text, status == DecodeStatus::Malformed)
    }

    #[test]
    fn resolves_whatwg_labels() {
        for label in ["ISO-8859-1", "latin1", "Windows-1251", "utf-16le", "KOI8-R"] {
            assert!(DefaultRegistry.resolve(label).is_ok(), "{}", label);
        }
    }

    #[test]
    fn unknown_label() {
        match DefaultRegistry.resolve("Windows-1") {
            Err(Error::UnsupportedCharset(name)) => assert_eq!(name, "Windows-1"),
            _ => panic!("Windows-1 must not resolve"),
        }
    }

    #[test]
    fn windows_1251() {
        let mut decoder = DefaultRegistry.resolve("Windows-1251").unwrap();
        assert_eq!(decoder.name(), "windows-1251");
        let (text, malformed) = decode_all(&mut *decoder, b"\xC1\xF3\xEB\xE3\xE0\xEA\xEE\xE2");
        assert_eq!(text, "Булгаков");
        assert!(!malformed);
    }

    #[test]
    fn utf16_without_bom_sniffing() {
        let mut decoder = DefaultRegistry.resolve("UTF-16LE").unwrap();
        let (text, _) = decode_all(&mut *decoder, b"\xFF\xFEt\x00");
        assert_eq!(text, "\u{FEFF}t");
    }

    #[test]
    fn utf32_both_orders() {
        let mut le = DefaultRegistry.resolve("UTF-32LE").unwrap();
        let (text, _) = decode_all(&mut *le, b"t\x00\x00\x00\x16\x04\x00\x00");
        assert_eq!(text, "tЖ");

        let mut be = DefaultRegistry.resolve("utf-32be").unwrap();
        let (text, _) = decode_all(&mut *be, b"\x00\x00\x00t\x00\x01\xF6\x00");
        assert_eq!(text, "t\u{1F600}");
    }

    #[test]
    fn utf32_keeps_partial_units() {
        let mut decoder = Utf32Decoder::new(false);
        let mut out = [0u8; 8];
        let (status, read, written) = decoder.decode(b"t\x00", &mut out, false);
        assert_eq!((status, read, written), (DecodeStatus::InputEmpty, 2, 0));
        let (status, read, written) = decoder.decode(b"\x00\x00", &mut out, true);
        assert_eq!((status, read, written), (DecodeStatus::InputEmpty, 2, 1));
        assert_eq!(&out[..1], b"t");
    }

    #[test]
    fn utf32_malformed() {
        let mut decoder = Utf32Decoder::new(false);
        let (_, malformed) = decode_all(&mut decoder, b"\x00\xD8\x00\x00");
        assert!(malformed);

        let mut decoder = Utf32Decoder::new(false);
        let (_, malformed) = decode_all(&mut decoder, b"t\x00\x00");
        assert!(malformed);
    }

    #[test]
    fn closure_registry() {
        let registry = |name: &str| -> Option<Box<dyn CharsetDecoder>> {
            if name == "x-latin" {
                Some(Box::new(encoding_rs::WINDOWS_1252.new_decoder_without_bom_handling()))
            } else {
                None
            }
        };
        assert!(registry.resolve("x-latin").is_ok());
        assert!(matches!(
            registry.resolve("latin1"),
            Err(Error::UnsupportedCharset(_))
        ));
    }
}
