use std::fmt;
use std::io;
use std::io::{BufRead, Read};

use log::{debug, warn};

use crate::charset::{CharsetRegistry, DefaultRegistry};
use crate::encoding::{detect, UTF_8};
use crate::errors::Unsupported;
use crate::transcoder::decoding::DecodingReader;
use crate::transcoder::reader::PeekReader;

mod decoding;
mod reader;

/// Bytes inspected to detect the encoding.
pub const DEFAULT_LOOKAHEAD: usize = 128;
/// Capacity of the internal buffers.
pub const DEFAULT_CAPACITY: usize = 8 * 1024;
/// Smallest useful window: `<?xml` plus one byte.
const MIN_LOOKAHEAD: usize = 6;

/// What to do with byte sequences that are invalid in the detected encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trap {
    /// Fail the read that reaches them with [`io::ErrorKind::InvalidData`].
    #[default]
    Strict,
    /// Replace them with `U+FFFD REPLACEMENT CHARACTER`.
    Replace,
}

/// Settings for building a [`Utf8Reader`].
///
/// ```
/// use xml_utf8::{Config, Trap};
///
/// let src = &b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xE9</a>"[..];
/// let mut reader = Config::new().trap(Trap::Replace).open(src)?;
///
/// let mut xml = String::new();
/// std::io::Read::read_to_string(&mut reader, &mut xml)?;
/// assert!(xml.ends_with("<a>café</a>"));
/// # Ok::<(), xml_utf8::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    lookahead: usize,
    capacity: usize,
    trap: Trap,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            lookahead: DEFAULT_LOOKAHEAD,
            capacity: DEFAULT_CAPACITY,
            trap: Trap::Strict,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leading bytes inspected to detect the encoding. Values below
    /// 6 are raised to 6.
    pub fn lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead.max(MIN_LOOKAHEAD);
        self
    }

    /// Size of the input and output buffers. Never smaller than the
    /// lookahead window.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn trap(mut self, trap: Trap) -> Self {
        self.trap = trap;
        self
    }

    /// Builds a reader using the [`DefaultRegistry`].
    ///
    /// See [`open_with`](Config::open_with).
    pub fn open<R: Read>(&self, source: R) -> Result<Utf8Reader<R>, Unsupported<Utf8Reader<R>>> {
        self.open_with(&DefaultRegistry, source)
    }

    /// Detects the encoding of `source` and builds a reader converting it to
    /// UTF-8.
    ///
    /// If the encoding is not known to `registry`, the error still holds a
    /// reader that skipped the BOM and passes the remaining bytes through
    /// untouched.
    ///
    /// I/O errors while reading the lookahead window are logged and
    /// otherwise ignored: detection works on the bytes read before the error,
    /// and later reads hit the source again.
    pub fn open_with<R: Read>(
        &self,
        registry: &dyn CharsetRegistry,
        source: R,
    ) -> Result<Utf8Reader<R>, Unsupported<Utf8Reader<R>>> {
        let mut source = PeekReader::with_capacity(self.capacity.max(self.lookahead), source);
        if let Err(e) = source.fill_to(self.lookahead) {
            warn!("ignoring error while detecting encoding: {}", e);
        }
        self.finish(registry, source)
    }

    /// Always yields a reader. An unsupported encoding is logged and the
    /// stream is passed through as is.
    pub fn open_lenient<R: Read>(&self, source: R) -> Utf8Reader<R> {
        self.open(source).unwrap_or_else(|e| {
            warn!("{}, reading the input untransformed", e);
            e.into_reader()
        })
    }

    fn finish<R: Read>(
        &self,
        registry: &dyn CharsetRegistry,
        mut source: PeekReader<R>,
    ) -> Result<Utf8Reader<R>, Unsupported<Utf8Reader<R>>> {
        let window = source.buffer();
        let window = &window[..window.len().min(self.lookahead)];
        let (encoding, bom_len) = detect(window);
        let encoding = encoding.into_owned();
        debug!(
            "detected encoding {} (BOM of {} bytes) from {} bytes",
            encoding,
            bom_len,
            window.len()
        );
        source.consume(bom_len);

        if encoding == UTF_8 {
            return Ok(Utf8Reader {
                inner: Inner::PassThrough(source),
            });
        }
        match registry.resolve(&encoding) {
            Ok(decoder) => {
                debug!("decoding {} with {}", encoding, decoder.name());
                let reader = DecodingReader::new(source, decoder, self.trap, self.capacity);
                Ok(Utf8Reader {
                    inner: Inner::Decoding(reader),
                })
            }
            Err(e) => {
                debug!("{}", e);
                Err(Unsupported {
                    reader: Utf8Reader {
                        inner: Inner::PassThrough(source),
                    },
                    encoding,
                })
            }
        }
    }
}

/// Reader producing UTF-8 from an XML byte stream in any supported encoding.
///
/// The encoding is detected once, when the reader is built, from the first
/// bytes of the stream:
///
/// 1. a byte order mark (UTF-8, UTF-16LE/BE, UTF-32LE/BE), which is dropped;
/// 2. otherwise the `encoding="..."` attribute of a leading XML declaration;
/// 3. otherwise UTF-8.
///
/// UTF-8 input is passed through without validation. Everything else is
/// decoded lazily, as it is read.
///
/// ```
/// use std::io::Read;
/// use xml_utf8::Utf8Reader;
///
/// let utf16 = &b"\xFF\xFEt\x00e\x00s\x00t\x00"[..];
/// let mut reader = Utf8Reader::new(utf16)?;
///
/// let mut text = String::new();
/// reader.read_to_string(&mut text)?;
/// assert_eq!(text, "test");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Utf8Reader<R> {
    inner: Inner<R>,
}

enum Inner<R> {
    PassThrough(PeekReader<R>),
    Decoding(DecodingReader<PeekReader<R>>),
}

impl<R: Read> Utf8Reader<R> {
    /// Builds a reader with the default [`Config`].
    ///
    /// If the detected encoding is unsupported, the error holds a reader
    /// returning the raw bytes after the BOM.
    pub fn new(source: R) -> Result<Self, Unsupported<Self>> {
        Config::default().open(source)
    }

    /// Name of the encoding being decoded, or `None` if the input is passed
    /// through as is.
    pub fn encoding(&self) -> Option<&str> {
        match &self.inner {
            Inner::PassThrough(_) => None,
            Inner::Decoding(r) => Some(r.encoding()),
        }
    }

    pub fn get_ref(&self) -> &R {
        match &self.inner {
            Inner::PassThrough(r) => r.get_ref(),
            Inner::Decoding(r) => r.get_ref().get_ref(),
        }
    }

    /// Unwraps the source. Bytes already buffered are lost.
    pub fn into_inner(self) -> R {
        match self.inner {
            Inner::PassThrough(r) => r.into_inner(),
            Inner::Decoding(r) => r.into_inner().into_inner(),
        }
    }
}

impl<R: Read> Read for Utf8Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::PassThrough(r) => r.read(buf),
            Inner::Decoding(r) => r.read(buf),
        }
    }
}

impl<R: Read> BufRead for Utf8Reader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match &mut self.inner {
            Inner::PassThrough(r) => r.fill_buf(),
            Inner::Decoding(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match &mut self.inner {
            Inner::PassThrough(r) => r.consume(amt),
            Inner::Decoding(r) => r.consume(amt),
        }
    }
}

impl<R> fmt::Debug for Utf8Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoding = match &self.inner {
            Inner::PassThrough(_) => None,
            Inner::Decoding(r) => Some(r.encoding()),
        };
        f.debug_struct("Utf8Reader")
            .field("encoding", &encoding)
            .finish_non_exhaustive()
    }
}
