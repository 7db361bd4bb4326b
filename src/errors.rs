use std::fmt;
use std::io;

use thiserror::Error;

/// A specialized `Result` type where the error is hard-wired to [`Error`].
///
/// [`Error`]: enum.Error.html
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The charset registry does not know the detected or declared encoding.
    #[error("unsupported charset: {0:?}")]
    UnsupportedCharset(String),
    /// The input holds a byte sequence that is invalid for its encoding.
    #[error("malformed {encoding} input")]
    Malformed { encoding: String },
}

impl Error {
    pub(crate) fn malformed(encoding: &str) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            Error::Malformed {
                encoding: encoding.to_owned(),
            },
        )
    }
}

/// Returned when the detected encoding cannot be resolved.
///
/// Still owns the reader, positioned right after the BOM (if any) and
/// delivering the raw, untransformed bytes. Callers decide whether to give up
/// or to keep reading with [`into_reader`](Unsupported::into_reader).
pub struct Unsupported<R> {
    pub(crate) reader: R,
    pub(crate) encoding: String,
}

impl<R> Unsupported<R> {
    /// The encoding name that failed to resolve.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn into_reader(self) -> R {
        self.reader
    }

    pub fn into_parts(self) -> (Error, R) {
        (Error::UnsupportedCharset(self.encoding), self.reader)
    }
}

impl<R> fmt::Debug for Unsupported<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsupported")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl<R> fmt::Display for Unsupported<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported charset: {:?}", self.encoding)
    }
}

impl<R> std::error::Error for Unsupported<R> {}

impl<R> From<Unsupported<R>> for Error {
    fn from(e: Unsupported<R>) -> Self {
        Error::UnsupportedCharset(e.encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_converts_and_keeps_reader() {
        let err = Unsupported {
            reader: &b"raw"[..],
            encoding: "Windows-1".to_owned(),
        };
        assert_eq!(err.to_string(), "unsupported charset: \"Windows-1\"");
        let (e, reader) = err.into_parts();
        assert_eq!(reader, b"raw");
        assert!(matches!(e, Error::UnsupportedCharset(ref name) if name == "Windows-1"));
    }

    #[test]
    fn malformed_is_invalid_data() {
        let e = Error::malformed("windows-1251");
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
        assert_eq!(e.to_string(), "malformed windows-1251 input");
    }
}
