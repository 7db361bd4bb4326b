use std::cmp;
use std::io;
use std::io::{BufRead, Read};

/// Buffered reader that can look ahead without consuming.
///
/// Unlike [`std::io::BufReader`], [`fill_to`](PeekReader::fill_to) keeps reading
/// until it holds the requested number of bytes, so sources that trickle data
/// in small chunks are looked at just like a slice would be.
pub(crate) struct PeekReader<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
}

impl<R: Read> PeekReader<R> {
    pub(crate) fn with_capacity(capacity: usize, inner: R) -> Self {
        PeekReader {
            inner,
            buf: vec![0; capacity].into_boxed_slice(),
            pos: 0,
            filled: 0,
        }
    }

    /// Fills the buffer until it holds `n` unread bytes or the source ends.
    ///
    /// `n` is capped at the buffer capacity. On error, whatever was read
    /// before the error is kept and still visible through
    /// [`buffer`](PeekReader::buffer).
    pub(crate) fn fill_to(&mut self, n: usize) -> io::Result<()> {
        let n = cmp::min(n, self.buf.len());
        if self.filled - self.pos >= n {
            return Ok(());
        }
        if self.pos + n > self.buf.len() {
            self.buf.copy_within(self.pos..self.filled, 0);
            self.filled -= self.pos;
            self.pos = 0;
        }
        while self.filled - self.pos < n {
            match self.inner.read(&mut self.buf[self.filled..]) {
                Ok(0) => break,
                Ok(read) => self.filled += read,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Unread bytes currently held in the buffer.
    pub(crate) fn buffer(&self) -> &[u8] {
        &self.buf[self.pos..self.filled]
    }

    pub(crate) fn get_ref(&self) -> &R {
        &self.inner
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for PeekReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        // Skip the copy when the caller's buffer is at least as large as ours.
        if self.pos == self.filled && out.len() >= self.buf.len() {
            return self.inner.read(out);
        }
        let read = {
            let mut available = self.fill_buf()?;
            available.read(out)?
        };
        self.consume(read);
        Ok(read)
    }
}

impl<R: Read> BufRead for PeekReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.filled {
            self.filled = self.inner.read(&mut self.buf)?;
            self.pos = 0;
        }
        Ok(&self.buf[self.pos..self.filled])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = cmp::min(self.pos + amt, self.filled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `chunk` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(out.len()).min(self.data.len());
            out[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn peek_gathers_small_reads() {
        let src = Trickle {
            data: b"<?xml encoding=\"KOI8-R\"?>",
            chunk: 3,
        };
        let mut reader = PeekReader::with_capacity(64, src);
        reader.fill_to(16).unwrap();
        assert_eq!(&reader.buffer()[..16], b"<?xml encoding=\"");
        // peeking does not consume
        let mut all = String::new();
        reader.read_to_string(&mut all).unwrap();
        assert_eq!(all, "<?xml encoding=\"KOI8-R\"?>");
    }

    #[test]
    fn peek_short_source() {
        let mut reader = PeekReader::with_capacity(64, &b"A"[..]);
        reader.fill_to(32).unwrap();
        reader.fill_to(32).unwrap();
        assert_eq!(reader.buffer(), b"A");
    }

    #[test]
    fn peek_is_capped_by_capacity() {
        let mut reader = PeekReader::with_capacity(4, &b"abcdef"[..]);
        reader.fill_to(10).unwrap();
        assert_eq!(reader.buffer(), b"abcd");
    }

    #[test]
    fn peek_after_consume_compacts() {
        let mut reader = PeekReader::with_capacity(4, &b"abcdef"[..]);
        reader.fill_to(4).unwrap();
        reader.consume(3);
        reader.fill_to(3).unwrap();
        assert_eq!(reader.buffer(), b"def");
    }

    #[test]
    fn error_keeps_partial_bytes() {
        let src = (&b"<?x"[..]).chain(Failing);
        let mut reader = PeekReader::with_capacity(16, src);
        assert!(reader.fill_to(8).is_err());
        assert_eq!(reader.buffer(), b"<?x");
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        }
    }
}
