use std::io;
use std::io::{BufRead, Read};

use log::trace;

use crate::charset::{CharsetDecoder, DecodeStatus};
use crate::errors::Error;
use crate::transcoder::Trap;

const REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();
/// Room needed to always make progress: one UTF-8 character.
const MIN_ROOM: usize = 4;

/// Pulls bytes from `inner` and hands them out as UTF-8.
///
/// Decoding happens one output buffer at a time, as the consumer asks for
/// more.
pub(crate) struct DecodingReader<R> {
    inner: R,
    decoder: Box<dyn CharsetDecoder>,
    trap: Trap,
    out: Box<[u8]>,
    pos: usize,
    len: usize,
    /// The decoder saw the end of the input.
    finished: bool,
    /// An error met after some output was already decoded; reported once
    /// that output is consumed.
    pending: Option<io::Error>,
    /// A replacement character that did not fit in the output buffer.
    replacement: bool,
}

impl<R> DecodingReader<R> {
    pub(crate) fn encoding(&self) -> &str {
        self.decoder.name()
    }

    pub(crate) fn get_ref(&self) -> &R {
        &self.inner
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> DecodingReader<R> {
    pub(crate) fn new(
        inner: R,
        decoder: Box<dyn CharsetDecoder>,
        trap: Trap,
        capacity: usize,
    ) -> Self {
        DecodingReader {
            inner,
            decoder,
            trap,
            out: vec![0; capacity.max(MIN_ROOM * 2)].into_boxed_slice(),
            pos: 0,
            len: 0,
            finished: false,
            pending: None,
            replacement: false,
        }
    }

    /// Decodes into the empty output buffer until it has something to hand
    /// out or the input ends.
    fn decode_more(&mut self) -> io::Result<()> {
        debug_assert_eq!(self.pos, self.len);
        self.pos = 0;
        self.len = 0;

        if let Some(e) = self.pending.take() {
            return Err(e);
        }
        if self.replacement {
            self.replacement = false;
            self.push_replacement();
        }

        while !self.finished && self.out.len() - self.len >= MIN_ROOM {
            let src = match self.inner.fill_buf() {
                Ok(src) => src,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if self.len > 0 => {
                    self.pending = Some(e);
                    break;
                }
                Err(e) => return Err(e),
            };
            let last = src.is_empty();
            let (status, read, written) = self.decoder.decode(src, &mut self.out[self.len..], last);
            self.inner.consume(read);
            self.len += written;
            trace!(
                "decoded {} bytes of {} into {} bytes",
                read,
                self.decoder.name(),
                written
            );

            match status {
                DecodeStatus::InputEmpty if last => self.finished = true,
                DecodeStatus::InputEmpty if self.len > 0 => break,
                DecodeStatus::InputEmpty => (),
                DecodeStatus::OutputFull => break,
                DecodeStatus::Malformed => match self.trap {
                    Trap::Replace if self.out.len() - self.len >= REPLACEMENT.len() => {
                        self.push_replacement()
                    }
                    Trap::Replace => {
                        self.replacement = true;
                        break;
                    }
                    Trap::Strict if self.len == 0 => {
                        return Err(Error::malformed(self.decoder.name()));
                    }
                    Trap::Strict => {
                        self.pending = Some(Error::malformed(self.decoder.name()));
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    fn push_replacement(&mut self) {
        let end = self.len + REPLACEMENT.len();
        self.out[self.len..end].copy_from_slice(REPLACEMENT);
        self.len = end;
    }
}

impl<R: BufRead> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = {
            let mut available = self.fill_buf()?;
            available.read(buf)?
        };
        self.consume(read);
        Ok(read)
    }
}

impl<R: BufRead> BufRead for DecodingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.len {
            self.decode_more()?;
        }
        Ok(&self.out[self.pos..self.len])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = std::cmp::min(self.pos + amt, self.len);
    }
}
