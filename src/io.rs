//! Minimal byte-stream traits consumed by the codec, with in-memory
//! implementations and adapters over [`std::io`].
//!
//! The codec touches streams only through [`Sink`] and [`Source`]; anything
//! that can write bytes and report a position can back an encoder, and
//! anything that can hand out bytes one at a time with one byte of
//! push-back can back a decoder. Streams are expected to be in binary mode
//! (no newline translation); that is the caller's responsibility. Neither
//! trait closes the underlying stream.

use std::io::{self, Read, Write};

use bytes::BytesMut;

/// Byte output stream consumed by [`Encoder`](crate::Encoder).
pub trait Sink {
    /// Appends `buf` to the stream.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Appends a single byte.
    #[inline]
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.write_all(&[byte])
    }

    /// Current byte position.
    fn position(&self) -> u64;

    /// Pushes buffered bytes down to the underlying stream.
    fn flush(&mut self) -> io::Result<()>;
}

/// Byte input stream consumed by [`Decoder`](crate::Decoder).
///
/// `unget` must accept at least the byte most recently read, which is the
/// only shape of push-back the decoder performs. Position counters move
/// backwards on `unget`.
pub trait Source {
    /// Consumes and returns one byte, or `None` at end of input.
    fn get(&mut self) -> io::Result<Option<u8>>;

    /// Pushes the byte most recently read back onto the stream, so the
    /// next `get` returns it again.
    fn unget(&mut self, byte: u8);

    /// Fills `buf` completely or fails with [`io::ErrorKind::UnexpectedEof`].
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Returns the next byte without consuming it.
    fn peek(&mut self) -> io::Result<Option<u8>> {
        Ok(match self.get()? {
            Some(byte) => {
                self.unget(byte);
                Some(byte)
            }
            None => None,
        })
    }

    /// Current byte position.
    fn position(&self) -> u64;

    /// True once the stream has no further bytes.
    fn at_eof(&mut self) -> io::Result<bool> {
        Ok(self.peek()?.is_none())
    }
}

impl Sink for Vec<u8> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.len() as u64
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for BytesMut {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.len() as u64
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Counting [`Sink`] adapter over any [`std::io::Write`].
#[derive(Debug)]
pub struct IoSink<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        IoSink { inner, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for IoSink<W> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.written
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// In-memory [`Source`] over a byte slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl<'a> From<&'a [u8]> for SliceSource<'a> {
    fn from(data: &'a [u8]) -> Self {
        SliceSource::new(data)
    }
}

impl Source for SliceSource<'_> {
    fn get(&mut self) -> io::Result<Option<u8>> {
        match self.data.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }

    fn unget(&mut self, byte: u8) {
        debug_assert!(self.pos > 0 && self.data[self.pos - 1] == byte);
        self.pos -= 1;
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if self.remaining() < buf.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        Ok(self.data.get(self.pos).copied())
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }
}

/// [`Source`] adapter over any [`std::io::Read`], with a one-byte
/// push-back slot.
#[derive(Debug)]
pub struct IoSource<R: Read> {
    inner: R,
    pushback: Option<u8>,
    pos: u64,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        IoSource {
            inner,
            pushback: None,
            pos: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Source for IoSource<R> {
    fn get(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pushback.take() {
            self.pos += 1;
            return Ok(Some(byte));
        }
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.pos += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn unget(&mut self, byte: u8) {
        debug_assert!(self.pushback.is_none());
        self.pushback = Some(byte);
        self.pos -= 1;
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let skip = match self.pushback.take() {
            Some(byte) => {
                buf[0] = byte;
                1
            }
            None => 0,
        };
        self.inner.read_exact(&mut buf[skip..])?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}
