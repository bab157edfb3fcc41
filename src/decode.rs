//! Decoding from a byte source into caller-supplied destinations.
//!
//! [`Decoder`] validates the next value in three steps: peek the tag,
//! check it against the family group of the destination type, check that
//! the destination can hold every value of that family, and only then
//! consume tag and payload. A [`TypeMismatch`](crate::Error::TypeMismatch)
//! or a fixed-width [`NarrowingConversion`](crate::Error::NarrowingConversion)
//! therefore leaves the tag in the source for the caller to diagnose.
//! Types opt in through [`Unpack`]; tuples of destinations decode
//! sequentially.

use std::io;
use std::str;

use crate::encode::{Encoder, Pack};
use crate::endian::to_big_endian;
use crate::format::Format;
use crate::io::{Sink, Source};
use crate::{Error, Result};

fn read_err(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::EndOfInput
    } else {
        Error::StreamRead(e)
    }
}

/// Streaming decoder bound to a borrowed byte source.
pub struct Decoder<'a, R: Source> {
    source: &'a mut R,
    start: u64,
    nul_strings: bool,
}

impl<'a, R: Source> Decoder<'a, R> {
    /// Binds to `source` at its current position.
    pub fn new(source: &'a mut R) -> Self {
        let start = source.position();
        Decoder {
            source,
            start,
            nul_strings: true,
        }
    }

    /// Binds to `source`, counting bytes from the caller-supplied offset.
    pub fn with_offset(source: &'a mut R, start: u64) -> Self {
        Decoder {
            source,
            start,
            nul_strings: true,
        }
    }

    /// Controls whether growable string destinations receive a trailing
    /// NUL, matching the fixed-buffer form. On by default.
    pub fn nul_terminated_strings(&mut self, on: bool) -> &mut Self {
        self.nul_strings = on;
        self
    }

    /// Bytes consumed through this decoder since construction.
    pub fn byte_count(&self) -> u64 {
        self.source.position() - self.start
    }

    /// Fills one destination, or several via a tuple of destinations, from
    /// the next value(s) in the source.
    ///
    /// A failure mid-tuple leaves earlier destinations populated and the
    /// source positioned at the bytes actually consumed.
    pub fn deserialize<T: Unpack + ?Sized>(&mut self, dest: &mut T) -> Result<()> {
        dest.unpack(self)
    }

    fn peek_tag(&mut self) -> Result<u8> {
        match self.source.peek().map_err(read_err)? {
            Some(tag) => Ok(tag),
            None => Err(Error::EndOfInput),
        }
    }

    fn bump(&mut self) -> Result<u8> {
        match self.source.get().map_err(read_err)? {
            Some(byte) => Ok(byte),
            None => Err(Error::EndOfInput),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.source.read_exact(buf).map_err(read_err)
    }

    fn read_u16_be(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(to_big_endian(u16::from_ne_bytes(buf)))
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(to_big_endian(u32::from_ne_bytes(buf)))
    }

    fn read_u64_be(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(to_big_endian(u64::from_ne_bytes(buf)))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let tag = self.peek_tag()?;
        let value = match Format::of(tag) {
            Format::True => true,
            Format::False => false,
            _ => {
                return Err(Error::TypeMismatch {
                    expected: "bool",
                    found: tag,
                })
            }
        };
        self.bump()?;
        Ok(value)
    }

    /// Decodes the next unsigned-family value for a destination whose
    /// maximum is `max`. The family's implied range is checked against the
    /// destination before any byte is consumed.
    pub fn read_unsigned(&mut self, dest: &'static str, max: u64) -> Result<u64> {
        let tag = self.peek_tag()?;
        match Format::of(tag) {
            Format::PosFixint => {
                self.bump()?;
                Ok((tag & 0x7f) as u64)
            }
            Format::Uint8 => {
                self.narrow(max >= u8::MAX as u64, "uint8", dest)?;
                self.bump()?;
                Ok(self.bump()? as u64)
            }
            Format::Uint16 => {
                self.narrow(max >= u16::MAX as u64, "uint16", dest)?;
                self.bump()?;
                Ok(self.read_u16_be()? as u64)
            }
            Format::Uint32 => {
                self.narrow(max >= u32::MAX as u64, "uint32", dest)?;
                self.bump()?;
                Ok(self.read_u32_be()? as u64)
            }
            Format::Uint64 => {
                self.narrow(max >= u64::MAX, "uint64", dest)?;
                self.bump()?;
                self.read_u64_be()
            }
            _ => Err(Error::TypeMismatch {
                expected: "unsigned integer",
                found: tag,
            }),
        }
    }

    /// Decodes the next signed-family value for a destination spanning
    /// `min..=max`. Both bounds participate in the narrowing check.
    pub fn read_signed(&mut self, dest: &'static str, min: i64, max: i64) -> Result<i64> {
        let tag = self.peek_tag()?;
        match Format::of(tag) {
            Format::PosFixint => {
                self.bump()?;
                Ok((tag & 0x7f) as i64)
            }
            Format::NegFixint => {
                // The tag byte read as two's complement is the value.
                self.bump()?;
                Ok(tag as i8 as i64)
            }
            Format::Int8 => {
                self.narrow(min <= i8::MIN as i64 && max >= i8::MAX as i64, "int8", dest)?;
                self.bump()?;
                Ok(self.bump()? as i8 as i64)
            }
            Format::Int16 => {
                self.narrow(min <= i16::MIN as i64 && max >= i16::MAX as i64, "int16", dest)?;
                self.bump()?;
                Ok(self.read_u16_be()? as i16 as i64)
            }
            Format::Int32 => {
                self.narrow(min <= i32::MIN as i64 && max >= i32::MAX as i64, "int32", dest)?;
                self.bump()?;
                Ok(self.read_u32_be()? as i32 as i64)
            }
            Format::Int64 => {
                self.narrow(min == i64::MIN && max == i64::MAX, "int64", dest)?;
                self.bump()?;
                Ok(self.read_u64_be()? as i64)
            }
            _ => Err(Error::TypeMismatch {
                expected: "signed integer",
                found: tag,
            }),
        }
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let tag = self.peek_tag()?;
        match Format::of(tag) {
            Format::Float32 => {
                self.bump()?;
                Ok(f32::from_bits(self.read_u32_be()?))
            }
            Format::Float64 => Err(Error::NarrowingConversion {
                family: "float64",
                dest: "f32",
            }),
            _ => Err(Error::TypeMismatch {
                expected: "float",
                found: tag,
            }),
        }
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let tag = self.peek_tag()?;
        match Format::of(tag) {
            Format::Float32 => {
                self.bump()?;
                Ok(f32::from_bits(self.read_u32_be()?) as f64)
            }
            Format::Float64 => {
                self.bump()?;
                Ok(f64::from_bits(self.read_u64_be()?))
            }
            _ => Err(Error::TypeMismatch {
                expected: "float",
                found: tag,
            }),
        }
    }

    /// Validates the string family and consumes tag plus length prefix,
    /// returning the payload length.
    pub fn read_str_header(&mut self) -> Result<usize> {
        let tag = self.peek_tag()?;
        match Format::of(tag) {
            Format::FixStr => {
                self.bump()?;
                Ok((tag & 0x1f) as usize)
            }
            Format::Str8 => {
                self.bump()?;
                Ok(self.bump()? as usize)
            }
            Format::Str16 => {
                self.bump()?;
                Ok(self.read_u16_be()? as usize)
            }
            Format::Str32 => {
                self.bump()?;
                Ok(self.read_u32_be()? as usize)
            }
            _ => Err(Error::TypeMismatch {
                expected: "string",
                found: tag,
            }),
        }
    }

    /// Validates the array family and consumes tag plus count prefix,
    /// returning the element count.
    pub fn read_array_header(&mut self) -> Result<usize> {
        let tag = self.peek_tag()?;
        match Format::of(tag) {
            Format::FixArray => {
                self.bump()?;
                Ok((tag & 0x0f) as usize)
            }
            Format::Array16 => {
                self.bump()?;
                Ok(self.read_u16_be()? as usize)
            }
            Format::Array32 => {
                self.bump()?;
                Ok(self.read_u32_be()? as usize)
            }
            _ => Err(Error::TypeMismatch {
                expected: "array",
                found: tag,
            }),
        }
    }

    fn narrow(&self, fits: bool, family: &'static str, dest: &'static str) -> Result<()> {
        if fits {
            Ok(())
        } else {
            Err(Error::NarrowingConversion { family, dest })
        }
    }
}

/// Mutable destination fillable from a byte source.
pub trait Unpack {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()>;
}

impl Unpack for bool {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
        *self = dec.read_bool()?;
        Ok(())
    }
}

macro_rules! unpack_unsigned {
    ($($t:ty),*) => {
        $(
            impl Unpack for $t {
                fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
                    *self = dec.read_unsigned(stringify!($t), <$t>::MAX as u64)? as $t;
                    Ok(())
                }
            }
        )*
    };
}

macro_rules! unpack_signed {
    ($($t:ty),*) => {
        $(
            impl Unpack for $t {
                fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
                    *self = dec.read_signed(
                        stringify!($t),
                        <$t>::MIN as i64,
                        <$t>::MAX as i64,
                    )? as $t;
                    Ok(())
                }
            }
        )*
    };
}

unpack_unsigned!(u8, u16, u32, u64, usize);
unpack_signed!(i8, i16, i32, i64, isize);

impl Unpack for f32 {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
        *self = dec.read_f32()?;
        Ok(())
    }
}

impl Unpack for f64 {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
        *self = dec.read_f64()?;
        Ok(())
    }
}

impl Unpack for String {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
        let len = dec.read_str_header()?;
        let mut buf = vec![0u8; len];
        dec.read_exact(&mut buf)?;
        let mut s = String::from_utf8(buf).map_err(|e| Error::InvalidUtf8(e.utf8_error()))?;
        if dec.nul_strings {
            s.push('\0');
        }
        *self = s;
        Ok(())
    }
}

/// Fixed arrays admit at most `N` elements; a shorter wire value fills the
/// leading slots and leaves the rest untouched.
impl<T: Unpack, const N: usize> Unpack for [T; N] {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
        let count = dec.read_array_header()?;
        if count > N {
            return Err(Error::CapacityTooSmall {
                needed: count,
                capacity: N,
            });
        }
        for slot in &mut self[..count] {
            slot.unpack(dec)?;
        }
        Ok(())
    }
}

impl<T: Unpack + Default> Unpack for Vec<T> {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
        let count = dec.read_array_header()?;
        self.clear();
        self.resize_with(count, T::default);
        for slot in self.iter_mut() {
            slot.unpack(dec)?;
        }
        Ok(())
    }
}

impl<T: Unpack + ?Sized> Unpack for &mut T {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
        (**self).unpack(dec)
    }
}

macro_rules! tuple_unpack {
    ($($name:ident),+) => {
        impl<$($name: Unpack),+> Unpack for ($($name,)+) {
            #[allow(non_snake_case)]
            fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
                let ($($name,)+) = self;
                $($name.unpack(dec)?;)+
                Ok(())
            }
        }
    };
}

tuple_unpack!(A);
tuple_unpack!(A, B);
tuple_unpack!(A, B, C);
tuple_unpack!(A, B, C, D);
tuple_unpack!(A, B, C, D, E);
tuple_unpack!(A, B, C, D, E, F);
tuple_unpack!(A, B, C, D, E, F, G);
tuple_unpack!(A, B, C, D, E, F, G, H);
tuple_unpack!(A, B, C, D, E, F, G, H, I);
tuple_unpack!(A, B, C, D, E, F, G, H, I, J);
tuple_unpack!(A, B, C, D, E, F, G, H, I, J, K);
tuple_unpack!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Fixed-capacity, NUL-terminated string destination.
///
/// Mirrors decoding into a byte buffer of size `N`: a value of length
/// `len` requires `N >= len + 1` for the terminator. `len()` and
/// `as_str()` exclude the terminator.
#[derive(Clone, Copy)]
pub struct StrBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> StrBuf<N> {
    pub fn new() -> Self {
        StrBuf {
            buf: [0; N],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn as_str(&self) -> &str {
        str::from_utf8(&self.buf[..self.len]).expect("StrBuf contents are validated on write")
    }
}

impl<const N: usize> Default for StrBuf<N> {
    fn default() -> Self {
        StrBuf::new()
    }
}

impl<const N: usize> std::fmt::Debug for StrBuf<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StrBuf").field(&self.as_str()).finish()
    }
}

impl<const N: usize> Unpack for StrBuf<N> {
    fn unpack<R: Source>(&mut self, dec: &mut Decoder<'_, R>) -> Result<()> {
        let len = dec.read_str_header()?;
        if N < len + 1 {
            return Err(Error::CapacityTooSmall {
                needed: len + 1,
                capacity: N,
            });
        }
        // The buffer is about to be overwritten; keep `len` in sync so a
        // failed read or validation leaves the buffer empty, not stale.
        self.len = 0;
        dec.read_exact(&mut self.buf[..len])?;
        str::from_utf8(&self.buf[..len])?;
        self.buf[len] = 0;
        self.len = len;
        Ok(())
    }
}

impl<const N: usize> Pack for StrBuf<N> {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        enc.put_str(self.as_str())
    }
}
