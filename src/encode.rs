//! Encoding onto a byte sink.
//!
//! [`Encoder`] owns the type-to-family dispatch: every value is written as
//! the narrowest family that represents it, as one tag byte followed by
//! its payload in big-endian order. Types opt in through [`Pack`], and
//! tuples act as argument packs so several values can be serialized in one
//! call.

use crate::endian::to_big_endian;
use crate::format::{Format, FIXARR_MASK, FIXSTR_MASK, NEG_FIXINT_MIN};
use crate::io::Sink;
use crate::{Error, Result};

/// Streaming encoder bound to a borrowed byte sink.
///
/// The sink is flushed when the encoder is dropped. A failed write leaves
/// previously serialized values committed to the sink.
pub struct Encoder<'a, W: Sink> {
    sink: &'a mut W,
    start: u64,
}

impl<'a, W: Sink> Encoder<'a, W> {
    /// Binds to `sink` at its current position.
    pub fn new(sink: &'a mut W) -> Self {
        let start = sink.position();
        Encoder { sink, start }
    }

    /// Binds to `sink`, counting bytes from the caller-supplied offset.
    pub fn with_offset(sink: &'a mut W, start: u64) -> Self {
        Encoder { sink, start }
    }

    /// Bytes written through this encoder since construction.
    pub fn byte_count(&self) -> u64 {
        self.sink.position() - self.start
    }

    /// Serializes one value, or several via a tuple of values.
    ///
    /// A tuple is encoded element by element in order; the call is
    /// equivalent to serializing each element separately.
    pub fn serialize<T: Pack + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.pack(self)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush().map_err(Error::StreamWrite)
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes).map_err(Error::StreamWrite)
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        self.sink.write_byte(byte).map_err(Error::StreamWrite)
    }

    pub fn put_bool(&mut self, v: bool) -> Result<()> {
        self.put_byte(if v { Format::True as u8 } else { Format::False as u8 })
    }

    /// Writes `v` as the narrowest unsigned family containing it.
    pub fn put_unsigned(&mut self, v: u64) -> Result<()> {
        if v <= 0x7f {
            self.put_byte(v as u8)
        } else if v <= u8::MAX as u64 {
            self.put(&[Format::Uint8 as u8, v as u8])
        } else if v <= u16::MAX as u64 {
            self.put_byte(Format::Uint16 as u8)?;
            self.put(&to_big_endian(v as u16).to_ne_bytes())
        } else if v <= u32::MAX as u64 {
            self.put_byte(Format::Uint32 as u8)?;
            self.put(&to_big_endian(v as u32).to_ne_bytes())
        } else {
            self.put_byte(Format::Uint64 as u8)?;
            self.put(&to_big_endian(v).to_ne_bytes())
        }
    }

    /// Writes `v` as the narrowest signed family containing it.
    ///
    /// Values in `0..=127` become positive fixints; `-32..=-1` become
    /// negative fixints, whose tag byte is the two's-complement byte of
    /// the value itself.
    pub fn put_signed(&mut self, v: i64) -> Result<()> {
        if (0..=0x7f).contains(&v) {
            self.put_byte(v as u8)
        } else if v < 0 && v >= NEG_FIXINT_MIN {
            self.put_byte(v as i8 as u8)
        } else if v >= i8::MIN as i64 && v <= i8::MAX as i64 {
            self.put(&[Format::Int8 as u8, v as i8 as u8])
        } else if v >= i16::MIN as i64 && v <= i16::MAX as i64 {
            self.put_byte(Format::Int16 as u8)?;
            self.put(&to_big_endian(v as i16 as u16).to_ne_bytes())
        } else if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
            self.put_byte(Format::Int32 as u8)?;
            self.put(&to_big_endian(v as i32 as u32).to_ne_bytes())
        } else {
            self.put_byte(Format::Int64 as u8)?;
            self.put(&to_big_endian(v as u64).to_ne_bytes())
        }
    }

    /// Writes the raw IEEE-754 bits of `v` after the float32 tag.
    pub fn put_f32(&mut self, v: f32) -> Result<()> {
        self.put_byte(Format::Float32 as u8)?;
        self.put(&to_big_endian(v.to_bits()).to_ne_bytes())
    }

    /// Writes the raw IEEE-754 bits of `v` after the float64 tag.
    pub fn put_f64(&mut self, v: f64) -> Result<()> {
        self.put_byte(Format::Float64 as u8)?;
        self.put(&to_big_endian(v.to_bits()).to_ne_bytes())
    }

    /// Writes the string family header and UTF-8 payload for `s`.
    pub fn put_str(&mut self, s: &str) -> Result<()> {
        let len = s.len();
        if len <= 0x1f {
            self.put_byte(FIXSTR_MASK | len as u8)?;
        } else if len <= u8::MAX as usize {
            self.put(&[Format::Str8 as u8, len as u8])?;
        } else if len <= u16::MAX as usize {
            self.put_byte(Format::Str16 as u8)?;
            self.put(&to_big_endian(len as u16).to_ne_bytes())?;
        } else if len <= u32::MAX as usize {
            self.put_byte(Format::Str32 as u8)?;
            self.put(&to_big_endian(len as u32).to_ne_bytes())?;
        } else {
            return Err(Error::LengthOverflow(len));
        }
        self.put(s.as_bytes())
    }

    /// Writes the array family header for a sequence of `len` elements.
    ///
    /// The caller is responsible for encoding exactly `len` elements
    /// afterwards.
    pub fn put_array_header(&mut self, len: usize) -> Result<()> {
        if len <= 0x0f {
            self.put_byte(FIXARR_MASK | len as u8)
        } else if len <= u16::MAX as usize {
            self.put_byte(Format::Array16 as u8)?;
            self.put(&to_big_endian(len as u16).to_ne_bytes())
        } else if len <= u32::MAX as usize {
            self.put_byte(Format::Array32 as u8)?;
            self.put(&to_big_endian(len as u32).to_ne_bytes())
        } else {
            Err(Error::LengthOverflow(len))
        }
    }
}

impl<W: Sink> Drop for Encoder<'_, W> {
    fn drop(&mut self) {
        let _ = self.sink.flush();
    }
}

/// Value encodable onto a byte sink.
pub trait Pack {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()>;
}

impl Pack for bool {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        enc.put_bool(*self)
    }
}

macro_rules! pack_unsigned {
    ($($t:ty),*) => {
        $(
            impl Pack for $t {
                fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
                    enc.put_unsigned(*self as u64)
                }
            }
        )*
    };
}

macro_rules! pack_signed {
    ($($t:ty),*) => {
        $(
            impl Pack for $t {
                fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
                    enc.put_signed(*self as i64)
                }
            }
        )*
    };
}

pack_unsigned!(u8, u16, u32, u64, usize);
pack_signed!(i8, i16, i32, i64, isize);

impl Pack for f32 {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        enc.put_f32(*self)
    }
}

impl Pack for f64 {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        enc.put_f64(*self)
    }
}

impl Pack for str {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        enc.put_str(self)
    }
}

impl Pack for String {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        enc.put_str(self)
    }
}

/// Slices encode as the array family: header, then each element by
/// recursive dispatch. Strings are not arrays; `&[u8]` encodes as an
/// array of integers.
impl<T: Pack> Pack for [T] {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        enc.put_array_header(self.len())?;
        for element in self {
            element.pack(enc)?;
        }
        Ok(())
    }
}

impl<T: Pack, const N: usize> Pack for [T; N] {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        self.as_slice().pack(enc)
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        self.as_slice().pack(enc)
    }
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
        (**self).pack(enc)
    }
}

// Tuples are serialization argument packs, not a wire family: each element
// is encoded in order, exactly as a sequence of single-value calls.
macro_rules! tuple_pack {
    ($($name:ident),+) => {
        impl<$($name: Pack),+> Pack for ($($name,)+) {
            #[allow(non_snake_case)]
            fn pack<W: Sink>(&self, enc: &mut Encoder<'_, W>) -> Result<()> {
                let ($($name,)+) = self;
                $($name.pack(enc)?;)+
                Ok(())
            }
        }
    };
}

tuple_pack!(A);
tuple_pack!(A, B);
tuple_pack!(A, B, C);
tuple_pack!(A, B, C, D);
tuple_pack!(A, B, C, D, E);
tuple_pack!(A, B, C, D, E, F);
tuple_pack!(A, B, C, D, E, F, G);
tuple_pack!(A, B, C, D, E, F, G, H);
tuple_pack!(A, B, C, D, E, F, G, H, I);
tuple_pack!(A, B, C, D, E, F, G, H, I, J);
tuple_pack!(A, B, C, D, E, F, G, H, I, J, K);
tuple_pack!(A, B, C, D, E, F, G, H, I, J, K, L);
