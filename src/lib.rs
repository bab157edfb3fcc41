//! # mpack
//!
//! A streaming MessagePack encoder/decoder for a fixed set of types:
//! booleans, unsigned and signed integers of width 8/16/32/64, `f32`/`f64`,
//! UTF-8 strings, and homogeneous arrays.
//!
//! - [`Encoder`] and [`Decoder`] bind to a borrowed byte stream and track
//!   the bytes written or read since construction
//! - Integers always take the narrowest wire family that holds the value;
//!   all multi-byte fields are big-endian
//! - Decoding is driven by the destination type: the next tag is checked
//!   against the destination's family group, then against its range,
//!   before any byte is consumed
//! - Nil, map, bin, and ext tags are reserved: never produced, always
//!   rejected with [`Error::TypeMismatch`]
//!
//! ## Example
//! ```rust
//! use mpack::{Decoder, Encoder, SliceSource};
//!
//! let mut buf = Vec::new();
//! let mut enc = Encoder::new(&mut buf);
//! enc.serialize(&(true, 35u16, "abc"))?;
//! assert_eq!(enc.byte_count(), 6);
//! drop(enc);
//! assert_eq!(buf, [0xc3, 0x23, 0xa3, 0x61, 0x62, 0x63]);
//!
//! let mut src = SliceSource::new(&buf);
//! let mut dec = Decoder::new(&mut src);
//! dec.nul_terminated_strings(false);
//! let mut flag = false;
//! let mut n = 0u16;
//! let mut s = String::new();
//! dec.deserialize(&mut (&mut flag, &mut n, &mut s))?;
//! assert!(flag);
//! assert_eq!(n, 35);
//! assert_eq!(s, "abc");
//! # Ok::<(), mpack::Error>(())
//! ```
//!
//! One encoder or decoder instance is not meant to be shared between
//! threads; independent instances over independent streams need no
//! coordination.

pub mod decode;
pub mod encode;
pub mod endian;
pub mod format;
pub mod io;

pub use decode::{Decoder, StrBuf, Unpack};
pub use encode::{Encoder, Pack};
pub use format::Format;
pub use io::{IoSink, IoSource, Sink, SliceSource, Source};

use bytes::{Bytes, BytesMut};

/// Error type for every encode and decode operation in this crate.
///
/// Each error aborts the current single-value operation; there are no
/// retries and no fallback encodings. Values already written or
/// destinations already filled stay as they are.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A decode found no bytes available at the source, including a
    /// payload cut short.
    #[error("no bytes available at the source")]
    EndOfInput,
    /// The sink reported a write failure.
    #[error("sink write failed: {0}")]
    StreamWrite(#[source] std::io::Error),
    /// The source reported a read failure other than running out of bytes.
    #[error("source read failed: {0}")]
    StreamRead(#[source] std::io::Error),
    /// The next tag is not in the family group of the destination type.
    /// The tag is left in the source.
    #[error("tag {found:#04x} is not in the {expected} family")]
    TypeMismatch { expected: &'static str, found: u8 },
    /// The family is compatible but the destination cannot represent
    /// every value of it. For fixed-width families the tag is left in the
    /// source.
    #[error("a {family} value does not always fit in {dest}")]
    NarrowingConversion {
        family: &'static str,
        dest: &'static str,
    },
    /// A fixed-capacity destination is smaller than the decoded value
    /// (strings count their NUL terminator).
    #[error("destination holds {capacity} but the value needs {needed}")]
    CapacityTooSmall { needed: usize, capacity: usize },
    /// An encoded string or array would exceed the 32-bit wire limit.
    #[error("length {0} exceeds the 32-bit wire limit")]
    LengthOverflow(usize),
    /// A string payload is not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Encodes `value` into a fresh byte buffer.
///
/// ```rust
/// let wire = mpack::encode_to_bytes(&128u32)?;
/// assert_eq!(&wire[..], [0xcc, 0x80]);
/// # Ok::<(), mpack::Error>(())
/// ```
pub fn encode_to_bytes<T: Pack + ?Sized>(value: &T) -> Result<Bytes> {
    let mut out = BytesMut::new();
    let mut enc = Encoder::new(&mut out);
    enc.serialize(value)?;
    drop(enc);
    Ok(out.freeze())
}

/// Decodes one value of type `T` from the front of `input`.
///
/// ```rust
/// let value: u16 = mpack::decode_from_slice(&[0xcd, 0x01, 0x00])?;
/// assert_eq!(value, 256);
/// # Ok::<(), mpack::Error>(())
/// ```
pub fn decode_from_slice<T: Unpack + Default>(input: &[u8]) -> Result<T> {
    let mut src = SliceSource::new(input);
    let mut dec = Decoder::new(&mut src);
    let mut value = T::default();
    dec.deserialize(&mut value)?;
    Ok(value)
}
