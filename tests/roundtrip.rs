//! Serialize/deserialize round trips over streams: multi-value calls,
//! byte counting, capacity handling, and the io adapters.

use mpack::{
    decode_from_slice, encode_to_bytes, Decoder, Encoder, Error, IoSink, IoSource, SliceSource,
    StrBuf,
};

#[test]
fn bools_roundtrip_and_hit_end_of_input() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.serialize(&(true, false)).unwrap();
    assert_eq!(enc.byte_count(), 2);
    drop(enc);
    assert_eq!(buf, [0xc3, 0xc2]);

    let mut src = SliceSource::new(&buf);
    let mut dec = Decoder::new(&mut src);
    let mut first = false;
    let mut second = true;
    dec.deserialize(&mut (&mut first, &mut second)).unwrap();
    assert!(first);
    assert!(!second);
    assert_eq!(dec.byte_count(), 2);

    let mut third = false;
    assert!(matches!(
        dec.deserialize(&mut third),
        Err(Error::EndOfInput)
    ));
}

#[test]
fn small_unsigned_values_stay_single_byte() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.serialize(&(0u8, 35u16, 127u32)).unwrap();
    assert_eq!(enc.byte_count(), 3);
    drop(enc);
    assert_eq!(buf, [0x00, 0x23, 0x7f]);

    let mut src = SliceSource::new(&buf);
    let mut dec = Decoder::new(&mut src);
    let (mut a, mut b, mut c) = (0u8, 0u8, 0u8);
    dec.deserialize(&mut (&mut a, &mut b, &mut c)).unwrap();
    assert_eq!((a, b, c), (0, 35, 127));
}

#[test]
fn uint8_family_decodes_into_u8_destinations() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.serialize(&(128u16, 180u32, 255u64)).unwrap();
    drop(enc);
    assert_eq!(buf, [0xcc, 0x80, 0xcc, 0xb4, 0xcc, 0xff]);

    let mut src = SliceSource::new(&buf);
    let mut dec = Decoder::new(&mut src);
    let (mut a, mut b, mut c) = (0u8, 0u8, 0u8);
    dec.deserialize(&mut (&mut a, &mut b, &mut c)).unwrap();
    assert_eq!((a, b, c), (128, 180, 255));
}

#[test]
fn uint16_family_decodes_into_wide_destinations() {
    let wire = [0xcd, 0x01, 0x00, 0xcd, 0x75, 0x30];
    let mut src = SliceSource::new(&wire);
    let mut dec = Decoder::new(&mut src);
    let mut val16 = 0u16;
    let mut val32 = 0u32;
    dec.deserialize(&mut (&mut val16, &mut val32)).unwrap();
    assert_eq!(val16, 256);
    assert_eq!(val32, 30000);

    assert!(matches!(
        decode_from_slice::<u8>(&[0xcd, 0x01, 0x00]),
        Err(Error::NarrowingConversion { .. })
    ));
}

#[test]
fn negative_fixints_roundtrip() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.serialize(&(-1i8, -12i16, -32i32)).unwrap();
    drop(enc);
    assert_eq!(buf, [0xff, 0xf4, 0xe0]);

    let mut src = SliceSource::new(&buf);
    let mut dec = Decoder::new(&mut src);
    let (mut a, mut b, mut c) = (0i8, 0i8, 0i8);
    dec.deserialize(&mut (&mut a, &mut b, &mut c)).unwrap();
    assert_eq!((a, b, c), (-1, -12, -32));
}

#[test]
fn mixed_float_sequence_counts_38_bytes() {
    let floats32 = (3.14159f32, 0.0f32, f32::MAX, f32::INFINITY);
    let floats64 = (f64::MIN_POSITIVE, 1.14f64);

    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.serialize(&floats32).unwrap();
    enc.serialize(&floats64).unwrap();
    assert_eq!(enc.byte_count(), 38); // four 5-byte f32 groups, two 9-byte f64 groups
    drop(enc);
    assert_eq!(buf[0], 0xca);
    assert_eq!(buf[20], 0xcb);

    let mut src = SliceSource::new(&buf);
    let mut dec = Decoder::new(&mut src);
    let (mut a, mut b, mut c, mut d) = (0f32, 0f32, 0f32, 0f32);
    let (mut e, mut f) = (0f64, 0f64);
    dec.deserialize(&mut (&mut a, &mut b, &mut c, &mut d, &mut e, &mut f))
        .unwrap();
    assert_eq!(a.to_bits(), 3.14159f32.to_bits());
    assert_eq!(b.to_bits(), 0.0f32.to_bits());
    assert_eq!(c, f32::MAX);
    assert_eq!(d, f32::INFINITY);
    assert_eq!(e, f64::MIN_POSITIVE);
    assert_eq!(f, 1.14f64);
}

#[test]
fn float32_widens_into_f64_destination() {
    let wire = encode_to_bytes(&2.5f32).unwrap();
    let got: f64 = decode_from_slice(&wire).unwrap();
    assert_eq!(got, 2.5);
}

#[test]
fn arrays_respect_destination_capacity() {
    let wire = encode_to_bytes(&[5u8, 4, 3, 2]).unwrap();
    assert_eq!(&wire[..], [0x94, 0x05, 0x04, 0x03, 0x02]);

    assert!(matches!(
        decode_from_slice::<[u8; 3]>(&wire),
        Err(Error::CapacityTooSmall {
            needed: 4,
            capacity: 3
        })
    ));

    let grown: Vec<u8> = decode_from_slice(&wire).unwrap();
    assert_eq!(grown, [5, 4, 3, 2]);

    // A shorter value fills the leading slots of a fixed destination.
    let mut fixed = [9u8; 6];
    let mut src = SliceSource::new(&wire);
    let mut dec = Decoder::new(&mut src);
    dec.deserialize(&mut fixed).unwrap();
    assert_eq!(fixed, [5, 4, 3, 2, 9, 9]);
}

#[test]
fn sixteen_element_array_uses_array16() {
    let values: [i32; 16] = [
        16, 15, 14, 13, 12, 11, 10, 9, -1, -2, -3, -4, -5, -6, -7, -8,
    ];
    let wire = encode_to_bytes(&values).unwrap();
    assert_eq!(&wire[..3], [0xdc, 0x00, 0x10]);
    // Every element fits a fixint, one byte each.
    assert_eq!(wire.len(), 19);

    let grown: Vec<i32> = decode_from_slice(&wire).unwrap();
    assert_eq!(grown, values);

    let fixed: [i32; 16] = decode_from_slice(&wire).unwrap();
    assert_eq!(fixed, values);
}

#[test]
fn growable_strings_get_a_nul_by_default() {
    let wire = encode_to_bytes("abc").unwrap();
    let with_nul: String = decode_from_slice(&wire).unwrap();
    assert_eq!(with_nul, "abc\0");

    let mut src = SliceSource::new(&wire);
    let mut dec = Decoder::new(&mut src);
    dec.nul_terminated_strings(false);
    let mut bare = String::new();
    dec.deserialize(&mut bare).unwrap();
    assert_eq!(bare, "abc");
}

#[test]
fn fixed_string_buffers_take_len_plus_one() {
    let wire = encode_to_bytes("abc").unwrap();

    let buf: StrBuf<4> = decode_from_slice(&wire).unwrap();
    assert_eq!(buf.as_str(), "abc");
    assert_eq!(buf.len(), 3);

    assert!(matches!(
        decode_from_slice::<StrBuf<3>>(&wire),
        Err(Error::CapacityTooSmall {
            needed: 4,
            capacity: 3
        })
    ));
}

#[test]
fn str_buf_reencodes_without_terminator() {
    let wire = encode_to_bytes("hello").unwrap();
    let buf: StrBuf<16> = decode_from_slice(&wire).unwrap();
    assert_eq!(encode_to_bytes(&buf).unwrap(), wire);
}

#[test]
fn megabyte_string_roundtrips() {
    let big = "x".repeat(1 << 20);
    let wire = encode_to_bytes(big.as_str()).unwrap();
    assert_eq!(&wire[..5], [0xdb, 0x00, 0x10, 0x00, 0x00]);
    assert_eq!(wire.len() as u64, (1 << 20) + 5);

    let mut src = SliceSource::new(&wire);
    let mut dec = Decoder::new(&mut src);
    dec.nul_terminated_strings(false);
    let mut back = String::new();
    dec.deserialize(&mut back).unwrap();
    assert_eq!(back, big);
    assert_eq!(dec.byte_count(), wire.len() as u64);
}

#[test]
fn large_array_roundtrips() {
    let values: Vec<u32> = (0..(1u32 << 17)).collect();
    let wire = encode_to_bytes(&values).unwrap();
    assert_eq!(&wire[..5], [0xdd, 0x00, 0x02, 0x00, 0x00]);

    let back: Vec<u32> = decode_from_slice(&wire).unwrap();
    assert_eq!(back, values);
}

#[test]
fn encoder_counts_from_existing_sink_position() {
    let mut buf = vec![0xaa, 0xbb];
    let mut enc = Encoder::new(&mut buf);
    enc.serialize(&1u8).unwrap();
    assert_eq!(enc.byte_count(), 1);
    drop(enc);
    assert_eq!(buf, [0xaa, 0xbb, 0x01]);
}

#[test]
fn io_adapters_roundtrip() {
    let mut sink = IoSink::new(Vec::new());
    let mut enc = Encoder::new(&mut sink);
    enc.serialize(&(1u8, "hi", true, -7i32)).unwrap();
    assert_eq!(enc.byte_count(), 6);
    drop(enc);
    let wire = sink.into_inner();

    let mut src = IoSource::new(&wire[..]);
    let mut dec = Decoder::new(&mut src);
    dec.nul_terminated_strings(false);
    let mut n = 0u8;
    let mut s = String::new();
    let mut flag = false;
    let mut neg = 0i32;
    dec.deserialize(&mut (&mut n, &mut s, &mut flag, &mut neg))
        .unwrap();
    assert_eq!((n, s.as_str(), flag, neg), (1, "hi", true, -7));
    assert_eq!(dec.byte_count(), wire.len() as u64);
}

#[test]
fn variadic_call_equals_sequential_calls() {
    let mut variadic = Vec::new();
    let mut enc = Encoder::new(&mut variadic);
    enc.serialize(&(42u16, "ab", -5i8)).unwrap();
    drop(enc);

    let mut sequential = Vec::new();
    let mut enc = Encoder::new(&mut sequential);
    enc.serialize(&42u16).unwrap();
    enc.serialize("ab").unwrap();
    enc.serialize(&-5i8).unwrap();
    drop(enc);

    assert_eq!(variadic, sequential);
}
