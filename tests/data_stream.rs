extern crate pigment;
extern crate rand;

use std::io::Cursor;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pigment::prelude::*;

fn samples() -> Vec<f64> {
    let mut rng = StdRng::from_seed([7; 32]);
    let mut values: Vec<f64> = (0..256).map(|_| rng.gen_range(-1e6, 1e6)).collect();
    values.extend_from_slice(&[
        0.0,
        -0.0,
        1.0,
        ::std::f64::MIN_POSITIVE,
        ::std::f64::MAX,
        ::std::f64::INFINITY,
        ::std::f64::NEG_INFINITY,
        ::std::f64::NAN,
    ]);
    values
}

fn round_trip(endianness: Endianness) {
    let values = samples();

    let mut writer = DataWriter::new(Vec::new(), endianness);
    writer.write_f64_slice(&values).unwrap();
    assert_eq!(writer.written(), values.len() * 8);

    let bytes = writer.into_inner();
    for (i, v) in values.iter().enumerate() {
        let expected = match endianness {
            Endianness::Big => v.to_bits().to_be_bytes(),
            Endianness::Little => v.to_bits().to_le_bytes(),
        };

        assert_eq!(&bytes[i * 8..i * 8 + 8], &expected[..]);
    }

    let mut reader = DataReader::new(Cursor::new(bytes), endianness);
    let mut restored = vec![0.0f64; values.len()];
    reader.read_f64_slice(&mut restored).unwrap();
    assert_eq!(reader.bytes_read(), values.len() * 8);

    for (lhs, rhs) in values.iter().zip(restored.iter()) {
        assert_eq!(lhs.to_bits(), rhs.to_bits());
    }
}

#[test]
fn doubles_big_endian() {
    round_trip(Endianness::Big);
}

#[test]
fn doubles_little_endian() {
    round_trip(Endianness::Little);
}

#[test]
fn one_in_big_endian() {
    let mut writer = DataWriter::new(Vec::new(), Endianness::Big);
    writer.write_f64(1.0).unwrap();
    assert_eq!(
        writer.into_inner(),
        vec![0x3f, 0xf0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn mixed_records() {
    let mut writer = DataWriter::new(Vec::new(), Endianness::native());
    writer.write_u16(0xBEEF).unwrap();
    writer.write_i32_slice(&[-1, 2, -3]).unwrap();
    writer.write_string("pass").unwrap();
    writer.write_f32(0.5).unwrap();

    let mut reader = DataReader::new(Cursor::new(writer.into_inner()), Endianness::native());
    assert_eq!(reader.read_u16().unwrap(), 0xBEEF);

    let mut ints = [0i32; 3];
    reader.read_i32_slice(&mut ints).unwrap();
    assert_eq!(ints, [-1, 2, -3]);
    assert_eq!(reader.read_string().unwrap(), "pass");
    assert_eq!(reader.read_f32().unwrap(), 0.5);

    // The stream is exhausted.
    assert!(reader.read_f32().is_err());
}
