//! Round-trip Tests - Primary Codec
//!
//! These tests write every value kind through the primary codec and read it
//! back through the descriptors the stream parser recovers:
//! - All nine scalar kinds and their arrays, including empty arrays
//! - Empty and absent strings
//! - The boxed value path
//! - Single-byte string mode
//! - Identical output over owned and external buffers

mod common;

use common::*;
use fieldwire::{
    BinarySerialiser, DataType, ExternalBuffer, FastByteBuffer, FieldMeta, IoBuffer, IoSerialiser, ProtocolInfo,
    SerialiserConfig, Value, ValueArray,
};
use proptest::prelude::*;

/// Write one field of each kind into an open primary stream
fn write_all_kinds<S: IoSerialiser>(ser: &mut S) {
    ser.put("bool", &true).unwrap();
    ser.put("byte", &-7i8).unwrap();
    ser.put("char", &0x263Au16).unwrap();
    ser.put("short", &-1234i16).unwrap();
    ser.put("int", &i32::MIN).unwrap();
    ser.put("long", &i64::MAX).unwrap();
    ser.put("float", &1.25f32).unwrap();
    ser.put("double", &-2.5e300f64).unwrap();
    ser.put("string", &"grüße".to_string()).unwrap();

    ser.put_array("bools", &[true, false, true]).unwrap();
    ser.put_array("bytes", &[i8::MIN, 0, i8::MAX]).unwrap();
    ser.put_array("chars", &[b'a' as u16, 0xFFFF]).unwrap();
    ser.put_array("shorts", &[1i16, -1]).unwrap();
    ser.put_array("ints", &[1i32, 2, 3]).unwrap();
    ser.put_array("longs", &[i64::MIN]).unwrap();
    ser.put_array("floats", &[0.5f32, f32::MAX]).unwrap();
    ser.put_array("doubles", &[f64::MIN_POSITIVE]).unwrap();
    ser.put_array("strings", &["a".to_string(), String::new(), "ccc".to_string()]).unwrap();
    ser.put_array::<i32>("empty", &[]).unwrap();
}

#[test]
fn test_all_kinds_roundtrip() {
    init_logging();

    let (mut ser, root) = primary_writer();
    write_all_kinds(&mut ser);
    let mut ser = finish_primary(ser, root);

    let tree = ser.parse_stream().unwrap();
    let field = |name: &str| tree.header(tree.find_path(&[name]).unwrap()).clone();

    assert!(ser.get::<bool>(&field("bool")).unwrap());
    assert_eq!(ser.get::<i8>(&field("byte")).unwrap(), -7);
    assert_eq!(ser.get::<u16>(&field("char")).unwrap(), 0x263A);
    assert_eq!(ser.get::<i16>(&field("short")).unwrap(), -1234);
    assert_eq!(ser.get::<i32>(&field("int")).unwrap(), i32::MIN);
    assert_eq!(ser.get::<i64>(&field("long")).unwrap(), i64::MAX);
    assert_eq!(ser.get::<f32>(&field("float")).unwrap(), 1.25);
    assert_eq!(ser.get::<f64>(&field("double")).unwrap(), -2.5e300);
    assert_eq!(ser.get::<String>(&field("string")).unwrap(), "grüße");

    assert_eq!(ser.get_array::<bool>(&field("bools")).unwrap(), vec![true, false, true]);
    assert_eq!(ser.get_array::<i8>(&field("bytes")).unwrap(), vec![i8::MIN, 0, i8::MAX]);
    assert_eq!(ser.get_array::<u16>(&field("chars")).unwrap(), vec![97, 0xFFFF]);
    assert_eq!(ser.get_array::<i16>(&field("shorts")).unwrap(), vec![1, -1]);
    assert_eq!(ser.get_array::<i32>(&field("ints")).unwrap(), vec![1, 2, 3]);
    assert_eq!(ser.get_array::<i64>(&field("longs")).unwrap(), vec![i64::MIN]);
    assert_eq!(ser.get_array::<f32>(&field("floats")).unwrap(), vec![0.5, f32::MAX]);
    assert_eq!(ser.get_array::<f64>(&field("doubles")).unwrap(), vec![f64::MIN_POSITIVE]);
    assert_eq!(ser.get_array::<String>(&field("strings")).unwrap(), vec!["a", "", "ccc"]);

    let (dims, empty) = ser.get_array_dims::<i32>(&field("empty")).unwrap();
    assert_eq!(dims, vec![0]);
    assert!(empty.is_empty());
}

#[test]
fn test_absent_and_empty_strings_collapse() {
    let (mut ser, root) = primary_writer();
    let absent = ser.put_str("absent", None).unwrap();
    let empty = ser.put_str("empty", Some("")).unwrap();
    assert_eq!(absent.data_size, empty.data_size);
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    for expected in ["absent", "empty"] {
        let field = ser.get_field_header().unwrap();
        assert_eq!(field.name, expected);
        assert_eq!(ser.get::<String>(&field).unwrap(), "");
    }
}

#[test]
fn test_boxed_path_matches_typed_path() {
    let (mut typed, typed_root) = primary_writer();
    typed.put("v", &42i16).unwrap();
    typed.put_array("a", &[1.0f64, 2.0]).unwrap();
    let typed = finish_primary(typed, typed_root);

    let (mut boxed, boxed_root) = primary_writer();
    boxed.put_boxed("v", &Value::Short(42)).unwrap();
    boxed.put_boxed_array("a", &ValueArray::Double(vec![1.0, 2.0])).unwrap();
    let mut boxed = finish_primary(boxed, boxed_root);

    assert_eq!(typed.buffer().as_slice()[..typed.buffer().limit()], boxed.buffer().as_slice()[..boxed.buffer().limit()]);

    let tree = boxed.parse_stream().unwrap();
    let v = tree.header(tree.find_path(&["v"]).unwrap()).clone();
    let a = tree.header(tree.find_path(&["a"]).unwrap()).clone();
    assert_eq!(boxed.get_boxed(&v).unwrap(), Value::Short(42));
    assert_eq!(boxed.get_boxed_array(&a).unwrap(), ValueArray::Double(vec![1.0, 2.0]));
}

#[test]
fn test_simple_string_mode() {
    let config = SerialiserConfig::default().with_simple_strings(true);
    let mut ser = BinarySerialiser::with_config(FastByteBuffer::new(), config.clone());
    let root = ser.put_header_info(&ProtocolInfo::primary()).unwrap();
    ser.put("latin", &"café €".to_string()).unwrap();
    ser.put_end_marker(root).unwrap();

    let mut buffer = ser.into_buffer();
    buffer.flip();
    let mut ser = BinarySerialiser::with_config(buffer, config);
    open_stream(&mut ser);
    let field = ser.get_field_header().unwrap();
    assert_eq!(ser.get::<String>(&field).unwrap(), "café ?");
}

#[test]
fn test_metadata_survives_parse() {
    let (mut ser, root) = primary_writer();
    let meta = FieldMeta::new().with_unit("ms").with_description("round trip time");
    ser.put_with_meta("rtt", &12.5f32, &meta).unwrap();
    ser.put("plain", &1i32).unwrap();
    let mut ser = finish_primary(ser, root);

    let tree = ser.parse_stream().unwrap();
    let rtt = tree.header(tree.find("rtt").unwrap());
    assert_eq!(rtt.meta, meta);
    assert_eq!(rtt.data_size, 4);
    assert!(tree.header(tree.find("plain").unwrap()).meta.is_empty());
}

#[test]
fn test_external_buffer_parity() {
    let (mut owned, owned_root) = primary_writer();
    write_all_kinds(&mut owned);
    owned.put_end_marker(owned_root).unwrap();
    let owned_bytes = owned.buffer().written().to_vec();

    let mut region = vec![0u8; 4096];
    let mut external = BinarySerialiser::new(ExternalBuffer::new(&mut region));
    let root = external.put_header_info(&ProtocolInfo::primary()).unwrap();
    write_all_kinds(&mut external);
    external.put_end_marker(root).unwrap();
    assert_eq!(external.buffer().written(), owned_bytes.as_slice());

    let mut buffer = external.into_buffer();
    buffer.flip();
    let mut reader = BinarySerialiser::new(buffer);
    let tree = reader.parse_stream().unwrap();
    let ints = tree.header(tree.find("ints").unwrap()).clone();
    assert_eq!(reader.get_array::<i32>(&ints).unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_external_buffer_exhaustion_is_capacity_error() {
    let mut region = [0u8; 40];
    let mut ser = BinarySerialiser::new(ExternalBuffer::new(&mut region));
    let root = ser.put_header_info(&ProtocolInfo::primary()).unwrap();
    let err = ser.put_array("big", &[0i64; 16]).unwrap_err();
    assert_eq!(err.kind(), fieldwire::ErrorKind::Capacity);
    drop(root);
}

#[test]
fn test_type_tags_on_the_wire() {
    let (mut ser, root) = primary_writer();
    let header = ser.put("x", &1u16).unwrap();
    assert_eq!(ser.buffer().as_slice()[header.header_start], DataType::Char.as_u8());
    let _ = finish_primary(ser, root);
}

proptest! {
    #[test]
    fn prop_long_arrays_roundtrip(values in proptest::collection::vec(any::<i64>(), 0..64)) {
        let (mut ser, root) = primary_writer();
        ser.put_array("xs", &values).unwrap();
        let mut ser = finish_primary(ser, root);
        open_stream(&mut ser);
        let field = ser.get_field_header().unwrap();
        prop_assert_eq!(ser.get_array::<i64>(&field).unwrap(), values);
    }

    #[test]
    fn prop_strings_roundtrip(value in ".*") {
        let (mut ser, root) = primary_writer();
        ser.put("s", &value).unwrap();
        let mut ser = finish_primary(ser, root);
        open_stream(&mut ser);
        let field = ser.get_field_header().unwrap();
        prop_assert_eq!(ser.get::<String>(&field).unwrap(), value);
    }
}
