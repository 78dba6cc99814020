//! Compact Codec Tests
//!
//! These tests pin the compact format to its conformance bytes and check
//! that navigation behaves the same as for the primary codec:
//! - Decoding the conformance fixture
//! - Reproducing it byte for byte from the writer
//! - Enums written as their member name
//! - Path lookup and skipping independent of the codec

mod common;

use common::*;
use fieldwire::{
    CompactSerialiser, DataType, EnumFamily, EnumValue, ErrorKind, FastByteBuffer, FieldTree, IoBuffer, IoSerialiser, WireError, ROOT_NAME,
};

fn fixture_reader() -> CompactSerialiser<FastByteBuffer> {
    CompactSerialiser::new(FastByteBuffer::from_slice(&compact_fixture()))
}

#[test]
fn test_fixture_decodes() {
    init_logging();

    let mut ser = fixture_reader();
    let tree = ser.parse_stream().unwrap();
    let root = tree.root();
    assert_eq!(tree.header(root).name, ROOT_NAME);

    let names: Vec<&str> = tree.children(root).iter().map(|&id| tree.header(id).name.as_str()).collect();
    assert_eq!(names, ["0", "1", "2", "3", "7", "d", "f"]);

    let field = |path: &[&str]| tree.header(tree.find_path(path).unwrap()).clone();
    assert_eq!(ser.get::<i64>(&field(&["0"])).unwrap(), 1);
    assert_eq!(ser.get::<String>(&field(&["1"])).unwrap(), "");
    assert_eq!(ser.get::<i8>(&field(&["2"])).unwrap(), 5);
    assert_eq!(field(&["3"]).data_type, DataType::StartMarker);
    assert_eq!(ser.get::<i64>(&field(&["3", "b"])).unwrap(), 114);
    assert_eq!(ser.get::<i8>(&field(&["7"])).unwrap(), 0);
    assert_eq!(ser.get::<String>(&field(&["d"])).unwrap(), "");
    assert_eq!(ser.get::<String>(&field(&["f"])).unwrap(), "");

    assert_eq!(tree.header(root).data_end(), compact_fixture().len());
}

#[test]
fn test_fixture_extents() {
    let mut ser = fixture_reader();
    let tree = ser.parse_stream().unwrap();
    let long = tree.header(tree.find_path(&["0"]).unwrap());
    assert_eq!((long.data_start, long.data_size), (11, 8));

    let record = tree.header(tree.find_path(&["3"]).unwrap());
    assert_eq!(record.data_start, record.header_start + 11);
    assert_eq!(tree.children(tree.find_path(&["3"]).unwrap()).len(), 1);
}

#[test]
fn test_writer_reproduces_fixture() {
    let (mut ser, root) = compact_writer();
    ser.put("0", &1i64).unwrap();
    ser.put_str("1", None).unwrap();
    ser.put("2", &5i8).unwrap();
    let record = ser.put_start_marker("3").unwrap();
    ser.put("b", &114i64).unwrap();
    ser.put_end_marker(record).unwrap();
    ser.put("7", &0i8).unwrap();
    ser.put_str("d", Some("")).unwrap();
    ser.put_str("f", None).unwrap();
    ser.put_end_marker(root).unwrap();

    assert_eq!(ser.buffer().written(), compact_fixture().as_slice());
}

#[test]
fn test_skip_record_in_fixture() {
    let mut ser = fixture_reader();
    open_stream(&mut ser);
    let mut seen = Vec::new();
    while ser.buffer().position() < ser.buffer().limit() {
        let field = ser.get_field_header().unwrap();
        seen.push(field.name.clone());
        ser.skip_field(&field).unwrap();
    }
    assert_eq!(seen, ["0", "1", "2", "3", "7", "d", "f"]);
}

/// Same nested layout through any codec
fn write_nested<S: IoSerialiser>(ser: &mut S) {
    let outer = ser.put_start_marker("outer").unwrap();
    ser.put("id", &9i32).unwrap();
    let inner = ser.put_start_marker("inner").unwrap();
    ser.put("value", &0.125f64).unwrap();
    ser.put_end_marker(inner).unwrap();
    ser.put_end_marker(outer).unwrap();
    ser.put("tail", &"done".to_string()).unwrap();
}

#[test]
fn test_navigation_is_codec_independent() {
    let (mut primary, primary_root) = primary_writer();
    let (mut compact, compact_root) = compact_writer();
    write_nested(&mut primary);
    write_nested(&mut compact);
    let mut primary = finish_primary(primary, primary_root);
    let mut compact = finish_compact(compact, compact_root);

    let primary_tree = primary.parse_stream().unwrap();
    let compact_tree = compact.parse_stream().unwrap();
    let path = ["outer", "inner", "value"];

    let p = primary_tree.header(primary_tree.find_path(&path).unwrap()).clone();
    let c = compact_tree.header(compact_tree.find_path(&path).unwrap()).clone();
    assert_eq!(primary.get::<f64>(&p).unwrap(), 0.125);
    assert_eq!(compact.get::<f64>(&c).unwrap(), 0.125);
    assert_eq!(primary_tree.depth(primary_tree.find_path(&path).unwrap()), 3);
    assert_eq!(compact_tree.depth(compact_tree.find_path(&path).unwrap()), 3);

    let names = |tree: &FieldTree| tree.walk().map(|(_, id)| tree.header(id).name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&primary_tree), names(&compact_tree));
}

#[test]
fn test_enum_written_as_member_name() {
    let (mut ser, root) = compact_writer();
    let mode = EnumValue {
        family: EnumFamily::new("Mode", ["Off", "On"]),
        member: "On".to_string(),
    };
    ser.put_enum_value("mode", &mode).unwrap();
    let mut ser = finish_compact(ser, root);

    open_stream(&mut ser);
    let field = ser.get_field_header().unwrap();
    assert_eq!(field.data_type, DataType::String);
    assert_eq!(ser.get::<String>(&field).unwrap(), "On");
    assert_eq!(ser.get_enum_value(&field).unwrap().member, "On");
}

#[test]
fn test_wrong_accessor_is_type_mismatch() {
    let mut ser = fixture_reader();
    let tree = ser.parse_stream().unwrap();
    let long = tree.header(tree.find_path(&["0"]).unwrap()).clone();
    let err = ser.get::<String>(&long).unwrap_err();
    assert!(matches!(err, WireError::TypeMismatch { expected: DataType::String, found: DataType::Long, .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_truncated_fixture_is_structural() {
    let bytes = compact_fixture();
    let mut ser = CompactSerialiser::new(FastByteBuffer::from_slice(&bytes[..bytes.len() - 3]));
    let err = ser.parse_stream().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
}
