//! Collection Tests - Lists, Sets, Queues, Maps and Enums
//!
//! These tests exercise the generic container paths of the primary codec:
//! - List and set round-trip to structural equality
//! - Queue round-trip compared by successive removal
//! - Container accessors sharing one decode loop
//! - Maps with declared key and value types
//! - Enums resolved by symbol, with default fallback and family skipping

mod common;

use std::collections::{HashMap, HashSet, VecDeque};

use common::*;
use fieldwire::{
    wire_enum, CollectionKind, DataType, EnumValue, IoBuffer, IoSerialiser, Value, ValueArray, WireEnum, WireError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    Red,
    Green,
    Blue,
}

wire_enum!(Colour { Red, Green, Blue });

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Green,
    Amber,
    Red,
    Unknown,
}

wire_enum!(Signal { Green, Amber, Red, Unknown });

#[test]
fn test_list_and_set_roundtrip() {
    init_logging();

    let list = vec![3i32, 1, 4, 1, 5];
    let set: HashSet<String> = ["alpha", "beta", "gamma"].iter().map(|s| s.to_string()).collect();

    let (mut ser, root) = primary_writer();
    ser.put_collection("list", CollectionKind::List, list.iter().copied()).unwrap();
    ser.put_collection("set", CollectionKind::Set, set.iter().cloned()).unwrap();
    let mut ser = finish_primary(ser, root);

    let tree = ser.parse_stream().unwrap();
    let list_field = tree.header(tree.find("list").unwrap()).clone();
    let set_field = tree.header(tree.find("set").unwrap()).clone();
    assert_eq!(list_field.data_type, DataType::List);
    assert_eq!(set_field.data_type, DataType::Set);

    assert_eq!(ser.get_list::<i32>(&list_field).unwrap(), list);
    assert_eq!(ser.get_set::<String>(&set_field).unwrap(), set);
}

#[test]
fn test_queue_roundtrip_by_removal() {
    let mut queue: VecDeque<f64> = VecDeque::new();
    queue.extend([0.5, -1.0, 2.25]);

    let (mut ser, root) = primary_writer();
    ser.put_collection("queue", CollectionKind::Queue, queue.iter().copied()).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let field = ser.get_field_header().unwrap();
    let mut decoded = ser.get_queue::<f64>(&field).unwrap();
    while let Some(expected) = queue.pop_front() {
        assert_eq!(decoded.pop_front(), Some(expected));
    }
    assert!(decoded.pop_front().is_none());
}

#[test]
fn test_accessors_share_decode_loop() {
    let (mut ser, root) = primary_writer();
    ser.put_collection("ids", CollectionKind::List, vec![7i64, 8, 7]).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let field = ser.get_field_header().unwrap();
    let as_set: HashSet<i64> = ser.get_collection_into(&field).unwrap();
    let as_queue = ser.get_queue::<i64>(&field).unwrap();
    let boxed = ser.get_boxed_collection(&field).unwrap();

    assert_eq!(as_set, HashSet::from([7, 8]));
    assert_eq!(as_queue, VecDeque::from(vec![7, 8, 7]));
    assert_eq!(boxed, ValueArray::Long(vec![7, 8, 7]));
}

#[test]
fn test_empty_collection() {
    let (mut ser, root) = primary_writer();
    ser.put_collection("none", CollectionKind::Set, Vec::<i16>::new()).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let field = ser.get_field_header().unwrap();
    assert!(ser.get_set::<i16>(&field).unwrap().is_empty());
}

#[test]
fn test_map_roundtrip() {
    let map: HashMap<String, f32> = HashMap::from([("x".to_string(), 1.5), ("y".to_string(), -0.25)]);

    let (mut ser, root) = primary_writer();
    ser.put_map("coords", map.clone()).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let field = ser.get_field_header().unwrap();
    assert_eq!(ser.get_map::<String, f32>(&field).unwrap(), map);

    let mut boxed = ser.get_boxed_map(&field).unwrap();
    boxed.sort_by(|a, b| a.0.to_string().cmp(&b.0.to_string()));
    assert_eq!(boxed[0], (Value::from("x"), Value::Float(1.5)));
}

#[test]
fn test_map_with_wrong_value_type_is_recoverable() {
    let (mut ser, root) = primary_writer();
    ser.put_map("m", vec![(1i32, 2i64)]).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let field = ser.get_field_header().unwrap();
    let err = ser.get_map::<i32, i32>(&field).unwrap_err();
    assert!(matches!(
        err,
        WireError::TypeMismatch { expected: DataType::Int, found: DataType::Long, .. }
    ));
}

#[test]
fn test_enum_roundtrip() {
    let (mut ser, root) = primary_writer();
    ser.put_enum("colour", &Colour::Blue).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let field = ser.get_field_header().unwrap();
    assert_eq!(field.data_type, DataType::Enum);
    assert_eq!(ser.get_enum(&field, Colour::Red).unwrap(), Colour::Blue);

    let value = ser.get_enum_value(&field).unwrap();
    assert_eq!(value.family.name, Colour::NAME);
    assert_eq!(value.family.symbols, vec!["Red", "Green", "Blue"]);
    assert_eq!(value.ordinal(), Some(2));
}

#[test]
fn test_enum_resolves_by_symbol_across_families() {
    let (mut ser, root) = primary_writer();
    ser.put_enum("a", &Colour::Red).unwrap();
    ser.put_enum("b", &Colour::Blue).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let a = ser.get_field_header().unwrap();
    // Red has ordinal 0 in Colour but 2 in Signal
    assert_eq!(ser.get_enum(&a, Signal::Unknown).unwrap(), Signal::Red);
    ser.skip_field(&a).unwrap();

    let b = ser.get_field_header().unwrap();
    assert_eq!(ser.get_enum(&b, Signal::Unknown).unwrap(), Signal::Unknown);
}

#[test]
fn test_skip_enum_info() {
    let (mut ser, root) = primary_writer();
    ser.put_enum("colour", &Colour::Green).unwrap();
    ser.put_enum_value("custom", &EnumValue::of(&Signal::Amber)).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    for expected in ["Green", "Amber"] {
        let field = ser.get_field_header().unwrap();
        ser.skip_enum_info().unwrap();
        assert_eq!(ser.buffer_mut().get_string().unwrap(), expected);
        ser.skip_field(&field).unwrap();
    }
}

#[test]
fn test_compact_collections_and_enums() {
    let (mut ser, root) = compact_writer();
    ser.put_collection("list", CollectionKind::List, vec![1i32, 2]).unwrap();
    ser.put_enum("colour", &Colour::Green).unwrap();
    let mut ser = finish_compact(ser, root);

    open_stream(&mut ser);
    let list = ser.get_field_header().unwrap();
    assert_eq!(list.data_type, DataType::IntArray);
    assert_eq!(ser.get_list::<i32>(&list).unwrap(), vec![1, 2]);
    assert_eq!(ser.get_array::<i32>(&list).unwrap(), vec![1, 2]);

    ser.skip_field(&list).unwrap();
    let colour = ser.get_field_header().unwrap();
    assert_eq!(colour.data_type, DataType::String);
    assert_eq!(ser.get_enum(&colour, Colour::Red).unwrap(), Colour::Green);
}
