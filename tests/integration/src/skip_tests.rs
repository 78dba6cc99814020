//! Skip-addressing Tests
//!
//! Every descriptor either codec hands out must satisfy
//! `data_start + data_size == next sibling header`. These tests check that:
//! - For randomly shaped streams, in both codecs
//! - For deeply nested scopes
//! - When a reader refuses a field after a type mismatch

mod common;

use common::*;
use fieldwire::{DataType, FieldHeader, FieldTree, IoBuffer, IoSerialiser, PendingField, WireError};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Long(i64),
    Text(String),
    Ints(Vec<i32>),
    Open,
    Close,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i64>().prop_map(Op::Long),
        "[a-z]{0,12}".prop_map(Op::Text),
        proptest::collection::vec(any::<i32>(), 0..8).prop_map(Op::Ints),
        Just(Op::Open),
        Just(Op::Close),
    ]
}

/// Write `ops` into an open scope, returning the headers in pre-order
fn write_ops<S: IoSerialiser>(ser: &mut S, ops: &[Op]) -> Vec<FieldHeader> {
    let mut written: Vec<Option<FieldHeader>> = Vec::new();
    let mut open: Vec<(usize, PendingField)> = Vec::new();
    for (i, op) in ops.iter().enumerate() {
        let name = format!("f{}", i);
        match op {
            Op::Long(v) => written.push(Some(ser.put(&name, v).unwrap())),
            Op::Text(s) => written.push(Some(ser.put_str(&name, Some(s.as_str())).unwrap())),
            Op::Ints(v) => written.push(Some(ser.put_array(&name, v.as_slice()).unwrap())),
            Op::Open => {
                open.push((written.len(), ser.put_start_marker(&name).unwrap()));
                written.push(None);
            }
            Op::Close => {
                if let Some((slot, pending)) = open.pop() {
                    written[slot] = Some(ser.put_end_marker(pending).unwrap());
                }
            }
        }
    }
    while let Some((slot, pending)) = open.pop() {
        written[slot] = Some(ser.put_end_marker(pending).unwrap());
    }
    written.into_iter().flatten().collect()
}

/// Consecutive siblings must abut: `data_end` of one is the header of the next
fn siblings_abut(tree: &FieldTree) -> bool {
    tree.walk().all(|(_, id)| {
        tree.children(id)
            .windows(2)
            .all(|pair| tree.header(pair[0]).data_end() == tree.header(pair[1]).header_start)
    })
}

fn parsed_headers(tree: &FieldTree) -> Vec<FieldHeader> {
    tree.walk().skip(1).map(|(_, id)| tree.header(id).clone()).collect()
}

proptest! {
    #[test]
    fn prop_primary_skip_invariant(ops in proptest::collection::vec(op(), 0..40)) {
        let (mut ser, root) = primary_writer();
        let written = write_ops(&mut ser, &ops);
        let mut ser = finish_primary(ser, root);

        let tree = ser.parse_stream().unwrap();
        prop_assert!(siblings_abut(&tree));
        prop_assert_eq!(parsed_headers(&tree), written);
    }

    #[test]
    fn prop_compact_skip_invariant(ops in proptest::collection::vec(op(), 0..40)) {
        let (mut ser, root) = compact_writer();
        let written = write_ops(&mut ser, &ops);
        let mut ser = finish_compact(ser, root);

        let tree = ser.parse_stream().unwrap();
        prop_assert!(siblings_abut(&tree));
        prop_assert_eq!(parsed_headers(&tree), written);
    }
}

/// Nest `levels` scopes, each holding a value, followed by a trailing sibling
fn write_deep<S: IoSerialiser>(ser: &mut S, levels: usize) {
    let mut scopes = Vec::new();
    for level in 0..levels {
        scopes.push(ser.put_start_marker(&format!("level{}", level)).unwrap());
        ser.put("value", &(level as i64)).unwrap();
    }
    while let Some(scope) = scopes.pop() {
        ser.put_end_marker(scope).unwrap();
    }
    ser.put("after", &-1i32).unwrap();
}

fn skip_outermost_scope<S: IoSerialiser>(ser: &mut S) {
    open_stream(ser);
    let outer = ser.get_start_marker().unwrap();
    ser.skip_field(&outer).unwrap();
    let after = ser.get_field_header().unwrap();
    assert_eq!(after.name, "after");
    assert_eq!(ser.get::<i32>(&after).unwrap(), -1);
}

#[test]
fn test_deep_nesting_skip() {
    init_logging();

    let (mut primary, root) = primary_writer();
    write_deep(&mut primary, 50);
    skip_outermost_scope(&mut finish_primary(primary, root));

    let (mut compact, root) = compact_writer();
    write_deep(&mut compact, 50);
    skip_outermost_scope(&mut finish_compact(compact, root));
}

#[test]
fn test_deep_nesting_parses_in_both_codecs() {
    let (mut primary, root) = primary_writer();
    let mut scopes = Vec::new();
    for level in 0..50 {
        scopes.push(primary.put_start_marker(&format!("level{}", level)).unwrap());
    }
    while let Some(scope) = scopes.pop() {
        primary.put_end_marker(scope).unwrap();
    }
    let mut primary = finish_primary(primary, root);
    let tree = primary.parse_stream().unwrap();
    assert_eq!(tree.len(), 51);
    assert_eq!(tree.walk().map(|(depth, _)| depth).max(), Some(50));

    let (mut compact, root) = compact_writer();
    for level in 0..50 {
        scopes.push(compact.put_start_marker(&format!("level{}", level)).unwrap());
    }
    while let Some(scope) = scopes.pop() {
        compact.put_end_marker(scope).unwrap();
    }
    let mut compact = finish_compact(compact, root);
    let tree = compact.parse_stream().unwrap();
    assert_eq!(tree.len(), 51);
}

#[test]
fn test_type_mismatch_is_recoverable() {
    let (mut ser, root) = primary_writer();
    ser.put("count", &3i32).unwrap();
    ser.put("name", &"widget".to_string()).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let count = ser.get_field_header().unwrap();
    let err = ser.get::<i64>(&count).unwrap_err();
    assert!(err.is_recoverable());
    assert!(matches!(
        err,
        WireError::TypeMismatch { expected: DataType::Long, found: DataType::Int, .. }
    ));

    ser.skip_field(&count).unwrap();
    let name = ser.get_field_header().unwrap();
    assert_eq!(ser.get::<String>(&name).unwrap(), "widget");
}

#[test]
fn test_boxed_accessor_on_wrong_shape_is_recoverable() {
    let (mut ser, root) = primary_writer();
    ser.put_array("xs", &[1i32, 2, 3]).unwrap();
    ser.put("n", &7i32).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    let xs = ser.get_field_header().unwrap();
    let err = ser.get_boxed(&xs).unwrap_err();
    assert!(err.is_recoverable());
    assert!(matches!(
        err,
        WireError::TypeMismatch { expected: DataType::Int, found: DataType::IntArray, .. }
    ));

    ser.skip_field(&xs).unwrap();
    let n = ser.get_field_header().unwrap();
    let err = ser.get_boxed_array(&n).unwrap_err();
    assert!(err.is_recoverable());
    assert!(matches!(
        err,
        WireError::TypeMismatch { expected: DataType::IntArray, found: DataType::Int, .. }
    ));
    assert_eq!(ser.get::<i32>(&n).unwrap(), 7);
}

#[test]
fn test_unknown_fields_are_skipped_without_decoding() {
    let (mut ser, root) = primary_writer();
    ser.put_array_dims("matrix", &[0u16; 12], &[3, 4]).unwrap();
    ser.put_map("lookup", vec![(1i32, "one".to_string())]).unwrap();
    ser.put("tail", &true).unwrap();
    let mut ser = finish_primary(ser, root);

    open_stream(&mut ser);
    for _ in 0..2 {
        let field = ser.get_field_header().unwrap();
        assert!(field.data_type.is_composite());
        ser.skip_field(&field).unwrap();
    }
    let tail = ser.get_field_header().unwrap();
    assert!(ser.get::<bool>(&tail).unwrap());
    assert_eq!(tail.data_end(), ser.buffer().limit() - 13 - 9);
}
