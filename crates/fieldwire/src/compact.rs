//! Compact wire format
//!
//! A denser tag-and-length layout used to exchange data with an external
//! control-system protocol. There is no stream header and no per-field size:
//!
//! ```text
//! record := count (i32) field[count]
//! field  := name (string) type (u8) payload
//! ```
//!
//! Nested records are a `DATA` field whose payload is itself a record, so
//! nesting is implied by the type byte instead of start/end markers. Field
//! sizes are recovered on read by scanning the payload, which keeps the
//! skip-addressing invariant intact for the descriptors handed out.
//!
//! | Type byte | Payload                                   |
//! |-----------|-------------------------------------------|
//! | 0..=6     | bool, byte, short, int, long, float, double |
//! | 7         | string                                    |
//! | 8         | nested record                             |
//! | 9..=16    | 1-D arrays, same order, then string       |
//! | 17        | array of records                          |
//! | 18..=25   | 2-D arrays: rows, cols, flat array        |
//! | 201..=203 | char, char array, 2-D char array          |

use std::collections::HashMap;

use crate::codec::{check_dims, wire_i32, CollectionKind, IoSerialiser, PendingField};
use crate::config::SerialiserConfig;
use crate::data_type::DataType;
use crate::enums::{EnumFamily, EnumValue};
use crate::error::{Result, WireError};
use crate::field::{field_hash, FieldHeader, FieldMeta};
use crate::protocol::{ProtocolInfo, COMPACT_PRODUCER};
use fieldwire_buffer::{FastByteBuffer, IoBuffer};
use tracing::{debug, trace};

const STRING: u8 = 7;
const DATA: u8 = 8;
const DATA_ARRAY: u8 = 17;
const TWO_DIM_OFFSET: u8 = 9;
const CHAR: u8 = 201;
const CHAR_ARRAY: u8 = 202;
const CHAR_ARRAY_2D: u8 = 203;

const ROOT_NAME: &str = "ROOT";

const SCALARS: [DataType; 8] = [
    DataType::Bool,
    DataType::Byte,
    DataType::Short,
    DataType::Int,
    DataType::Long,
    DataType::Float,
    DataType::Double,
    DataType::String,
];

const ARRAYS: [DataType; 8] = [
    DataType::BoolArray,
    DataType::ByteArray,
    DataType::ShortArray,
    DataType::IntArray,
    DataType::LongArray,
    DataType::FloatArray,
    DataType::DoubleArray,
    DataType::StringArray,
];

fn is_two_dim(wire: u8) -> bool {
    (18..=25).contains(&wire) || wire == CHAR_ARRAY_2D
}

/// Field tag for a compact type byte
fn data_type_of(wire: u8) -> Option<DataType> {
    match wire {
        0..=7 => Some(SCALARS[usize::from(wire)]),
        DATA => Some(DataType::StartMarker),
        9..=16 => Some(ARRAYS[usize::from(wire - 9)]),
        DATA_ARRAY => Some(DataType::Other),
        18..=25 => Some(ARRAYS[usize::from(wire - 18)]),
        CHAR => Some(DataType::Char),
        CHAR_ARRAY | CHAR_ARRAY_2D => Some(DataType::CharArray),
        _ => None,
    }
}

/// Compact type byte for a field tag
fn wire_type_of(data_type: DataType, two_dim: bool) -> Option<u8> {
    if let Some(i) = SCALARS.iter().position(|&t| t == data_type) {
        return Some(i as u8);
    }
    if let Some(i) = ARRAYS.iter().position(|&t| t == data_type) {
        let wire = 9 + i as u8;
        return Some(if two_dim { wire + TWO_DIM_OFFSET } else { wire });
    }
    match (data_type, two_dim) {
        (DataType::Char, false) => Some(CHAR),
        (DataType::CharArray, false) => Some(CHAR_ARRAY),
        (DataType::CharArray, true) => Some(CHAR_ARRAY_2D),
        (DataType::StartMarker, false) => Some(DATA),
        (DataType::Other, false) => Some(DATA_ARRAY),
        _ => None,
    }
}

/// Treat buffer bounds failures while scanning as a truncated stream
fn truncated(position: usize, what: &'static str) -> impl FnOnce(WireError) -> WireError {
    move |err| match err {
        WireError::Buffer(_) => WireError::structural(position, format!("truncated {}", what)),
        other => other,
    }
}

/// Codec for the compact, legacy-compatible wire format
#[derive(Debug)]
pub struct CompactSerialiser<B: IoBuffer = FastByteBuffer> {
    buffer: B,
    config: SerialiserConfig,
    /// Count offset and child count of each record open for writing
    scopes: Vec<(usize, usize)>,
    /// Record sizes by count offset, valid until the next write or stream open
    record_sizes: HashMap<usize, usize>,
}

impl<B: IoBuffer> CompactSerialiser<B> {
    pub fn new(buffer: B) -> Self {
        Self::with_config(buffer, SerialiserConfig::default())
    }

    pub fn with_config(mut buffer: B, config: SerialiserConfig) -> Self {
        if config.enforce_simple_strings {
            buffer.set_enforce_simple_strings(true);
        }
        Self { buffer, config, scopes: Vec::new(), record_sizes: HashMap::new() }
    }

    pub fn into_buffer(self) -> B {
        self.buffer
    }

    fn begin_field(&mut self, name: &str, data_type: DataType, wire_type: u8) -> Result<PendingField> {
        let header_start = self.buffer.position();
        self.record_sizes.clear();
        match self.scopes.last_mut() {
            Some((_, count)) => *count += 1,
            None => return Err(WireError::structural(header_start, "compact fields must be written inside a record")),
        }
        self.buffer.put_string(name)?;
        self.buffer.put_byte(wire_type as i8)?;
        let data_start = self.buffer.position();
        trace!(field = name, %data_type, wire_type, header_start, "put compact field header");

        Ok(PendingField::new(FieldHeader {
            name: name.to_string(),
            hash: field_hash(name),
            data_type,
            wire_type,
            header_start,
            data_start,
            data_size: 0,
            meta: FieldMeta::default(),
        }))
    }

    /// Reserve a child count and open a record scope
    fn open_scope(&mut self, mut pending: PendingField) -> Result<PendingField> {
        let offset = self.buffer.position();
        self.buffer.put_int(0)?;
        self.record_sizes.clear();
        self.scopes.push((offset, 0));
        pending.header.data_start = offset + 4;
        pending.scope_offset = Some(offset);
        Ok(pending)
    }

    /// Bytes occupied by the payload of type `wire` starting at `at`
    fn payload_size(&mut self, wire: u8, at: usize, depth: usize) -> Result<usize> {
        if depth > self.config.max_depth {
            return Err(WireError::structural(at, format!("records nested deeper than {}", self.config.max_depth)));
        }
        let data_type =
            data_type_of(wire).ok_or_else(|| WireError::structural(at, format!("unknown compact type {}", wire)))?;
        if let Some(width) = data_type.primitive_width() {
            return Ok(width);
        }
        match wire {
            STRING => Ok(4 + self.buffer.get_length_at(at)?),
            DATA => self.record_size(at, depth + 1),
            DATA_ARRAY => {
                let count = self.buffer.get_length_at(at)?;
                let mut size = 4;
                for _ in 0..count {
                    size += self.record_size(at + size, depth + 1)?;
                }
                Ok(size)
            }
            w if is_two_dim(w) => Ok(8 + self.array_size(data_type, at + 8)?),
            _ => self.array_size(data_type, at),
        }
    }

    fn record_size(&mut self, at: usize, depth: usize) -> Result<usize> {
        if let Some(&size) = self.record_sizes.get(&at) {
            return Ok(size);
        }
        let count = self.buffer.get_length_at(at)?;
        let mut size = 4;
        for _ in 0..count {
            size += self.field_size(at + size, depth)?;
        }
        self.record_sizes.insert(at, size);
        Ok(size)
    }

    fn field_size(&mut self, at: usize, depth: usize) -> Result<usize> {
        let name_len = 4 + self.buffer.get_length_at(at)?;
        let wire = self.buffer.get_byte_at(at + name_len)? as u8;
        Ok(name_len + 1 + self.payload_size(wire, at + name_len + 1, depth)?)
    }

    fn array_size(&self, array_type: DataType, at: usize) -> Result<usize> {
        let count = self.buffer.get_length_at(at)?;
        let element = array_type.element_type().and_then(DataType::primitive_width);
        match element {
            Some(width) => count
                .checked_mul(width)
                .and_then(|n| n.checked_add(4))
                .ok_or_else(|| WireError::structural(at, format!("array of {} elements overflows", count))),
            None => {
                let mut size = 4;
                for _ in 0..count {
                    size += 4 + self.buffer.get_length_at(at + size)?;
                }
                Ok(size)
            }
        }
    }

    fn check_extent(&self, header_start: usize, name: &str, end: usize) -> Result<()> {
        if end > self.buffer.limit() {
            return Err(WireError::structural(
                header_start,
                format!("'{}' extends past the end of the buffer", name),
            ));
        }
        Ok(())
    }
}

impl<B: IoBuffer> IoSerialiser for CompactSerialiser<B> {
    type Buffer = B;

    const NAME: &'static str = "compact";
    const END_MARKERS: bool = false;

    fn buffer(&self) -> &B {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    fn config(&self) -> &SerialiserConfig {
        &self.config
    }

    fn protocol_info(&self) -> ProtocolInfo {
        ProtocolInfo::compact()
    }

    /// The compact format carries no header: this only opens the root record
    fn put_header_info(&mut self, info: &ProtocolInfo) -> Result<PendingField> {
        if info.producer != COMPACT_PRODUCER {
            return Err(WireError::ProtocolMismatch {
                expected: self.protocol_info().to_string(),
                got: info.to_string(),
            });
        }
        let header_start = self.buffer.position();
        let root = PendingField::new(FieldHeader {
            name: ROOT_NAME.to_string(),
            hash: field_hash(ROOT_NAME),
            data_type: DataType::StartMarker,
            wire_type: DATA,
            header_start,
            data_start: header_start,
            data_size: 0,
            meta: FieldMeta::default(),
        });
        self.open_scope(root)
    }

    fn get_header_info(&mut self) -> Result<ProtocolInfo> {
        let info = self.protocol_info();
        debug!(protocol = %info, "compact stream has no header");
        Ok(info)
    }

    fn get_root_header(&mut self) -> Result<FieldHeader> {
        let header_start = self.buffer.position();
        self.record_sizes.clear();
        let size = self
            .payload_size(DATA, header_start, 0)
            .map_err(truncated(header_start, "root record"))?;
        self.check_extent(header_start, ROOT_NAME, header_start + size)?;
        let data_start = header_start + 4;
        self.buffer.set_position(data_start)?;
        Ok(FieldHeader {
            name: ROOT_NAME.to_string(),
            hash: field_hash(ROOT_NAME),
            data_type: DataType::StartMarker,
            wire_type: DATA,
            header_start,
            data_start,
            data_size: size - 4,
            meta: FieldMeta::default(),
        })
    }

    fn put_field_header_with_meta(
        &mut self,
        name: &str,
        data_type: DataType,
        _meta: &FieldMeta,
    ) -> Result<PendingField> {
        if data_type == DataType::StartMarker {
            return self.put_start_marker(name);
        }
        let wire = wire_type_of(data_type, false).ok_or(WireError::Unsupported { codec: Self::NAME, data_type })?;
        self.begin_field(name, data_type, wire)
    }

    fn finish_field(&mut self, pending: PendingField) -> Result<FieldHeader> {
        let mut header = pending.header;
        let position = self.buffer.position();
        if position < header.data_start {
            return Err(WireError::structural(position, format!("cursor moved before the data of '{}'", header.name)));
        }
        header.data_size = position - header.data_start;
        Ok(header)
    }

    fn get_field_header(&mut self) -> Result<FieldHeader> {
        let header_start = self.buffer.position();
        let name = self
            .buffer
            .get_string()
            .map_err(|e| WireError::structural(header_start, format!("bad field name: {}", e)))?;
        let wire = self
            .buffer
            .get_byte()
            .map_err(|e| WireError::structural(header_start, format!("bad field type: {}", e)))? as u8;
        let data_type = data_type_of(wire)
            .ok_or_else(|| WireError::structural(header_start, format!("unknown compact type {} for '{}'", wire, name)))?;

        let payload_start = self.buffer.position();
        let payload = self
            .payload_size(wire, payload_start, 0)
            .map_err(truncated(header_start, "field payload"))?;
        self.check_extent(header_start, &name, payload_start + payload)?;

        // a record's children start after its count
        let (data_start, data_size) = if wire == DATA {
            (payload_start + 4, payload - 4)
        } else {
            (payload_start, payload)
        };
        self.buffer.set_position(data_start)?;
        trace!(field = %name, %data_type, wire, data_start, data_size, "got compact field header");

        Ok(FieldHeader {
            hash: field_hash(&name),
            name,
            data_type,
            wire_type: wire,
            header_start,
            data_start,
            data_size,
            meta: FieldMeta::default(),
        })
    }

    fn put_start_marker(&mut self, name: &str) -> Result<PendingField> {
        let pending = self.begin_field(name, DataType::StartMarker, DATA)?;
        self.open_scope(pending)
    }

    fn put_end_marker(&mut self, start: PendingField) -> Result<FieldHeader> {
        let position = self.buffer.position();
        let offset = start
            .scope_offset
            .ok_or_else(|| WireError::structural(position, format!("'{}' is not a record", start.name())))?;
        let count = match self.scopes.last() {
            Some(&(top, count)) if top == offset => count,
            Some(_) => {
                return Err(WireError::structural(
                    position,
                    format!("'{}' closed while an inner record is still open", start.name()),
                ))
            }
            None => return Err(WireError::structural(position, "no open record to close")),
        };
        self.scopes.pop();
        self.buffer.put_int_at(offset, wire_i32(count, offset)?)?;
        self.finish_field(start)
    }

    fn get_end_marker(&mut self, start: &FieldHeader) -> Result<FieldHeader> {
        let position = self.buffer.position();
        if position != start.data_end() {
            return Err(WireError::structural(
                position,
                format!("record '{}' ends at {}", start.name, start.data_end()),
            ));
        }
        Ok(FieldHeader {
            name: start.name.clone(),
            hash: start.hash,
            data_type: DataType::EndMarker,
            wire_type: DataType::EndMarker.as_u8(),
            header_start: position,
            data_start: position,
            data_size: 0,
            meta: FieldMeta::default(),
        })
    }

    fn put_array_header(
        &mut self,
        name: &str,
        element: DataType,
        dims: &[usize],
        count: usize,
    ) -> Result<PendingField> {
        check_dims(self.buffer.position(), dims, count)?;
        let array_type = element.array_of().ok_or(WireError::Unsupported { codec: Self::NAME, data_type: element })?;
        let unsupported = WireError::Unsupported { codec: Self::NAME, data_type: array_type };
        match dims {
            [_] => {
                let wire = wire_type_of(array_type, false).ok_or(unsupported)?;
                self.begin_field(name, array_type, wire)
            }
            [rows, cols] => {
                let wire = wire_type_of(array_type, true).ok_or(unsupported)?;
                let pending = self.begin_field(name, array_type, wire)?;
                self.buffer.put_length(*rows)?;
                self.buffer.put_length(*cols)?;
                Ok(pending)
            }
            _ => Err(unsupported),
        }
    }

    fn get_array_header(&mut self, field: &FieldHeader) -> Result<Vec<usize>> {
        if !field.data_type.is_array() {
            return Err(WireError::structural(field.header_start, format!("'{}' is not an array", field.name)));
        }
        self.buffer.set_position(field.data_start)?;
        if !is_two_dim(field.wire_type) {
            return Ok(Vec::new());
        }
        let rows = self.buffer.get_length()?;
        let cols = self.buffer.get_length()?;
        Ok(vec![rows, cols])
    }

    /// Collections are plain 1-D arrays in the compact format
    fn put_collection_header(
        &mut self,
        name: &str,
        _kind: CollectionKind,
        element: DataType,
        count: usize,
    ) -> Result<PendingField> {
        self.put_array_header(name, element, &[count], count)
    }

    fn get_collection_header(&mut self, field: &FieldHeader) -> Result<(DataType, Vec<usize>)> {
        let element = match field.data_type.element_type() {
            Some(element) if !is_two_dim(field.wire_type) => element,
            _ => return Err(field.mismatch(DataType::List)),
        };
        self.buffer.set_position(field.data_start)?;
        Ok((element, Vec::new()))
    }

    fn put_map_header(
        &mut self,
        _name: &str,
        _key: DataType,
        _value: DataType,
        _count: usize,
    ) -> Result<PendingField> {
        Err(WireError::Unsupported { codec: Self::NAME, data_type: DataType::Map })
    }

    fn get_map_header(&mut self, field: &FieldHeader) -> Result<(DataType, DataType, usize)> {
        Err(field.mismatch(DataType::Map))
    }

    /// Enums travel as their member name
    fn put_enum_value(&mut self, name: &str, value: &EnumValue) -> Result<FieldHeader> {
        let pending = self.begin_field(name, DataType::String, STRING)?;
        self.buffer.put_string(&value.member)?;
        self.finish_field(pending)
    }

    fn get_enum_value(&mut self, field: &FieldHeader) -> Result<EnumValue> {
        field.expect_type(DataType::String)?;
        self.buffer.set_position(field.data_start)?;
        let member = self.buffer.get_string()?;
        Ok(EnumValue {
            family: EnumFamily::new("", Vec::<String>::new()),
            member,
        })
    }

    fn skip_enum_info(&mut self) -> Result<()> {
        Ok(())
    }
}
