//! The wire codec contract
//!
//! [`IoSerialiser`] is implemented by both wire formats. Each codec supplies
//! the handful of layout-specific primitives (field headers, markers, array
//! and collection headers, enum payloads); every typed and boxed put/get is
//! built on top of those here, so the two formats behave identically at the
//! API level.
//!
//! Writing a field is two-phase: the header is written with a placeholder
//! size and a [`PendingField`] handle is returned; once the payload is in the
//! buffer, [`IoSerialiser::finish_field`] patches the size through the handle.
//!
//! Reading a field header always leaves the cursor at the field's data start.
//! Typed getters take the header and check the declared tag first; a
//! mismatch is reported as a recoverable [`WireError::TypeMismatch`] and the
//! caller can step over the field with [`IoSerialiser::skip_field`].

use crate::config::SerialiserConfig;
use crate::data_type::DataType;
use crate::enums::{EnumValue, WireEnum};
use crate::error::{Result, WireError};
use crate::field::{FieldHeader, FieldMeta, FieldTree};
use crate::parser;
use crate::protocol::ProtocolInfo;
use crate::value::{Value, ValueArray, WireValue};
use fieldwire_buffer::IoBuffer;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// Container a collection field was written from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    Queue,
}

impl CollectionKind {
    pub fn data_type(self) -> DataType {
        match self {
            Self::List => DataType::List,
            Self::Set => DataType::Set,
            Self::Queue => DataType::Queue,
        }
    }
}

/// A field whose header is written but whose size is not yet known
#[derive(Debug)]
#[must_use = "a pending field must be passed to finish_field or put_end_marker"]
pub struct PendingField {
    pub(crate) header: FieldHeader,
    /// Offset of the child-count slot for codecs that count scope members
    pub(crate) scope_offset: Option<usize>,
}

impl PendingField {
    pub(crate) fn new(header: FieldHeader) -> Self {
        Self { header, scope_offset: None }
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn data_type(&self) -> DataType {
        self.header.data_type
    }

    pub fn header_start(&self) -> usize {
        self.header.header_start
    }

    pub fn data_start(&self) -> usize {
        self.header.data_start
    }
}

/// Convert an offset or count to its `i32` wire form
pub(crate) fn wire_i32(value: usize, position: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| WireError::structural(position, format!("{} does not fit an i32 field", value)))
}

/// Element count must equal the product of the dimensions
pub(crate) fn check_dims(position: usize, dims: &[usize], count: usize) -> Result<()> {
    let product = dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
    if dims.is_empty() || product != Some(count) {
        return Err(WireError::structural(
            position,
            format!("dimensions {:?} do not match {} elements", dims, count),
        ));
    }
    Ok(())
}

fn array_type(element: DataType) -> DataType {
    element.array_of().unwrap_or(DataType::Other)
}

/// Put/get protocol shared by both wire formats
pub trait IoSerialiser {
    type Buffer: IoBuffer;

    /// Codec name used in error reports
    const NAME: &'static str;

    /// Whether every scope closes with an END_MARKER header on the wire
    const END_MARKERS: bool = true;

    fn buffer(&self) -> &Self::Buffer;

    fn buffer_mut(&mut self) -> &mut Self::Buffer;

    fn config(&self) -> &SerialiserConfig;

    /// Identity this codec writes and expects
    fn protocol_info(&self) -> ProtocolInfo;

    // Stream framing

    /// Write the stream header and open the root scope
    fn put_header_info(&mut self, info: &ProtocolInfo) -> Result<PendingField>;

    /// Read the stream header and validate it against [`Self::protocol_info`]
    fn get_header_info(&mut self) -> Result<ProtocolInfo>;

    /// Read the root scope descriptor that follows the stream header
    fn get_root_header(&mut self) -> Result<FieldHeader>;

    // Field headers and scopes

    fn put_field_header_with_meta(
        &mut self,
        name: &str,
        data_type: DataType,
        meta: &FieldMeta,
    ) -> Result<PendingField>;

    /// Patch the size of a field whose payload has been written
    fn finish_field(&mut self, pending: PendingField) -> Result<FieldHeader>;

    /// Read one field header, leaving the cursor at its data start
    fn get_field_header(&mut self) -> Result<FieldHeader>;

    fn put_start_marker(&mut self, name: &str) -> Result<PendingField>;

    /// Close the scope opened by `start`
    fn put_end_marker(&mut self, start: PendingField) -> Result<FieldHeader>;

    /// Read the header closing `start`; every child must have been consumed
    fn get_end_marker(&mut self, start: &FieldHeader) -> Result<FieldHeader>;

    // Layout-specific payload headers

    /// Open an array field with the given dimensions
    fn put_array_header(
        &mut self,
        name: &str,
        element: DataType,
        dims: &[usize],
        count: usize,
    ) -> Result<PendingField>;

    /// Position at the elements of an array field and return its dimensions.
    /// An empty vector means the dimensions are implied by the element count.
    fn get_array_header(&mut self, field: &FieldHeader) -> Result<Vec<usize>>;

    fn put_collection_header(
        &mut self,
        name: &str,
        kind: CollectionKind,
        element: DataType,
        count: usize,
    ) -> Result<PendingField>;

    /// Position at the elements of a collection field, returning the element
    /// tag and the dimensions (empty when implied by the element count)
    fn get_collection_header(&mut self, field: &FieldHeader) -> Result<(DataType, Vec<usize>)>;

    fn put_map_header(
        &mut self,
        name: &str,
        key: DataType,
        value: DataType,
        count: usize,
    ) -> Result<PendingField>;

    /// Position at the entries of a map field: `(key tag, value tag, entries)`
    fn get_map_header(&mut self, field: &FieldHeader) -> Result<(DataType, DataType, usize)>;

    fn put_enum_value(&mut self, name: &str, value: &EnumValue) -> Result<FieldHeader>;

    fn get_enum_value(&mut self, field: &FieldHeader) -> Result<EnumValue>;

    /// Advance past an enum's family block, leaving the cursor on the member
    fn skip_enum_info(&mut self) -> Result<()>;

    // Provided: fields and markers

    fn put_field_header(&mut self, name: &str, data_type: DataType) -> Result<PendingField> {
        self.put_field_header_with_meta(name, data_type, &FieldMeta::default())
    }

    fn get_start_marker(&mut self) -> Result<FieldHeader> {
        let header = self.get_field_header()?;
        header.expect_type(DataType::StartMarker)?;
        Ok(header)
    }

    /// Move the cursor past `field`, whether or not its payload was read
    fn skip_field(&mut self, field: &FieldHeader) -> Result<()> {
        self.buffer_mut().set_position(field.data_end())?;
        Ok(())
    }

    /// Decode the remaining stream into a field tree without a schema
    fn parse_stream(&mut self) -> Result<FieldTree>
    where
        Self: Sized,
    {
        parser::parse_stream(self)
    }

    // Provided: scalars

    fn put<T: WireValue>(&mut self, name: &str, value: &T) -> Result<FieldHeader> {
        self.put_with_meta(name, value, &FieldMeta::default())
    }

    fn put_with_meta<T: WireValue>(&mut self, name: &str, value: &T, meta: &FieldMeta) -> Result<FieldHeader> {
        let pending = self.put_field_header_with_meta(name, T::DATA_TYPE, meta)?;
        value.put_value(self.buffer_mut())?;
        self.finish_field(pending)
    }

    /// String field; `None` is written as the empty string
    fn put_str(&mut self, name: &str, value: Option<&str>) -> Result<FieldHeader> {
        let pending = self.put_field_header(name, DataType::String)?;
        self.buffer_mut().put_string(value.unwrap_or_default())?;
        self.finish_field(pending)
    }

    fn get<T: WireValue>(&mut self, field: &FieldHeader) -> Result<T> {
        field.expect_type(T::DATA_TYPE)?;
        self.buffer_mut().set_position(field.data_start)?;
        Ok(T::get_value(self.buffer_mut())?)
    }

    fn put_boxed(&mut self, name: &str, value: &Value) -> Result<FieldHeader> {
        let pending = self.put_field_header(name, value.data_type())?;
        value.put(self.buffer_mut())?;
        self.finish_field(pending)
    }

    fn get_boxed(&mut self, field: &FieldHeader) -> Result<Value> {
        if !field.data_type.is_scalar() {
            return Err(field.mismatch(field.data_type.element_type().unwrap_or(DataType::Other)));
        }
        self.buffer_mut().set_position(field.data_start)?;
        Value::get(self.buffer_mut(), field.data_type)
    }

    // Provided: arrays

    fn put_array<T: WireValue>(&mut self, name: &str, values: &[T]) -> Result<FieldHeader> {
        self.put_array_dims(name, values, &[values.len()])
    }

    /// Array of the flattened `values` with explicit dimensions
    fn put_array_dims<T: WireValue>(&mut self, name: &str, values: &[T], dims: &[usize]) -> Result<FieldHeader> {
        let pending = self.put_array_header(name, T::DATA_TYPE, dims, values.len())?;
        T::put_values(values, self.buffer_mut())?;
        self.finish_field(pending)
    }

    fn get_array<T: WireValue>(&mut self, field: &FieldHeader) -> Result<Vec<T>> {
        self.get_array_dims(field).map(|(_, values)| values)
    }

    /// Flattened elements with their dimensions
    fn get_array_dims<T: WireValue>(&mut self, field: &FieldHeader) -> Result<(Vec<usize>, Vec<T>)> {
        field.expect_type(array_type(T::DATA_TYPE))?;
        let dims = self.get_array_header(field)?;
        let values = T::get_values(self.buffer_mut())?;
        let dims = if dims.is_empty() { vec![values.len()] } else { dims };
        check_dims(field.data_start, &dims, values.len())?;
        Ok((dims, values))
    }

    fn put_boxed_array(&mut self, name: &str, values: &ValueArray) -> Result<FieldHeader> {
        self.put_boxed_array_dims(name, values, &[values.len()])
    }

    fn put_boxed_array_dims(&mut self, name: &str, values: &ValueArray, dims: &[usize]) -> Result<FieldHeader> {
        let pending = self.put_array_header(name, values.element_type(), dims, values.len())?;
        values.put(self.buffer_mut())?;
        self.finish_field(pending)
    }

    fn get_boxed_array(&mut self, field: &FieldHeader) -> Result<ValueArray> {
        self.get_boxed_array_dims(field).map(|(_, values)| values)
    }

    fn get_boxed_array_dims(&mut self, field: &FieldHeader) -> Result<(Vec<usize>, ValueArray)> {
        let element = match field.data_type.element_type() {
            Some(element) => element,
            None => return Err(field.mismatch(field.data_type.array_of().unwrap_or(DataType::Other))),
        };
        let dims = self.get_array_header(field)?;
        let values = ValueArray::get(self.buffer_mut(), element)?;
        let dims = if dims.is_empty() { vec![values.len()] } else { dims };
        check_dims(field.data_start, &dims, values.len())?;
        Ok((dims, values))
    }

    // Provided: collections

    fn put_collection<T, I>(&mut self, name: &str, kind: CollectionKind, items: I) -> Result<FieldHeader>
    where
        T: WireValue,
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        let pending = self.put_collection_header(name, kind, T::DATA_TYPE, items.len())?;
        T::put_values(&items, self.buffer_mut())?;
        self.finish_field(pending)
    }

    /// Decode a collection field of element type `T` into any container
    fn get_collection_into<T, C>(&mut self, field: &FieldHeader) -> Result<C>
    where
        T: WireValue,
        C: FromIterator<T>,
    {
        let (element, dims) = self.get_collection_header(field)?;
        if element != T::DATA_TYPE {
            return Err(WireError::TypeMismatch {
                field: field.name.clone(),
                expected: T::DATA_TYPE,
                found: element,
            });
        }
        let values = T::get_values(self.buffer_mut())?;
        if !dims.is_empty() {
            check_dims(field.data_start, &dims, values.len())?;
        }
        Ok(values.into_iter().collect())
    }

    fn get_list<T: WireValue>(&mut self, field: &FieldHeader) -> Result<Vec<T>> {
        self.get_collection_into(field)
    }

    fn get_set<T: WireValue + Eq + Hash>(&mut self, field: &FieldHeader) -> Result<HashSet<T>> {
        self.get_collection_into(field)
    }

    fn get_queue<T: WireValue>(&mut self, field: &FieldHeader) -> Result<VecDeque<T>> {
        self.get_collection_into(field)
    }

    fn get_boxed_collection(&mut self, field: &FieldHeader) -> Result<ValueArray> {
        let (element, dims) = self.get_collection_header(field)?;
        let values = ValueArray::get(self.buffer_mut(), element)?;
        if !dims.is_empty() {
            check_dims(field.data_start, &dims, values.len())?;
        }
        Ok(values)
    }

    // Provided: maps

    fn put_map<K, V, I>(&mut self, name: &str, entries: I) -> Result<FieldHeader>
    where
        K: WireValue,
        V: WireValue,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        let pending = self.put_map_header(name, K::DATA_TYPE, V::DATA_TYPE, entries.len())?;
        for (key, value) in &entries {
            key.put_value(self.buffer_mut())?;
            value.put_value(self.buffer_mut())?;
        }
        self.finish_field(pending)
    }

    fn get_map<K, V>(&mut self, field: &FieldHeader) -> Result<HashMap<K, V>>
    where
        K: WireValue + Eq + Hash,
        V: WireValue,
    {
        let (key, value, count) = self.get_map_header(field)?;
        for (expected, found) in [(K::DATA_TYPE, key), (V::DATA_TYPE, value)] {
            if expected != found {
                return Err(WireError::TypeMismatch { field: field.name.clone(), expected, found });
            }
        }
        let mut map = HashMap::with_capacity(count);
        for _ in 0..count {
            let k = K::get_value(self.buffer_mut())?;
            let v = V::get_value(self.buffer_mut())?;
            map.insert(k, v);
        }
        Ok(map)
    }

    /// Map entries in wire order
    fn get_boxed_map(&mut self, field: &FieldHeader) -> Result<Vec<(Value, Value)>> {
        let (key, value, count) = self.get_map_header(field)?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let k = Value::get(self.buffer_mut(), key)?;
            let v = Value::get(self.buffer_mut(), value)?;
            entries.push((k, v));
        }
        Ok(entries)
    }

    // Provided: enums

    fn put_enum<E: WireEnum>(&mut self, name: &str, value: &E) -> Result<FieldHeader> {
        self.put_enum_value(name, &EnumValue::of(value))
    }

    /// Decode an enum member of `E`, using `default` when the member is unknown
    fn get_enum<E: WireEnum>(&mut self, field: &FieldHeader, default: E) -> Result<E> {
        let value = self.get_enum_value(field)?;
        Ok(value.resolve(default))
    }
}
