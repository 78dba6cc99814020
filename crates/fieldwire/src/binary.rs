//! Primary wire format
//!
//! Stream layout:
//!
//! ```text
//! +--------------------+-------+-------+-------+------------------------+
//! | producer (string)  | major | minor | micro | ROOT start marker ...  |
//! +--------------------+-------+-------+-------+------------------------+
//! ```
//!
//! Every field starts with a fixed header, followed by its name and optional
//! metadata, followed by the payload:
//!
//! ```text
//!  0      1          5              9           13
//! +------+----------+--------------+-----------+------+------+------+---------+
//! | tag  | name     | data start   | data size | name | unit | desc | payload |
//! | (u8) | hash i32 | (rel.) i32   | i32       |      | opt. | opt. |         |
//! +------+----------+--------------+-----------+------+------+------+---------+
//! ```
//!
//! The data start is relative to the first header byte, so a reader that does
//! not know about trailing header extensions still lands on the payload.
//! A start marker's size covers its children and the closing end marker, so
//! skipping it lands on its next sibling.

use crate::codec::{check_dims, wire_i32, CollectionKind, IoSerialiser, PendingField};
use crate::config::SerialiserConfig;
use crate::data_type::DataType;
use crate::enums::{EnumFamily, EnumValue};
use crate::error::{Result, WireError};
use crate::field::{field_hash, FieldHeader, FieldMeta};
use crate::protocol::ProtocolInfo;
use fieldwire_buffer::{FastByteBuffer, IoBuffer};
use tracing::{debug, trace};

/// Scope name of the outermost start marker
pub const ROOT_NAME: &str = "ROOT";

const HASH_OFFSET: usize = 1;
const DATA_START_OFFSET: usize = 5;
const DATA_SIZE_OFFSET: usize = 9;
const FIXED_HEADER_LEN: usize = 13;

fn tag_at(buf: &impl IoBuffer, position: usize) -> Result<DataType> {
    let raw = buf.get_byte_at(position)? as u8;
    DataType::from_u8(raw).ok_or_else(|| WireError::structural(position, format!("unknown type tag {:#04x}", raw)))
}

fn read_scalar_tag<B: IoBuffer>(buf: &mut B) -> Result<DataType> {
    let position = buf.position();
    let data_type = tag_at(&*buf, position)?;
    buf.skip(1)?;
    if !data_type.is_scalar() {
        return Err(WireError::structural(position, format!("{} is not an element type", data_type)));
    }
    Ok(data_type)
}

fn read_single_dim<B: IoBuffer>(buf: &mut B) -> Result<usize> {
    let position = buf.position();
    let ndims = buf.get_length()?;
    if ndims != 1 {
        return Err(WireError::structural(position, format!("expected one dimension, found {}", ndims)));
    }
    Ok(buf.get_length()?)
}

/// Codec for the primary, fully self-describing wire format
#[derive(Debug)]
pub struct BinarySerialiser<B: IoBuffer = FastByteBuffer> {
    buffer: B,
    config: SerialiserConfig,
}

impl<B: IoBuffer> BinarySerialiser<B> {
    pub fn new(buffer: B) -> Self {
        Self::with_config(buffer, SerialiserConfig::default())
    }

    pub fn with_config(mut buffer: B, config: SerialiserConfig) -> Self {
        if config.enforce_simple_strings {
            buffer.set_enforce_simple_strings(true);
        }
        Self { buffer, config }
    }

    pub fn into_buffer(self) -> B {
        self.buffer
    }
}

impl<B: IoBuffer> IoSerialiser for BinarySerialiser<B> {
    type Buffer = B;

    const NAME: &'static str = "binary";

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
        ProtocolInfo::primary()
    }

    fn put_header_info(&mut self, info: &ProtocolInfo) -> Result<PendingField> {
        self.buffer.put_string(&info.producer)?;
        for part in [info.major, info.minor, info.micro] {
            self.buffer.put_byte(part as i8)?;
        }
        debug!(protocol = %info, "wrote stream header");
        self.put_start_marker(ROOT_NAME)
    }

    fn get_header_info(&mut self) -> Result<ProtocolInfo> {
        let producer = self.buffer.get_string()?;
        let major = self.buffer.get_byte()? as u8;
        let minor = self.buffer.get_byte()? as u8;
        let micro = self.buffer.get_byte()? as u8;
        let received = ProtocolInfo::new(producer, major, minor, micro);
        self.protocol_info().check(&received, self.config.accept_newer_minor)?;
        debug!(protocol = %received, "accepted stream header");
        Ok(received)
    }

    fn get_root_header(&mut self) -> Result<FieldHeader> {
        self.get_start_marker()
    }

    fn put_field_header_with_meta(
        &mut self,
        name: &str,
        data_type: DataType,
        meta: &FieldMeta,
    ) -> Result<PendingField> {
        let header_start = self.buffer.position();
        let hash = field_hash(name);
        self.buffer.put_byte(data_type.as_u8() as i8)?;
        self.buffer.put_int(hash)?;
        // data start and size are patched below and in finish_field
        self.buffer.put_int(0)?;
        self.buffer.put_int(0)?;
        self.buffer.put_string(name)?;

        let meta = if self.config.put_field_metadata { meta.clone() } else { FieldMeta::default() };
        if !meta.is_empty() {
            self.buffer.put_string(meta.unit.as_deref().unwrap_or_default())?;
            self.buffer.put_string(meta.description.as_deref().unwrap_or_default())?;
        }

        let data_start = self.buffer.position();
        let relative = wire_i32(data_start - header_start, header_start)?;
        self.buffer.put_int_at(header_start + DATA_START_OFFSET, relative)?;
        trace!(field = name, %data_type, header_start, data_start, "put field header");

        Ok(PendingField::new(FieldHeader {
            name: name.to_string(),
            hash,
            data_type,
            wire_type: data_type.as_u8(),
            header_start,
            data_start,
            data_size: 0,
            meta,
        }))
    }

    fn finish_field(&mut self, pending: PendingField) -> Result<FieldHeader> {
        let mut header = pending.header;
        let position = self.buffer.position();
        if position < header.data_start {
            return Err(WireError::structural(position, format!("cursor moved before the data of '{}'", header.name)));
        }
        header.data_size = position - header.data_start;
        let size = wire_i32(header.data_size, header.header_start)?;
        self.buffer.put_int_at(header.header_start + DATA_SIZE_OFFSET, size)?;
        Ok(header)
    }

    fn get_field_header(&mut self) -> Result<FieldHeader> {
        let header_start = self.buffer.position();
        self.buffer
            .check_read(header_start, FIXED_HEADER_LEN)
            .map_err(|_| WireError::structural(header_start, "truncated field header"))?;
        let data_type = tag_at(&self.buffer, header_start)?;
        let wire_type = data_type.as_u8();
        let hash = self.buffer.get_int_at(header_start + HASH_OFFSET)?;
        let relative = self.buffer.get_int_at(header_start + DATA_START_OFFSET)?;
        let size = self.buffer.get_int_at(header_start + DATA_SIZE_OFFSET)?;
        let (relative, data_size) = match (usize::try_from(relative), usize::try_from(size)) {
            (Ok(relative), Ok(size)) => (relative, size),
            _ => {
                return Err(WireError::structural(
                    header_start,
                    format!("negative header offsets ({}, {})", relative, size),
                ))
            }
        };

        self.buffer.skip(FIXED_HEADER_LEN)?;
        let name = self.buffer.get_string()?;
        let data_start = header_start + relative;
        if self.buffer.position() > data_start {
            return Err(WireError::structural(header_start, format!("data start of '{}' lies inside its header", name)));
        }
        if field_hash(&name) != hash {
            return Err(WireError::structural(header_start, format!("name hash mismatch for '{}'", name)));
        }

        let mut meta = FieldMeta::default();
        if self.buffer.position() < data_start {
            let unit = self.buffer.get_string()?;
            let description = self.buffer.get_string()?;
            meta.unit = Some(unit).filter(|s| !s.is_empty());
            meta.description = Some(description).filter(|s| !s.is_empty());
        }
        // anything left between the description and the data start is skipped;
        // bytes there are never interpreted, but unit and description always come first
        if self.buffer.position() > data_start {
            return Err(WireError::structural(header_start, format!("metadata of '{}' overruns its data", name)));
        }
        if data_start.checked_add(data_size).map_or(true, |end| end > self.buffer.limit()) {
            return Err(WireError::structural(
                header_start,
                format!("'{}' declares {} bytes past the end of the buffer", name, data_size),
            ));
        }
        self.buffer.set_position(data_start)?;
        trace!(field = %name, %data_type, data_start, data_size, "got field header");

        Ok(FieldHeader {
            name,
            hash,
            data_type,
            wire_type,
            header_start,
            data_start,
            data_size,
            meta,
        })
    }

    fn put_start_marker(&mut self, name: &str) -> Result<PendingField> {
        self.put_field_header(name, DataType::StartMarker)
    }

    fn put_end_marker(&mut self, start: PendingField) -> Result<FieldHeader> {
        if start.data_type() != DataType::StartMarker {
            return Err(WireError::structural(
                start.header_start(),
                format!("'{}' is not a start marker", start.name()),
            ));
        }
        let end = self.put_field_header(start.name(), DataType::EndMarker)?;
        self.finish_field(end)?;
        self.finish_field(start)
    }

    fn get_end_marker(&mut self, start: &FieldHeader) -> Result<FieldHeader> {
        let end = self.get_field_header()?;
        if end.data_type != DataType::EndMarker || end.name != start.name || end.data_end() != start.data_end() {
            return Err(WireError::structural(
                end.header_start,
                format!("expected end of '{}', found {} '{}'", start.name, end.data_type, end.name),
            ));
        }
        Ok(end)
    }

    fn put_array_header(
        &mut self,
        name: &str,
        element: DataType,
        dims: &[usize],
        count: usize,
    ) -> Result<PendingField> {
        let position = self.buffer.position();
        check_dims(position, dims, count)?;
        let array_type = element.array_of().ok_or(WireError::Unsupported { codec: Self::NAME, data_type: element })?;
        let pending = self.put_field_header(name, array_type)?;
        self.buffer.put_length(dims.len())?;
        for &dim in dims {
            self.buffer.put_length(dim)?;
        }
        Ok(pending)
    }

    fn get_array_header(&mut self, field: &FieldHeader) -> Result<Vec<usize>> {
        if !field.data_type.is_array() {
            return Err(WireError::structural(field.header_start, format!("'{}' is not an array", field.name)));
        }
        self.buffer.set_position(field.data_start)?;
        let ndims = self.buffer.get_length()?;
        self.buffer.check_read(self.buffer.position(), ndims.saturating_mul(4))?;
        let mut dims = Vec::with_capacity(ndims);
        for _ in 0..ndims {
            dims.push(self.buffer.get_length()?);
        }
        Ok(dims)
    }

    fn put_collection_header(
        &mut self,
        name: &str,
        kind: CollectionKind,
        element: DataType,
        count: usize,
    ) -> Result<PendingField> {
        if !element.is_scalar() {
            return Err(WireError::Unsupported { codec: Self::NAME, data_type: element });
        }
        let pending = self.put_field_header(name, kind.data_type())?;
        self.buffer.put_byte(element.as_u8() as i8)?;
        self.buffer.put_length(1)?;
        self.buffer.put_length(count)?;
        Ok(pending)
    }

    fn get_collection_header(&mut self, field: &FieldHeader) -> Result<(DataType, Vec<usize>)> {
        if !field.data_type.is_collection() {
            return Err(field.mismatch(DataType::List));
        }
        self.buffer.set_position(field.data_start)?;
        let element = read_scalar_tag(&mut self.buffer)?;
        let count = read_single_dim(&mut self.buffer)?;
        Ok((element, vec![count]))
    }

    fn put_map_header(
        &mut self,
        name: &str,
        key: DataType,
        value: DataType,
        count: usize,
    ) -> Result<PendingField> {
        for data_type in [key, value] {
            if !data_type.is_scalar() {
                return Err(WireError::Unsupported { codec: Self::NAME, data_type });
            }
        }
        let pending = self.put_field_header(name, DataType::Map)?;
        self.buffer.put_byte(key.as_u8() as i8)?;
        self.buffer.put_byte(value.as_u8() as i8)?;
        self.buffer.put_length(1)?;
        self.buffer.put_length(count)?;
        Ok(pending)
    }

    fn get_map_header(&mut self, field: &FieldHeader) -> Result<(DataType, DataType, usize)> {
        field.expect_type(DataType::Map)?;
        self.buffer.set_position(field.data_start)?;
        let key = read_scalar_tag(&mut self.buffer)?;
        let value = read_scalar_tag(&mut self.buffer)?;
        let count = read_single_dim(&mut self.buffer)?;
        Ok((key, value, count))
    }

    fn put_enum_value(&mut self, name: &str, value: &EnumValue) -> Result<FieldHeader> {
        let pending = self.put_field_header(name, DataType::Enum)?;
        value.put(&mut self.buffer)?;
        self.finish_field(pending)
    }

    fn get_enum_value(&mut self, field: &FieldHeader) -> Result<EnumValue> {
        field.expect_type(DataType::Enum)?;
        self.buffer.set_position(field.data_start)?;
        EnumValue::get(&mut self.buffer)
    }

    fn skip_enum_info(&mut self) -> Result<()> {
        EnumFamily::skip(&mut self.buffer)
    }
}
