//! Self-describing binary serialisation
//!
//! This crate converts structured data (scalars, multi-dimensional arrays,
//! collections, maps, enums, nested records) into a versioned binary wire
//! representation and back, without the reader knowing the writer's schema.
//!
//! Two wire formats implement one contract, [`IoSerialiser`]:
//! - [`BinarySerialiser`]: the primary format, with explicit field headers,
//!   name hashes, optional unit/description metadata and start/end markers
//! - [`CompactSerialiser`]: a denser tag-and-length format for exchanging
//!   data with an external control-system protocol
//!
//! # Skip Addressing
//!
//! Every [`FieldHeader`] satisfies `data_start + data_size == next sibling`,
//! so a reader can step over any field it does not understand. The stream
//! parser relies on nothing else to rebuild a [`FieldTree`] from an unknown
//! buffer.
//!
//! # Example
//!
//! ```
//! use fieldwire::{BinarySerialiser, FastByteBuffer, IoBuffer, IoSerialiser, ProtocolInfo};
//!
//! let mut ser = BinarySerialiser::new(FastByteBuffer::new());
//! let root = ser.put_header_info(&ProtocolInfo::primary())?;
//! ser.put("temperature", &21.5f64)?;
//! ser.put_end_marker(root)?;
//!
//! let mut buffer = ser.into_buffer();
//! buffer.flip();
//! let mut ser = BinarySerialiser::new(buffer);
//! let tree = ser.parse_stream()?;
//! let field = tree.header(tree.find_path(&["temperature"]).unwrap()).clone();
//! assert_eq!(ser.get::<f64>(&field)?, 21.5);
//! # Ok::<(), fieldwire::WireError>(())
//! ```

mod binary;
mod codec;
mod compact;
mod config;
mod data_type;
mod enums;
mod error;
mod field;
mod parser;
mod protocol;
mod value;

pub use binary::{BinarySerialiser, ROOT_NAME};
pub use codec::{CollectionKind, IoSerialiser, PendingField};
pub use compact::CompactSerialiser;
pub use config::{SerialiserConfig, DEFAULT_MAX_DEPTH};
pub use data_type::DataType;
pub use enums::{EnumFamily, EnumValue, WireEnum};
pub use error::{ErrorKind, Result, WireError};
pub use field::{field_hash, FieldHeader, FieldId, FieldMeta, FieldNode, FieldTree, Walk};
pub use parser::parse_stream;
pub use protocol::{ProtocolInfo, COMPACT_PRODUCER, COMPACT_VERSION, PRIMARY_PRODUCER, PRIMARY_VERSION};
pub use value::{Value, ValueArray, WireValue};

pub use fieldwire_buffer::{BufferError, ExternalBuffer, FastByteBuffer, IoBuffer};

/// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};
