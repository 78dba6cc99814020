//! Primitive-like values
//!
//! Two ways to move scalars through a codec:
//!
//! - Typed: any [`WireValue`] (`bool`, `i8`, `u16`, `i16`, `i32`, `i64`,
//!   `f32`, `f64`, `String`) knows its tag and its buffer codec
//! - Boxed: [`Value`] / [`ValueArray`] carry the tag at runtime, for callers
//!   that only learn the element kind while decoding

use crate::data_type::DataType;
use crate::error::{Result, WireError};
use fieldwire_buffer::IoBuffer;
use std::fmt;

type BufferResult<T> = fieldwire_buffer::Result<T>;

/// A scalar of one of the nine primitive-like kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

/// An array of one of the nine primitive-like kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ValueArray {
    Bool(Vec<bool>),
    Byte(Vec<i8>),
    Char(Vec<u16>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<String>),
}

fn not_scalar(data_type: DataType) -> WireError {
    WireError::Unsupported { codec: "boxed value", data_type }
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Byte(_) => DataType::Byte,
            Self::Char(_) => DataType::Char,
            Self::Short(_) => DataType::Short,
            Self::Int(_) => DataType::Int,
            Self::Long(_) => DataType::Long,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    pub fn put<B: IoBuffer>(&self, buf: &mut B) -> BufferResult<()> {
        match self {
            Self::Bool(v) => buf.put_bool(*v),
            Self::Byte(v) => buf.put_byte(*v),
            Self::Char(v) => buf.put_char(*v),
            Self::Short(v) => buf.put_short(*v),
            Self::Int(v) => buf.put_int(*v),
            Self::Long(v) => buf.put_long(*v),
            Self::Float(v) => buf.put_float(*v),
            Self::Double(v) => buf.put_double(*v),
            Self::String(v) => buf.put_string(v),
        }
    }

    /// Decode one scalar of kind `data_type` at the cursor
    pub fn get<B: IoBuffer>(buf: &mut B, data_type: DataType) -> Result<Self> {
        let value = match data_type {
            DataType::Bool => Self::Bool(buf.get_bool()?),
            DataType::Byte => Self::Byte(buf.get_byte()?),
            DataType::Char => Self::Char(buf.get_char()?),
            DataType::Short => Self::Short(buf.get_short()?),
            DataType::Int => Self::Int(buf.get_int()?),
            DataType::Long => Self::Long(buf.get_long()?),
            DataType::Float => Self::Float(buf.get_float()?),
            DataType::Double => Self::Double(buf.get_double()?),
            DataType::String => Self::String(buf.get_string()?),
            other => return Err(not_scalar(other)),
        };
        Ok(value)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Char(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Char(v) => match char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "'{}'", c),
                None => write!(f, "\\u{:04x}", v),
            },
            Self::Short(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{:?}", v),
        }
    }
}

impl ValueArray {
    /// Array tag (`IntArray`, ...)
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::BoolArray,
            Self::Byte(_) => DataType::ByteArray,
            Self::Char(_) => DataType::CharArray,
            Self::Short(_) => DataType::ShortArray,
            Self::Int(_) => DataType::IntArray,
            Self::Long(_) => DataType::LongArray,
            Self::Float(_) => DataType::FloatArray,
            Self::Double(_) => DataType::DoubleArray,
            Self::String(_) => DataType::StringArray,
        }
    }

    /// Scalar tag of the elements
    pub fn element_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Byte(_) => DataType::Byte,
            Self::Char(_) => DataType::Char,
            Self::Short(_) => DataType::Short,
            Self::Int(_) => DataType::Int,
            Self::Long(_) => DataType::Long,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length-prefixed element block
    pub fn put<B: IoBuffer>(&self, buf: &mut B) -> BufferResult<()> {
        match self {
            Self::Bool(v) => buf.put_bool_array(v),
            Self::Byte(v) => buf.put_byte_array(v),
            Self::Char(v) => buf.put_char_array(v),
            Self::Short(v) => buf.put_short_array(v),
            Self::Int(v) => buf.put_int_array(v),
            Self::Long(v) => buf.put_long_array(v),
            Self::Float(v) => buf.put_float_array(v),
            Self::Double(v) => buf.put_double_array(v),
            Self::String(v) => buf.put_string_array(v),
        }
    }

    /// Decode a length-prefixed element block of scalar kind `element_type`
    pub fn get<B: IoBuffer>(buf: &mut B, element_type: DataType) -> Result<Self> {
        let array = match element_type {
            DataType::Bool => Self::Bool(buf.get_bool_array()?),
            DataType::Byte => Self::Byte(buf.get_byte_array()?),
            DataType::Char => Self::Char(buf.get_char_array()?),
            DataType::Short => Self::Short(buf.get_short_array()?),
            DataType::Int => Self::Int(buf.get_int_array()?),
            DataType::Long => Self::Long(buf.get_long_array()?),
            DataType::Float => Self::Float(buf.get_float_array()?),
            DataType::Double => Self::Double(buf.get_double_array()?),
            DataType::String => Self::String(buf.get_string_array()?),
            other => return Err(not_scalar(other)),
        };
        Ok(array)
    }

    /// Box every element
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            Self::Bool(v) => v.iter().copied().map(Value::Bool).collect(),
            Self::Byte(v) => v.iter().copied().map(Value::Byte).collect(),
            Self::Char(v) => v.iter().copied().map(Value::Char).collect(),
            Self::Short(v) => v.iter().copied().map(Value::Short).collect(),
            Self::Int(v) => v.iter().copied().map(Value::Int).collect(),
            Self::Long(v) => v.iter().copied().map(Value::Long).collect(),
            Self::Float(v) => v.iter().copied().map(Value::Float).collect(),
            Self::Double(v) => v.iter().copied().map(Value::Double).collect(),
            Self::String(v) => v.iter().cloned().map(Value::String).collect(),
        }
    }
}

/// A scalar type with a fixed tag and a buffer codec
pub trait WireValue: Sized + Clone {
    const DATA_TYPE: DataType;

    fn put_value<B: IoBuffer>(&self, buf: &mut B) -> BufferResult<()>;

    fn get_value<B: IoBuffer>(buf: &mut B) -> BufferResult<Self>;

    /// Length-prefixed element block
    fn put_values<B: IoBuffer>(values: &[Self], buf: &mut B) -> BufferResult<()>;

    fn get_values<B: IoBuffer>(buf: &mut B) -> BufferResult<Vec<Self>>;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Option<Self>;

    fn into_array(values: Vec<Self>) -> ValueArray;

    fn from_array(array: ValueArray) -> Option<Vec<Self>>;
}

macro_rules! impl_wire_value {
    ($ty:ty, $variant:ident, $data_type:expr, $get:ident, $put:ident, $get_array:ident, $put_array:ident) => {
        impl WireValue for $ty {
            const DATA_TYPE: DataType = $data_type;

            fn put_value<B: IoBuffer>(&self, buf: &mut B) -> BufferResult<()> {
                buf.$put(*self)
            }

            fn get_value<B: IoBuffer>(buf: &mut B) -> BufferResult<Self> {
                buf.$get()
            }

            fn put_values<B: IoBuffer>(values: &[Self], buf: &mut B) -> BufferResult<()> {
                buf.$put_array(values)
            }

            fn get_values<B: IoBuffer>(buf: &mut B) -> BufferResult<Vec<Self>> {
                buf.$get_array()
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_array(values: Vec<Self>) -> ValueArray {
                ValueArray::$variant(values)
            }

            fn from_array(array: ValueArray) -> Option<Vec<Self>> {
                match array {
                    ValueArray::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }
    };
}

impl_wire_value!(bool, Bool, DataType::Bool, get_bool, put_bool, get_bool_array, put_bool_array);
impl_wire_value!(i8, Byte, DataType::Byte, get_byte, put_byte, get_byte_array, put_byte_array);
impl_wire_value!(u16, Char, DataType::Char, get_char, put_char, get_char_array, put_char_array);
impl_wire_value!(i16, Short, DataType::Short, get_short, put_short, get_short_array, put_short_array);
impl_wire_value!(i32, Int, DataType::Int, get_int, put_int, get_int_array, put_int_array);
impl_wire_value!(i64, Long, DataType::Long, get_long, put_long, get_long_array, put_long_array);
impl_wire_value!(f32, Float, DataType::Float, get_float, put_float, get_float_array, put_float_array);
impl_wire_value!(f64, Double, DataType::Double, get_double, put_double, get_double_array, put_double_array);

impl WireValue for String {
    const DATA_TYPE: DataType = DataType::String;

    fn put_value<B: IoBuffer>(&self, buf: &mut B) -> BufferResult<()> {
        buf.put_string(self)
    }

    fn get_value<B: IoBuffer>(buf: &mut B) -> BufferResult<Self> {
        buf.get_string()
    }

    fn put_values<B: IoBuffer>(values: &[Self], buf: &mut B) -> BufferResult<()> {
        buf.put_string_array(values)
    }

    fn get_values<B: IoBuffer>(buf: &mut B) -> BufferResult<Vec<Self>> {
        buf.get_string_array()
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    fn into_array(values: Vec<Self>) -> ValueArray {
        ValueArray::String(values)
    }

    fn from_array(array: ValueArray) -> Option<Vec<Self>> {
        match array {
            ValueArray::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}
