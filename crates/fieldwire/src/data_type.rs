//! Wire type tags
//!
//! | Range     | Kind                                   |
//! |-----------|----------------------------------------|
//! | 0         | start marker                           |
//! | 1..=9     | scalars (bool .. string)               |
//! | 101..=109 | arrays of the scalars, same order      |
//! | 201..=205 | enum, list, map, queue, set            |
//! | 0xFD      | other (opaque, skippable)              |
//! | 0xFE      | end marker                             |

use std::fmt;

/// Type tag carried in every field header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    StartMarker = 0,
    Bool = 1,
    Byte = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Float = 6,
    Double = 7,
    Char = 8,
    String = 9,
    BoolArray = 101,
    ByteArray = 102,
    ShortArray = 103,
    IntArray = 104,
    LongArray = 105,
    FloatArray = 106,
    DoubleArray = 107,
    CharArray = 108,
    StringArray = 109,
    Enum = 201,
    List = 202,
    Map = 203,
    Queue = 204,
    Set = 205,
    Other = 0xFD,
    EndMarker = 0xFE,
}

impl DataType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::StartMarker),
            1 => Some(Self::Bool),
            2 => Some(Self::Byte),
            3 => Some(Self::Short),
            4 => Some(Self::Int),
            5 => Some(Self::Long),
            6 => Some(Self::Float),
            7 => Some(Self::Double),
            8 => Some(Self::Char),
            9 => Some(Self::String),
            101 => Some(Self::BoolArray),
            102 => Some(Self::ByteArray),
            103 => Some(Self::ShortArray),
            104 => Some(Self::IntArray),
            105 => Some(Self::LongArray),
            106 => Some(Self::FloatArray),
            107 => Some(Self::DoubleArray),
            108 => Some(Self::CharArray),
            109 => Some(Self::StringArray),
            201 => Some(Self::Enum),
            202 => Some(Self::List),
            203 => Some(Self::Map),
            204 => Some(Self::Queue),
            205 => Some(Self::Set),
            0xFD => Some(Self::Other),
            0xFE => Some(Self::EndMarker),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Primitives and strings: a single value, no children
    pub fn is_scalar(self) -> bool {
        (1..=9).contains(&self.as_u8())
    }

    pub fn is_array(self) -> bool {
        (101..=109).contains(&self.as_u8())
    }

    pub fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Queue)
    }

    pub fn is_marker(self) -> bool {
        matches!(self, Self::StartMarker | Self::EndMarker)
    }

    /// Anything that is not a single scalar value
    pub fn is_composite(self) -> bool {
        !self.is_scalar()
    }

    /// Element tag of an array tag
    pub fn element_type(self) -> Option<Self> {
        if self.is_array() {
            Self::from_u8(self.as_u8() - 100)
        } else {
            None
        }
    }

    /// Array tag for a scalar tag
    pub fn array_of(self) -> Option<Self> {
        if self.is_scalar() {
            Self::from_u8(self.as_u8() + 100)
        } else {
            None
        }
    }

    /// Encoded width of a fixed-width scalar
    pub fn primitive_width(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Byte => Some(1),
            Self::Short | Self::Char => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double => Some(8),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StartMarker => "START_MARKER",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::String => "string",
            Self::BoolArray => "bool[]",
            Self::ByteArray => "byte[]",
            Self::ShortArray => "short[]",
            Self::IntArray => "int[]",
            Self::LongArray => "long[]",
            Self::FloatArray => "float[]",
            Self::DoubleArray => "double[]",
            Self::CharArray => "char[]",
            Self::StringArray => "string[]",
            Self::Enum => "enum",
            Self::List => "list",
            Self::Map => "map",
            Self::Queue => "queue",
            Self::Set => "set",
            Self::Other => "other",
            Self::EndMarker => "END_MARKER",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
