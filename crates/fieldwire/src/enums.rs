//! Enumerations on the wire
//!
//! An enum payload carries its family (type name plus ordered symbol table)
//! followed by the selected member's symbol:
//!
//! ```text
//! family name (string)
//! symbol count (i32)
//! symbols[count] (string)
//! member (string)
//! ```
//!
//! Decoding yields a generic [`EnumValue`]; the caller resolves it against
//! its own type with [`EnumValue::resolve`]. Members are matched by symbol,
//! not ordinal, so reordering variants does not change what a stream means.

use crate::error::Result;
use fieldwire_buffer::IoBuffer;
use tracing::{debug, warn};

/// A fieldless enum that can be written by symbol
///
/// Usually implemented with [`wire_enum!`](crate::wire_enum).
pub trait WireEnum: Sized {
    /// Family identity written on the wire
    const NAME: &'static str;
    /// Symbols in declaration order
    const SYMBOLS: &'static [&'static str];

    fn ordinal(&self) -> usize;

    fn from_ordinal(ordinal: usize) -> Option<Self>;

    fn symbol(&self) -> &'static str {
        Self::SYMBOLS.get(self.ordinal()).copied().unwrap_or_default()
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        Self::SYMBOLS
            .iter()
            .position(|s| *s == symbol)
            .and_then(Self::from_ordinal)
    }

    fn family() -> EnumFamily {
        EnumFamily::new(Self::NAME, Self::SYMBOLS.iter().copied())
    }
}

/// Implement [`WireEnum`] for a `Copy` enum without explicit discriminants
#[macro_export]
macro_rules! wire_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::WireEnum for $name {
            const NAME: &'static str = concat!(module_path!(), "::", stringify!($name));
            const SYMBOLS: &'static [&'static str] = &[$(stringify!($variant)),+];

            fn ordinal(&self) -> usize {
                *self as usize
            }

            fn from_ordinal(ordinal: usize) -> Option<Self> {
                const ALL: &[$name] = &[$($name::$variant),+];
                ALL.get(ordinal).copied()
            }
        }
    };
}

fn skip_string<B: IoBuffer>(buf: &mut B) -> Result<()> {
    let len = buf.get_length()?;
    buf.skip(len)?;
    Ok(())
}

/// Enum type identity: name plus ordered symbol table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumFamily {
    pub name: String,
    pub symbols: Vec<String>,
}

impl EnumFamily {
    pub fn new<S: Into<String>>(name: impl Into<String>, symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ordinal_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    pub fn put<B: IoBuffer>(&self, buf: &mut B) -> Result<()> {
        buf.put_string(&self.name)?;
        buf.put_string_array(&self.symbols)?;
        Ok(())
    }

    pub fn get<B: IoBuffer>(buf: &mut B) -> Result<Self> {
        let name = buf.get_string()?;
        let symbols = buf.get_string_array()?;
        Ok(Self { name, symbols })
    }

    /// Step over a family block without materialising it
    pub fn skip<B: IoBuffer>(buf: &mut B) -> Result<()> {
        skip_string(buf)?;
        let count = buf.get_length()?;
        for _ in 0..count {
            skip_string(buf)?;
        }
        Ok(())
    }
}

/// A decoded enum member, not yet bound to a Rust type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub family: EnumFamily,
    pub member: String,
}

impl EnumValue {
    pub fn of<E: WireEnum>(value: &E) -> Self {
        Self {
            family: E::family(),
            member: value.symbol().to_string(),
        }
    }

    /// Position of the member in its family's symbol table
    pub fn ordinal(&self) -> Option<usize> {
        self.family.ordinal_of(&self.member)
    }

    pub fn put<B: IoBuffer>(&self, buf: &mut B) -> Result<()> {
        self.family.put(buf)?;
        buf.put_string(&self.member)?;
        Ok(())
    }

    pub fn get<B: IoBuffer>(buf: &mut B) -> Result<Self> {
        let family = EnumFamily::get(buf)?;
        let member = buf.get_string()?;
        Ok(Self { family, member })
    }

    /// Bind to `E` by symbol, falling back to `default` when the member
    /// cannot be resolved in `E`'s family.
    pub fn resolve<E: WireEnum>(&self, default: E) -> E {
        if self.family.name != E::NAME {
            debug!(wire = %self.family.name, target = E::NAME, "enum family differs, resolving by symbol");
        }
        match E::from_symbol(&self.member) {
            Some(value) => value,
            None => {
                warn!(member = %self.member, target = E::NAME, "unknown enum member, using default");
                default
            }
        }
    }
}
