//! Stream identity
//!
//! Every primary-format stream opens with a header block naming the
//! producer and its version:
//!
//! ```text
//! +----------------------+-------+-------+-------+
//! | producer (string)    | major | minor | micro |
//! +----------------------+-------+-------+-------+
//! ```

use crate::error::{Result, WireError};
use std::fmt;
use tracing::debug;

/// Producer name written by the primary codec
pub const PRIMARY_PRODUCER: &str = "fieldwire";
/// Primary format version
pub const PRIMARY_VERSION: (u8, u8, u8) = (1, 0, 0);

/// Identity reported by the compact codec, which carries no header on the wire
pub const COMPACT_PRODUCER: &str = "fieldwire-compact";
/// Compact format version
pub const COMPACT_VERSION: (u8, u8, u8) = (1, 0, 0);

/// Producer identity and version triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolInfo {
    pub producer: String,
    pub major: u8,
    pub minor: u8,
    pub micro: u8,
}

impl ProtocolInfo {
    pub fn new(producer: impl Into<String>, major: u8, minor: u8, micro: u8) -> Self {
        Self {
            producer: producer.into(),
            major,
            minor,
            micro,
        }
    }

    pub fn primary() -> Self {
        let (major, minor, micro) = PRIMARY_VERSION;
        Self::new(PRIMARY_PRODUCER, major, minor, micro)
    }

    pub fn compact() -> Self {
        let (major, minor, micro) = COMPACT_VERSION;
        Self::new(COMPACT_PRODUCER, major, minor, micro)
    }

    pub fn version(&self) -> (u8, u8, u8) {
        (self.major, self.minor, self.micro)
    }

    /// Check a header read off the wire against this (expected) identity.
    ///
    /// The producer and major version must match. A differing minor/micro
    /// version is accepted when `accept_newer_minor` is set and the received
    /// one is not older; otherwise the full triple must match.
    pub fn check(&self, received: &ProtocolInfo, accept_newer_minor: bool) -> Result<()> {
        let mismatch = || WireError::ProtocolMismatch {
            expected: self.to_string(),
            got: received.to_string(),
        };
        if received.producer != self.producer || received.major != self.major {
            return Err(mismatch());
        }
        if received.version() == self.version() {
            return Ok(());
        }
        if accept_newer_minor && (received.minor, received.micro) > (self.minor, self.micro) {
            debug!(expected = %self, received = %received, "accepting newer minor version");
            return Ok(());
        }
        Err(mismatch())
    }
}

impl fmt::Display for ProtocolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}.{}", self.producer, self.major, self.minor, self.micro)
    }
}
