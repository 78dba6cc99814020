//! Serialiser configuration

/// Nesting depth accepted by the stream parser by default
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Codec configuration shared by both wire formats
#[derive(Debug, Clone)]
pub struct SerialiserConfig {
    /// Force single-byte string encoding on the owned buffer
    pub enforce_simple_strings: bool,
    /// Write unit/description metadata into primary field headers
    pub put_field_metadata: bool,
    /// Maximum nesting depth the stream parser descends
    pub max_depth: usize,
    /// Accept streams written by a newer minor/micro version
    pub accept_newer_minor: bool,
}

impl SerialiserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simple_strings(mut self, enforce: bool) -> Self {
        self.enforce_simple_strings = enforce;
        self
    }

    pub fn with_field_metadata(mut self, enabled: bool) -> Self {
        self.put_field_metadata = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_accept_newer_minor(mut self, accept: bool) -> Self {
        self.accept_newer_minor = accept;
        self
    }
}

impl Default for SerialiserConfig {
    fn default() -> Self {
        Self {
            enforce_simple_strings: false,
            put_field_metadata: true,
            max_depth: DEFAULT_MAX_DEPTH,
            accept_newer_minor: true,
        }
    }
}
