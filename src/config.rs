//! Configuration for interpreting template text

/// Longest string a template may hold or produce, in characters
pub const MAX_STRING_LEN: usize = 500;

/// Largest number a template may hold or produce
pub const MAX_NUMBER: f64 = 10000.0;

/// Longest list or tuple a template may produce
pub const MAX_SEQUENCE_LEN: usize = 500;

/// Most copies nested list layers may expand one template into
pub const MAX_REPEATED_LAYERS: usize = 10_000;

/// Deepest expression nesting the analyser accepts
pub const MAX_NESTING_DEPTH: usize = 200;

/// Guards applied to literals and computed results of text templates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Longest accepted string, in characters
    pub max_string_len: usize,

    /// Largest accepted number; compared raw, so large negatives pass
    pub max_number: f64,

    /// Longest accepted computed list or tuple
    pub max_sequence_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_string_len: MAX_STRING_LEN,
            max_number: MAX_NUMBER,
            max_sequence_len: MAX_SEQUENCE_LEN,
        }
    }
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the longest accepted string
    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    /// Set the largest accepted number
    pub fn with_max_number(mut self, max: f64) -> Self {
        self.max_number = max;
        self
    }

    /// Set the longest accepted computed sequence
    pub fn with_max_sequence_len(mut self, len: usize) -> Self {
        self.max_sequence_len = len;
        self
    }
}

/// Configuration for the tree interpreter
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// Resource guards
    pub limits: Limits,
}

impl InterpreterConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource guards
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
