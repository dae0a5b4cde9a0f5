//! Resource limits applied while building, reading and validating

/// Limits guarding against hostile or runaway input
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum container nesting depth (default: 128)
    ///
    /// Validation, hashing and dumping recurse once per level, so deep
    /// limits need a correspondingly large thread stack.
    pub max_depth: usize,
    /// Maximum byte size of a single value (default: unlimited)
    pub max_byte_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_byte_size: u64::MAX,
        }
    }
}

impl Limits {
    /// Limits with no depth or size restriction
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_byte_size: u64::MAX,
        }
    }
}
