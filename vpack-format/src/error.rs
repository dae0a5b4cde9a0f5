//! Error types for VPack

use thiserror::Error;

/// Broad classification of a [`VPackError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The bytes or the requested access do not fit the value's structure
    Structural,
    /// A builder operation was issued in the wrong state
    BuilderState,
    /// The validator rejected a buffer
    Validator,
    /// The feature is reserved but not implemented
    NotImplemented,
    /// An internal invariant was violated
    Internal,
    /// The underlying writer failed
    Io,
}

/// VPack error types
#[derive(Debug, Error)]
pub enum VPackError {
    /// Value is not of the type the operation expects.
    #[error("Invalid value type: {0}")]
    InvalidValueType(String),
    /// Index is not below the container's length.
    #[error("Index out of bounds")]
    IndexOutOfBounds,
    /// Attribute path is empty or otherwise unusable.
    #[error("Invalid attribute path")]
    InvalidAttributePath,
    /// Array length does not match the requested tuple arity.
    #[error("Array length does not match tuple size")]
    BadTupleSize,
    /// Number does not fit the requested target width.
    #[error("Number out of range")]
    NumberOutOfRange,
    /// Value has no JSON representation and no fallback was configured.
    #[error("Type has no equivalent in JSON: {0}")]
    NoJsonEquivalent(String),
    /// String payload is not well-formed UTF-8.
    #[error("Invalid UTF-8 sequence")]
    InvalidUtf8Sequence,
    /// Control character found where it is not allowed.
    #[error("Unexpected control character")]
    UnexpectedControlCharacter,
    /// Nesting depth exceeded the configured limit.
    #[error("Too deep nesting")]
    TooDeepNesting,
    /// A configured size limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// JSON text could not be parsed.
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        /// Parser message
        message: String,
        /// 1-based line of the offending input
        line: usize,
        /// 1-based column of the offending input
        column: usize,
    },
    /// Positional add issued where no array is open.
    #[error("Need open Array")]
    BuilderNeedOpenArray,
    /// Keyed add issued where no object is open.
    #[error("Need open Object")]
    BuilderNeedOpenObject,
    /// Operation needs a subvalue that is not there.
    #[error("Need subvalue: {0}")]
    BuilderNeedSubvalue(String),
    /// Close issued on a builder without open containers.
    #[error("Need open compound value (Array or Object)")]
    BuilderNeedOpenCompound,
    /// Result requested while containers are still open.
    #[error("Builder value not yet sealed")]
    BuilderNotSealed,
    /// Value type cannot be added in this position.
    #[error("Unexpected type: {0}")]
    BuilderUnexpectedType(String),
    /// External values are disallowed by configuration.
    #[error("Externals are not allowed in this configuration")]
    BuilderExternalsDisallowed,
    /// Object contains the same key more than once.
    #[error("Duplicate attribute name")]
    DuplicateAttributeName,
    /// Object key is neither a string nor a translatable integer.
    #[error("Key is not a String")]
    KeyNotString,
    /// Validator found an unknown or misplaced head byte.
    #[error("Invalid type found in binary data: {0}")]
    ValidatorInvalidType(String),
    /// Validator found a length field inconsistent with the buffer.
    #[error("Invalid length found in binary data: {0}")]
    ValidatorInvalidLength(String),
    /// Encountered a reserved feature that is not implemented.
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    /// Internal invariant was violated.
    #[error("Internal error: {0}")]
    InternalError(String),
    /// I/O operation failed while writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VPackError {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            VPackError::InvalidValueType(_)
            | VPackError::IndexOutOfBounds
            | VPackError::InvalidAttributePath
            | VPackError::BadTupleSize
            | VPackError::NumberOutOfRange
            | VPackError::NoJsonEquivalent(_)
            | VPackError::InvalidUtf8Sequence
            | VPackError::UnexpectedControlCharacter
            | VPackError::TooDeepNesting
            | VPackError::LimitExceeded(_)
            | VPackError::Parse { .. } => ErrorCategory::Structural,
            VPackError::BuilderNeedOpenArray
            | VPackError::BuilderNeedOpenObject
            | VPackError::BuilderNeedSubvalue(_)
            | VPackError::BuilderNeedOpenCompound
            | VPackError::BuilderNotSealed
            | VPackError::BuilderUnexpectedType(_)
            | VPackError::BuilderExternalsDisallowed
            | VPackError::DuplicateAttributeName
            | VPackError::KeyNotString => ErrorCategory::BuilderState,
            VPackError::ValidatorInvalidType(_) | VPackError::ValidatorInvalidLength(_) => {
                ErrorCategory::Validator
            }
            VPackError::NotImplemented(_) => ErrorCategory::NotImplemented,
            VPackError::InternalError(_) => ErrorCategory::Internal,
            VPackError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Shorthand for a length error raised while reading past a value's end
    pub fn truncated(what: &str) -> Self {
        VPackError::ValidatorInvalidLength(format!("{} extends beyond end of buffer", what))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, VPackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            VPackError::IndexOutOfBounds.category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            VPackError::BuilderNotSealed.category(),
            ErrorCategory::BuilderState
        );
        assert_eq!(
            VPackError::ValidatorInvalidLength("x".to_string()).category(),
            ErrorCategory::Validator
        );
        assert_eq!(
            VPackError::NotImplemented("BCD".to_string()).category(),
            ErrorCategory::NotImplemented
        );
    }

    #[test]
    fn test_error_messages() {
        let err = VPackError::Parse {
            message: "expected value".to_string(),
            line: 1,
            column: 4,
        };
        assert_eq!(
            err.to_string(),
            "Parse error at line 1, column 4: expected value"
        );
        assert!(VPackError::truncated("String")
            .to_string()
            .contains("String extends beyond end of buffer"));
    }
}
