use cdr_types::ModelError;
use thiserror::Error;

/// Result alias used across the reference codec.
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Errors produced while encoding, decoding or checking dynamic values.
///
/// Decode failures correspond one to one with the conditions under which a
/// generated decode routine reports failure.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// The buffer is shorter than the wire size of the type.
    #[error("not enough data: need {needed} bytes, have {available}")]
    InsufficientData { needed: usize, available: usize },

    /// No member is labeled with the discriminant and the union has no default.
    #[error("union '{type_name}' has no member for discriminant {discriminant}")]
    UnmatchedDiscriminant { type_name: String, discriminant: i64 },

    /// A sequence length on the wire is larger than its bound.
    #[error("sequence length {length} exceeds bound {bound}")]
    BoundExceeded { length: u32, bound: u32 },

    /// No NUL byte within a string's wire capacity.
    #[error("string is not terminated within {capacity} bytes")]
    UnterminatedString { capacity: u64 },

    /// An enumerator ordinal or name that the enum does not define.
    #[error("enum '{type_name}' has no enumerator {value}")]
    InvalidEnumValue { type_name: String, value: String },

    /// A boolean byte other than 0 or 1.
    #[error("boolean byte {value} is neither 0 nor 1")]
    InvalidBool { value: u8 },

    /// The dynamic value does not have the shape the type requires.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A value outside the inclusive bounds of a range, min or max annotation.
    #[error("'{type_name}.{member}' value {value} violates its range annotation")]
    RangeViolation {
        type_name: String,
        member: String,
        value: String,
    },

    /// Layout computation over the model failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ReflectError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        ReflectError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/* Helper function to check data size */
pub(crate) fn check_size(data: &[u8], needed: usize) -> ReflectResult<()> {
    if data.len() < needed {
        Err(ReflectError::InsufficientData {
            needed,
            available: data.len(),
        })
    } else {
        Ok(())
    }
}
