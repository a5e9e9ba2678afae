use super::{Error, ErrorKind};

/// Error when a value fails a field's validation constraints.
#[derive(Debug)]
pub(super) struct ValidationError {
    pub(super) field: String,
    pub(super) kind: ValidationErrorKind,
}

#[derive(Debug)]
pub(super) enum ValidationErrorKind {
    /// Value is not one of the enumerated allowed values
    Values { value: String },

    /// Value does not match the declared pattern
    Pattern { value: String, pattern: String },
}

impl Error {
    pub fn validation_values(field: impl Into<String>, value: impl Into<String>) -> Error {
        Error::from(ErrorKind::Validation(ValidationError {
            field: field.into(),
            kind: ValidationErrorKind::Values {
                value: value.into(),
            },
        }))
    }

    pub fn validation_pattern(
        field: impl Into<String>,
        value: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Error {
        Error::from(ErrorKind::Validation(ValidationError {
            field: field.into(),
            kind: ValidationErrorKind::Pattern {
                value: value.into(),
                pattern: pattern.into(),
            },
        }))
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.kind {
            ValidationErrorKind::Values { value } => write!(
                f,
                "value `{}` is not an allowed value for field `{}`",
                value, self.field
            ),
            ValidationErrorKind::Pattern { value, pattern } => write!(
                f,
                "value `{}` for field `{}` does not match pattern `{}`",
                value, self.field, pattern
            ),
        }
    }
}
