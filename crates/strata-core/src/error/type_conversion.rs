use super::{Error, ErrorKind};

use crate::stmt::Type;

/// Error when a positional bind parameter cannot be coerced to its
/// declared type.
#[derive(Debug)]
pub(super) struct TypeConversionError {
    pub(super) value: String,
    pub(super) ty: Type,
}

impl Error {
    pub fn type_conversion(value: impl Into<String>, ty: Type) -> Error {
        Error::from(ErrorKind::TypeConversion(TypeConversionError {
            value: value.into(),
            ty,
        }))
    }
}

impl core::fmt::Display for TypeConversionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "cannot coerce {} to {}", self.value, self.ty)
    }
}
