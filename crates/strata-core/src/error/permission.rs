use super::{Error, ErrorKind};

/// Error when the caller's role set does not allow an action.
#[derive(Debug)]
pub(super) struct PermissionError {
    pub(super) action: &'static str,
    pub(super) entity: String,
    pub(super) field: Option<String>,
}

impl Error {
    /// An action was attempted against a field or table the caller may not
    /// touch. Never coerced to a silent no-op; silent drops have caused
    /// data-loss bugs before.
    pub fn permission(action: &'static str, entity: impl Into<String>, field: Option<&str>) -> Error {
        Error::from(ErrorKind::Permission(PermissionError {
            action,
            entity: entity.into(),
            field: field.map(str::to_string),
        }))
    }
}

impl core::fmt::Display for PermissionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.field {
            Some(field) => write!(
                f,
                "permission denied: cannot {} field `{}` of `{}`",
                self.action, field, self.entity
            ),
            None => write!(
                f,
                "permission denied: cannot {} `{}`",
                self.action, self.entity
            ),
        }
    }
}
