use super::{Error, ErrorKind};

/// Error from the underlying statement or connection.
///
/// Driver messages may leak connection details, so the full text is only
/// attached when the request runs with the debug flag set.
#[derive(Debug)]
pub(super) struct ExecutionError {
    pub(super) message: String,
    pub(super) detail: Option<String>,
}

impl Error {
    pub fn execution(message: impl Into<String>, detail: Option<String>) -> Error {
        Error::from(ErrorKind::Execution(ExecutionError {
            message: message.into(),
            detail,
        }))
    }
}

impl core::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.message, detail),
            None => f.write_str(&self.message),
        }
    }
}
