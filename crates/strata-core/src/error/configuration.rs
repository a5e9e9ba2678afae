use super::{Error, ErrorKind};

/// Error for malformed schema or connection configuration.
#[derive(Debug)]
pub(super) struct ConfigurationError {
    pub(super) message: String,
}

impl Error {
    /// A fatal deployment-time configuration mistake.
    pub fn configuration(message: impl Into<String>) -> Error {
        Error::from(ErrorKind::Configuration(ConfigurationError {
            message: message.into(),
        }))
    }
}

impl core::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}
