//! Crate error type.

use thiserror::Error;

use crate::core::cursor::Size;

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// An interactive-only call was made on an output-only backend.
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        operation: &'static str,
        backend: &'static str,
    },

    /// A blocking read was unwound by an interrupt request.
    #[error("read interrupted")]
    Interrupted,

    #[error("every choice is disabled")]
    NoEnabledChoice,

    #[error("window {size} is smaller than the required {minimum}")]
    WindowTooSmall { size: Size, minimum: Size },

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u16, height: u16 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    pub(crate) fn unsupported(operation: &'static str, backend: &'static str) -> Self {
        Self::Unsupported { operation, backend }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::ConsoleError;

    #[test]
    fn unsupported_message_names_operation_and_backend() {
        let err = ConsoleError::unsupported("read_key", "discard");
        assert!(err.is_unsupported());
        assert_eq!(
            err.to_string(),
            "read_key is not supported by the discard backend"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: ConsoleError = io.into();
        assert!(!err.is_unsupported());
        assert!(matches!(err, ConsoleError::Io(_)));
    }
}
