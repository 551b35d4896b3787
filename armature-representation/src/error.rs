//! Error types for representation operations.

use crate::{ConfigError, WireFormat};
use std::io;
use thiserror::Error;

/// Errors raised while reading, decoding, encoding or writing a representation.
#[derive(Debug, Error)]
pub enum RepresentationError {
    /// Reading the inbound stream or writing the sink failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The inbound bytes are malformed or do not fit the target type.
    #[error("{format} deserialization error: {message}")]
    Decode {
        /// Format the reader was bound to.
        format: WireFormat,
        /// Message from the underlying codec.
        message: String,
    },

    /// The value cannot be expressed in the format.
    #[error("{format} serialization error: {message}")]
    Encode {
        /// Format the writer was bound to.
        format: WireFormat,
        /// Message from the underlying codec.
        message: String,
    },

    /// The inbound stream was already read by an earlier, failed decode.
    #[error("representation stream already consumed")]
    Consumed,

    /// The codec configuration holds a value the codecs cannot use.
    #[error("Invalid codec configuration: {0}")]
    Config(#[from] ConfigError),

    /// No format is registered for the media type and strict mode is on.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
}

impl RepresentationError {
    pub(crate) fn decode(format: WireFormat, err: impl std::fmt::Display) -> Self {
        RepresentationError::Decode {
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn encode(format: WireFormat, err: impl std::fmt::Display) -> Self {
        RepresentationError::Encode {
            format,
            message: err.to_string(),
        }
    }
}

impl From<RepresentationError> for io::Error {
    fn from(err: RepresentationError) -> Self {
        match err {
            RepresentationError::Io(inner) => inner,
            RepresentationError::Decode { .. } | RepresentationError::Encode { .. } => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
            RepresentationError::Config(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            RepresentationError::Consumed => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            RepresentationError::UnsupportedMediaType(_) => {
                io::Error::new(io::ErrorKind::Unsupported, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepresentationError::decode(WireFormat::Json, "EOF while parsing");
        assert_eq!(
            err.to_string(),
            "JSON deserialization error: EOF while parsing"
        );

        let err = RepresentationError::UnsupportedMediaType("application/x-unknown".into());
        assert!(err.to_string().contains("application/x-unknown"));
    }

    #[test]
    fn test_into_io_error_kind() {
        let io_err: io::Error = RepresentationError::encode(WireFormat::Csv, "nested").into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);

        let io_err: io::Error = RepresentationError::Consumed.into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);

        let original = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
        let io_err: io::Error = RepresentationError::Io(original).into();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
    }
}
