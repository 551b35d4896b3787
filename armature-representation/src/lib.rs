//! Serde-backed representations for Armature.
//!
//! A representation is an HTTP body paired with its media type. This crate
//! converts between such bodies and typed `serde` values in JSON, binary JSON
//! (MessagePack), XML, YAML and CSV.
//!
//! ## Features
//!
//! - **Typed adapter**: [`SerdeRepresentation`] wraps a value to encode or an
//!   inbound body to decode
//! - **Lazy codecs**: mapper, reader and writer are built on first use and can
//!   be replaced before that
//! - **Format selection**: the wire format follows the declared media type,
//!   unrecognised types fall back to JSON (or fail, in strict mode)
//! - **HTTP Integration**: conversion from `http` requests and into `http`
//!   responses with the `http` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use armature_media::MediaType;
//! use armature_representation::{BytesRepresentation, SerdeRepresentation};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct User {
//!     id: u32,
//!     name: String,
//! }
//!
//! // Encode a response body as YAML
//! let mut outbound = SerdeRepresentation::new(
//!     MediaType::application_yaml(),
//!     User { id: 7, name: "scott".to_string() },
//! );
//! let body = outbound.to_bytes().unwrap();
//! assert_eq!(&body[..], b"id: 7\nname: scott\n");
//!
//! // Decode a request body
//! let request = BytesRepresentation::new(MediaType::application_yaml(), body);
//! let user: User = SerdeRepresentation::from_representation(request)
//!     .into_value()
//!     .unwrap();
//! assert_eq!(user.name, "scott");
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use armature_representation::{CodecConfig, SerdeRepresentation};
//!
//! let config = CodecConfig::default().pretty();
//! let mut repr = SerdeRepresentation::json(vec![1, 2]).with_config(config);
//! assert_eq!(&repr.to_bytes().unwrap()[..], b"[\n  1,\n  2\n]");
//! ```

mod adapter;
mod codec;
mod config;
mod error;
mod format;
mod mapper;
mod representation;
mod tabular;

#[cfg(feature = "http")]
mod http;

pub use adapter::SerdeRepresentation;
pub use armature_media::MediaType;
pub use config::{CodecConfig, ConfigError};
pub use error::RepresentationError;
pub use format::WireFormat;
pub use mapper::{Mapper, ObjectReader, ObjectWriter, TargetType};
pub use representation::{BytesRepresentation, Representation, StreamRepresentation};

use serde::{Serialize, de::DeserializeOwned};

/// Result type for representation operations.
pub type Result<T> = std::result::Result<T, RepresentationError>;

/// Encode `value` for `media_type` with the default configuration.
///
/// Unrecognised media types are encoded as JSON.
pub fn to_vec<T: Serialize>(media_type: &MediaType, value: &T) -> Result<Vec<u8>> {
    Mapper::for_media_type(media_type, &CodecConfig::default())?
        .writer()
        .write_to_vec(value)
}

/// Decode `bytes` declared as `media_type` with the default configuration.
pub fn from_slice<T: DeserializeOwned>(media_type: &MediaType, bytes: &[u8]) -> Result<T> {
    Mapper::for_media_type(media_type, &CodecConfig::default())?
        .reader()
        .read_slice(bytes)
}
