// Armature Serde - typed request and response representations
//
// This library binds serde values to HTTP bodies, picking the wire format
// (JSON, MessagePack, XML, YAML, CSV) from the declared media type.

// Re-export media types
pub use armature_media as media;
pub use armature_media::{MediaType, MediaTypeError};

// Re-export the representation layer
pub use armature_representation as representation;
pub use armature_representation::{
    BytesRepresentation, CodecConfig, ConfigError, Mapper, ObjectReader, ObjectWriter,
    Representation, RepresentationError, Result, SerdeRepresentation, StreamRepresentation,
    TargetType, WireFormat, from_slice, to_vec,
};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        BytesRepresentation, CodecConfig, MediaType, Representation, RepresentationError,
        SerdeRepresentation, WireFormat,
    };
}
