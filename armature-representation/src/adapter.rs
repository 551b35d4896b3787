//! Typed representation adapter.

use crate::{
    CodecConfig, Mapper, ObjectReader, ObjectWriter, Representation, RepresentationError, Result,
    TargetType,
};
use armature_media::MediaType;
use bytes::Bytes;
use once_cell::unsync::OnceCell;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::io::{self, Cursor, Read, Write};

/// What the adapter currently holds.
enum Content<T> {
    /// An in-memory value, either given or already decoded.
    Value(T),
    /// An inbound body that has not been decoded yet.
    Stream(Box<dyn Representation>),
    /// The inbound body was read by a decode that failed.
    Consumed,
}

impl<T> Content<T> {
    fn name(&self) -> &'static str {
        match self {
            Content::Value(_) => "value",
            Content::Stream(_) => "stream",
            Content::Consumed => "consumed",
        }
    }
}

/// A representation backed by a `serde` value.
///
/// Built either from a value and the media type to encode it as (outbound),
/// or from an inbound [`Representation`] whose body is decoded into `T` on
/// demand. The [`Mapper`], [`ObjectReader`] and [`ObjectWriter`] are created
/// lazily on first access and then cached; each can be replaced before use.
///
/// The adapter is meant for one request/response exchange and is not `Sync`.
///
/// # Example
///
/// ```
/// use armature_representation::{BytesRepresentation, SerdeRepresentation};
/// use armature_media::MediaType;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// let mut outbound = SerdeRepresentation::json(User { name: "scott".into() });
/// let body = outbound.to_bytes().unwrap();
/// assert_eq!(&body[..], br#"{"name":"scott"}"#);
///
/// let inbound = BytesRepresentation::new(MediaType::application_json(), body);
/// let mut parsed = SerdeRepresentation::<User>::from_representation(inbound);
/// assert_eq!(parsed.value().unwrap().name, "scott");
/// ```
pub struct SerdeRepresentation<T> {
    media_type: MediaType,
    content: Content<T>,
    config: CodecConfig,
    mapper: OnceCell<Mapper>,
    reader: OnceCell<ObjectReader<T>>,
    writer: OnceCell<ObjectWriter<T>>,
}

impl<T> SerdeRepresentation<T> {
    /// Wrap `value`, to be encoded as `media_type`.
    pub fn new(media_type: MediaType, value: T) -> Self {
        Self::with_content(media_type, Content::Value(value))
    }

    /// Wrap `value`, to be encoded as `application/json`.
    pub fn json(value: T) -> Self {
        Self::new(MediaType::application_json(), value)
    }

    /// Wrap an inbound representation, to be decoded into `T`.
    ///
    /// The media type is taken from the inbound representation.
    pub fn from_representation(representation: impl Representation + 'static) -> Self {
        let media_type = representation.media_type().clone();
        Self::with_content(media_type, Content::Stream(Box::new(representation)))
    }

    fn with_content(media_type: MediaType, content: Content<T>) -> Self {
        Self {
            media_type,
            content,
            config: CodecConfig::default(),
            mapper: OnceCell::new(),
            reader: OnceCell::new(),
            writer: OnceCell::new(),
        }
    }

    /// Use `config` when the mapper is built.
    ///
    /// Has no effect on a mapper that was already built or set.
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    /// Descriptor of the target type `T`.
    pub fn target_type(&self) -> TargetType {
        TargetType::of::<T>()
    }

    /// The held value, without decoding.
    pub fn held_value(&self) -> Option<&T> {
        match &self.content {
            Content::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Whether an undecoded inbound body is held.
    pub fn has_stream(&self) -> bool {
        matches!(self.content, Content::Stream(_))
    }

    /// Replace the held content with `value`, dropping any inbound body.
    pub fn set_value(&mut self, value: T) {
        self.content = Content::Value(value);
    }

    /// Returns the cached mapper, building it from the media type on first call.
    pub fn mapper(&self) -> Result<&Mapper> {
        self.mapper
            .get_or_try_init(|| Mapper::for_media_type(&self.media_type, &self.config))
    }

    /// Replace the mapper. Readers and writers already built keep theirs.
    pub fn set_mapper(&mut self, mapper: Mapper) {
        self.mapper = OnceCell::with_value(mapper);
    }

    /// Replace the reader.
    pub fn set_reader(&mut self, reader: ObjectReader<T>) {
        self.reader = OnceCell::with_value(reader);
    }

    /// Replace the writer.
    pub fn set_writer(&mut self, writer: ObjectWriter<T>) {
        self.writer = OnceCell::with_value(writer);
    }

    /// Decode the same inbound body into another type.
    ///
    /// Only possible while the body is still unread; otherwise `self` is
    /// handed back. The mapper is kept, the reader and writer are dropped.
    pub fn retarget<U>(self) -> std::result::Result<SerdeRepresentation<U>, Self> {
        match self.content {
            Content::Stream(representation) => Ok(SerdeRepresentation {
                media_type: self.media_type,
                content: Content::Stream(representation),
                config: self.config,
                mapper: self.mapper,
                reader: OnceCell::new(),
                writer: OnceCell::new(),
            }),
            content => Err(Self { content, ..self }),
        }
    }
}

impl<T: DeserializeOwned> SerdeRepresentation<T> {
    /// Returns the cached reader, deriving it from the mapper on first call.
    pub fn reader(&self) -> Result<&ObjectReader<T>> {
        self.reader.get_or_try_init(|| self.mapper().map(Mapper::reader))
    }

    /// Returns the value, decoding the inbound body if needed.
    ///
    /// The body is read at most once. A successful decode is cached; after a
    /// failed one every call returns [`RepresentationError::Consumed`].
    pub fn value(&mut self) -> Result<&T> {
        if self.has_stream() {
            let value = self.decode_stream()?;
            self.content = Content::Value(value);
        }

        match &self.content {
            Content::Value(value) => Ok(value),
            _ => Err(RepresentationError::Consumed),
        }
    }

    /// Owning variant of [`value`](Self::value).
    pub fn into_value(mut self) -> Result<T> {
        if self.has_stream() {
            return self.decode_stream();
        }

        match self.content {
            Content::Value(value) => Ok(value),
            _ => Err(RepresentationError::Consumed),
        }
    }

    fn decode_stream(&mut self) -> Result<T> {
        // Resolve the reader first so a strict-mode failure leaves the body unread
        self.reader()?;

        let mut representation = match std::mem::replace(&mut self.content, Content::Consumed) {
            Content::Stream(representation) => representation,
            other => {
                self.content = other;
                return Err(RepresentationError::Consumed);
            }
        };

        let reader = self.reader()?;
        let stream = representation.stream()?;
        reader.read_value(stream)
    }
}

impl<T: Serialize> SerdeRepresentation<T> {
    /// Returns the cached writer, deriving it from the mapper on first call.
    pub fn writer(&self) -> Result<&ObjectWriter<T>> {
        self.writer.get_or_try_init(|| self.mapper().map(Mapper::writer))
    }

    /// Write the representation into `sink`.
    ///
    /// An inbound body is copied verbatim without involving any encoder; a
    /// held value is encoded with the writer. When nothing is held, nothing
    /// is written. The sink is never closed.
    pub fn write(&mut self, sink: &mut dyn Write) -> Result<u64> {
        if let Content::Stream(representation) = &mut self.content {
            let copied = representation.write_to(sink)?;
            tracing::trace!(
                media_type = %self.media_type,
                bytes = copied,
                "Passed representation through"
            );
            return Ok(copied);
        }

        match &self.content {
            Content::Value(value) => self.writer()?.write_value(sink, value),
            _ => Ok(0),
        }
    }

    /// Write the representation into a buffer.
    pub fn to_bytes(&mut self) -> Result<Bytes> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

impl<T: Serialize> Representation for SerdeRepresentation<T> {
    fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    fn stream(&mut self) -> io::Result<Box<dyn Read + '_>> {
        let body = self.to_bytes()?;
        Ok(Box::new(Cursor::new(body)))
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> io::Result<u64> {
        self.write(sink).map_err(io::Error::from)
    }
}

impl<T> fmt::Debug for SerdeRepresentation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeRepresentation")
            .field("media_type", &self.media_type.to_string())
            .field("content", &self.content.name())
            .field("target", &self.target_type())
            .field("mapper", &self.mapper.get())
            .finish()
    }
}
