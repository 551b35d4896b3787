//! Inbound representations.
//!
//! A representation is a body paired with its declared media type. The
//! request pipeline hands one to [`SerdeRepresentation`](crate::SerdeRepresentation)
//! when a body has to be decoded, or when it should be passed through
//! untouched.

use armature_media::MediaType;
use bytes::Bytes;
use std::io::{self, Cursor, Read, Write};

/// A body with a declared media type.
pub trait Representation {
    /// Declared media type of the body.
    fn media_type(&self) -> &MediaType;

    /// Open the body for reading.
    fn stream(&mut self) -> io::Result<Box<dyn Read + '_>>;

    /// Copy the body into `sink`, returning the number of bytes copied.
    fn write_to(&mut self, sink: &mut dyn Write) -> io::Result<u64> {
        let mut stream = self.stream()?;
        io::copy(&mut stream, sink)
    }

    /// Body size, when known up front.
    fn size(&self) -> Option<u64> {
        None
    }
}

impl<R: Representation + ?Sized> Representation for Box<R> {
    fn media_type(&self) -> &MediaType {
        (**self).media_type()
    }

    fn stream(&mut self) -> io::Result<Box<dyn Read + '_>> {
        (**self).stream()
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> io::Result<u64> {
        (**self).write_to(sink)
    }

    fn size(&self) -> Option<u64> {
        (**self).size()
    }
}

// ============================================================================
// In-memory bodies
// ============================================================================

/// A fully buffered body. Can be streamed any number of times.
#[derive(Debug, Clone)]
pub struct BytesRepresentation {
    media_type: MediaType,
    body: Bytes,
}

impl BytesRepresentation {
    /// Create a representation over `body`.
    pub fn new(media_type: MediaType, body: impl Into<Bytes>) -> Self {
        Self {
            media_type,
            body: body.into(),
        }
    }

    /// Create a representation over a static slice.
    pub fn from_static(media_type: MediaType, body: &'static [u8]) -> Self {
        Self::new(media_type, Bytes::from_static(body))
    }

    /// Create a representation over a string.
    pub fn from_string(media_type: MediaType, body: impl Into<String>) -> Self {
        Self::new(media_type, Bytes::from(body.into()))
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

impl Representation for BytesRepresentation {
    fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    fn stream(&mut self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(self.body.as_ref())))
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> io::Result<u64> {
        sink.write_all(&self.body)?;
        Ok(self.body.len() as u64)
    }

    fn size(&self) -> Option<u64> {
        Some(self.body.len() as u64)
    }
}

// ============================================================================
// Streamed bodies
// ============================================================================

/// A body backed by a reader that can only be opened once.
pub struct StreamRepresentation<R> {
    media_type: MediaType,
    reader: Option<R>,
    size: Option<u64>,
}

impl<R: Read> StreamRepresentation<R> {
    /// Create a representation over `reader`.
    pub fn new(media_type: MediaType, reader: R) -> Self {
        Self {
            media_type,
            reader: Some(reader),
            size: None,
        }
    }

    /// Declare the body size (e.g. from `Content-Length`).
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Whether the stream has already been handed out.
    pub fn is_consumed(&self) -> bool {
        self.reader.is_none()
    }
}

impl<R: Read> Representation for StreamRepresentation<R> {
    fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    fn stream(&mut self) -> io::Result<Box<dyn Read + '_>> {
        match self.reader.take() {
            Some(reader) => Ok(Box::new(reader)),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "representation stream already consumed",
            )),
        }
    }

    fn size(&self) -> Option<u64> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_representation_restreams() {
        let mut repr = BytesRepresentation::from_static(MediaType::text_plain(), b"hello");
        assert_eq!(repr.size(), Some(5));

        for _ in 0..2 {
            let mut out = String::new();
            repr.stream().unwrap().read_to_string(&mut out).unwrap();
            assert_eq!(out, "hello");
        }
    }

    #[test]
    fn test_stream_representation_is_single_use() {
        let mut repr = StreamRepresentation::new(MediaType::text_plain(), &b"abc"[..]);
        assert!(!repr.is_consumed());

        let mut out = Vec::new();
        assert_eq!(repr.write_to(&mut out).unwrap(), 3);
        assert_eq!(out, b"abc");
        assert!(repr.is_consumed());

        let err = repr.stream().err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_boxed_representation_delegates() {
        let mut repr: Box<dyn Representation> = Box::new(BytesRepresentation::from_string(
            MediaType::application_json(),
            "{}",
        ));
        assert_eq!(repr.media_type(), &MediaType::application_json());

        let mut out = Vec::new();
        repr.write_to(&mut out).unwrap();
        assert_eq!(out, b"{}");
    }
}
