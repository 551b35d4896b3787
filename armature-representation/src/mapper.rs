//! Mapper, object reader and object writer.
//!
//! A [`Mapper`] is the format-specific configuration for one wire format.
//! Readers and writers are derived from it and bound to a target type; each
//! keeps its own copy of the mapper, so they can be tuned independently
//! (e.g. a pretty-printing writer next to a size-limited reader).

use crate::{CodecConfig, ConfigError, RepresentationError, Result, WireFormat, codec};
use armature_media::MediaType;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::io::{self, Read, Write};
use std::marker::PhantomData;

/// Runtime descriptor of the type a reader decodes into or a writer encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetType {
    name: &'static str,
}

impl TargetType {
    /// Descriptor for `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ============================================================================
// Mapper
// ============================================================================

/// Format-specific codec configuration.
///
/// The mapper never owns the output sink: every encoder writes into a
/// borrowed `&mut dyn Write` and leaves closing it to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper {
    format: WireFormat,
    pretty: bool,
    xml_root: Option<String>,
    csv_delimiter: u8,
    csv_has_headers: bool,
    max_input_bytes: Option<u64>,
}

impl Mapper {
    /// Create a mapper for `format` with default options.
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            pretty: false,
            xml_root: None,
            csv_delimiter: b',',
            csv_has_headers: true,
            max_input_bytes: None,
        }
    }

    /// Build the mapper for a declared media type.
    ///
    /// Unrecognised media types get a JSON mapper unless
    /// `config.strict_media_types` is set, in which case
    /// [`RepresentationError::UnsupportedMediaType`] is returned.
    pub fn for_media_type(media_type: &MediaType, config: &CodecConfig) -> Result<Self> {
        let format = WireFormat::select(media_type);

        if format.is_fallback() {
            if config.strict_media_types {
                return Err(RepresentationError::UnsupportedMediaType(
                    media_type.to_string(),
                ));
            }
            tracing::warn!(
                media_type = %media_type,
                "No codec registered for media type, falling back to JSON"
            );
        }

        tracing::debug!(media_type = %media_type, format = %format, "Building codec mapper");
        Ok(Self::new(format).configured(config)?)
    }

    /// Apply the options from `config`, after validating them.
    pub fn configured(mut self, config: &CodecConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        self.pretty = config.pretty;
        self.xml_root = config.xml_root.clone();
        self.csv_delimiter = config.csv_delimiter as u8;
        self.csv_has_headers = config.csv_has_headers;
        self.max_input_bytes = config.max_input_bytes;
        Ok(self)
    }

    /// Enable or disable pretty output.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the XML root element. Required to encode a top-level sequence.
    pub fn with_xml_root(mut self, root: impl Into<String>) -> Self {
        self.xml_root = Some(root.into());
        self
    }

    /// Set the CSV delimiter byte. Non-ASCII bytes fail at encode and decode time.
    pub fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    /// Enable or disable the CSV header row.
    pub fn with_csv_headers(mut self, has_headers: bool) -> Self {
        self.csv_has_headers = has_headers;
        self
    }

    /// Limit the number of bytes read from an inbound stream.
    pub fn with_max_input_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_input_bytes = limit;
        self
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    pub fn xml_root(&self) -> Option<&str> {
        self.xml_root.as_deref()
    }

    pub fn csv_delimiter(&self) -> u8 {
        self.csv_delimiter
    }

    pub fn csv_has_headers(&self) -> bool {
        self.csv_has_headers
    }

    pub fn max_input_bytes(&self) -> Option<u64> {
        self.max_input_bytes
    }

    /// Derive a reader bound to `T`.
    pub fn reader<T: DeserializeOwned>(&self) -> ObjectReader<T> {
        ObjectReader::new(self.clone())
    }

    /// Derive a writer bound to `T`.
    pub fn writer<T: Serialize>(&self) -> ObjectWriter<T> {
        ObjectWriter::new(self.clone())
    }

    /// Read the whole stream, honouring `max_input_bytes`.
    fn read_limited<R: Read>(&self, reader: R) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        match self.max_input_bytes {
            Some(limit) => {
                reader.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
                if buf.len() as u64 > limit {
                    return Err(RepresentationError::decode(
                        self.format,
                        format!("body exceeds the {} byte limit", limit),
                    ));
                }
            }
            None => {
                let mut reader = reader;
                reader.read_to_end(&mut buf)?;
            }
        }
        Ok(buf)
    }
}

// ============================================================================
// Object Reader
// ============================================================================

/// Decodes one value of type `T` from a byte stream.
pub struct ObjectReader<T> {
    mapper: Mapper,
    _target: PhantomData<fn() -> T>,
}

impl<T> ObjectReader<T> {
    /// Reader bound to `T` using `mapper`.
    pub fn new(mapper: Mapper) -> Self {
        Self {
            mapper,
            _target: PhantomData,
        }
    }

    /// The mapper this reader was derived from.
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn target_type(&self) -> TargetType {
        TargetType::of::<T>()
    }

    /// Limit the number of bytes read per value.
    pub fn with_max_input_bytes(mut self, limit: Option<u64>) -> Self {
        self.mapper.max_input_bytes = limit;
        self
    }
}

impl<T: DeserializeOwned> ObjectReader<T> {
    /// Read the stream to its end and decode it.
    pub fn read_value<R: Read>(&self, reader: R) -> Result<T> {
        let bytes = self.mapper.read_limited(reader)?;
        tracing::trace!(
            format = %self.mapper.format,
            target = %self.target_type(),
            bytes = bytes.len(),
            "Decoding representation"
        );
        codec::decode(&self.mapper, &bytes)
    }

    /// Decode an in-memory body.
    pub fn read_slice(&self, bytes: &[u8]) -> Result<T> {
        self.read_value(bytes)
    }
}

impl<T> Clone for ObjectReader<T> {
    fn clone(&self) -> Self {
        Self::new(self.mapper.clone())
    }
}

impl<T> fmt::Debug for ObjectReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectReader")
            .field("target", &self.target_type())
            .field("mapper", &self.mapper)
            .finish()
    }
}

// ============================================================================
// Object Writer
// ============================================================================

/// Encodes values of type `T` into a sink.
pub struct ObjectWriter<T> {
    mapper: Mapper,
    _value: PhantomData<fn(&T)>,
}

impl<T> ObjectWriter<T> {
    /// Writer bound to `T` using `mapper`.
    pub fn new(mapper: Mapper) -> Self {
        Self {
            mapper,
            _value: PhantomData,
        }
    }

    /// The mapper this writer was derived from.
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn target_type(&self) -> TargetType {
        TargetType::of::<T>()
    }

    /// Enable or disable pretty output for this writer only.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.mapper.pretty = pretty;
        self
    }
}

impl<T: Serialize> ObjectWriter<T> {
    /// Encode `value` into `sink`, returning the number of bytes written.
    ///
    /// The sink is flushed but never closed.
    pub fn write_value(&self, sink: &mut dyn Write, value: &T) -> Result<u64> {
        let mut counting = CountingWriter::new(sink);
        codec::encode(&self.mapper, value, &mut counting)?;
        counting.flush()?;
        tracing::trace!(
            format = %self.mapper.format,
            target = %self.target_type(),
            bytes = counting.count,
            "Encoded representation"
        );
        Ok(counting.count)
    }

    /// Encode `value` into a fresh buffer.
    pub fn write_to_vec(&self, value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_value(&mut buf, value)?;
        Ok(buf)
    }
}

impl<T> Clone for ObjectWriter<T> {
    fn clone(&self) -> Self {
        Self::new(self.mapper.clone())
    }
}

impl<T> fmt::Debug for ObjectWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectWriter")
            .field("target", &self.target_type())
            .field("mapper", &self.mapper)
            .finish()
    }
}

struct CountingWriter<'a> {
    inner: &'a mut dyn Write,
    count: u64,
}

impl<'a> CountingWriter<'a> {
    fn new(inner: &'a mut dyn Write) -> Self {
        Self { inner, count: 0 }
    }
}

impl Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
