//! Format dispatch for encoding and decoding.

use crate::{Mapper, RepresentationError, Result, WireFormat, tabular};
use serde::{Serialize, de::DeserializeOwned};
use std::io::Write;

pub(crate) fn decode<T: DeserializeOwned>(mapper: &Mapper, bytes: &[u8]) -> Result<T> {
    let format = mapper.format();
    match format {
        WireFormat::Json | WireFormat::FallbackJson => {
            serde_json::from_slice(bytes).map_err(|e| RepresentationError::decode(format, e))
        }
        WireFormat::BinaryJson => {
            rmp_serde::from_slice(bytes).map_err(|e| RepresentationError::decode(format, e))
        }
        WireFormat::Xml => {
            quick_xml::de::from_reader(bytes).map_err(|e| RepresentationError::decode(format, e))
        }
        WireFormat::Yaml => {
            serde_yaml::from_slice(bytes).map_err(|e| RepresentationError::decode(format, e))
        }
        WireFormat::Csv => tabular::decode(bytes, mapper.csv_delimiter(), mapper.csv_has_headers()),
    }
}

pub(crate) fn encode<T: Serialize + ?Sized>(
    mapper: &Mapper,
    value: &T,
    sink: &mut dyn Write,
) -> Result<()> {
    let format = mapper.format();
    match format {
        WireFormat::Json | WireFormat::FallbackJson => {
            let result = if mapper.is_pretty() {
                serde_json::to_writer_pretty(&mut *sink, value)
            } else {
                serde_json::to_writer(&mut *sink, value)
            };
            result.map_err(|e| {
                if e.is_io() {
                    RepresentationError::Io(e.into())
                } else {
                    RepresentationError::encode(format, e)
                }
            })
        }
        WireFormat::BinaryJson => {
            let mut sink = sink;
            rmp_serde::encode::write_named(&mut sink, value)
                .map_err(|e| RepresentationError::encode(format, e))
        }
        WireFormat::Xml => {
            let xml = encode_xml(value, mapper.xml_root(), mapper.is_pretty())
                .map_err(|e| RepresentationError::encode(format, e))?;
            sink.write_all(xml.as_bytes())?;
            Ok(())
        }
        WireFormat::Yaml => serde_yaml::to_writer(&mut *sink, value)
            .map_err(|e| RepresentationError::encode(format, e)),
        WireFormat::Csv => tabular::encode(
            value,
            sink,
            mapper.csv_delimiter(),
            mapper.csv_has_headers(),
        ),
    }
}

fn encode_xml<T: Serialize + ?Sized>(
    value: &T,
    root: Option<&str>,
    pretty: bool,
) -> std::result::Result<String, String> {
    let mut out = String::new();
    let mut serializer = match root {
        Some(root) => quick_xml::se::Serializer::with_root(&mut out, Some(root))
            .map_err(|e| e.to_string())?,
        None => quick_xml::se::Serializer::new(&mut out),
    };
    if pretty {
        serializer.indent(' ', 2);
    }
    value.serialize(serializer).map_err(|e| e.to_string())?;
    Ok(out)
}
