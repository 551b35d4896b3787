//! CSV bridge.
//!
//! Encoding routes values through `serde_json::Value` so that any `Serialize`
//! type made of flat records can be written as rows. Decoding goes the other
//! way without an intermediate tree: rows are exposed to the target type as a
//! sequence of records (or a single record), and each cell is parsed as
//! whatever the target field asks for. `"007"` stays a string for a `String`
//! field and an empty cell is `None` for an `Option` field.

use crate::{RepresentationError, Result, WireFormat};
use csv::StringRecord;
use serde::de::value::{Error as DeError, MapDeserializer, SeqDeserializer, StrDeserializer};
use serde::de::{self, Deserializer, IntoDeserializer, Visitor};
use serde::{Deserialize, Serialize, de::DeserializeOwned, forward_to_deserialize_any};
use serde_json::Value;
use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

const FORMAT: WireFormat = WireFormat::Csv;

type DeResult<T> = std::result::Result<T, DeError>;

pub(crate) fn encode<T: Serialize + ?Sized>(
    value: &T,
    sink: &mut dyn Write,
    delimiter: u8,
    has_headers: bool,
) -> Result<()> {
    let delimiter = ascii_delimiter(delimiter).map_err(|e| RepresentationError::encode(FORMAT, e))?;
    let value = serde_json::to_value(value).map_err(|e| RepresentationError::encode(FORMAT, e))?;
    let rows = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(sink);

    let headers: Option<Vec<String>> = match rows.first() {
        Some(Value::Object(first)) if has_headers => Some(first.keys().cloned().collect()),
        _ => None,
    };
    if let Some(headers) = &headers {
        writer.write_record(headers).map_err(csv_error)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let record = match (row, &headers) {
            (Value::Object(fields), Some(headers)) => {
                if let Some(extra) = fields.keys().find(|k| !headers.contains(k)) {
                    return Err(RepresentationError::encode(
                        FORMAT,
                        format!("record {} has field '{}' missing from the header", index, extra),
                    ));
                }
                headers
                    .iter()
                    .map(|h| cell(h, fields.get(h).unwrap_or(&Value::Null)))
                    .collect::<Result<Vec<_>>>()?
            }
            (Value::Object(fields), None) => fields
                .iter()
                .map(|(k, v)| cell(k, v))
                .collect::<Result<Vec<_>>>()?,
            (Value::Array(items), _) => items
                .iter()
                .enumerate()
                .map(|(i, v)| cell(&i.to_string(), v))
                .collect::<Result<Vec<_>>>()?,
            (scalar, _) => vec![cell("0", scalar)?],
        };
        writer.write_record(&record).map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

pub(crate) fn decode<T: DeserializeOwned>(
    bytes: &[u8],
    delimiter: u8,
    has_headers: bool,
) -> Result<T> {
    let delimiter = ascii_delimiter(delimiter).map_err(|e| RepresentationError::decode(FORMAT, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .from_reader(bytes);

    let headers = if has_headers {
        Some(reader.headers().map_err(csv_error)?.clone())
    } else {
        None
    };
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(csv_error)?;

    let rows = Rows {
        headers: headers.as_ref(),
        records: &records,
    };
    T::deserialize(rows).map_err(|e| RepresentationError::decode(FORMAT, e))
}

fn cell(column: &str, value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) | Value::Object(_) => Err(RepresentationError::encode(
            FORMAT,
            format!("column '{}' holds a nested value", column),
        )),
    }
}

// Non-ASCII bytes would split a UTF-8 sequence and corrupt the output
fn ascii_delimiter(delimiter: u8) -> std::result::Result<u8, String> {
    if delimiter.is_ascii() {
        Ok(delimiter)
    } else {
        Err(format!("delimiter 0x{:02x} is not an ASCII character", delimiter))
    }
}

// ============================================================================
// Typed row access
// ============================================================================

/// All records of a body. Sequence targets get every record, anything else
/// gets the only one.
#[derive(Clone, Copy)]
struct Rows<'a> {
    headers: Option<&'a StringRecord>,
    records: &'a [StringRecord],
}

impl<'a> Rows<'a> {
    fn single(self) -> DeResult<Record<'a>> {
        match self.records {
            [fields] => Ok(Record {
                headers: self.headers,
                fields,
                index: 0,
            }),
            records => Err(de::Error::custom(format_args!(
                "expected a single record, found {}",
                records.len()
            ))),
        }
    }
}

impl<'de> Deserializer<'de> for Rows<'_> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        let headers = self.headers;
        let records = self
            .records
            .iter()
            .enumerate()
            .map(|(index, fields)| Record {
                headers,
                fields,
                index,
            });
        SeqDeserializer::<_, DeError>::new(records).deserialize_any(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        if self.records.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DeResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> DeResult<V::Value> {
        self.single()?.deserialize_any(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        self.single()?.deserialize_any(visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> DeResult<V::Value> {
        self.single()?.deserialize_any(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> DeResult<V::Value> {
        self.single()?.deserialize_any(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string
        bytes byte_buf unit unit_struct enum identifier ignored_any
    }
}

/// One record, seen as a map keyed by the header row or as a plain sequence.
#[derive(Clone, Copy)]
struct Record<'a> {
    headers: Option<&'a StringRecord>,
    fields: &'a StringRecord,
    index: usize,
}

impl<'de> IntoDeserializer<'de, DeError> for Record<'_> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for Record<'_> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        let result = match self.headers {
            Some(headers) => {
                let entries = headers.iter().zip(self.fields.iter()).map(|(column, value)| {
                    let cell = Cell {
                        column: Some(column),
                        value,
                    };
                    (column, cell)
                });
                MapDeserializer::<_, DeError>::new(entries).deserialize_any(visitor)
            }
            None => {
                let cells = self.fields.iter().map(|value| Cell {
                    column: None,
                    value,
                });
                SeqDeserializer::<_, DeError>::new(cells).deserialize_any(visitor)
            }
        };
        result.map_err(|e| de::Error::custom(format_args!("record {}: {}", self.index + 1, e)))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

/// A single cell, parsed as the type the visitor asks for.
#[derive(Clone, Copy)]
struct Cell<'a> {
    column: Option<&'a str>,
    value: &'a str,
}

impl Cell<'_> {
    fn parse<N>(self, expected: &str) -> DeResult<N>
    where
        N: FromStr,
        N::Err: Display,
    {
        self.value.parse().map_err(|e| self.invalid(expected, e))
    }

    fn invalid(self, expected: &str, err: impl Display) -> DeError {
        match self.column {
            Some(column) => de::Error::custom(format_args!(
                "column '{}': invalid {} '{}': {}",
                column, expected, self.value, err
            )),
            None => de::Error::custom(format_args!(
                "invalid {} '{}': {}",
                expected, self.value, err
            )),
        }
    }
}

impl<'de> IntoDeserializer<'de, DeError> for Cell<'_> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! parse_cell {
    ($($method:ident => $visit:ident($ty:ty),)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for Cell<'_> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        visitor.visit_str(self.value)
    }

    parse_cell! {
        deserialize_bool => visit_bool(bool),
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        visitor.visit_bytes(self.value.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        if self.value.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        if self.value.is_empty() {
            visitor.visit_unit()
        } else {
            Err(self.invalid("unit", "expected an empty cell"))
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DeResult<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DeResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> DeResult<V::Value> {
        let variant: StrDeserializer<'_, DeError> = self.value.into_deserializer();
        visitor.visit_enum(variant)
    }

    forward_to_deserialize_any! {
        str string seq tuple tuple_struct map struct identifier ignored_any
    }
}

fn csv_error(err: csv::Error) -> RepresentationError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io) = err.into_kind() {
            return RepresentationError::Io(io);
        }
        return RepresentationError::decode(FORMAT, "I/O failure");
    }
    RepresentationError::decode(FORMAT, err)
}
