//! Wire formats and media type based format selection.

use armature_media::MediaType;
use std::fmt;

/// Wire formats a [`Mapper`](crate::Mapper) can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// `application/json`
    Json,
    /// Binary JSON, encoded as MessagePack
    BinaryJson,
    /// `application/xml`, `text/xml`
    Xml,
    /// `application/yaml` and aliases
    Yaml,
    /// `text/csv`
    Csv,
    /// Unrecognised media type, handled as JSON
    FallbackJson,
}

impl WireFormat {
    /// Pick the format for a declared media type.
    ///
    /// Candidates are tried in order: JSON, binary JSON, XML, YAML, CSV.
    /// Anything else resolves to [`WireFormat::FallbackJson`].
    pub fn select(media_type: &MediaType) -> WireFormat {
        if MediaType::application_json().is_compatible(media_type) {
            return WireFormat::Json;
        }

        let candidates: [(WireFormat, &[fn() -> MediaType]); 4] = [
            (
                WireFormat::BinaryJson,
                &[
                    MediaType::application_msgpack,
                    MediaType::application_x_msgpack,
                    MediaType::application_json_smile,
                ],
            ),
            (
                WireFormat::Xml,
                &[MediaType::application_xml, MediaType::text_xml],
            ),
            (
                WireFormat::Yaml,
                &[
                    MediaType::application_yaml,
                    MediaType::application_x_yaml,
                    MediaType::text_yaml,
                ],
            ),
            (WireFormat::Csv, &[MediaType::text_csv]),
        ];

        candidates
            .iter()
            .find(|(_, types)| types.iter().any(|t| t().is_compatible(media_type)))
            .map(|(format, _)| *format)
            .unwrap_or(WireFormat::FallbackJson)
    }

    /// Media type written by this format.
    pub fn media_type(&self) -> MediaType {
        match self {
            WireFormat::Json | WireFormat::FallbackJson => MediaType::application_json(),
            WireFormat::BinaryJson => MediaType::application_msgpack(),
            WireFormat::Xml => MediaType::application_xml(),
            WireFormat::Yaml => MediaType::application_yaml(),
            WireFormat::Csv => MediaType::text_csv(),
        }
    }

    /// Whether the encoded output is UTF-8 text.
    pub fn is_textual(&self) -> bool {
        !matches!(self, WireFormat::BinaryJson)
    }

    /// Whether this format was chosen because nothing else matched.
    pub fn is_fallback(&self) -> bool {
        matches!(self, WireFormat::FallbackJson)
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            WireFormat::Json => "JSON",
            WireFormat::BinaryJson => "binary JSON",
            WireFormat::Xml => "XML",
            WireFormat::Yaml => "YAML",
            WireFormat::Csv => "CSV",
            WireFormat::FallbackJson => "JSON (fallback)",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(s: &str) -> WireFormat {
        WireFormat::select(&MediaType::parse(s).unwrap())
    }

    #[test]
    fn test_select_json() {
        assert_eq!(select("application/json"), WireFormat::Json);
        assert_eq!(select("application/json; charset=utf-8"), WireFormat::Json);
    }

    #[test]
    fn test_wildcards_resolve_to_json() {
        assert_eq!(select("*/*"), WireFormat::Json);
        assert_eq!(select("application/*"), WireFormat::Json);
    }

    #[test]
    fn test_select_binary_json() {
        assert_eq!(select("application/msgpack"), WireFormat::BinaryJson);
        assert_eq!(select("application/x-msgpack"), WireFormat::BinaryJson);
        assert_eq!(select("application/x-json-smile"), WireFormat::BinaryJson);
    }

    #[test]
    fn test_select_text_formats() {
        assert_eq!(select("application/xml"), WireFormat::Xml);
        assert_eq!(select("text/xml"), WireFormat::Xml);
        assert_eq!(select("application/x-yaml"), WireFormat::Yaml);
        assert_eq!(select("text/yaml"), WireFormat::Yaml);
        assert_eq!(select("text/csv; header=present"), WireFormat::Csv);
    }

    #[test]
    fn test_text_wildcard_picks_first_text_format() {
        // text/xml is the first candidate under text/*
        assert_eq!(select("text/*"), WireFormat::Xml);
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(select("application/x-unknown"), WireFormat::FallbackJson);
        assert_eq!(select("text/plain"), WireFormat::FallbackJson);
        assert!(WireFormat::FallbackJson.is_fallback());
        assert_eq!(
            WireFormat::FallbackJson.media_type(),
            MediaType::application_json()
        );
    }
}
