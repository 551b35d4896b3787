//! Codec configuration.
//!
//! Values can come from code, from environment variables or from a TOML
//! document:
//!
//! - `ARMATURE_REPR_STRICT=1` - Reject unrecognised media types instead of
//!   falling back to JSON
//! - `ARMATURE_REPR_PRETTY=1` - Pretty-print JSON and indent XML
//! - `ARMATURE_REPR_XML_ROOT=name` - Root element for XML output
//! - `ARMATURE_REPR_CSV_DELIMITER=;` - CSV field delimiter
//! - `ARMATURE_REPR_CSV_HEADERS=0` - Disable the CSV header row
//! - `ARMATURE_REPR_MAX_INPUT_BYTES=65536` - Upper bound on decoded bodies

use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Errors raised while loading a [`CodecConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Options applied when a [`Mapper`](crate::Mapper) is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Fail on unrecognised media types instead of falling back to JSON.
    pub strict_media_types: bool,
    /// Pretty-print JSON, indent XML.
    pub pretty: bool,
    /// Root element name for XML output. Defaults to the type name.
    ///
    /// Top-level sequences have no type name to fall back on and fail to
    /// encode without it; with it, each element is written under this name.
    pub xml_root: Option<String>,
    /// CSV field delimiter (single ASCII character).
    pub csv_delimiter: char,
    /// Whether CSV bodies carry a header row.
    pub csv_has_headers: bool,
    /// Maximum number of bytes read from an inbound stream.
    pub max_input_bytes: Option<u64>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict_media_types: false,
            pretty: false,
            xml_root: None,
            csv_delimiter: ',',
            csv_has_headers: true,
            max_input_bytes: None,
        }
    }
}

impl CodecConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `ARMATURE_REPR_*` environment variables.
    ///
    /// Unset variables keep their default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("ARMATURE_REPR_STRICT") {
            config.strict_media_types = parse_flag(&v);
        }
        if let Some(v) = lookup("ARMATURE_REPR_PRETTY") {
            config.pretty = parse_flag(&v);
        }
        if let Some(v) = lookup("ARMATURE_REPR_XML_ROOT") {
            config.xml_root = Some(v).filter(|root| !root.is_empty());
        }
        if let Some(v) = lookup("ARMATURE_REPR_CSV_DELIMITER") {
            let mut chars = v.chars();
            config.csv_delimiter = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "ARMATURE_REPR_CSV_DELIMITER".to_string(),
                        message: format!("expected a single character, got '{}'", v),
                    });
                }
            };
        }
        if let Some(v) = lookup("ARMATURE_REPR_CSV_HEADERS") {
            config.csv_has_headers = parse_flag(&v);
        }
        if let Some(v) = lookup("ARMATURE_REPR_MAX_INPUT_BYTES") {
            let limit = v.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "ARMATURE_REPR_MAX_INPUT_BYTES".to_string(),
                message: e.to_string(),
            })?;
            config.max_input_bytes = Some(limit);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML document.
    ///
    /// ```
    /// use armature_representation::CodecConfig;
    ///
    /// let config = CodecConfig::from_toml_str("pretty = true\ncsv_delimiter = ';'").unwrap();
    /// assert!(config.pretty);
    /// assert_eq!(config.csv_delimiter, ';');
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.csv_delimiter.is_ascii() {
            return Err(ConfigError::InvalidValue {
                key: "csv_delimiter".to_string(),
                message: format!("'{}' is not an ASCII character", self.csv_delimiter),
            });
        }
        Ok(())
    }

    /// Enable strict media type handling.
    pub fn strict(mut self) -> Self {
        self.strict_media_types = true;
        self
    }

    /// Enable pretty output.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Set the XML root element.
    pub fn with_xml_root(mut self, root: impl Into<String>) -> Self {
        self.xml_root = Some(root.into());
        self
    }

    /// Set the CSV delimiter. Checked by [`validate`](Self::validate) when a
    /// mapper is built from this configuration.
    pub fn with_csv_delimiter(mut self, delimiter: char) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    /// Set the inbound size limit.
    pub fn with_max_input_bytes(mut self, limit: u64) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }
}

fn parse_flag(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}
