//! Media types for Armature representations.
//!
//! A [`MediaType`] is the structured label carried by `Content-Type` and
//! `Accept` headers. Besides parsing and formatting, this crate implements the
//! compatibility rule used when picking a wire format for a body:
//! two media types are compatible when either one includes the other.
//!
//! # Examples
//!
//! ```
//! use armature_media::MediaType;
//!
//! let declared = MediaType::parse("application/json; charset=utf-8").unwrap();
//! assert!(MediaType::application_json().is_compatible(&declared));
//!
//! // Wildcards are honoured in both directions
//! let any = MediaType::parse("application/*").unwrap();
//! assert!(MediaType::application_json().is_compatible(&any));
//! assert!(!MediaType::text_csv().is_compatible(&any));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Wildcard token for type or subtype.
pub const WILDCARD: &str = "*";

/// Errors produced when parsing a media type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    /// Input was empty or only whitespace.
    #[error("media type is empty")]
    Empty,

    /// Input had no `/` separating type and subtype.
    #[error("media type '{0}' is missing a subtype")]
    MissingSubtype(String),

    /// Type or subtype contained characters outside the token grammar.
    #[error("media type '{0}' contains invalid characters")]
    InvalidToken(String),
}

// ============================================================================
// Media Types
// ============================================================================

/// Represents a media type (MIME type) with optional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    /// The type (e.g., "application", "text")
    pub type_: String,
    /// The subtype (e.g., "json", "csv")
    pub subtype: String,
    /// Parameters (e.g., charset=utf-8), keys lowercased
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// Create a new media type.
    pub fn new(type_: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            type_: type_.into().to_ascii_lowercase(),
            subtype: subtype.into().to_ascii_lowercase(),
            params: BTreeMap::new(),
        }
    }

    /// Create a media type with a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// `application/json`
    pub fn application_json() -> Self {
        Self::new("application", "json")
    }

    /// `application/msgpack`
    pub fn application_msgpack() -> Self {
        Self::new("application", "msgpack")
    }

    /// `application/x-msgpack`
    pub fn application_x_msgpack() -> Self {
        Self::new("application", "x-msgpack")
    }

    /// `application/x-json-smile`
    pub fn application_json_smile() -> Self {
        Self::new("application", "x-json-smile")
    }

    /// `application/xml`
    pub fn application_xml() -> Self {
        Self::new("application", "xml")
    }

    /// `text/xml`
    pub fn text_xml() -> Self {
        Self::new("text", "xml")
    }

    /// `application/yaml`
    pub fn application_yaml() -> Self {
        Self::new("application", "yaml")
    }

    /// `application/x-yaml`
    pub fn application_x_yaml() -> Self {
        Self::new("application", "x-yaml")
    }

    /// `text/yaml`
    pub fn text_yaml() -> Self {
        Self::new("text", "yaml")
    }

    /// `text/csv`
    pub fn text_csv() -> Self {
        Self::new("text", "csv")
    }

    /// `text/plain`
    pub fn text_plain() -> Self {
        Self::new("text", "plain")
    }

    /// `application/octet-stream`
    pub fn application_octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// `*/*`
    pub fn any() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// Parse a media type from a string. Quality values (`q=`) are dropped.
    pub fn parse(s: &str) -> Option<Self> {
        Self::try_parse(s).ok()
    }

    fn try_parse(s: &str) -> Result<Self, MediaTypeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MediaTypeError::Empty);
        }

        let mut parts = s.split(';');
        let type_subtype = parts.next().unwrap_or_default().trim();
        let (type_, subtype) = type_subtype
            .split_once('/')
            .ok_or_else(|| MediaTypeError::MissingSubtype(s.to_string()))?;

        let type_ = type_.trim().to_ascii_lowercase();
        let subtype = subtype.trim().to_ascii_lowercase();
        if !is_token(&type_) || !is_token(&subtype) {
            return Err(MediaTypeError::InvalidToken(s.to_string()));
        }

        let mut params = BTreeMap::new();
        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                let key = key.trim().to_ascii_lowercase();
                let value = value.trim().trim_matches('"').to_string();
                if key != "q" && !key.is_empty() {
                    params.insert(key, value);
                }
            }
        }

        Ok(Self {
            type_,
            subtype,
            params,
        })
    }

    /// Check if this media type matches another, considering wildcards only.
    pub fn matches(&self, other: &MediaType) -> bool {
        let type_matches =
            self.type_ == WILDCARD || other.type_ == WILDCARD || self.type_ == other.type_;
        let subtype_matches = self.subtype == WILDCARD
            || other.subtype == WILDCARD
            || self.subtype == other.subtype;
        type_matches && subtype_matches
    }

    /// Check if this media type includes `other`.
    ///
    /// `*/*` includes everything, `application/*` includes every
    /// `application` subtype. Parameters set on both sides must agree,
    /// except `charset`, which never affects inclusion.
    pub fn includes(&self, other: &MediaType) -> bool {
        let type_included = self.type_ == WILDCARD || self.type_ == other.type_;
        let subtype_included = self.subtype == WILDCARD
            || (self.type_ != WILDCARD && self.subtype == other.subtype);
        type_included && subtype_included && self.params_agree(other)
    }

    /// Check if either media type includes the other.
    pub fn is_compatible(&self, other: &MediaType) -> bool {
        self.includes(other) || other.includes(self)
    }

    fn params_agree(&self, other: &MediaType) -> bool {
        self.params
            .iter()
            .filter(|(key, _)| key.as_str() != "charset")
            .all(|(key, value)| {
                other
                    .params
                    .get(key)
                    .is_none_or(|theirs| theirs.eq_ignore_ascii_case(value))
            })
    }

    /// Check if this is a wildcard type (`*/*`).
    pub fn is_any(&self) -> bool {
        self.type_ == WILDCARD && self.subtype == WILDCARD
    }

    /// Check that neither the type nor the subtype is a wildcard.
    pub fn is_concrete(&self) -> bool {
        self.type_ != WILDCARD && self.subtype != WILDCARD
    }

    /// The `type/subtype` pair without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// The `charset` parameter, if present.
    pub fn charset(&self) -> Option<&str> {
        self.params.get("charset").map(String::as_str)
    }

    /// Full header value including parameters.
    pub fn to_header_value(&self) -> String {
        let mut result = self.essence();
        for (key, value) in &self.params {
            result.push_str(&format!("; {}={}", key, value));
        }
        result
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self::application_octet_stream()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_header_value())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}

// RFC 7230 token characters
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

// ============================================================================
// Tests
// ============================================================================
