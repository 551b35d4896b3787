//! HTTP integration for serde representations.

use crate::{BytesRepresentation, RepresentationError, Result, SerdeRepresentation};
use armature_media::MediaType;
use bytes::Bytes;
use ::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use ::http::{Request, Response, StatusCode};
use serde::Serialize;
use std::io;

/// Media type declared by `Content-Type`, or `application/octet-stream`.
fn declared_media_type(headers: &HeaderMap) -> MediaType {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(MediaType::parse)
        .unwrap_or_default()
}

impl<T> SerdeRepresentation<T> {
    /// Wrap the body of an inbound request.
    pub fn from_request(request: Request<Bytes>) -> Self {
        let media_type = declared_media_type(request.headers());
        Self::from_representation(BytesRepresentation::new(media_type, request.into_body()))
    }

    /// Wrap the body of a response received from another service.
    pub fn from_response(response: Response<Bytes>) -> Self {
        let media_type = declared_media_type(response.headers());
        Self::from_representation(BytesRepresentation::new(media_type, response.into_body()))
    }
}

impl<T: Serialize> SerdeRepresentation<T> {
    /// Encode into an HTTP response with the given status.
    ///
    /// `Content-Type` is the declared media type, or the media type of the
    /// selected format when the declared one contains wildcards.
    pub fn into_response(mut self, status: StatusCode) -> Result<Response<Bytes>> {
        let body = self.to_bytes()?;
        let content_type = if self.media_type().is_concrete() {
            self.media_type().to_string()
        } else {
            self.mapper()?.format().media_type().to_string()
        };

        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .map_err(|e| RepresentationError::Io(io::Error::other(e)))
    }
}
