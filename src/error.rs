//! Pipeline error types.

use std::fmt;

use bytes::{Buf, Bytes};
use http::{HeaderMap, StatusCode};
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error carried across the transport and codec seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the request pipeline.
///
/// Each variant names the stage that failed and preserves the underlying
/// cause, so callers can walk `source()` chains down to the originating
/// serializer, transport, or parser error.
#[derive(Debug, Error)]
pub enum Error {
    /// The request URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The method token is not a legal HTTP method.
    #[error("invalid method: {0}")]
    InvalidMethod(#[from] http::method::InvalidMethod),

    /// The request payload could not be encoded.
    #[error("encode request: {0}")]
    Encode(#[source] CodecError),

    /// The transport failed to produce a response.
    #[error("transport: {0}")]
    Transport(#[source] BoxError),

    /// The response status code was outside the acceptable set.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// The response body could not be decoded.
    #[error("decode response: {0}")]
    Decode(#[source] CodecError),
}

impl Error {
    /// Status code of the rejected response, if this is a bad-status error.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.as_status().map(StatusError::status)
    }

    /// Borrow the captured response detail, if this is a bad-status error.
    pub fn as_status(&self) -> Option<&StatusError> {
        match self {
            Self::Status(e) => Some(e),
            _ => None,
        }
    }

    /// Check if this is a bad-status error.
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status(_))
    }

    /// Check if this is a transport error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Errors produced by encoder and decoder implementations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("serialize: {0}")]
    Serialize(#[source] BoxError),

    /// The body could not be deserialized.
    #[error("deserialize: {0}")]
    Deserialize(#[source] BoxError),
}

/// Response detail captured when a status code falls outside the acceptable
/// set: the code itself, a snapshot of the response headers, and the fully
/// buffered body.
///
/// The body is buffered, not streamed, so it stays readable after the
/// transport connection is gone; all three views over it are repeatable.
#[derive(Debug)]
pub struct StatusError {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    drain_error: Option<BoxError>,
}

impl StatusError {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            drain_error: None,
        }
    }

    pub(crate) fn with_drain_error(
        status: StatusCode,
        headers: HeaderMap,
        partial_body: Bytes,
        cause: BoxError,
    ) -> Self {
        Self {
            status,
            headers,
            body: partial_body,
            drain_error: Some(cause),
        }
    }

    /// Buffer the whole body of a rejected response before the connection
    /// is released. A read failure part-way through keeps the bytes
    /// captured so far and records the failure without replacing the
    /// bad-status signal.
    pub(crate) async fn capture(mut response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let mut body = Vec::new();

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => return Self::new(status, headers, body.into()),
                Err(e) => {
                    return Self::with_drain_error(status, headers, body.into(), e.into());
                }
            }
        }
    }

    /// The rejected status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Snapshot of the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The captured body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The captured body as lossy UTF-8 text.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// A fresh reader over the captured body.
    pub fn body_reader(&self) -> bytes::buf::Reader<Bytes> {
        self.body.clone().reader()
    }

    /// The body-read failure, if draining the response did not complete.
    pub fn drain_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.drain_error.as_deref()
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad status code: {}", self.status.as_u16())?;
        if let Some(cause) = &self.drain_error {
            write!(f, " (body drain failed: {cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for StatusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.drain_error
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
