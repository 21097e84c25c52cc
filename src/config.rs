//! Client defaults and per-call effective configuration.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderValue, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{Decoder, Encoder, JsonCodec};
use crate::transport::Transport;

/// Status codes treated as success when no override says otherwise.
pub(crate) fn default_ok_codes() -> HashSet<StatusCode> {
    HashSet::from([
        StatusCode::OK,
        StatusCode::CREATED,
        StatusCode::ACCEPTED,
        StatusCode::NO_CONTENT,
    ])
}

/// Base configuration shared by every call issued from one client.
///
/// Built once at construction and never mutated afterwards; per-call
/// overrides always operate on a private copy, so the default is safe to
/// read concurrently without locking.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) headers: HeaderMap,
    pub(crate) ok_codes: HashSet<StatusCode>,
}

impl ClientConfig {
    /// Default configuration for a client named `name`: the standard
    /// transport, `user-agent`/`content-type` headers, and the default
    /// acceptable codes.
    ///
    /// Panics if `name` is not a legal header value.
    pub(crate) fn new(name: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(name).expect("client name must be a legal header value"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        Self {
            transport: Arc::new(reqwest::Client::new()),
            headers,
            ok_codes: default_ok_codes(),
        }
    }

    /// Headers attached to every request by default.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Status codes accepted by default.
    pub fn ok_codes(&self) -> &HashSet<StatusCode> {
        &self.ok_codes
    }
}

/// Effective configuration for one call: the client default plus any
/// per-call overrides, applied in order.
///
/// The headers and the code set are deep-copied out of the default before
/// any override runs, so no call can observe another call's mutations.
/// The transport and codecs are shared by reference.
pub struct RequestConfig<P: ?Sized, R> {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) headers: HeaderMap,
    pub(crate) ok_codes: HashSet<StatusCode>,
    pub(crate) encoder: Arc<dyn Encoder<P>>,
    pub(crate) decoder: Arc<dyn Decoder<R>>,
    pub(crate) timeout: Option<Duration>,
    // First expected_codes override in a composition pass replaces the
    // inherited set; later ones union into it.
    pub(crate) replaced_ok_codes: bool,
}

impl<P, R> RequestConfig<P, R>
where
    P: Serialize + ?Sized,
    R: DeserializeOwned,
{
    pub(crate) fn from_default(base: &ClientConfig) -> Self {
        Self {
            transport: Arc::clone(&base.transport),
            headers: base.headers.clone(),
            ok_codes: base.ok_codes.clone(),
            encoder: Arc::new(JsonCodec),
            decoder: Arc::new(JsonCodec),
            timeout: None,
            replaced_ok_codes: false,
        }
    }
}

impl<P: ?Sized, R> RequestConfig<P, R> {
    /// Headers the outbound request will carry.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Status codes this call will accept.
    pub fn ok_codes(&self) -> &HashSet<StatusCode> {
        &self.ok_codes
    }

    /// Deadline for the whole call, if one was set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
