//! Per-call configuration overrides.
//!
//! Every override is an ordered mutation of the effective request
//! configuration: the pipeline clones the client default, then applies the
//! given options first to last. Aside from the replace-then-union rule of
//! [`expected_codes`], application order is the only coupling between
//! options.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use http::{HeaderName, HeaderValue, StatusCode, header};

use crate::codec::{Decoder, Encoder};
use crate::config::RequestConfig;
use crate::transport::Transport;

/// A single per-call override of the effective request configuration.
///
/// Built by the free functions in this module ([`set_headers`],
/// [`expected_codes`], [`with_transport`], ...) and passed to the client's
/// verb methods, which apply them in order.
pub struct RequestOption<P: ?Sized, R>(Box<dyn FnOnce(&mut RequestConfig<P, R>) + Send>);

impl<P: ?Sized, R> RequestOption<P, R> {
    fn new(mutate: impl FnOnce(&mut RequestConfig<P, R>) + Send + 'static) -> Self {
        Self(Box::new(mutate))
    }

    pub(crate) fn apply(self, config: &mut RequestConfig<P, R>) {
        (self.0)(config)
    }
}

pub(crate) fn header_name(name: &str) -> HeaderName {
    name.parse()
        .unwrap_or_else(|_| panic!("invalid header name: {name:?}"))
}

pub(crate) fn header_value(value: &str) -> HeaderValue {
    value
        .parse()
        .unwrap_or_else(|_| panic!("invalid header value: {value:?}"))
}

pub(crate) fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or_else(|_| panic!("invalid status code: {code}"))
}

/// Replace any existing values for each given header with the new value.
///
/// Panics if a name or value is not a legal HTTP header token.
pub fn set_headers<P, R, I, K, V>(pairs: I) -> RequestOption<P, R>
where
    P: ?Sized,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let pairs: Vec<(HeaderName, HeaderValue)> = pairs
        .into_iter()
        .map(|(k, v)| (header_name(k.as_ref()), header_value(v.as_ref())))
        .collect();

    RequestOption::new(move |config| {
        for (name, value) in pairs {
            config.headers.insert(name, value);
        }
    })
}

/// Append each given header value, preserving any prior values.
///
/// Panics if a name or value is not a legal HTTP header token.
pub fn add_headers<P, R, I, K, V>(pairs: I) -> RequestOption<P, R>
where
    P: ?Sized,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let pairs: Vec<(HeaderName, HeaderValue)> = pairs
        .into_iter()
        .map(|(k, v)| (header_name(k.as_ref()), header_value(v.as_ref())))
        .collect();

    RequestOption::new(move |config| {
        for (name, value) in pairs {
            config.headers.append(name, value);
        }
    })
}

/// Drop all values for each named header. Absent names are no-ops.
///
/// Panics if a name is not a legal HTTP header token.
pub fn remove_headers<P, R, I, K>(names: I) -> RequestOption<P, R>
where
    P: ?Sized,
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let names: Vec<HeaderName> = names
        .into_iter()
        .map(|n| header_name(n.as_ref()))
        .collect();

    RequestOption::new(move |config| {
        for name in &names {
            config.headers.remove(name);
        }
    })
}

/// Declare the status codes treated as success for this call.
///
/// The first use within one option list replaces the inherited set
/// wholesale; any further use in the same list adds to it. An independent
/// later call starts from the client default again.
///
/// Panics if `codes` is empty or contains an invalid status code.
pub fn expected_codes<P: ?Sized, R>(codes: impl IntoIterator<Item = u16>) -> RequestOption<P, R> {
    let codes: Vec<StatusCode> = codes.into_iter().map(status_code).collect();
    assert!(!codes.is_empty(), "expected_codes requires at least one code");

    RequestOption::new(move |config| {
        if !config.replaced_ok_codes {
            config.ok_codes.clear();
            config.replaced_ok_codes = true;
        }
        config.ok_codes.extend(codes);
    })
}

/// Replace the transport used for this call.
pub fn with_transport<P: ?Sized, R>(transport: impl Transport + 'static) -> RequestOption<P, R> {
    let transport: Arc<dyn Transport> = Arc::new(transport);
    RequestOption::new(move |config| config.transport = transport)
}

/// Replace the payload encoder for this call.
pub fn with_encoder<P: ?Sized + 'static, R>(encoder: impl Encoder<P> + 'static) -> RequestOption<P, R> {
    let encoder: Arc<dyn Encoder<P>> = Arc::new(encoder);
    RequestOption::new(move |config| config.encoder = encoder)
}

/// Replace the response decoder for this call.
pub fn with_decoder<P: ?Sized, R: 'static>(decoder: impl Decoder<R> + 'static) -> RequestOption<P, R> {
    let decoder: Arc<dyn Decoder<R>> = Arc::new(decoder);
    RequestOption::new(move |config| config.decoder = decoder)
}

/// Bound the whole call with a deadline.
///
/// Expiry aborts the in-flight request and surfaces as a transport error.
pub fn timeout<P: ?Sized, R>(timeout: Duration) -> RequestOption<P, R> {
    RequestOption::new(move |config| config.timeout = Some(timeout))
}

/// Send a bearer token in the `authorization` header.
pub fn bearer_auth<P: ?Sized, R>(token: impl AsRef<str>) -> RequestOption<P, R> {
    set_headers([(
        header::AUTHORIZATION.as_str(),
        format!("Bearer {}", token.as_ref()),
    )])
}

/// Send basic credentials in the `authorization` header.
pub fn basic_auth<P: ?Sized, R>(
    username: impl AsRef<str>,
    password: Option<&str>,
) -> RequestOption<P, R> {
    let credentials = match password {
        Some(p) => format!("{}:{}", username.as_ref(), p),
        None => format!("{}:", username.as_ref()),
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);

    set_headers([(header::AUTHORIZATION.as_str(), format!("Basic {encoded}"))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, default_ok_codes};

    type TestConfig = RequestConfig<(), serde_json::Value>;

    fn effective(options: Vec<RequestOption<(), serde_json::Value>>) -> TestConfig {
        let base = ClientConfig::new("test");
        let mut config = TestConfig::from_default(&base);
        for option in options {
            option.apply(&mut config);
        }
        config
    }

    #[test]
    fn test_set_headers_replaces_values() {
        let config = effective(vec![
            add_headers([("x-tag", "first"), ("x-tag", "second")]),
            set_headers([("x-tag", "only")]),
        ]);

        let values: Vec<_> = config.headers().get_all("x-tag").iter().collect();
        assert_eq!(values, ["only"]);
    }

    #[test]
    fn test_add_headers_preserves_prior_values() {
        let config = effective(vec![
            set_headers([("content-type", "test")]),
            add_headers([("content-type", "test2")]),
        ]);

        let values: Vec<_> = config.headers().get_all("content-type").iter().collect();
        assert_eq!(values, ["test", "test2"]);
    }

    #[test]
    fn test_remove_headers_drops_all_values_and_ignores_absent() {
        let config = effective(vec![
            add_headers([("x-tag", "second")]),
            remove_headers(["x-tag", "user-agent", "x-never-set"]),
        ]);

        assert!(config.headers().get("x-tag").is_none());
        assert!(config.headers().get("user-agent").is_none());
    }

    #[test]
    fn test_expected_codes_replace_then_union() {
        let config = effective(vec![expected_codes([400]), expected_codes([203])]);

        let want: std::collections::HashSet<_> = [StatusCode::BAD_REQUEST, StatusCode::NON_AUTHORITATIVE_INFORMATION]
            .into_iter()
            .collect();
        assert_eq!(config.ok_codes(), &want);
    }

    #[test]
    fn test_expected_codes_resets_per_pass() {
        // A later, independent composition starts from the default again.
        let first = effective(vec![expected_codes([400])]);
        let second = effective(vec![]);

        assert_eq!(
            first.ok_codes(),
            &std::collections::HashSet::from([StatusCode::BAD_REQUEST])
        );
        assert_eq!(second.ok_codes(), &default_ok_codes());
    }

    #[test]
    #[should_panic(expected = "at least one code")]
    fn test_expected_codes_empty_panics() {
        let _: RequestOption<(), serde_json::Value> = expected_codes([]);
    }

    #[test]
    #[should_panic(expected = "invalid status code")]
    fn test_expected_codes_invalid_code_panics() {
        let _: RequestOption<(), serde_json::Value> = expected_codes([99]);
    }

    #[test]
    #[should_panic(expected = "invalid header name")]
    fn test_set_headers_invalid_name_panics() {
        let _ = set_headers::<(), serde_json::Value, _, _, _>([("bad header", "1")]);
    }

    #[test]
    fn test_codec_overrides_replace_defaults() {
        let base = ClientConfig::new("test");
        let mut config = RequestConfig::<Vec<u8>, Vec<u8>>::from_default(&base);

        for option in [
            with_encoder(crate::codec::RawCodec),
            with_decoder(crate::codec::RawCodec),
        ] {
            option.apply(&mut config);
        }

        let mut buf = Vec::new();
        config.encoder.encode(&b"raw".to_vec(), &mut buf).unwrap();
        assert_eq!(buf, b"raw");
        assert_eq!(config.decoder.decode(b"raw").unwrap(), b"raw");
    }

    #[test]
    fn test_timeout_sets_deadline() {
        let config = effective(vec![timeout(Duration::from_secs(5))]);
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_bearer_auth_header() {
        let config = effective(vec![bearer_auth("secret-token")]);
        assert_eq!(
            config.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer secret-token"
        );
    }

    #[test]
    fn test_basic_auth_header() {
        let config = effective(vec![basic_auth("user", Some("pass"))]);
        // "user:pass" in base64.
        assert_eq!(
            config.headers().get(header::AUTHORIZATION).unwrap(),
            "Basic dXNlcjpwYXNz"
        );
    }
}
