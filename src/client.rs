//! Client facade and the request execution pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use http::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, RequestConfig};
use crate::error::{Error, Result, StatusError};
use crate::options::{RequestOption, header_name, header_value, status_code};
use crate::transport::Transport;

/// Named HTTP client: an immutable default configuration plus one entry
/// point per common verb, all funneling into the same pipeline.
///
/// Cloning is cheap; clones share the default configuration and the
/// transport. A client is safe to use from many tasks at once because the
/// default is never written after construction — every call works on a
/// private copy.
#[derive(Clone)]
pub struct Client {
    name: String,
    config: Arc<ClientConfig>,
}

impl Client {
    /// Create a client with the default configuration: JSON codec both
    /// ways, the standard transport, `user-agent: <name>`, and
    /// `content-type: application/json`.
    ///
    /// Panics if `name` is not a legal header value.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Start building a client with construction-time overrides.
    pub fn builder(name: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(name)
    }

    /// The identity this client sends as its `user-agent`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default configuration calls start from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a GET request and decode the response body.
    pub async fn get<R>(&self, url: &str, options: Vec<RequestOption<(), R>>) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.send(Method::GET, url, None::<&()>, options).await
    }

    /// Send a POST request with `payload` and decode the response body.
    pub async fn post<P, R>(
        &self,
        url: &str,
        payload: &P,
        options: Vec<RequestOption<P, R>>,
    ) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(Method::POST, url, Some(payload), options).await
    }

    /// Send a PUT request with `payload` and decode the response body.
    pub async fn put<P, R>(
        &self,
        url: &str,
        payload: &P,
        options: Vec<RequestOption<P, R>>,
    ) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(Method::PUT, url, Some(payload), options).await
    }

    /// Send a PATCH request with `payload` and decode the response body.
    pub async fn patch<P, R>(
        &self,
        url: &str,
        payload: &P,
        options: Vec<RequestOption<P, R>>,
    ) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(Method::PATCH, url, Some(payload), options).await
    }

    /// Send a DELETE request and decode the response body.
    pub async fn delete<R>(&self, url: &str, options: Vec<RequestOption<(), R>>) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.send(Method::DELETE, url, None::<&()>, options).await
    }

    /// Send a HEAD request. The response body is never decoded.
    pub async fn head(&self, url: &str, options: Vec<RequestOption<(), ()>>) -> Result<()> {
        let (_config, _response) = self
            .dispatch(Method::HEAD, url, None::<&()>, options)
            .await?;
        Ok(())
    }

    /// Send a request with any method token, case-insensitively.
    pub async fn request<P, R>(
        &self,
        method: &str,
        url: &str,
        payload: Option<&P>,
        options: Vec<RequestOption<P, R>>,
    ) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
        self.send(method, url, payload, options).await
    }

    /// The full pipeline: compose, encode, dispatch, validate, decode.
    async fn send<P, R>(
        &self,
        method: Method,
        url: &str,
        payload: Option<&P>,
        options: Vec<RequestOption<P, R>>,
    ) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let (config, response) = self.dispatch(method, url, payload, options).await?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.into()))?;

        let value = config.decoder.decode(&body).map_err(Error::Decode)?;

        debug!(client = %self.name, status = %status, "request complete");

        Ok(value)
    }

    /// Compose the effective configuration, encode the payload, dispatch
    /// through the transport, and validate the status code. Returns the
    /// accepted response together with the effective configuration, whose
    /// decoder the caller may still need.
    async fn dispatch<P, R>(
        &self,
        method: Method,
        url: &str,
        payload: Option<&P>,
        options: Vec<RequestOption<P, R>>,
    ) -> Result<(RequestConfig<P, R>, reqwest::Response)>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url: Url = url.parse()?;

        let mut config = RequestConfig::from_default(&self.config);
        for option in options {
            option.apply(&mut config);
        }

        let mut request = reqwest::Request::new(method.clone(), url.clone());
        *request.headers_mut() = config.headers.clone();
        *request.timeout_mut() = config.timeout;

        if let Some(value) = payload {
            let mut body = Vec::new();
            config
                .encoder
                .encode(value, &mut body)
                .map_err(Error::Encode)?;
            *request.body_mut() = Some(body.into());
        }

        debug!(client = %self.name, method = %method, url = %url, "sending request");

        let response = config
            .transport
            .send(request)
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        if !config.ok_codes.contains(&status) {
            warn!(
                client = %self.name,
                method = %method,
                url = %url,
                status = %status,
                "unacceptable status code"
            );
            return Err(Error::Status(StatusError::capture(response).await));
        }

        Ok((config, response))
    }
}

/// Builder applying construction-time overrides to a client's default
/// configuration, in the order the methods are called.
pub struct ClientBuilder {
    name: String,
    config: ClientConfig,
    replaced_ok_codes: bool,
}

impl ClientBuilder {
    fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let config = ClientConfig::new(&name);
        Self {
            name,
            config,
            replaced_ok_codes: false,
        }
    }

    /// Replace the default transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.config.transport = Arc::new(transport);
        self
    }

    /// Replace any existing default values for `name` with `value`.
    ///
    /// Panics if the name or value is not a legal HTTP header token.
    pub fn set_header(mut self, name: &str, value: &str) -> Self {
        self.config
            .headers
            .insert(header_name(name), header_value(value));
        self
    }

    /// Append a default header value, preserving any prior values.
    ///
    /// Panics if the name or value is not a legal HTTP header token.
    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.config
            .headers
            .append(header_name(name), header_value(value));
        self
    }

    /// Drop a default header. Absent names are no-ops.
    pub fn remove_header(mut self, name: &str) -> Self {
        self.config.headers.remove(name);
        self
    }

    /// Declare the status codes treated as success by default.
    ///
    /// The first call replaces the built-in set; further calls on the same
    /// builder add to it.
    ///
    /// Panics if `codes` is empty or contains an invalid status code.
    pub fn expected_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        let codes: HashSet<StatusCode> = codes.into_iter().map(status_code).collect();
        assert!(!codes.is_empty(), "expected_codes requires at least one code");

        if !self.replaced_ok_codes {
            self.config.ok_codes.clear();
            self.replaced_ok_codes = true;
        }
        self.config.ok_codes.extend(codes);
        self
    }

    /// Finish construction.
    pub fn build(self) -> Client {
        Client {
            name: self.name,
            config: Arc::new(self.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_ok_codes;
    use http::header;

    #[test]
    fn test_client_creation_defaults() {
        let client = Client::new("test");

        assert_eq!(client.name(), "test");
        assert_eq!(
            client.config().headers().get(header::USER_AGENT).unwrap(),
            "test"
        );
        assert_eq!(
            client.config().headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(client.config().ok_codes(), &default_ok_codes());
    }

    #[test]
    fn test_builder_overrides_apply_in_order() {
        let client = Client::builder("test")
            .set_header("x-env", "staging")
            .add_header("x-env", "eu")
            .remove_header("content-type")
            .expected_codes([200])
            .expected_codes([404])
            .build();

        let headers = client.config().headers();
        let values: Vec<_> = headers.get_all("x-env").iter().collect();
        assert_eq!(values, ["staging", "eu"]);
        assert!(headers.get(header::CONTENT_TYPE).is_none());

        // First expected_codes call replaced the default set, the second
        // added to it.
        let want: HashSet<_> = [StatusCode::OK, StatusCode::NOT_FOUND].into_iter().collect();
        assert_eq!(client.config().ok_codes(), &want);
    }

    #[test]
    #[should_panic(expected = "at least one code")]
    fn test_builder_empty_expected_codes_panics() {
        let _ = Client::builder("test").expected_codes([]);
    }

    #[test]
    fn test_clones_share_defaults() {
        let client = Client::builder("test").set_header("x-env", "prod").build();
        let clone = client.clone();

        assert_eq!(clone.name(), "test");
        assert_eq!(clone.config().headers().get("x-env").unwrap(), "prod");
    }
}
