//! Transport capability: the seam between the pipeline and the network.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// Sends one outbound request and yields one response or a transport
/// failure.
///
/// This is the only thing the pipeline asks of the network, so real
/// clients, test doubles, and recording wrappers are interchangeable.
/// `reqwest::Client` is the default implementation; alternatives plug in
/// through [`ClientBuilder::transport`](crate::ClientBuilder::transport)
/// or the per-call [`with_transport`](crate::with_transport) override.
///
/// Implementations must be safe for concurrent invocation: one transport
/// instance is shared by every call issued from the same client. Retry,
/// pooling, TLS, and redirect policy all live behind this seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single HTTP round trip.
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
        Ok(self.execute(request).await?)
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
        (**self).send(request).await
    }
}
