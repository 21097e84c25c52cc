//! # Wirecall
//!
//! A small HTTP request/response pipeline: issue a call, encode an optional
//! payload, validate the status code against a configurable acceptance set,
//! decode the body, and on rejection keep the full response for inspection.
//!
//! ## Features
//!
//! - **Per-call overrides**: ordered options compose a private effective
//!   configuration from the client default — headers, acceptable codes,
//!   codecs, transport, deadline
//! - **Pluggable codecs**: JSON by default, form-urlencoded and raw bytes
//!   included, custom [`Encoder`]/[`Decoder`] implementations per call
//! - **Structured status errors**: a rejected response is captured whole —
//!   status code, header snapshot, buffered body — inside
//!   [`Error::Status`]
//! - **Swappable transport**: one narrow [`Transport`] trait, implemented
//!   by `reqwest::Client`, test doubles, or recording wrappers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use wirecall::Client;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     login: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wirecall::Error> {
//!     let client = Client::new("users-api");
//!
//!     let user: User = client
//!         .get("https://api.example.com/users/1", vec![])
//!         .await?;
//!
//!     println!("{} = {}", user.id, user.login);
//!     Ok(())
//! }
//! ```
//!
//! ## With Overrides
//!
//! ```rust,no_run
//! use serde_json::{Value, json};
//! use wirecall::{Client, Error, expected_codes, set_headers};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("orders-api");
//!
//!     let result: Result<Value, Error> = client
//!         .post(
//!             "https://api.example.com/orders",
//!             &json!({"item": "widget", "quantity": 5}),
//!             vec![
//!                 set_headers([("x-request-id", "9d4f")]),
//!                 expected_codes([200, 201, 409]),
//!             ],
//!         )
//!         .await;
//!
//!     if let Err(e) = &result {
//!         // A rejected status keeps the whole response around.
//!         if let Some(status) = e.as_status() {
//!             eprintln!("{}: {}", status.status(), status.body_text());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod codec;
mod config;
mod error;
mod options;
mod transport;

pub use client::{Client, ClientBuilder};
pub use codec::{Decoder, Encoder, FormCodec, JsonCodec, RawCodec};
pub use config::{ClientConfig, RequestConfig};
pub use error::{BoxError, CodecError, Error, Result, StatusError};
pub use options::{
    RequestOption, add_headers, basic_auth, bearer_auth, expected_codes, remove_headers,
    set_headers, timeout, with_decoder, with_encoder, with_transport,
};
pub use transport::Transport;

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use wirecall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::{Client, ClientBuilder};
    pub use crate::codec::{Decoder, Encoder, FormCodec, JsonCodec, RawCodec};
    pub use crate::error::{CodecError, Error, Result, StatusError};
    pub use crate::options::{
        RequestOption, add_headers, basic_auth, bearer_auth, expected_codes, remove_headers,
        set_headers, timeout, with_decoder, with_encoder, with_transport,
    };
    pub use crate::transport::Transport;
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}
