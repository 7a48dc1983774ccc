//! Async client for the memvault memory and retrieval API, along with the
//! [Server-Sent Events](https://html.spec.whatwg.org/multipage/server-sent-events.html) (SSE)
//! decoder its streaming endpoints are read with.
//!
//! The crate is layered:
//!
//! - [`Client`] - resolves requests against the configured base url, authenticates them, bounds
//!   every attempt with a timeout and retries transient failures with jittered exponential
//!   backoff. Failures come back as a classified [`Error`].
//! - [`resources`] - typed handles for each endpoint group, e.g. [`Client::memories`] or
//!   [`Client::conversations`].
//! - [`ResponseStream`] - the body of a streaming endpoint as a
//!   [`Stream`][futures_core::Stream] of [`Event`]s, optionally turned into typed values with
//!   [`ResponseStream::json`].
//! - [`EventStream`] - the decoder itself, a generic adapter from any
//!   `Stream<Item = Result<impl AsRef<[u8]>, E>>` to a stream of [`Event`]s.
//! - Low-level parsing via [`parser::parse_line`] and [`parser::parse_line_from_buffer`].
//!
//! # Quick start
//!
//! ```no_run
//! use futures::StreamExt;
//! use memvault::{Client, ClientConfig, resources::query::QueryRequest};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::from_env()?)?;
//!
//! let answer = client.query().ask(&QueryRequest::new("what tea do I like?")).await?;
//! println!("{}", answer.answer);
//!
//! let mut stream = client.query().stream(&QueryRequest::new("and coffee?")).await?;
//! while let Some(event) = stream.next().await {
//!     let event = event?;
//!     println!("{}: {}", event.event, event.data);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Using `EventStream` directly
//!
//! If you already have a byte stream (from any HTTP client, a file, etc.) the decoder works on
//! its own:
//!
//! ```rust
//! use bytes::Bytes;
//! use futures::StreamExt;
//! use memvault::EventStream;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let chunks = vec![
//!     Ok::<_, std::io::Error>(Bytes::from("data: hello\n\ndata: world\n\n")),
//! ];
//! let mut stream = EventStream::new(futures::stream::iter(chunks));
//!
//! while let Some(Ok(event)) = stream.next().await {
//!     println!("{}", event.data);
//! }
//! # }
//! ```
//!
//! # Errors
//!
//! Every call returns [`Error`], which can be asked what went wrong instead of matched on:
//! [`Error::is_retryable`], [`Error::is_auth_error`], [`Error::is_rate_limited`] and friends.
//! Retries have already happened by the time an error reaches the caller.
//!
//! # Logging
//!
//! Attempts, retries and stream lifecycles are reported through [`tracing`]; install any
//! subscriber to see them.

pub mod client;
pub mod config;
pub(crate) mod constants;
pub mod errors;
pub mod event;
pub mod event_stream;
pub mod json_stream;
pub mod parser;
pub mod resources;
pub mod retry;

pub use client::{Client, ResponseStream};
pub use config::{ClientConfig, ConfigError};
pub use errors::Error;
pub use event::Event;
pub use event_stream::EventStream;
pub use json_stream::JsonStream;
pub use retry::RetryPolicy;
