//! HTTP side of the crate: building requests, running them with retries, and handing streaming
//! bodies over to the decoder

use core::{
    future::Future,
    pin::{Pin, pin},
    task::{Context, Poll, ready},
    time::Duration,
};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_core::{FusedStream, Stream};
use futures_timer::Delay;
use futures_util::future::{self, Either};
use http_body_util::BodyDataStream;
use pin_project_lite::pin_project;
use reqwest::{
    Body, Method, Response, StatusCode, Url,
    header::{ACCEPT, CONTENT_TYPE, HeaderValue, RETRY_AFTER},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::ClientConfig,
    constants::{ERROR_BODY_LIMIT, EVENT_STREAM_MIME, JSON_MIME},
    errors::{Error, EventStreamError, NetworkError, api},
    event::Event,
    event_stream::EventStream,
    json_stream::JsonStream,
    resources::{Conversations, Memories, Query, Search, Users, Webhooks},
    retry::parse_retry_after,
};

/// Handle to the memvault API
///
/// Cheap to clone; clones share the connection pool and configuration. Every call runs on its
/// own, so any number of them can be in flight at once.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    config: Arc<ClientConfig>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Self::with_http_client(config, http)
    }

    /// Like [`Client::new`] but reusing an existing [`reqwest::Client`]. Its own timeout, if
    /// any, applies on top of [`ClientConfig::timeout`].
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::invalid_target(config.base_url.as_str(), e))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::invalid_target(
                config.base_url.as_str(),
                "base url cannot carry a path",
            ));
        }

        Ok(Self {
            http,
            base_url,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn memories(&self) -> Memories<'_> {
        Memories::new(self)
    }

    pub fn query(&self) -> Query<'_> {
        Query::new(self)
    }

    pub fn search(&self) -> Search<'_> {
        Search::new(self)
    }

    pub fn conversations(&self) -> Conversations<'_> {
        Conversations::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn webhooks(&self) -> Webhooks<'_> {
        Webhooks::new(self)
    }

    /// Runs `request` and decodes the JSON response body into `T`. An empty body decodes as
    /// `null`, so `T = ()` works for endpoints that answer with nothing.
    pub(crate) async fn send<T>(&self, request: ApiRequest) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(&request)?;
        let body = self
            .with_retries(&request, &url, || self.buffered_attempt(&request, &url))
            .await?;
        decode_body(&body)
    }

    /// Runs `request` and returns the response body as a stream of events once the server has
    /// answered with a 2xx status
    pub(crate) async fn stream(&self, request: ApiRequest) -> Result<ResponseStream, Error> {
        let url = self.url_for(&request)?;
        let response = self
            .with_retries(&request, &url, || self.streaming_attempt(&request, &url))
            .await?;
        tracing::debug!(method = %request.method, %url, "event stream opened");
        Ok(ResponseStream::new(response))
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                Error::invalid_target(self.base_url.as_str(), "base url cannot carry a path")
            })?;
            segments.pop_if_empty();
            for segment in &request.path {
                // url silently drops dot segments, which would quietly hit a different endpoint
                if segment.is_empty() || segment == "." || segment == ".." {
                    return Err(Error::invalid_target(
                        request.display_path(),
                        format!("`{segment}` is not a valid path segment"),
                    ));
                }
                segments.push(segment);
            }
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    fn request_builder(
        &self,
        request: &ApiRequest,
        url: &Url,
        accept: &'static str,
    ) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(request.method.clone(), url.clone())
            .bearer_auth(&self.config.api_key)
            .header(ACCEPT, HeaderValue::from_static(accept));
        match &request.body {
            Some(body) => builder
                .header(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME))
                .body(Body::from(body.clone())),
            None => builder,
        }
    }

    async fn buffered_attempt(&self, request: &ApiRequest, url: &Url) -> Result<Bytes, Attempt> {
        let response = self
            .request_builder(request, url, JSON_MIME)
            .send()
            .await
            .map_err(Attempt::network)?;
        let response = check_status(response).await?;
        response.bytes().await.map_err(Attempt::network)
    }

    async fn streaming_attempt(&self, request: &ApiRequest, url: &Url) -> Result<Response, Attempt> {
        let response = self
            .request_builder(request, url, EVENT_STREAM_MIME)
            .send()
            .await
            .map_err(Attempt::network)?;
        check_status(response).await
    }

    /// Runs attempts one after another until one succeeds, one fails for good, or the retry
    /// policy runs out
    async fn with_retries<T, F, Fut>(
        &self,
        request: &ApiRequest,
        url: &Url,
        mut attempt: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Attempt>>,
    {
        let policy = self.config.retry;
        let mut number = 1;
        loop {
            tracing::debug!(method = %request.method, %url, attempt = number, "sending request");

            let failed = match with_timeout(self.config.timeout, attempt()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(failed)) => failed,
                Err(timeout) => Attempt::from(timeout),
            };

            if !failed.error.is_retryable() || !policy.has_attempts_after(number) {
                tracing::debug!(
                    method = %request.method,
                    %url,
                    attempt = number,
                    error = %failed.error,
                    "request failed"
                );
                return Err(failed.error);
            }

            let delay = policy.delay(number, failed.retry_after);
            tracing::warn!(
                method = %request.method,
                %url,
                attempt = number,
                delay_ms = delay.as_millis() as u64,
                error = %failed.error,
                "request failed, retrying"
            );
            Delay::new(delay).await;
            number += 1;
        }
    }
}

/// A failed attempt, along with the server's `Retry-After` if it sent one
#[derive(Debug)]
struct Attempt {
    error: Error,
    retry_after: Option<Duration>,
}

impl Attempt {
    fn network(error: reqwest::Error) -> Self {
        Self {
            error: Error::from(error),
            retry_after: None,
        }
    }
}

impl From<NetworkError> for Attempt {
    fn from(value: NetworkError) -> Self {
        Self {
            error: Error::Network(value),
            retry_after: None,
        }
    }
}

async fn with_timeout<F>(timeout: Duration, future: F) -> Result<F::Output, NetworkError>
where
    F: Future,
{
    let future = pin!(future);
    let delay = pin!(Delay::new(timeout));
    match future::select(future, delay).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(((), _)) => Err(NetworkError::Timeout(timeout)),
    }
}

/// Passes 2xx responses through, anything else gets its body drained and classified
async fn check_status(response: Response) -> Result<Response, Attempt> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_retry_after);
    let body = read_error_body(response).await;

    Err(Attempt {
        error: api::from_response_body(status.as_u16(), &body),
        retry_after,
    })
}

/// Reads at most [ERROR_BODY_LIMIT] bytes. The body is only used to describe the failure, so a
/// transport error halfway through just leaves us with less of it.
async fn read_error_body(mut response: Response) -> Bytes {
    let mut body = BytesMut::new();
    while body.len() < ERROR_BODY_LIMIT {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(ERROR_BODY_LIMIT - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    body.freeze()
}

fn decode_body<T>(body: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(&mut deserializer).map_err(Error::Decode)
}

/// One logical call against the API, before it's resolved against the base url
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    path: Vec<String>,
    query: Vec<(&'static str, String)>,
    body: Option<Bytes>,
}

impl ApiRequest {
    pub(crate) fn new<I, P>(method: Method, path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            method,
            path: path.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn get<I, P>(path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post<I, P>(path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::new(Method::POST, path)
    }

    pub(crate) fn put<I, P>(path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::new(Method::PUT, path)
    }

    pub(crate) fn delete<I, P>(path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub(crate) fn query_opt(self, key: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Serialises `body` up front, so an unserialisable body fails before anything is sent
    pub(crate) fn json<B>(mut self, body: &B) -> Result<Self, Error>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(Error::Encode)?;
        self.body = Some(Bytes::from(body));
        Ok(self)
    }

    fn display_path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }
}

pin_project! {
    /// Events from a streaming endpoint, decoded as they arrive
    ///
    /// Ends when the server closes the response. Dropping it closes the connection.
    pub struct ResponseStream {
        #[pin]
        events: EventStream<BodyDataStream<Body>>,
        status: StatusCode,
    }
}

impl ResponseStream {
    fn new(response: Response) -> Self {
        let status = response.status();
        Self {
            events: EventStream::new(BodyDataStream::new(Body::from(response))),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Deserialises every event's data as JSON into `T`
    pub fn json<T>(self) -> JsonStream<T, Self>
    where
        T: DeserializeOwned,
    {
        JsonStream::new(self)
    }
}

impl core::fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Stream for ResponseStream {
    type Item = Result<Event, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let next = match ready!(this.events.poll_next(cx)) {
            Some(Ok(event)) => Ok(event),
            Some(Err(EventStreamError::Transport(e))) => {
                tracing::debug!(error = %e, "event stream transport failed");
                Err(Error::from(e))
            }
            Some(Err(EventStreamError::Utf8Error(e))) => {
                tracing::debug!(error = %e, "event stream carried invalid utf8");
                Err(Error::Stream(e.to_string()))
            }
            None => {
                tracing::debug!("event stream ended");
                return Poll::Ready(None);
            }
        };
        Poll::Ready(Some(next))
    }
}

impl FusedStream for ResponseStream {
    fn is_terminated(&self) -> bool {
        self.events.is_terminated()
    }
}
