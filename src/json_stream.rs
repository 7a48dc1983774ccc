//! Typed view over an event stream where every event carries JSON

use crate::event::Event;
use core::{
    error::Error,
    fmt::Display,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};
use futures_core::{FusedStream, Stream};
use serde::de::DeserializeOwned;

pub type DeserializeError = serde_path_to_error::Error<serde_json::Error>;

pin_project_lite::pin_project! {
    /// Deserialises the `data` of each event from `S` into a `T`
    ///
    /// An event that doesn't deserialise yields [`JsonStreamError::Deserialize`] and the stream
    /// carries on with the next event. Errors from `S` itself are passed through untouched.
    #[derive(Debug)]
    pub struct JsonStream<T, S> {
        #[pin]
        stream_state: JsonStreamState<S>,
        output_marker: PhantomData<fn() -> T>,
    }
}

impl<T, S> JsonStream<T, S> {
    #[must_use]
    pub fn new(stream: S) -> Self {
        JsonStream {
            stream_state: JsonStreamState::Active { stream },
            output_marker: PhantomData,
        }
    }
}

pin_project_lite::pin_project! {
    #[derive(Debug)]
    #[project = JsonStreamStateProjection]
    enum JsonStreamState<S> {
        Active {
            #[pin]
            stream: S
        },
        Inactive,
    }
}

#[derive(Debug)]
pub enum JsonStreamError<E> {
    Stream(E),
    Deserialize(DeserializeError),
}

impl<E> JsonStreamError<E> {
    /// Whether this only affects the one event, so polling again is worthwhile
    pub fn is_deserialize(&self) -> bool {
        matches!(self, JsonStreamError::Deserialize(_))
    }
}

impl<E> Display for JsonStreamError<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            JsonStreamError::Stream(e) => e.fmt(f),
            JsonStreamError::Deserialize(e) => write!(f, "invalid event payload: {e}"),
        }
    }
}

impl<E> Error for JsonStreamError<E> where E: Error {}

impl<T, S, E> Stream for JsonStream<T, S>
where
    S: Stream<Item = Result<Event, E>>,
    T: DeserializeOwned,
{
    type Item = Result<T, JsonStreamError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let stream = match this.stream_state.as_mut().project() {
            JsonStreamStateProjection::Active { stream } => stream,
            JsonStreamStateProjection::Inactive => return Poll::Ready(None),
        };

        let Some(next) = core::task::ready!(stream.poll_next(cx)) else {
            this.stream_state.set(JsonStreamState::Inactive);
            return Poll::Ready(None);
        };
        Poll::Ready(Some(match next {
            Ok(event) => event.json().map_err(JsonStreamError::Deserialize),
            Err(e) => Err(JsonStreamError::Stream(e)),
        }))
    }
}

impl<T, S, E> FusedStream for JsonStream<T, S>
where
    S: Stream<Item = Result<Event, E>>,
    T: DeserializeOwned,
{
    fn is_terminated(&self) -> bool {
        matches!(self.stream_state, JsonStreamState::Inactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventStream;
    use bytes::Bytes;
    use futures::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Delta {
        text: String,
    }

    #[tokio::test]
    async fn bad_payload_only_affects_its_own_event() {
        let events = EventStream::new(futures::stream::iter(vec![Ok::<_, ()>(
            Bytes::from_static(
                b"data: {\"text\": \"hel\"}\n\ndata: not json\n\ndata: {\"text\": 5}\n\ndata: {\"text\": \"lo\"}\n\n",
            ),
        )]));

        let results = JsonStream::<Delta, _>::new(events).collect::<Vec<_>>().await;

        assert_eq!(results.len(), 4);
        assert_eq!(
            results[0].as_ref().unwrap(),
            &Delta {
                text: "hel".into()
            }
        );
        assert!(results[1].as_ref().is_err_and(JsonStreamError::is_deserialize));
        match &results[2] {
            Err(JsonStreamError::Deserialize(e)) => assert_eq!(e.path().to_string(), "text"),
            other => panic!("expected a deserialize error, got {other:?}"),
        }
        assert_eq!(
            results[3].as_ref().unwrap(),
            &Delta {
                text: "lo".into()
            }
        );
    }

    #[tokio::test]
    async fn stream_errors_pass_through() {
        let events = futures::stream::iter(vec![
            Ok(Event::message("{\"text\": \"a\"}")),
            Err("boom"),
        ]);

        let mut stream = JsonStream::<Delta, _>::new(events);
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            Delta { text: "a".into() }
        );
        assert!(matches!(
            stream.next().await,
            Some(Err(JsonStreamError::Stream("boom")))
        ));
        assert!(stream.next().await.is_none());
        assert!(stream.is_terminated());
    }
}
