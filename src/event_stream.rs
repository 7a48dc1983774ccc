use core::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::{Buf, BufMut, BytesMut};
use bytes_utils::{Str, StrMut};
use futures_core::{FusedStream, Stream};

use crate::{
    constants::{BOM, LF, MESSAGE_STR},
    errors::EventStreamError,
    event::Event,
    parser::{FieldName, RawEventLineOwned, ValidatedEventLine, parse_line_from_buffer},
};

/// Fields collected since the last dispatched event
#[derive(Debug, Clone)]
pub(crate) struct EventBuilder {
    event: Option<Str>,
    id: Option<Str>,
    data_buffer: StrMut,
    data_lines: usize,
    is_complete: bool,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self {
            event: None,
            id: None,
            data_buffer: StrMut::new(),
            data_lines: 0,
            is_complete: false,
        }
    }
}

impl EventBuilder {
    fn add(&mut self, line: ValidatedEventLine) {
        match line {
            ValidatedEventLine::Empty => self.is_complete = true,
            ValidatedEventLine::Field {
                field_name: FieldName::Event,
                field_value,
            } => {
                self.event = field_value;
            }
            ValidatedEventLine::Field {
                field_name: FieldName::Data,
                field_value,
            } => {
                if let Some(field_value) = field_value {
                    self.data_buffer.push_str(&field_value);
                }
                self.data_buffer.push('\n');
                self.data_lines += 1;
            }
            ValidatedEventLine::Field {
                field_name: FieldName::Id,
                field_value,
            } => {
                self.id = field_value.filter(|id| !id.is_empty());
            }
            ValidatedEventLine::Comment
            | ValidatedEventLine::Field {
                field_name: FieldName::Ignored,
                ..
            } => (),
        }
    }

    /// Called on a blank line. Without any data lines the blank line is a keep-alive and the
    /// pending type and id stay put for the next event.
    fn dispatch(&mut self) -> Option<Event> {
        self.is_complete = false;
        if self.data_lines == 0 {
            return None;
        }

        let EventBuilder {
            event,
            id,
            data_buffer,
            ..
        } = core::mem::take(self);

        // every data line pushed a trailing LF, the last one isn't part of the payload
        let mut buf = data_buffer.into_inner();
        buf.truncate(buf.len() - 1);
        // Safety: we just removed the final byte, which is known to be LF and thus can't be part of another utf-8 codepoint
        let data = unsafe { StrMut::from_inner_unchecked(buf) };

        Some(Event {
            event: event
                .filter(|event| !event.is_empty())
                .unwrap_or(MESSAGE_STR),
            data: data.freeze(),
            id,
        })
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventStreamState {
    /// Haven't seen enough bytes to rule out a BOM yet
    NotStarted,
    Started,
    /// Underlying stream finished, whatever is buffered still has to come out
    Draining,
    Terminated,
}

/// Reads complete lines off `buffer` until one finishes an event or we run out of lines
fn parse_event<E>(
    buffer: &mut BytesMut,
    builder: &mut EventBuilder,
) -> Result<Option<Event>, EventStreamError<E>> {
    loop {
        let event_line = match parse_line_from_buffer(buffer).map(RawEventLineOwned::validate) {
            Some(Ok(event_line)) => event_line,
            Some(Err(e)) => return Err(EventStreamError::Utf8Error(e)),
            None => return Ok(None),
        };

        builder.add(event_line);

        // dispatch mutates I don't want to collapse this, for clarity
        #[allow(clippy::collapsible_if)]
        if builder.is_complete {
            if let Some(event) = builder.dispatch() {
                return Ok(Some(event));
            }
        }
    }
}

/// [None] if the buffer is still a strict prefix of the BOM and we need more bytes to decide
fn starts_with_bom(buffer: &[u8]) -> Option<bool> {
    if buffer.len() >= BOM.len() {
        Some(buffer.starts_with(BOM))
    } else if BOM.starts_with(buffer) {
        None
    } else {
        Some(false)
    }
}

pin_project_lite::pin_project! {
    /// [`Stream`] that decodes a stream of byte chunks into [`Event`]s
    ///
    /// Chunks don't need to line up with lines or events. When the underlying stream ends, an
    /// event that never got its closing blank line is still handed out. The first error, be it
    /// from the transport or invalid utf8 anywhere in a line (comments included), is yielded once
    /// and ends the stream; whatever was buffered at that point is discarded.
    #[project = EventStreamProjection]
    #[derive(Debug)]
    pub struct EventStream<S> {
        #[pin]
        stream: S,
        buffer: BytesMut,
        builder: EventBuilder,
        state: EventStreamState,
    }
}

impl<S> EventStream<S> {
    /// Create a new [`EventStream`] from a stream of [`AsRef<[u8]>`][AsRef]
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::new(),
            builder: EventBuilder::default(),
            state: EventStreamState::NotStarted,
        }
    }
}

impl<S> EventStreamProjection<'_, S> {
    fn terminate(&mut self) {
        *self.state = EventStreamState::Terminated;
        self.buffer.clear();
        self.builder.reset();
    }
}

impl<S, E, B> Stream for EventStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    type Item = Result<Event, EventStreamError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            match *this.state {
                EventStreamState::Terminated => return Poll::Ready(None),
                EventStreamState::NotStarted => {}
                EventStreamState::Started | EventStreamState::Draining => {
                    match parse_event(this.buffer, this.builder) {
                        Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                        Ok(None) => {}
                        Err(e) => {
                            this.terminate();
                            return Poll::Ready(Some(Err(e)));
                        }
                    }
                }
            }

            if *this.state == EventStreamState::Draining {
                // every buffered line has been consumed, anything left in the builder never saw its blank line
                *this.state = EventStreamState::Terminated;
                return Poll::Ready(this.builder.dispatch().map(Ok));
            }

            let new_bytes = match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(o)) => o,
                Some(Err(e)) => {
                    this.terminate();
                    return Poll::Ready(Some(Err(EventStreamError::Transport(e))));
                }
                None => {
                    // terminate the last line ourselves, a trailing CR just becomes CRLF
                    if !this.buffer.is_empty() {
                        this.buffer.put_u8(LF);
                    }
                    *this.state = EventStreamState::Draining;
                    continue;
                }
            };

            let new_bytes = new_bytes.as_ref();
            if new_bytes.is_empty() {
                continue;
            }
            this.buffer.extend_from_slice(new_bytes);

            if *this.state == EventStreamState::NotStarted {
                match starts_with_bom(this.buffer) {
                    Some(true) => {
                        *this.state = EventStreamState::Started;
                        this.buffer.advance(BOM.len());
                    }
                    Some(false) => *this.state = EventStreamState::Started,
                    None => continue,
                }
            }
        }
    }
}

impl<S, E, B> FusedStream for EventStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    fn is_terminated(&self) -> bool {
        self.state == EventStreamState::Terminated
    }
}
