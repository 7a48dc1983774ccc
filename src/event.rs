//! Representation of decoded SSE events

use bytes_utils::Str;
use serde::de::DeserializeOwned;

use crate::constants::MESSAGE_STR;

/// A single event pulled from an [EventStream][crate::event_stream::EventStream]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Event {
    /// Event type, `"message"` unless the server sent an `event:` field
    pub event: Str,
    /// Every `data:` line of the event joined with `\n`
    pub data: Str,
    pub id: Option<Str>,
}

impl Event {
    /// Shorthand for an unnamed event carrying `data`
    pub fn message(data: impl Into<Str>) -> Self {
        Self {
            event: MESSAGE_STR,
            data: data.into(),
            id: None,
        }
    }

    pub fn is_message(&self) -> bool {
        self.event == MESSAGE_STR
    }

    /// Deserialises [`Event::data`] as JSON, with the path to the offending field on failure
    pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
    where
        T: DeserializeOwned,
    {
        let mut deserializer = serde_json::Deserializer::from_str(&self.data);
        serde_path_to_error::deserialize(&mut deserializer)
    }
}
