//! Typed wrappers around the REST endpoints
//!
//! Each resource is a borrowed handle obtained from the [`Client`][crate::Client], e.g.
//! `client.memories().get("mem_123")`. The wire format is JSON with camelCase field names.

use serde::{Deserialize, Serialize};

use crate::client::ApiRequest;

pub mod conversations;
pub mod memories;
pub mod query;
pub mod search;
pub mod users;
pub mod webhooks;

pub use conversations::Conversations;
pub use memories::Memories;
pub use query::Query;
pub use search::Search;
pub use users::Users;
pub use webhooks::Webhooks;

/// One page of a cursor paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Paging parameters shared by the list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl PageParams {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            cursor: None,
        }
    }

    pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("limit", self.limit)
            .query_opt("cursor", self.cursor.as_deref())
    }

    /// Parameters for the page after `page`, if there is one
    pub fn after<T>(&self, page: &Page<T>) -> Option<Self> {
        page.next_cursor.as_ref().map(|cursor| Self {
            limit: self.limit,
            cursor: Some(cursor.clone()),
        })
    }
}

/// A stored memory that contributed to an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub memory_id: String,
    pub content: String,
    pub score: f32,
}
