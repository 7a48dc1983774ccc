use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Page, PageParams};
use crate::{
    client::{ApiRequest, Client},
    errors::Error,
};

const MEMORIES: &str = "memories";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemory {
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl CreateMemory {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Fields left as [None] are not touched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMemories {
    pub page: PageParams,
    pub tag: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Memories<'a> {
    client: &'a Client,
}

impl<'a> Memories<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, memory: &CreateMemory) -> Result<Memory, Error> {
        self.client
            .send(ApiRequest::post([MEMORIES]).json(memory)?)
            .await
    }

    pub async fn list(&self, params: &ListMemories) -> Result<Page<Memory>, Error> {
        let request = params
            .page
            .apply(ApiRequest::get([MEMORIES]))
            .query_opt("tag", params.tag.as_deref())
            .query_opt("userId", params.user_id.as_deref());
        self.client.send(request).await
    }

    pub async fn get(&self, id: &str) -> Result<Memory, Error> {
        self.client.send(ApiRequest::get([MEMORIES, id])).await
    }

    pub async fn update(&self, id: &str, update: &UpdateMemory) -> Result<Memory, Error> {
        self.client
            .send(ApiRequest::put([MEMORIES, id]).json(update)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.client.send(ApiRequest::delete([MEMORIES, id])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_body_uses_camel_case_and_skips_unset_fields() {
        let body = serde_json::to_value(CreateMemory::new("likes tea").user_id("u_1")).unwrap();
        assert_eq!(body, json!({"content": "likes tea", "userId": "u_1"}));

        let body = serde_json::to_value(
            CreateMemory::new("likes tea")
                .tag("prefs")
                .metadata(json!({"source": "chat"})),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({"content": "likes tea", "tags": ["prefs"], "metadata": {"source": "chat"}})
        );
    }

    #[test]
    fn memory_from_wire() {
        let memory: Memory = serde_json::from_value(json!({
            "id": "mem_1",
            "content": "likes tea",
            "createdAt": "2026-03-01T12:00:00Z",
        }))
        .unwrap();
        assert_eq!(memory.id, "mem_1");
        assert!(memory.tags.is_empty());
        assert_eq!(memory.user_id, None);
        assert_eq!(memory.updated_at, None);
    }
}
